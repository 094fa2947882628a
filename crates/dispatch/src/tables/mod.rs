//! Static candidate tables and the type-indexed registry accessor.

mod fp16;
mod fp32;
mod int8;
mod uint8;

pub use fp16::GEMM_FP16_METHODS;
pub use fp32::GEMM_FP32_METHODS;
pub use int8::GEMM_S8_METHODS;
pub use uint8::GEMM_U8_METHODS;

use crate::capabilities::BuildCapabilities;
use crate::implementation::GemmImplementation;
use crate::registry::Registry;
use gemmsel_kernels::{Accumulator, GemmArgs, Operand};
use half::f16;
use std::sync::OnceLock;

/// Maps an operand type to its candidate table for result type `Tr`.
pub trait GemmTypes<Tr: Accumulator<Self>>: Operand {
    /// The full table, before any build filtering.
    fn methods() -> &'static [GemmImplementation<Self, Tr>];

    /// Registry for the capabilities of the running binary, built once.
    fn native_registry() -> &'static Registry<Self, Tr>;

    fn registry(capabilities: BuildCapabilities) -> Registry<Self, Tr> {
        Registry::from_table(Self::methods(), capabilities)
    }
}

macro_rules! gemm_types {
    ($to:ty, $tr:ty, $table:expr) => {
        impl GemmTypes<$tr> for $to {
            fn methods() -> &'static [GemmImplementation<$to, $tr>] {
                $table
            }

            fn native_registry() -> &'static Registry<$to, $tr> {
                static REGISTRY: OnceLock<Registry<$to, $tr>> = OnceLock::new();
                REGISTRY.get_or_init(|| Self::registry(BuildCapabilities::native()))
            }
        }
    };
}

gemm_types!(f32, f32, GEMM_FP32_METHODS);
gemm_types!(f16, f16, GEMM_FP16_METHODS);
gemm_types!(i8, i32, GEMM_S8_METHODS);
gemm_types!(u8, u32, GEMM_U8_METHODS);

/// The B panel of a small-K problem fits in half the L1 cache.
pub(crate) fn b_panel_fits_l1(args: &GemmArgs, element_bytes: usize) -> bool {
    args.n
        .saturating_mul(args.k)
        .saturating_mul(element_bytes)
        <= args.ci.l1_cache_bytes / 2
}

/// Shapes where a full-width hybrid beats packing: small K and N, or several
/// multis with too few rows per thread to interleave.
pub(crate) fn hybrid_shape_fits(args: &GemmArgs, limit: usize) -> bool {
    (args.k <= limit && args.n <= limit) || (args.nmulti > 1 && args.m / args.max_threads < 8)
}

pub(crate) fn always(_: &GemmArgs) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::TargetArch;
    use gemmsel_kernels::{CpuInfo, GemmMethod};
    use std::sync::Arc;

    fn ends_with_portable_fallback<To, Tr>(table: &[GemmImplementation<To, Tr>])
    where
        To: Operand,
        Tr: Accumulator<To>,
    {
        let last = &table[table.len() - 1];
        assert!(last.is_terminal());
        let fallback = &table[table.len() - 2];
        assert!(matches!(fallback.scoring, crate::Scoring::None));
        assert_eq!(fallback.requires, crate::Requirements::NONE);
        assert!(fallback.is_supported.is_none());
        assert_eq!(fallback.method, GemmMethod::GemmInterleaved);
    }

    #[test]
    fn every_table_ends_with_unconditional_fallback() {
        ends_with_portable_fallback(GEMM_FP32_METHODS);
        ends_with_portable_fallback(GEMM_FP16_METHODS);
        ends_with_portable_fallback(GEMM_S8_METHODS);
        ends_with_portable_fallback(GEMM_U8_METHODS);
    }

    #[test]
    fn record_names_are_unique_per_table() {
        fn unique<To: Operand, Tr: Accumulator<To>>(table: &[GemmImplementation<To, Tr>]) {
            let mut names: Vec<_> = table.iter().map(|record| record.name).collect();
            names.sort_unstable();
            let total = names.len();
            names.dedup();
            assert_eq!(names.len(), total);
        }
        unique(GEMM_FP32_METHODS);
        unique(GEMM_FP16_METHODS);
        unique(GEMM_S8_METHODS);
        unique(GEMM_U8_METHODS);
    }

    #[test]
    fn native_registry_is_built_once() {
        let first = <f32 as GemmTypes<f32>>::native_registry();
        let second = <f32 as GemmTypes<f32>>::native_registry();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first.capabilities(), BuildCapabilities::native());
    }

    #[test]
    fn portable_build_keeps_only_portable_records() {
        let registry = <f32 as GemmTypes<f32>>::registry(BuildCapabilities::portable());
        assert!(registry.candidates().all(|record| record.requires.arch.is_none()));
        assert!(registry.find("gemv_batched").is_some());
        assert!(registry.find("sgemm_12x8_1d").is_none());

        let aarch32 = <f32 as GemmTypes<f32>>::registry(BuildCapabilities::new(TargetArch::Aarch32));
        assert!(aarch32.find("sgemm_8x6").is_some());
        assert!(aarch32.find("sgemm_12x8_1d").is_none());
    }

    #[test]
    fn helper_predicates() {
        let args = GemmArgs::new(Arc::new(CpuInfo::generic()), 64, 512, 8);
        // 512 * 8 * 4 = 16 KiB, exactly half of a 32 KiB L1.
        assert!(b_panel_fits_l1(&args, 4));
        assert!(!b_panel_fits_l1(&args, 8));
        assert!(hybrid_shape_fits(&GemmArgs::new(Arc::new(CpuInfo::generic()), 64, 128, 64), 256));
        assert!(!hybrid_shape_fits(&args, 256));
        let multi = args.clone().with_multis(4).with_max_threads(16);
        assert!(hybrid_shape_fits(&multi, 256));
    }

    #[test]
    fn huge_panels_never_fit() {
        let args = GemmArgs::new(Arc::new(CpuInfo::generic()), 1, usize::MAX / 2, usize::MAX / 2);
        assert!(!b_panel_fits_l1(&args, 4));

        let registry = <f32 as GemmTypes<f32>>::registry(BuildCapabilities::all_aarch64());
        let wide = GemmArgs::new(Arc::new(CpuInfo::generic()), 64, usize::MAX / 2, 4);
        assert!(registry
            .candidates()
            .filter(|record| record.name.starts_with("smallK"))
            .all(|record| record.is_preferred(&wide) != Some(true)));
    }
}
