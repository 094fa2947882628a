use super::{always, hybrid_shape_fits};
use crate::capabilities::{Requirements, TargetArch};
use crate::implementation::GemmImplementation;
use gemmsel_kernels::catalog::*;
use gemmsel_kernels::cost::interleaved_cycles;
use gemmsel_kernels::{
    Extension, GemmArgs, GemmHybrid, GemmInterleaved, GemmMethod, GemvBatched, UniqueGemmCommon,
};
use half::f16;

type Fp16 = GemmImplementation<f16, f16>;

const AARCH64: Requirements = Requirements::arch(TargetArch::Aarch64);
const AARCH64_FP16: Requirements = AARCH64.with(Extension::Fp16);
const SVE_FP16: Requirements = AARCH64_FP16.with(Extension::Sve);

pub static GEMM_FP16_METHODS: &[Fp16] = &[
    Fp16::preferred(
        GemmMethod::GemvBatched,
        "gemv_batched",
        Requirements::NONE,
        Some(|args: &GemmArgs| args.m == 1 && args.nbatches > 1),
        always,
        |args: &GemmArgs| -> UniqueGemmCommon<f16, f16> {
            Box::new(GemvBatched::<f16, f16>::new(args, &GEMV_BATCHED))
        },
    ),
    Fp16::preferred(
        GemmMethod::GemmHybrid,
        "hybrid_fp16_mla_4VLx4",
        SVE_FP16,
        Some(|args: &GemmArgs| args.k >= 8),
        |args: &GemmArgs| hybrid_shape_fits(args, 256),
        |args: &GemmArgs| -> UniqueGemmCommon<f16, f16> {
            Box::new(GemmHybrid::<f16, f16>::new(args, &SVE_HYBRID_FP16_MLA_4VLX4))
        },
    ),
    Fp16::with_estimate(
        GemmMethod::GemmInterleaved,
        "interleaved_fp16_mla_3VLx8",
        SVE_FP16,
        Some(|args: &GemmArgs| args.k > 4),
        |args: &GemmArgs| interleaved_cycles(args, &SVE_INTERLEAVED_FP16_MLA_3VLX8),
        |args: &GemmArgs| -> UniqueGemmCommon<f16, f16> {
            Box::new(GemmInterleaved::<f16, f16>::new(args, &SVE_INTERLEAVED_FP16_MLA_3VLX8))
        },
    ),
    Fp16::preferred(
        GemmMethod::GemmHybrid,
        "hybrid_fp16_mla_16x4",
        AARCH64_FP16,
        Some(|args: &GemmArgs| args.k >= 4),
        |args: &GemmArgs| hybrid_shape_fits(args, 256),
        |args: &GemmArgs| -> UniqueGemmCommon<f16, f16> {
            Box::new(GemmHybrid::<f16, f16>::new(args, &HYBRID_FP16_MLA_16X4))
        },
    ),
    Fp16::with_estimate(
        GemmMethod::GemmInterleaved,
        "hgemm_24x8",
        AARCH64_FP16,
        None,
        |args: &GemmArgs| interleaved_cycles(args, &HGEMM_24X8),
        |args: &GemmArgs| -> UniqueGemmCommon<f16, f16> {
            Box::new(GemmInterleaved::<f16, f16>::new(args, &HGEMM_24X8))
        },
    ),
    // Widens to fp32 on cores without native half-precision arithmetic.
    Fp16::with_estimate(
        GemmMethod::GemmInterleaved,
        "sgemm_12x8_widening",
        AARCH64,
        None,
        |args: &GemmArgs| interleaved_cycles(args, &SGEMM_12X8),
        |args: &GemmArgs| -> UniqueGemmCommon<f16, f16> {
            Box::new(GemmInterleaved::<f16, f16>::new(args, &SGEMM_12X8))
        },
    ),
    Fp16::new(
        GemmMethod::GemmInterleaved,
        "interleaved_fp16_portable_4x4",
        Requirements::NONE,
        None,
        |args: &GemmArgs| -> UniqueGemmCommon<f16, f16> {
            Box::new(GemmInterleaved::<f16, f16>::new(args, &INTERLEAVED_FP16_PORTABLE_4X4))
        },
    ),
    Fp16::terminal(),
];
