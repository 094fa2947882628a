use super::{always, b_panel_fits_l1};
use crate::capabilities::{Requirements, TargetArch};
use crate::implementation::GemmImplementation;
use gemmsel_kernels::catalog::*;
use gemmsel_kernels::cost::interleaved_cycles;
use gemmsel_kernels::{
    Extension, GemmArgs, GemmHybrid, GemmInterleaved, GemmMethod, GemvBatched, UniqueGemmCommon,
};

type U8 = GemmImplementation<u8, u32>;

const AARCH64: Requirements = Requirements::arch(TargetArch::Aarch64);
const DOTPROD: Requirements = AARCH64.with(Extension::Dotprod);

pub static GEMM_U8_METHODS: &[U8] = &[
    U8::preferred(
        GemmMethod::GemvBatched,
        "gemv_batched",
        Requirements::NONE,
        Some(|args: &GemmArgs| args.m == 1 && args.nbatches > 1),
        always,
        |args: &GemmArgs| -> UniqueGemmCommon<u8, u32> {
            Box::new(GemvBatched::<u8, u32>::new(args, &GEMV_BATCHED))
        },
    ),
    U8::with_estimate(
        GemmMethod::GemmInterleaved,
        "interleaved_u8u32_dot_3VLx8",
        AARCH64.with(Extension::Sve),
        Some(|args: &GemmArgs| args.k > 4),
        |args: &GemmArgs| interleaved_cycles(args, &SVE_INTERLEAVED_U8U32_DOT_3VLX8),
        |args: &GemmArgs| -> UniqueGemmCommon<u8, u32> {
            Box::new(GemmInterleaved::<u8, u32>::new(args, &SVE_INTERLEAVED_U8U32_DOT_3VLX8))
        },
    ),
    U8::preferred(
        GemmMethod::GemmHybrid,
        "smallK_hybrid_u8u32_dot_4x8",
        DOTPROD,
        Some(|args: &GemmArgs| args.n % 4 == 0 && args.k <= 32 && args.pretransposed_hint),
        |args: &GemmArgs| b_panel_fits_l1(args, 1),
        |args: &GemmArgs| -> UniqueGemmCommon<u8, u32> {
            Box::new(GemmHybrid::<u8, u32>::new(args, &SMALLK_HYBRID_U8U32_DOT_4X8))
        },
    ),
    U8::preferred(
        GemmMethod::GemmHybrid,
        "hybrid_u8u32_dot_16x4",
        DOTPROD,
        Some(|args: &GemmArgs| args.k >= 16 && args.pretransposed_hint),
        |args: &GemmArgs| args.n <= 256 && args.k > 128,
        |args: &GemmArgs| -> UniqueGemmCommon<u8, u32> {
            Box::new(GemmHybrid::<u8, u32>::new(args, &HYBRID_U8U32_DOT_16X4))
        },
    ),
    U8::with_estimate(
        GemmMethod::GemmInterleaved,
        "gemm_u8_12x8",
        DOTPROD,
        None,
        |args: &GemmArgs| interleaved_cycles(args, &GEMM_U8_12X8),
        |args: &GemmArgs| -> UniqueGemmCommon<u8, u32> {
            Box::new(GemmInterleaved::<u8, u32>::new(args, &GEMM_U8_12X8))
        },
    ),
    U8::with_estimate(
        GemmMethod::GemmInterleaved,
        "gemm_u8_4x4",
        AARCH64,
        None,
        |args: &GemmArgs| interleaved_cycles(args, &GEMM_U8_4X4),
        |args: &GemmArgs| -> UniqueGemmCommon<u8, u32> {
            Box::new(GemmInterleaved::<u8, u32>::new(args, &GEMM_U8_4X4))
        },
    ),
    U8::new(
        GemmMethod::GemmInterleaved,
        "interleaved_u8u32_portable_4x4",
        Requirements::NONE,
        None,
        |args: &GemmArgs| -> UniqueGemmCommon<u8, u32> {
            Box::new(GemmInterleaved::<u8, u32>::new(args, &INTERLEAVED_U8U32_PORTABLE_4X4))
        },
    ),
    U8::terminal(),
];
