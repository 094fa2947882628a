use super::{always, b_panel_fits_l1, hybrid_shape_fits};
use crate::capabilities::{Requirements, TargetArch};
use crate::implementation::GemmImplementation;
use gemmsel_kernels::catalog::*;
use gemmsel_kernels::cost::interleaved_cycles;
use gemmsel_kernels::{
    Extension, GemmArgs, GemmHybrid, GemmInterleaved, GemmMethod, GemvBatched, UniqueGemmCommon,
};

type S8 = GemmImplementation<i8, i32>;

const AARCH64: Requirements = Requirements::arch(TargetArch::Aarch64);
const DOTPROD: Requirements = AARCH64.with(Extension::Dotprod);
const SVE: Requirements = AARCH64.with(Extension::Sve);

pub static GEMM_S8_METHODS: &[S8] = &[
    S8::preferred(
        GemmMethod::GemvBatched,
        "gemv_batched",
        Requirements::NONE,
        Some(|args: &GemmArgs| args.m == 1 && args.nbatches > 1),
        always,
        |args: &GemmArgs| -> UniqueGemmCommon<i8, i32> {
            Box::new(GemvBatched::<i8, i32>::new(args, &GEMV_BATCHED))
        },
    ),
    S8::with_estimate(
        GemmMethod::GemmInterleaved,
        "interleaved_s8s32_mmla_3VLx8",
        SVE.with(Extension::I8mm),
        Some(|args: &GemmArgs| args.k > 8),
        |args: &GemmArgs| interleaved_cycles(args, &SVE_INTERLEAVED_S8S32_MMLA_3VLX8),
        |args: &GemmArgs| -> UniqueGemmCommon<i8, i32> {
            Box::new(GemmInterleaved::<i8, i32>::new(args, &SVE_INTERLEAVED_S8S32_MMLA_3VLX8))
        },
    ),
    S8::preferred(
        GemmMethod::GemmHybrid,
        "smallK_hybrid_s8s32_dot_1VLx8",
        SVE,
        Some(|args: &GemmArgs| args.k <= 64 && args.pretransposed_hint),
        |args: &GemmArgs| b_panel_fits_l1(args, 1),
        |args: &GemmArgs| -> UniqueGemmCommon<i8, i32> {
            Box::new(GemmHybrid::<i8, i32>::new(args, &SVE_SMALLK_HYBRID_S8S32_DOT_1VLX8))
        },
    ),
    S8::preferred(
        GemmMethod::GemmHybrid,
        "hybrid_s8s32_dot_4VLx4",
        SVE,
        Some(|args: &GemmArgs| args.k >= 16 && args.pretransposed_hint),
        |args: &GemmArgs| hybrid_shape_fits(args, 128),
        |args: &GemmArgs| -> UniqueGemmCommon<i8, i32> {
            Box::new(GemmHybrid::<i8, i32>::new(args, &SVE_HYBRID_S8S32_DOT_4VLX4))
        },
    ),
    S8::with_estimate(
        GemmMethod::GemmInterleaved,
        "interleaved_s8s32_dot_3VLx8",
        SVE,
        Some(|args: &GemmArgs| args.k > 4),
        |args: &GemmArgs| interleaved_cycles(args, &SVE_INTERLEAVED_S8S32_DOT_3VLX8),
        |args: &GemmArgs| -> UniqueGemmCommon<i8, i32> {
            Box::new(GemmInterleaved::<i8, i32>::new(args, &SVE_INTERLEAVED_S8S32_DOT_3VLX8))
        },
    ),
    S8::with_estimate(
        GemmMethod::GemmInterleaved,
        "interleaved_s8s32_mmla_12x8",
        AARCH64.with(Extension::I8mm),
        Some(|args: &GemmArgs| args.k > 8),
        |args: &GemmArgs| interleaved_cycles(args, &INTERLEAVED_S8S32_MMLA_12X8),
        |args: &GemmArgs| -> UniqueGemmCommon<i8, i32> {
            Box::new(GemmInterleaved::<i8, i32>::new(args, &INTERLEAVED_S8S32_MMLA_12X8))
        },
    ),
    S8::preferred(
        GemmMethod::GemmHybrid,
        "smallK_hybrid_s8s32_dot_4x8",
        DOTPROD,
        Some(|args: &GemmArgs| args.n % 4 == 0 && args.k <= 32 && args.pretransposed_hint),
        |args: &GemmArgs| b_panel_fits_l1(args, 1),
        |args: &GemmArgs| -> UniqueGemmCommon<i8, i32> {
            Box::new(GemmHybrid::<i8, i32>::new(args, &SMALLK_HYBRID_S8S32_DOT_4X8))
        },
    ),
    S8::preferred(
        GemmMethod::GemmHybrid,
        "smallK_hybrid_s8s32_dot_4x6",
        DOTPROD,
        Some(|args: &GemmArgs| {
            args.n % 4 == 0 && args.k > 32 && args.k <= 64 && args.pretransposed_hint
        }),
        |args: &GemmArgs| b_panel_fits_l1(args, 1),
        |args: &GemmArgs| -> UniqueGemmCommon<i8, i32> {
            Box::new(GemmHybrid::<i8, i32>::new(args, &SMALLK_HYBRID_S8S32_DOT_4X6))
        },
    ),
    S8::preferred(
        GemmMethod::GemmHybrid,
        "hybrid_s8s32_dot_16x4",
        DOTPROD,
        Some(|args: &GemmArgs| args.k >= 16 && args.pretransposed_hint),
        |args: &GemmArgs| args.n <= 256 && args.k > 128,
        |args: &GemmArgs| -> UniqueGemmCommon<i8, i32> {
            Box::new(GemmHybrid::<i8, i32>::new(args, &HYBRID_S8S32_DOT_16X4))
        },
    ),
    S8::with_estimate(
        GemmMethod::GemmInterleaved,
        "gemm_s8_12x8",
        DOTPROD,
        None,
        |args: &GemmArgs| interleaved_cycles(args, &GEMM_S8_12X8),
        |args: &GemmArgs| -> UniqueGemmCommon<i8, i32> {
            Box::new(GemmInterleaved::<i8, i32>::new(args, &GEMM_S8_12X8))
        },
    ),
    S8::with_estimate(
        GemmMethod::GemmInterleaved,
        "gemm_s8_4x4",
        AARCH64,
        None,
        |args: &GemmArgs| interleaved_cycles(args, &GEMM_S8_4X4),
        |args: &GemmArgs| -> UniqueGemmCommon<i8, i32> {
            Box::new(GemmInterleaved::<i8, i32>::new(args, &GEMM_S8_4X4))
        },
    ),
    S8::new(
        GemmMethod::GemmInterleaved,
        "interleaved_s8s32_portable_4x4",
        Requirements::NONE,
        None,
        |args: &GemmArgs| -> UniqueGemmCommon<i8, i32> {
            Box::new(GemmInterleaved::<i8, i32>::new(args, &INTERLEAVED_S8S32_PORTABLE_4X4))
        },
    ),
    S8::terminal(),
];
