use super::{always, b_panel_fits_l1, hybrid_shape_fits};
use crate::capabilities::{Requirements, TargetArch};
use crate::implementation::GemmImplementation;
use gemmsel_kernels::catalog::*;
use gemmsel_kernels::cost::{hybrid_cycles, interleaved_2d_cycles, interleaved_cycles};
use gemmsel_kernels::{
    Extension, GemmArgs, GemmHybrid, GemmInterleaved, GemmInterleaved2d, GemmMethod, GemvBatched,
    GemvPretransposed, UniqueGemmCommon,
};

type Fp32 = GemmImplementation<f32, f32>;

const AARCH64: Requirements = Requirements::arch(TargetArch::Aarch64);
const SVE: Requirements = AARCH64.with(Extension::Sve);

pub static GEMM_FP32_METHODS: &[Fp32] = &[
    Fp32::preferred(
        GemmMethod::GemvBatched,
        "gemv_batched",
        Requirements::NONE,
        Some(|args: &GemmArgs| args.m == 1 && args.nbatches > 1),
        always,
        |args: &GemmArgs| -> UniqueGemmCommon<f32, f32> {
            Box::new(GemvBatched::<f32, f32>::new(args, &GEMV_BATCHED))
        },
    ),
    Fp32::preferred(
        GemmMethod::GemvPretransposed,
        "sgemv_pretransposed",
        AARCH64,
        Some(|args: &GemmArgs| args.m == 1 && args.nbatches == 1),
        always,
        |args: &GemmArgs| -> UniqueGemmCommon<f32, f32> {
            Box::new(GemvPretransposed::<f32, f32>::new(args, &SGEMV_PRETRANSPOSED))
        },
    ),
    Fp32::preferred(
        GemmMethod::GemmHybrid,
        "hybrid_fp32_mmla_4VLx4",
        SVE.with(Extension::F32mm),
        Some(|args: &GemmArgs| args.k >= 4),
        |args: &GemmArgs| hybrid_shape_fits(args, 256),
        |args: &GemmArgs| -> UniqueGemmCommon<f32, f32> {
            Box::new(GemmHybrid::<f32, f32>::new(args, &SVE_HYBRID_FP32_MMLA_4VLX4))
        },
    ),
    Fp32::with_estimate(
        GemmMethod::GemmInterleaved,
        "interleaved_fp32_mmla_3VLx8",
        SVE.with(Extension::F32mm),
        Some(|args: &GemmArgs| args.k > 4),
        |args: &GemmArgs| interleaved_cycles(args, &SVE_INTERLEAVED_FP32_MMLA_3VLX8),
        |args: &GemmArgs| -> UniqueGemmCommon<f32, f32> {
            Box::new(GemmInterleaved::<f32, f32>::new(args, &SVE_INTERLEAVED_FP32_MMLA_3VLX8))
        },
    ),
    // smallK kernels are preferred only while the B panel fits in half of L1.
    // Past that they stay usable behind the estimated and unscored records.
    Fp32::preferred(
        GemmMethod::GemmHybrid,
        "smallK_hybrid_fp32_mla_1VLx8",
        SVE,
        Some(|args: &GemmArgs| args.k <= 24),
        |args: &GemmArgs| b_panel_fits_l1(args, 4),
        |args: &GemmArgs| -> UniqueGemmCommon<f32, f32> {
            Box::new(GemmHybrid::<f32, f32>::new(args, &SVE_SMALLK_HYBRID_FP32_MLA_1VLX8))
        },
    ),
    Fp32::with_estimate(
        GemmMethod::GemmHybrid,
        "hybrid_fp32_mla_4VLx4",
        SVE,
        Some(|args: &GemmArgs| args.k >= 4),
        |args: &GemmArgs| hybrid_cycles(args, &SVE_HYBRID_FP32_MLA_4VLX4),
        |args: &GemmArgs| -> UniqueGemmCommon<f32, f32> {
            Box::new(GemmHybrid::<f32, f32>::new(args, &SVE_HYBRID_FP32_MLA_4VLX4))
        },
    ),
    Fp32::preferred(
        GemmMethod::GemmHybrid,
        "smallK_hybrid_fp32_mla_4x8",
        AARCH64,
        Some(|args: &GemmArgs| args.k <= 8 && args.n % 4 == 0),
        |args: &GemmArgs| b_panel_fits_l1(args, 4),
        |args: &GemmArgs| -> UniqueGemmCommon<f32, f32> {
            Box::new(GemmHybrid::<f32, f32>::new(args, &SMALLK_HYBRID_FP32_MLA_4X8))
        },
    ),
    Fp32::preferred(
        GemmMethod::GemmHybrid,
        "smallK_hybrid_fp32_mla_4x6",
        AARCH64,
        Some(|args: &GemmArgs| args.k > 8 && args.k <= 16 && args.n % 4 == 0),
        |args: &GemmArgs| b_panel_fits_l1(args, 4),
        |args: &GemmArgs| -> UniqueGemmCommon<f32, f32> {
            Box::new(GemmHybrid::<f32, f32>::new(args, &SMALLK_HYBRID_FP32_MLA_4X6))
        },
    ),
    // Narrow outputs waste most of a 16-wide tile.
    Fp32::preferred(
        GemmMethod::GemmHybrid,
        "hybrid_fp32_mla_4x8_normal",
        AARCH64,
        Some(|args: &GemmArgs| args.k >= 4),
        |args: &GemmArgs| args.n < 12,
        |args: &GemmArgs| -> UniqueGemmCommon<f32, f32> {
            Box::new(GemmHybrid::<f32, f32>::new(args, &HYBRID_FP32_MLA_4X8))
        },
    ),
    Fp32::with_estimate(
        GemmMethod::GemmHybrid,
        "hybrid_fp32_mla_16x4",
        AARCH64,
        Some(|args: &GemmArgs| args.k >= 4),
        |args: &GemmArgs| hybrid_cycles(args, &HYBRID_FP32_MLA_16X4),
        |args: &GemmArgs| -> UniqueGemmCommon<f32, f32> {
            Box::new(GemmHybrid::<f32, f32>::new(args, &HYBRID_FP32_MLA_16X4))
        },
    ),
    Fp32::with_estimate(
        GemmMethod::GemmInterleaved,
        "interleaved_fp32_mla_3VLx8",
        SVE,
        Some(|args: &GemmArgs| args.k > 4),
        |args: &GemmArgs| interleaved_cycles(args, &SVE_INTERLEAVED_FP32_MLA_3VLX8),
        |args: &GemmArgs| -> UniqueGemmCommon<f32, f32> {
            Box::new(GemmInterleaved::<f32, f32>::new(args, &SVE_INTERLEAVED_FP32_MLA_3VLX8))
        },
    ),
    Fp32::with_estimate(
        GemmMethod::GemmInterleaved2d,
        "sgemm_12x8_2d",
        AARCH64,
        None,
        |args: &GemmArgs| interleaved_2d_cycles(args, &SGEMM_12X8),
        |args: &GemmArgs| -> UniqueGemmCommon<f32, f32> {
            Box::new(GemmInterleaved2d::<f32, f32>::new(args, &SGEMM_12X8))
        },
    ),
    Fp32::with_estimate(
        GemmMethod::GemmInterleaved,
        "sgemm_12x8_1d",
        AARCH64,
        None,
        |args: &GemmArgs| interleaved_cycles(args, &SGEMM_12X8),
        |args: &GemmArgs| -> UniqueGemmCommon<f32, f32> {
            Box::new(GemmInterleaved::<f32, f32>::new(args, &SGEMM_12X8))
        },
    ),
    Fp32::new(
        GemmMethod::GemmInterleaved,
        "sgemm_8x6",
        Requirements::arch(TargetArch::Aarch32),
        None,
        |args: &GemmArgs| -> UniqueGemmCommon<f32, f32> {
            Box::new(GemmInterleaved::<f32, f32>::new(args, &SGEMM_8X6))
        },
    ),
    Fp32::new(
        GemmMethod::GemmInterleaved,
        "interleaved_fp32_portable_4x4",
        Requirements::NONE,
        None,
        |args: &GemmArgs| -> UniqueGemmCommon<f32, f32> {
            Box::new(GemmInterleaved::<f32, f32>::new(args, &INTERLEAVED_FP32_PORTABLE_4X4))
        },
    ),
    Fp32::terminal(),
];
