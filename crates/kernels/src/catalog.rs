//! Catalog of micro-kernels the registries can pair with a strategy.

use crate::cpu::CpuModel;
use crate::perf::{KernelDescriptor, PerfTable, PerformanceParameters as P, TileWidth};

const fn fixed(
    name: &'static str,
    out_height: usize,
    out_width: usize,
    k_unroll: usize,
    operand_bytes: usize,
    result_bytes: usize,
    performance: PerfTable,
) -> KernelDescriptor {
    KernelDescriptor {
        name,
        out_height,
        out_width: TileWidth::Fixed(out_width),
        k_unroll,
        operand_bytes,
        result_bytes,
        performance,
    }
}

const fn scalable(
    name: &'static str,
    out_height: usize,
    vectors: usize,
    k_unroll: usize,
    operand_bytes: usize,
    result_bytes: usize,
    performance: PerfTable,
) -> KernelDescriptor {
    KernelDescriptor {
        name,
        out_height,
        out_width: TileWidth::Vectors(vectors),
        k_unroll,
        operand_bytes,
        result_bytes,
        performance,
    }
}

const PORTABLE_PERF: PerfTable = PerfTable::uniform(P::new(1.0, 1.0, 1.0));

const SGEMM_12X8_PERF: PerfTable = PerfTable {
    default: P::new(7.2307, 3.876, 2.932),
    tuned: &[
        (CpuModel::A55r1, P::new(3.724, 1.416, 1.113)),
        (CpuModel::A53, P::new(2.777, 0.987, 0.898)),
        (CpuModel::A73, P::new(2.885, 1.429, 1.163)),
    ],
};

const HYBRID_FP32_MLA_16X4_PERF: PerfTable = PerfTable {
    default: P::compute_only(6.25),
    tuned: &[
        (CpuModel::A55r1, P::compute_only(2.866)),
        (CpuModel::A53, P::compute_only(1.419)),
        (CpuModel::A73, P::compute_only(2.551)),
    ],
};

const SVE_HYBRID_FP32_MLA_4VLX4_PERF: PerfTable = PerfTable {
    default: P::compute_only(5.8),
    tuned: &[(CpuModel::V1, P::compute_only(6.4))],
};

const SVE_INTERLEAVED_FP32_MLA_3VLX8_PERF: PerfTable = PerfTable {
    default: P::new(6.9, 3.2, 2.6),
    tuned: &[(CpuModel::V1, P::new(7.8, 3.9, 3.1))],
};

const HGEMM_24X8_PERF: PerfTable = PerfTable {
    default: P::new(14.0, 3.9, 2.9),
    tuned: &[
        (CpuModel::A55r1, P::new(7.1, 1.4, 1.1)),
        (CpuModel::A55r0, P::new(5.2, 1.2, 1.0)),
    ],
};

const GEMM_8BIT_12X8_PERF: PerfTable = PerfTable {
    default: P::new(29.0, 3.7, 3.0),
    tuned: &[(CpuModel::A55r1, P::new(15.4, 1.6, 1.2))],
};

// Portable fallbacks, one per element pairing.

pub static GEMV_BATCHED: KernelDescriptor =
    fixed("gemv_batched", 4, 16, 1, 4, 4, PerfTable::uniform(P::compute_only(2.0)));

pub static INTERLEAVED_FP32_PORTABLE_4X4: KernelDescriptor =
    fixed("interleaved_fp32_portable_4x4", 4, 4, 1, 4, 4, PORTABLE_PERF);

pub static INTERLEAVED_FP16_PORTABLE_4X4: KernelDescriptor =
    fixed("interleaved_fp16_portable_4x4", 4, 4, 1, 2, 2, PORTABLE_PERF);

pub static INTERLEAVED_S8S32_PORTABLE_4X4: KernelDescriptor =
    fixed("interleaved_s8s32_portable_4x4", 4, 4, 1, 1, 4, PORTABLE_PERF);

pub static INTERLEAVED_U8U32_PORTABLE_4X4: KernelDescriptor =
    fixed("interleaved_u8u32_portable_4x4", 4, 4, 1, 1, 4, PORTABLE_PERF);

// 32-bit float.

pub static SGEMM_8X6: KernelDescriptor =
    fixed("sgemm_8x6", 6, 8, 1, 4, 4, PerfTable::uniform(P::new(2.2, 1.2, 1.0)));

pub static SGEMM_12X8: KernelDescriptor =
    fixed("sgemm_12x8", 8, 12, 1, 4, 4, SGEMM_12X8_PERF);

pub static SGEMV_PRETRANSPOSED: KernelDescriptor =
    fixed("sgemv_pretransposed", 1, 12, 1, 4, 4, PerfTable::uniform(P::compute_only(3.0)));

pub static HYBRID_FP32_MLA_16X4: KernelDescriptor =
    fixed("hybrid_fp32_mla_16x4", 4, 16, 1, 4, 4, HYBRID_FP32_MLA_16X4_PERF);

pub static HYBRID_FP32_MLA_4X8: KernelDescriptor =
    fixed("hybrid_fp32_mla_4x8", 8, 4, 1, 4, 4, PerfTable::uniform(P::compute_only(4.1)));

pub static SMALLK_HYBRID_FP32_MLA_4X8: KernelDescriptor =
    fixed("smallK_hybrid_fp32_mla_4x8", 8, 4, 1, 4, 4, PerfTable::uniform(P::compute_only(5.0)));

pub static SMALLK_HYBRID_FP32_MLA_4X6: KernelDescriptor =
    fixed("smallK_hybrid_fp32_mla_4x6", 6, 4, 1, 4, 4, PerfTable::uniform(P::compute_only(4.8)));

pub static SVE_HYBRID_FP32_MLA_4VLX4: KernelDescriptor =
    scalable("hybrid_fp32_mla_4VLx4", 4, 4, 1, 4, 4, SVE_HYBRID_FP32_MLA_4VLX4_PERF);

pub static SVE_HYBRID_FP32_MMLA_4VLX4: KernelDescriptor =
    scalable("hybrid_fp32_mmla_4VLx4", 4, 4, 2, 4, 4, PerfTable::uniform(P::compute_only(9.0)));

pub static SVE_SMALLK_HYBRID_FP32_MLA_1VLX8: KernelDescriptor = scalable(
    "smallK_hybrid_fp32_mla_1VLx8",
    8,
    1,
    1,
    4,
    4,
    PerfTable::uniform(P::compute_only(5.2)),
);

pub static SVE_INTERLEAVED_FP32_MLA_3VLX8: KernelDescriptor =
    scalable("interleaved_fp32_mla_3VLx8", 8, 3, 1, 4, 4, SVE_INTERLEAVED_FP32_MLA_3VLX8_PERF);

pub static SVE_INTERLEAVED_FP32_MMLA_3VLX8: KernelDescriptor = scalable(
    "interleaved_fp32_mmla_3VLx8",
    8,
    3,
    2,
    4,
    4,
    PerfTable::uniform(P::new(12.0, 3.5, 2.8)),
);

// 16-bit float.

pub static HGEMM_24X8: KernelDescriptor =
    fixed("hgemm_24x8", 8, 24, 1, 2, 2, HGEMM_24X8_PERF);

pub static HYBRID_FP16_MLA_16X4: KernelDescriptor =
    fixed("hybrid_fp16_mla_16x4", 4, 16, 1, 2, 2, PerfTable::uniform(P::compute_only(12.0)));

pub static SVE_HYBRID_FP16_MLA_4VLX4: KernelDescriptor =
    scalable("hybrid_fp16_mla_4VLx4", 4, 4, 1, 2, 2, PerfTable::uniform(P::compute_only(11.0)));

pub static SVE_INTERLEAVED_FP16_MLA_3VLX8: KernelDescriptor = scalable(
    "interleaved_fp16_mla_3VLx8",
    8,
    3,
    1,
    2,
    2,
    PerfTable::uniform(P::new(13.5, 3.8, 2.9)),
);

// 8-bit integer, 32-bit accumulation.

pub static GEMM_S8_12X8: KernelDescriptor =
    fixed("gemm_s8_12x8", 8, 12, 4, 1, 4, GEMM_8BIT_12X8_PERF);

pub static GEMM_S8_4X4: KernelDescriptor =
    fixed("gemm_s8_4x4", 4, 4, 16, 1, 4, PerfTable::uniform(P::new(7.1, 3.1, 2.8)));

pub static INTERLEAVED_S8S32_MMLA_12X8: KernelDescriptor = fixed(
    "interleaved_s8s32_mmla_12x8",
    8,
    12,
    8,
    1,
    4,
    PerfTable::uniform(P::new(55.0, 3.7, 3.0)),
);

pub static HYBRID_S8S32_DOT_16X4: KernelDescriptor =
    fixed("hybrid_s8s32_dot_16x4", 4, 16, 4, 1, 4, PerfTable::uniform(P::compute_only(25.0)));

pub static SMALLK_HYBRID_S8S32_DOT_4X8: KernelDescriptor =
    fixed("smallK_hybrid_s8s32_dot_4x8", 8, 4, 4, 1, 4, PerfTable::uniform(P::compute_only(20.0)));

pub static SMALLK_HYBRID_S8S32_DOT_4X6: KernelDescriptor =
    fixed("smallK_hybrid_s8s32_dot_4x6", 6, 4, 4, 1, 4, PerfTable::uniform(P::compute_only(19.0)));

pub static SVE_SMALLK_HYBRID_S8S32_DOT_1VLX8: KernelDescriptor = scalable(
    "smallK_hybrid_s8s32_dot_1VLx8",
    8,
    1,
    4,
    1,
    4,
    PerfTable::uniform(P::compute_only(21.0)),
);

pub static SVE_HYBRID_S8S32_DOT_4VLX4: KernelDescriptor =
    scalable("hybrid_s8s32_dot_4VLx4", 4, 4, 4, 1, 4, PerfTable::uniform(P::compute_only(24.0)));

pub static SVE_INTERLEAVED_S8S32_DOT_3VLX8: KernelDescriptor = scalable(
    "interleaved_s8s32_dot_3VLx8",
    8,
    3,
    4,
    1,
    4,
    PerfTable::uniform(P::new(27.0, 3.5, 3.0)),
);

pub static SVE_INTERLEAVED_S8S32_MMLA_3VLX8: KernelDescriptor = scalable(
    "interleaved_s8s32_mmla_3VLx8",
    8,
    3,
    8,
    1,
    4,
    PerfTable::uniform(P::new(52.0, 3.6, 3.0)),
);

// 8-bit unsigned integer, 32-bit accumulation.

pub static GEMM_U8_12X8: KernelDescriptor =
    fixed("gemm_u8_12x8", 8, 12, 4, 1, 4, GEMM_8BIT_12X8_PERF);

pub static GEMM_U8_4X4: KernelDescriptor =
    fixed("gemm_u8_4x4", 4, 4, 16, 1, 4, PerfTable::uniform(P::new(7.1, 3.1, 2.8)));

pub static HYBRID_U8U32_DOT_16X4: KernelDescriptor =
    fixed("hybrid_u8u32_dot_16x4", 4, 16, 4, 1, 4, PerfTable::uniform(P::compute_only(25.0)));

pub static SMALLK_HYBRID_U8U32_DOT_4X8: KernelDescriptor =
    fixed("smallK_hybrid_u8u32_dot_4x8", 8, 4, 4, 1, 4, PerfTable::uniform(P::compute_only(20.0)));

pub static SVE_INTERLEAVED_U8U32_DOT_3VLX8: KernelDescriptor = scalable(
    "interleaved_u8u32_dot_3VLx8",
    8,
    3,
    4,
    1,
    4,
    PerfTable::uniform(P::new(27.0, 3.5, 3.0)),
);
