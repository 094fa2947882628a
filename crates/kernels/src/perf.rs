//! Micro-kernel descriptors and per-micro-architecture performance profiles.

use crate::cpu::{CpuInfo, CpuModel};

/// Throughput constants for one micro-kernel on one micro-architecture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceParameters {
    pub kernel_macs_cycle: f32,
    pub prepare_bytes_cycle: f32,
    pub merge_bytes_cycle: f32,
}

impl PerformanceParameters {
    pub const fn new(kernel_macs_cycle: f32, prepare_bytes_cycle: f32, merge_bytes_cycle: f32) -> Self {
        Self {
            kernel_macs_cycle,
            prepare_bytes_cycle,
            merge_bytes_cycle,
        }
    }

    /// Profile for kernels that neither pack A nor merge partial results.
    pub const fn compute_only(kernel_macs_cycle: f32) -> Self {
        Self::new(kernel_macs_cycle, 1.0, 1.0)
    }
}

/// Tuned profiles keyed by CPU model, with a fallback for everything else.
#[derive(Debug, Clone, Copy)]
pub struct PerfTable {
    pub default: PerformanceParameters,
    pub tuned: &'static [(CpuModel, PerformanceParameters)],
}

impl PerfTable {
    pub const fn uniform(default: PerformanceParameters) -> Self {
        Self { default, tuned: &[] }
    }

    pub fn lookup(&self, model: CpuModel) -> PerformanceParameters {
        self.tuned
            .iter()
            .find(|(candidate, _)| *candidate == model)
            .map(|(_, params)| *params)
            .unwrap_or(self.default)
    }
}

/// Output tile width, either fixed or a multiple of the SVE vector length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileWidth {
    Fixed(usize),
    Vectors(usize),
}

/// Static description of one micro-kernel: tile geometry, internal element
/// widths and performance profile.
#[derive(Debug)]
pub struct KernelDescriptor {
    pub name: &'static str,
    pub out_height: usize,
    pub out_width: TileWidth,
    pub k_unroll: usize,
    /// Width of the element type the kernel consumes after packing.
    pub operand_bytes: usize,
    /// Width of the element type the kernel accumulates into.
    pub result_bytes: usize,
    pub performance: PerfTable,
}

impl KernelDescriptor {
    pub fn out_width(&self, ci: &CpuInfo) -> usize {
        match self.out_width {
            TileWidth::Fixed(width) => width,
            TileWidth::Vectors(count) => count * ci.vector_lanes(self.result_bytes),
        }
    }

    pub fn is_scalable(&self) -> bool {
        matches!(self.out_width, TileWidth::Vectors(_))
    }

    /// Profile for `ci`; MAC throughput of scalable kernels grows with the
    /// vector length (tables are written for 128-bit vectors).
    pub fn performance_parameters(&self, ci: &CpuInfo) -> PerformanceParameters {
        let mut params = self.performance.lookup(ci.model);
        if self.is_scalable() {
            params.kernel_macs_cycle *= (ci.sve_vector_bits.max(128) / 128) as f32;
        }
        params
    }
}
