//! Candidate registries and the selection engine for gemmsel.

pub mod capabilities;
pub mod error;
pub mod implementation;
pub mod registry;
pub mod select;
pub mod tables;

pub use capabilities::*;
pub use error::*;
pub use implementation::*;
pub use registry::*;
pub use select::*;
pub use tables::{GemmTypes, GEMM_FP16_METHODS, GEMM_FP32_METHODS, GEMM_S8_METHODS, GEMM_U8_METHODS};

use gemmsel_kernels::{Accumulator, GemmArgs, UniqueGemmCommon};

/// Instantiate the best strategy for `args` from the native registry.
pub fn gemm<To, Tr>(args: &GemmArgs) -> Result<UniqueGemmCommon<To, Tr>>
where
    To: GemmTypes<Tr>,
    Tr: Accumulator<To>,
{
    To::native_registry().instantiate_best(args)
}

/// Describe the strategy the native registry would pick for `args`.
pub fn get_gemm_method<To, Tr>(args: &GemmArgs) -> Result<KernelDescription>
where
    To: GemmTypes<Tr>,
    Tr: Accumulator<To>,
{
    To::native_registry().describe(args)
}

/// List every native strategy able to run `args`.
pub fn get_compatible_kernels<To, Tr>(args: &GemmArgs) -> Result<Vec<KernelDescription>>
where
    To: GemmTypes<Tr>,
    Tr: Accumulator<To>,
{
    To::native_registry().compatible_kernels(args)
}
