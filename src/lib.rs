//! Runtime selection of CPU GEMM strategies.
//!
//! Candidate kernels live in per-type registries filtered by the build's
//! capabilities; the selection engine picks one per problem shape and CPU.

pub use gemmsel_dispatch as dispatch;
pub use gemmsel_frontend as frontend;
pub use gemmsel_kernels as kernels;

pub use gemmsel_dispatch::{
    gemm, get_compatible_kernels, get_gemm_method, BuildCapabilities, GemmError, GemmImplementation,
    GemmTypes, KernelDescription, Registry, Requirements, Scoring, TargetArch,
};
pub use gemmsel_frontend::{EvaluationSuite, GemmSession, GemmShape, SessionOptions};
pub use gemmsel_kernels::{
    CpuInfo, CpuModel, Extension, ExtensionSet, GemmArgs, GemmCommon, GemmConfig, GemmMethod,
    UniqueGemmCommon,
};
