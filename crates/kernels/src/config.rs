//! GEMM problem descriptors and selection configuration.

use crate::cpu::CpuInfo;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    F32,
    F16,
    S8,
    U8,
    S32,
    U32,
}

impl DataType {
    pub fn element_size_bytes(&self) -> usize {
        match self {
            DataType::F32 | DataType::S32 | DataType::U32 => 4,
            DataType::F16 => 2,
            DataType::S8 | DataType::U8 => 1,
        }
    }
}

/// Strategy class of a registered GEMM implementation.
///
/// `Default` only tags the terminal record of a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GemmMethod {
    Default,
    GemvBatched,
    GemvPretransposed,
    GemmHybrid,
    GemmInterleaved,
    GemmInterleaved2d,
}

impl fmt::Display for GemmMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GemmMethod::Default => "default",
            GemmMethod::GemvBatched => "gemv-batched",
            GemmMethod::GemvPretransposed => "gemv-pretransposed",
            GemmMethod::GemmHybrid => "hybrid",
            GemmMethod::GemmInterleaved => "interleaved",
            GemmMethod::GemmInterleaved2d => "interleaved-2d",
        };
        f.write_str(name)
    }
}

/// Caller-supplied restrictions applied while scanning a registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GemmConfig {
    /// Only consider implementations of this strategy class.
    pub method: Option<GemmMethod>,
    /// Only consider implementations whose name contains this substring.
    pub filter: Option<String>,
}

impl GemmConfig {
    pub fn with_method(mut self, method: GemmMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn admits(&self, method: GemmMethod, name: &str) -> bool {
        if let Some(wanted) = self.method {
            if wanted != method {
                return false;
            }
        }
        match &self.filter {
            Some(filter) => name.contains(filter.as_str()),
            None => true,
        }
    }
}

/// Shape and environment of one GEMM invocation.
///
/// Computes `C[multi][batch] = A[multi][batch] * B[multi]` with `A` of
/// `m x k` and `B` of `k x n`.
#[derive(Debug, Clone)]
pub struct GemmArgs {
    pub ci: Arc<CpuInfo>,
    pub m: usize,
    pub n: usize,
    pub k: usize,
    pub nbatches: usize,
    pub nmulti: usize,
    pub max_threads: usize,
    pub pretransposed_hint: bool,
    pub cfg: GemmConfig,
}

impl GemmArgs {
    pub fn new(ci: Arc<CpuInfo>, m: usize, n: usize, k: usize) -> Self {
        Self {
            ci,
            m,
            n,
            k,
            nbatches: 1,
            nmulti: 1,
            max_threads: 1,
            pretransposed_hint: false,
            cfg: GemmConfig::default(),
        }
    }

    pub fn with_batches(mut self, nbatches: usize) -> Self {
        self.nbatches = nbatches;
        self
    }

    pub fn with_multis(mut self, nmulti: usize) -> Self {
        self.nmulti = nmulti;
        self
    }

    pub fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = max_threads;
        self
    }

    pub fn with_pretransposed_hint(mut self, hint: bool) -> Self {
        self.pretransposed_hint = hint;
        self
    }

    pub fn with_config(mut self, cfg: GemmConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Reject descriptors with an empty dimension or no threads.
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("m", self.m),
            ("n", self.n),
            ("k", self.k),
            ("nbatches", self.nbatches),
            ("nmulti", self.nmulti),
            ("max_threads", self.max_threads),
        ];
        for (name, value) in fields {
            if value == 0 {
                return Err(format!("{} must be at least 1", name));
            }
        }
        Ok(())
    }

    pub fn macs(&self) -> u64 {
        self.nmulti as u64 * self.nbatches as u64 * self.m as u64 * self.n as u64 * self.k as u64
    }
}
