//! GEMM session orchestration.

use anyhow::{Context, Result};
use gemmsel_dispatch::{BuildCapabilities, GemmTypes, KernelDescription, Registry};
use gemmsel_kernels::{
    Accumulator, CpuInfo, GemmArgs, GemmConfig, GemmMethod, UniqueGemmCommon,
};
use ndarray::{Array4, ArrayView3, ArrayView4};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Dimensions of one GEMM call, independent of the CPU it runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GemmShape {
    pub m: usize,
    pub n: usize,
    pub k: usize,
    pub nbatches: usize,
    pub nmulti: usize,
}

impl GemmShape {
    pub fn new(m: usize, n: usize, k: usize) -> Self {
        Self {
            m,
            n,
            k,
            nbatches: 1,
            nmulti: 1,
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

    pub fn flops(&self) -> f64 {
        2.0 * self.nmulti as f64 * self.nbatches as f64 * self.m as f64 * self.n as f64 * self.k as f64
    }

    pub fn data_footprint_bytes(&self, operand_bytes: usize, result_bytes: usize) -> usize {
        let count = |dims: &[usize]| {
            dims.iter()
                .fold(1usize, |acc, &dim| acc.saturating_mul(dim))
        };
        let a = count(&[self.nmulti, self.nbatches, self.m, self.k, operand_bytes]);
        let b = count(&[self.nmulti, self.k, self.n, operand_bytes]);
        let c = count(&[self.nmulti, self.nbatches, self.m, self.n, result_bytes]);
        a.saturating_add(b).saturating_add(c)
    }
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub capabilities: BuildCapabilities,
    pub max_threads: usize,
    pub pretransposed_hint: bool,
    pub config: GemmConfig,
    /// JSON `CpuInfo` to use instead of run-time detection.
    pub cpu_profile: Option<PathBuf>,
}

impl SessionOptions {
    /// CPU described by `cpu_profile`, or the detected CPU when none is set.
    pub fn load_cpu(&self) -> Result<CpuInfo> {
        match &self.cpu_profile {
            Some(path) => load_cpu_profile(path),
            None => Ok(CpuInfo::detect()),
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            capabilities: BuildCapabilities::native(),
            max_threads: rayon::current_num_threads(),
            pretransposed_hint: false,
            config: GemmConfig::default(),
            cpu_profile: None,
        }
    }
}

pub fn load_cpu_profile(path: &Path) -> Result<CpuInfo> {
    let blob = fs::read_to_string(path)
        .with_context(|| format!("reading cpu profile {}", path.display()))?;
    let cpu = serde_json::from_str(&blob)
        .with_context(|| format!("parsing cpu profile {}", path.display()))?;
    Ok(cpu)
}

pub struct GemmRun<Tr> {
    pub output: Array4<Tr>,
    pub kernel: String,
    pub method: GemmMethod,
    pub latency_ms: f64,
}

pub struct GemmSession {
    cpu: Arc<CpuInfo>,
    options: SessionOptions,
    pool: rayon::ThreadPool,
}

impl GemmSession {
    pub fn new(options: SessionOptions) -> Result<Self> {
        let cpu = options.load_cpu()?;
        Self::with_cpu(cpu, options)
    }

    pub fn with_cpu(cpu: CpuInfo, options: SessionOptions) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.max_threads.max(1))
            .build()
            .context("building gemm thread pool")?;
        Ok(Self {
            cpu: Arc::new(cpu),
            options,
            pool,
        })
    }

    pub fn cpu(&self) -> &CpuInfo {
        &self.cpu
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn args(&self, shape: GemmShape) -> GemmArgs {
        GemmArgs::new(Arc::clone(&self.cpu), shape.m, shape.n, shape.k)
            .with_batches(shape.nbatches)
            .with_multis(shape.nmulti)
            .with_max_threads(self.options.max_threads)
            .with_pretransposed_hint(self.options.pretransposed_hint)
            .with_config(self.options.config.clone())
    }

    fn with_registry<To, Tr, R>(&self, f: impl FnOnce(&Registry<To, Tr>) -> R) -> R
    where
        To: GemmTypes<Tr>,
        Tr: Accumulator<To>,
    {
        if self.options.capabilities == BuildCapabilities::native() {
            f(To::native_registry())
        } else {
            f(&To::registry(self.options.capabilities))
        }
    }

    pub fn describe<To, Tr>(&self, shape: GemmShape) -> Result<KernelDescription>
    where
        To: GemmTypes<Tr>,
        Tr: Accumulator<To>,
    {
        let args = self.args(shape);
        Ok(self.with_registry::<To, Tr, _>(|registry| registry.describe(&args))?)
    }

    pub fn compatible<To, Tr>(&self, shape: GemmShape) -> Result<Vec<KernelDescription>>
    where
        To: GemmTypes<Tr>,
        Tr: Accumulator<To>,
    {
        let args = self.args(shape);
        Ok(self.with_registry::<To, Tr, _>(|registry| registry.compatible_kernels(&args))?)
    }

    pub fn instantiate<To, Tr>(&self, shape: GemmShape) -> Result<UniqueGemmCommon<To, Tr>>
    where
        To: GemmTypes<Tr>,
        Tr: Accumulator<To>,
    {
        let args = self.args(shape);
        Ok(self.with_registry::<To, Tr, _>(|registry| registry.instantiate_best(&args))?)
    }

    /// Select, instantiate and run a GEMM on the session's thread pool.
    pub fn execute<To, Tr>(
        &self,
        shape: GemmShape,
        a: ArrayView4<'_, To>,
        b: ArrayView3<'_, To>,
    ) -> Result<GemmRun<Tr>>
    where
        To: GemmTypes<Tr>,
        Tr: Accumulator<To>,
    {
        let executor = self.instantiate::<To, Tr>(shape)?;
        let start = Instant::now();
        let output = self.pool.install(|| executor.execute(a, b))?;
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        info!(
            kernel = executor.name(),
            method = %executor.method(),
            m = shape.m,
            n = shape.n,
            k = shape.k,
            threads = self.options.max_threads,
            latency_ms,
            "gemm completed"
        );

        Ok(GemmRun {
            output,
            kernel: executor.name().to_string(),
            method: executor.method(),
            latency_ms,
        })
    }
}
