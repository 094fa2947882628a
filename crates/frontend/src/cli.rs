//! CLI wiring for the gemmsel toolkit.

use crate::eval::{EvaluationReport, EvaluationSuite};
use crate::session::{GemmSession, GemmShape, SessionOptions};
use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use gemmsel_dispatch::{BuildCapabilities, KernelDescription, TargetArch};
use gemmsel_kernels::{CpuModel, Extension, GemmConfig, GemmMethod};
use half::f16;
use ndarray::{Array3, Array4};
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "gemmsel", about = "Inspect and exercise GEMM kernel selection")]
pub struct Cli {
    /// Element type of the operands.
    #[arg(long, value_enum, default_value = "f32", global = true)]
    pub dtype: DtypeArg,

    /// Build to select for (defaults to the running binary).
    #[arg(long, global = true)]
    pub target: Option<TargetArch>,

    #[arg(long, global = true)]
    pub cpu_model: Option<CpuModel>,

    /// Extensions the CPU reports, in addition to detected ones.
    #[arg(long, value_delimiter = ',', global = true)]
    pub extensions: Vec<Extension>,

    /// JSON CPU profile used instead of detection.
    #[arg(long, global = true)]
    pub cpu_profile: Option<PathBuf>,

    #[arg(long, global = true)]
    pub threads: Option<usize>,

    /// Only consider strategies of this class.
    #[arg(long, value_enum, global = true)]
    pub method: Option<MethodArg>,

    /// Only consider kernels whose name contains this string.
    #[arg(long, global = true)]
    pub filter: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DtypeArg {
    F32,
    F16,
    S8,
    U8,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MethodArg {
    GemvBatched,
    GemvPretransposed,
    Hybrid,
    Interleaved,
    #[value(name = "interleaved-2d")]
    Interleaved2d,
}

impl From<MethodArg> for GemmMethod {
    fn from(value: MethodArg) -> GemmMethod {
        match value {
            MethodArg::GemvBatched => GemmMethod::GemvBatched,
            MethodArg::GemvPretransposed => GemmMethod::GemvPretransposed,
            MethodArg::Hybrid => GemmMethod::GemmHybrid,
            MethodArg::Interleaved => GemmMethod::GemmInterleaved,
            MethodArg::Interleaved2d => GemmMethod::GemmInterleaved2d,
        }
    }
}

#[derive(Args, Debug, Clone, Copy)]
pub struct ShapeArgs {
    #[arg(long, default_value_t = 256)]
    pub m: usize,
    #[arg(long, default_value_t = 256)]
    pub n: usize,
    #[arg(long, default_value_t = 256)]
    pub k: usize,
    #[arg(long, default_value_t = 1)]
    pub batches: usize,
    #[arg(long, default_value_t = 1)]
    pub multis: usize,
    /// The caller keeps B and allows it to be pretransposed.
    #[arg(long, default_value_t = false)]
    pub pretransposed: bool,
}

impl From<ShapeArgs> for GemmShape {
    fn from(value: ShapeArgs) -> GemmShape {
        GemmShape::new(value.m, value.n, value.k)
            .with_batches(value.batches)
            .with_multis(value.multis)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the kernel selection would pick.
    Select {
        #[command(flatten)]
        shape: ShapeArgs,
        /// List every compatible kernel instead of the winner.
        #[arg(long, default_value_t = false)]
        list: bool,
    },
    /// Select and execute an fp32 GEMM on deterministic data.
    Run {
        #[command(flatten)]
        shape: ShapeArgs,
    },
    /// Run the selection evaluation suite and emit a JSON report.
    Suite {
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        baseline: Option<PathBuf>,
    },
}

impl Cli {
    fn session_options(&self, pretransposed_hint: bool) -> SessionOptions {
        let defaults = SessionOptions::default();
        let capabilities = match self.target {
            Some(TargetArch::Aarch64) => BuildCapabilities::all_aarch64(),
            Some(arch) => BuildCapabilities::new(arch),
            None => defaults.capabilities,
        };
        let mut config = GemmConfig::default();
        if let Some(method) = self.method {
            config = config.with_method(method.into());
        }
        if let Some(filter) = &self.filter {
            config = config.with_filter(filter.clone());
        }
        SessionOptions {
            capabilities,
            max_threads: self.threads.unwrap_or(defaults.max_threads),
            pretransposed_hint,
            config,
            cpu_profile: self.cpu_profile.clone(),
        }
    }

    fn session(&self, pretransposed_hint: bool) -> Result<GemmSession> {
        let options = self.session_options(pretransposed_hint);
        let mut cpu = options.load_cpu()?;
        if let Some(model) = self.cpu_model {
            cpu = cpu.with_model(model);
        }
        cpu = cpu.with_extensions(self.extensions.iter().copied().collect());
        info!(
            model = ?cpu.model,
            extensions = ?cpu.extensions,
            target = %options.capabilities.arch,
            threads = options.max_threads,
            "session configured"
        );
        GemmSession::with_cpu(cpu, options)
    }
}

pub fn run_cli(cli: Cli) -> Result<()> {
    tracing_subscriber::fmt::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    match cli.command {
        Command::Select { shape, list } => {
            let session = cli.session(shape.pretransposed)?;
            let shape = GemmShape::from(shape);
            if list {
                let kernels = compatible(&session, cli.dtype, shape)?;
                println!("{}", serde_json::to_string_pretty(&kernels)?);
            } else {
                let kernel = describe(&session, cli.dtype, shape)?;
                println!("{}", serde_json::to_string_pretty(&kernel)?);
            }
        }
        Command::Run { shape } => {
            if cli.dtype != DtypeArg::F32 {
                bail!("run only supports --dtype f32");
            }
            let session = cli.session(shape.pretransposed)?;
            let shape = GemmShape::from(shape);
            let a = Array4::from_elem((shape.nmulti, shape.nbatches, shape.m, shape.k), 1.0f32);
            let b = Array3::from_elem((shape.nmulti, shape.k, shape.n), 1.0f32);
            let run = session.execute::<f32, f32>(shape, a.view(), b.view())?;
            let gflops = shape.flops() / (run.latency_ms.max(f64::EPSILON) * 1.0e6);
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "kernel": run.kernel,
                    "method": run.method,
                    "shape": shape,
                    "latency_ms": run.latency_ms,
                    "gflops": gflops,
                }))?
            );
        }
        Command::Suite {
            ref output,
            ref baseline,
        } => {
            if cli.dtype != DtypeArg::F32 {
                bail!("suite only supports --dtype f32");
            }
            let session = cli.session(false)?;
            let report = EvaluationSuite::selection_smoke().run(&session)?;

            println!(
                "target={}, cpu={:?}, threads={}, cases={}",
                report.target,
                report.cpu_model,
                report.threads,
                report.cases.len()
            );
            for case in &report.cases {
                println!(
                    "- {}: kernel={} method={} estimate={} latency_ms={:.3} gflops={:.3} max_abs_error={:.3e}",
                    case.case,
                    case.kernel,
                    case.method,
                    case.cycle_estimate
                        .map_or_else(|| "-".to_string(), |cycles| cycles.to_string()),
                    case.latency_ms,
                    case.gflops,
                    case.max_abs_error
                );
            }

            if let Some(path) = baseline {
                if path.exists() {
                    let baseline_blob = fs::read_to_string(path)?;
                    let baseline_report: EvaluationReport = serde_json::from_str(&baseline_blob)?;
                    for (name, delta) in report.diff(&baseline_report) {
                        println!(
                            "Δ {}: latency_ms={:+.3} kernel_changed={}",
                            name, delta.latency_ms_delta, delta.kernel_changed
                        );
                    }
                } else {
                    info!(path = %path.display(), "baseline report not found; skipping diff");
                }
            }

            if let Some(path) = output {
                fs::write(path, serde_json::to_string_pretty(&report)?)?;
            }
        }
    }
    Ok(())
}

fn describe(session: &GemmSession, dtype: DtypeArg, shape: GemmShape) -> Result<KernelDescription> {
    match dtype {
        DtypeArg::F32 => session.describe::<f32, f32>(shape),
        DtypeArg::F16 => session.describe::<f16, f16>(shape),
        DtypeArg::S8 => session.describe::<i8, i32>(shape),
        DtypeArg::U8 => session.describe::<u8, u32>(shape),
    }
}

fn compatible(
    session: &GemmSession,
    dtype: DtypeArg,
    shape: GemmShape,
) -> Result<Vec<KernelDescription>> {
    match dtype {
        DtypeArg::F32 => session.compatible::<f32, f32>(shape),
        DtypeArg::F16 => session.compatible::<f16, f16>(shape),
        DtypeArg::S8 => session.compatible::<i8, i32>(shape),
        DtypeArg::U8 => session.compatible::<u8, u32>(shape),
    }
}
