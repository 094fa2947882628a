//! Evaluation helpers for end-to-end kernel selection.
//!
//! The suite runs a handful of representative fp32 shapes through selection
//! and execution, checks the result against an `ndarray` reference product
//! and collects the chosen kernel, its estimate and latency in a JSON report.

use crate::session::{GemmRun, GemmSession, GemmShape};
use anyhow::Result;
use gemmsel_kernels::{CpuModel, GemmMethod};
use ndarray::{s, Array3, Array4};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GemmEvalCase {
    pub name: String,
    pub shape: GemmShape,
}

impl GemmEvalCase {
    pub fn new(name: impl Into<String>, shape: GemmShape) -> Self {
        Self {
            name: name.into(),
            shape,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GemmEvalResult {
    pub case: String,
    pub kernel: String,
    pub method: GemmMethod,
    pub cycle_estimate: Option<u64>,
    pub latency_ms: f64,
    pub gflops: f64,
    pub max_abs_error: f64,
    pub shape: GemmShape,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub cpu_model: CpuModel,
    pub target: String,
    pub threads: usize,
    pub generated_at_unix_ms: u128,
    pub cases: Vec<GemmEvalResult>,
}

impl EvaluationReport {
    pub fn as_map(&self) -> BTreeMap<&str, &GemmEvalResult> {
        self.cases
            .iter()
            .map(|case| (case.case.as_str(), case))
            .collect()
    }

    /// Cases present in both reports, keyed by case name.
    pub fn diff<'a>(
        &'a self,
        baseline: &'a EvaluationReport,
    ) -> BTreeMap<&'a str, EvaluationDelta<'a>> {
        let previous = baseline.as_map();
        self.as_map()
            .into_iter()
            .filter_map(|(case, result)| {
                previous.get(case).map(|&baseline_result| {
                    (
                        case,
                        EvaluationDelta {
                            current: result,
                            baseline: baseline_result,
                            kernel_changed: result.kernel != baseline_result.kernel,
                            latency_ms_delta: result.latency_ms - baseline_result.latency_ms,
                        },
                    )
                })
            })
            .collect()
    }
}

#[derive(Debug)]
pub struct EvaluationDelta<'a> {
    pub current: &'a GemmEvalResult,
    pub baseline: &'a GemmEvalResult,
    pub kernel_changed: bool,
    pub latency_ms_delta: f64,
}

pub struct EvaluationSuite {
    cases: Vec<GemmEvalCase>,
}

impl EvaluationSuite {
    pub fn new(cases: Vec<GemmEvalCase>) -> Self {
        Self { cases }
    }

    /// Shapes that steer selection towards each strategy family.
    pub fn selection_smoke() -> Self {
        Self::new(vec![
            GemmEvalCase::new("single_row", GemmShape::new(1, 512, 256)),
            GemmEvalCase::new("batched_rows", GemmShape::new(1, 256, 128).with_batches(8)),
            GemmEvalCase::new("tiny_k", GemmShape::new(64, 256, 4)),
            GemmEvalCase::new("narrow_output", GemmShape::new(256, 8, 64)),
            GemmEvalCase::new("square_128", GemmShape::new(128, 128, 128)),
            GemmEvalCase::new("multi_head", GemmShape::new(32, 64, 64).with_multis(4)),
        ])
    }

    pub fn cases(&self) -> &[GemmEvalCase] {
        &self.cases
    }

    pub fn run(&self, session: &GemmSession) -> Result<EvaluationReport> {
        let mut results = Vec::with_capacity(self.cases.len());

        for case in &self.cases {
            let shape = case.shape;
            let (a, b) = deterministic_operands(shape);
            let description = session.describe::<f32, f32>(shape)?;
            let GemmRun {
                output,
                kernel,
                method,
                latency_ms,
            } = session.execute::<f32, f32>(shape, a.view(), b.view())?;

            let mut max_abs_error = 0.0_f64;
            for multi in 0..shape.nmulti {
                for batch in 0..shape.nbatches {
                    let expected = a
                        .slice(s![multi, batch, .., ..])
                        .dot(&b.slice(s![multi, .., ..]));
                    let actual = output.slice(s![multi, batch, .., ..]);
                    max_abs_error = actual
                        .iter()
                        .zip(expected.iter())
                        .fold(max_abs_error, |acc, (lhs, rhs)| {
                            acc.max(f64::from((lhs - rhs).abs()))
                        });
                }
            }

            let gflops = if latency_ms > 0.0 {
                shape.flops() / (latency_ms * 1.0e6)
            } else {
                0.0
            };

            results.push(GemmEvalResult {
                case: case.name.clone(),
                kernel,
                method,
                cycle_estimate: description.cycle_estimate,
                latency_ms,
                gflops,
                max_abs_error,
                shape,
            });
        }

        let generated_at_unix_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_else(|_| Duration::from_secs(0))
            .as_millis();

        Ok(EvaluationReport {
            cpu_model: session.cpu().model,
            target: session.options().capabilities.arch.to_string(),
            threads: session.options().max_threads,
            generated_at_unix_ms,
            cases: results,
        })
    }
}

fn deterministic_operands(shape: GemmShape) -> (Array4<f32>, Array3<f32>) {
    let value = |row: usize, col: usize| {
        let seed = ((row * 1313) ^ (col * 7331)) as f32;
        1.0 + (seed % 17.0) / 16.0
    };
    let a = Array4::from_shape_fn((shape.nmulti, shape.nbatches, shape.m, shape.k), |(_, b, i, p)| {
        value(b * shape.m + i, p)
    });
    let b = Array3::from_shape_fn((shape.nmulti, shape.k, shape.n), |(q, p, j)| value(p + q, j));
    (a, b)
}
