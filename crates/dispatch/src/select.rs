//! Selection engine: picks the winning record of a registry for a problem.

use crate::error::{GemmError, Result};
use crate::implementation::{GemmImplementation, Scoring};
use crate::registry::Registry;
use gemmsel_kernels::{Accumulator, GemmArgs, GemmMethod, Operand, UniqueGemmCommon};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What selection decided, without instantiating anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelDescription {
    pub method: GemmMethod,
    pub name: String,
    /// The terminal record was reached.
    pub is_default: bool,
    pub cycle_estimate: Option<u64>,
}

impl KernelDescription {
    fn of<To: Operand, Tr: Accumulator<To>>(
        record: &GemmImplementation<To, Tr>,
        args: &GemmArgs,
    ) -> Self {
        Self {
            method: record.method,
            name: record.name.to_string(),
            is_default: record.is_terminal(),
            cycle_estimate: record.estimate_cost(args),
        }
    }
}

fn check(args: &GemmArgs) -> Result<()> {
    args.validate().map_err(GemmError::MalformedProblem)
}

impl<To: Operand, Tr: Accumulator<To>> Registry<To, Tr> {
    /// Pick the record that should run `args`.
    ///
    /// The first usable record whose preference test holds wins outright.
    /// Otherwise the usable record with the lowest cycle estimate wins,
    /// earliest on ties. Otherwise the first usable record with no scoring
    /// wins, then the first usable record whose preference test failed.
    /// Returns the terminal record only when nothing is usable.
    pub fn select(&self, args: &GemmArgs) -> Result<&GemmImplementation<To, Tr>> {
        check(args)?;

        let mut cheapest: Option<(&GemmImplementation<To, Tr>, u64)> = None;
        let mut fallback: Option<&GemmImplementation<To, Tr>> = None;
        let mut not_preferred: Option<&GemmImplementation<To, Tr>> = None;

        for record in self.candidates() {
            if !record.is_usable(args) {
                debug!(kernel = record.name, "kernel not usable");
                continue;
            }
            match record.scoring {
                Scoring::Preferred(is_preferred) => {
                    if is_preferred(args) {
                        debug!(
                            kernel = record.name,
                            method = %record.method,
                            m = args.m,
                            n = args.n,
                            k = args.k,
                            "selected preferred kernel"
                        );
                        return Ok(record);
                    }
                    if not_preferred.is_none() {
                        not_preferred = Some(record);
                    }
                }
                Scoring::Estimated(estimate) => {
                    let cycles = estimate(args);
                    debug!(kernel = record.name, estimate = cycles, "scored kernel");
                    if cheapest.map_or(true, |(_, best)| cycles < best) {
                        cheapest = Some((record, cycles));
                    }
                }
                Scoring::None => {
                    if fallback.is_none() {
                        fallback = Some(record);
                    }
                }
            }
        }

        let chosen = match (cheapest, fallback.or(not_preferred)) {
            (Some((record, cycles)), _) => {
                debug!(
                    kernel = record.name,
                    method = %record.method,
                    m = args.m,
                    n = args.n,
                    k = args.k,
                    estimate = cycles,
                    "selected cheapest kernel"
                );
                record
            }
            (None, Some(record)) => {
                debug!(kernel = record.name, method = %record.method, "selected fallback kernel");
                record
            }
            (None, None) => {
                debug!(m = args.m, n = args.n, k = args.k, "no usable kernel");
                self.terminal()
            }
        };
        Ok(chosen)
    }

    /// Select and build the executor for `args`.
    pub fn instantiate_best(&self, args: &GemmArgs) -> Result<UniqueGemmCommon<To, Tr>> {
        let record = self.select(args)?;
        record
            .instantiate(args)
            .ok_or(GemmError::NoViableStrategy {
                m: args.m,
                n: args.n,
                k: args.k,
                nbatches: args.nbatches,
                nmulti: args.nmulti,
            })
    }

    pub fn describe(&self, args: &GemmArgs) -> Result<KernelDescription> {
        let record = self.select(args)?;
        Ok(KernelDescription::of(record, args))
    }

    /// Every usable record for `args`, in registry order.
    pub fn compatible_kernels(&self, args: &GemmArgs) -> Result<Vec<KernelDescription>> {
        check(args)?;
        Ok(self
            .candidates()
            .filter(|record| record.is_usable(args))
            .map(|record| KernelDescription::of(record, args))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{BuildCapabilities, Requirements};
    use crate::implementation::CostEstimate;
    use gemmsel_kernels::catalog::INTERLEAVED_FP32_PORTABLE_4X4;
    use gemmsel_kernels::{CpuInfo, Extension, GemmConfig, GemmInterleaved};
    use std::sync::Arc;

    type Record = GemmImplementation<f32, f32>;

    fn build(args: &GemmArgs) -> UniqueGemmCommon<f32, f32> {
        Box::new(GemmInterleaved::<f32, f32>::new(args, &INTERLEAVED_FP32_PORTABLE_4X4))
    }

    fn args(m: usize, n: usize, k: usize) -> GemmArgs {
        GemmArgs::new(Arc::new(CpuInfo::generic()), m, n, k)
    }

    fn registry_of(records: &[Record]) -> Registry<f32, f32> {
        Registry::from_table(records, BuildCapabilities::all_aarch64())
    }

    fn fixed(name: &'static str, cost: CostEstimate) -> Record {
        Record::with_estimate(GemmMethod::GemmInterleaved, name, Requirements::NONE, None, cost, build)
    }

    #[test]
    fn preferred_record_short_circuits_cheaper_estimates() {
        let table = [
            fixed("cheap", |_: &GemmArgs| 1),
            Record::preferred(
                GemmMethod::GemmHybrid,
                "never",
                Requirements::NONE,
                None,
                |_: &GemmArgs| false,
                build,
            ),
            Record::preferred(
                GemmMethod::GemmHybrid,
                "small_k",
                Requirements::NONE,
                None,
                |args: &GemmArgs| args.k <= 8,
                build,
            ),
            Record::preferred(
                GemmMethod::GemmHybrid,
                "also_small_k",
                Requirements::NONE,
                None,
                |args: &GemmArgs| args.k <= 8,
                build,
            ),
        ];
        let registry = registry_of(&table);
        assert_eq!(registry.select(&args(64, 64, 4)).unwrap().name, "small_k");
        assert_eq!(registry.select(&args(64, 64, 64)).unwrap().name, "cheap");
    }

    #[test]
    fn cheapest_estimate_wins_with_earliest_tie() {
        let table = [
            fixed("costly", |_: &GemmArgs| 300),
            fixed("first_cheap", |_: &GemmArgs| 100),
            fixed("second_cheap", |_: &GemmArgs| 100),
            fixed("by_k", |args: &GemmArgs| args.k as u64),
        ];
        let registry = registry_of(&table);
        assert_eq!(registry.select(&args(8, 8, 200)).unwrap().name, "first_cheap");
        assert_eq!(registry.select(&args(8, 8, 50)).unwrap().name, "by_k");
    }

    #[test]
    fn estimates_beat_earlier_unscored_records() {
        let table = [
            Record::new(GemmMethod::GemmInterleaved, "unscored", Requirements::NONE, None, build),
            fixed("estimated", |_: &GemmArgs| u64::MAX),
        ];
        let registry = registry_of(&table);
        assert_eq!(registry.select(&args(8, 8, 8)).unwrap().name, "estimated");

        let only_unscored = registry_of(&table[..1]);
        assert_eq!(only_unscored.select(&args(8, 8, 8)).unwrap().name, "unscored");
    }

    #[test]
    fn unusable_records_are_skipped() {
        let table = [
            Record::with_estimate(
                GemmMethod::GemmHybrid,
                "needs_k4",
                Requirements::NONE,
                Some(|args: &GemmArgs| args.k >= 4),
                |_: &GemmArgs| 1,
                build,
            ),
            Record::with_estimate(
                GemmMethod::GemmHybrid,
                "needs_sve",
                Requirements::NONE.with(Extension::Sve),
                None,
                |_: &GemmArgs| 0,
                build,
            ),
            fixed("fallback", |_: &GemmArgs| 10),
        ];
        let registry = registry_of(&table);
        assert_eq!(registry.select(&args(8, 8, 2)).unwrap().name, "fallback");
        assert_eq!(registry.select(&args(8, 8, 8)).unwrap().name, "needs_k4");

        let mut sve_args = args(8, 8, 8);
        sve_args.ci = Arc::new(CpuInfo::generic().with_extension(Extension::Sve));
        assert_eq!(registry.select(&sve_args).unwrap().name, "needs_sve");
    }

    #[test]
    fn config_restricts_candidates() {
        let table = [
            fixed("alpha_fast", |_: &GemmArgs| 1),
            Record::with_estimate(
                GemmMethod::GemmInterleaved2d,
                "beta_slow",
                Requirements::NONE,
                None,
                |_: &GemmArgs| 5,
                build,
            ),
        ];
        let registry = registry_of(&table);
        let by_name = args(8, 8, 8).with_config(GemmConfig::default().with_filter("beta"));
        assert_eq!(registry.select(&by_name).unwrap().name, "beta_slow");
        let by_method = args(8, 8, 8)
            .with_config(GemmConfig::default().with_method(GemmMethod::GemmInterleaved2d));
        assert_eq!(registry.select(&by_method).unwrap().name, "beta_slow");
    }

    #[test]
    fn nothing_usable_reaches_terminal() {
        let table = [Record::preferred(
            GemmMethod::GemmHybrid,
            "never",
            Requirements::NONE,
            Some(|_: &GemmArgs| false),
            |_: &GemmArgs| true,
            build,
        )];
        let registry = registry_of(&table);
        let args = args(3, 5, 7).with_batches(2);
        let selected = registry.select(&args).unwrap();
        assert!(selected.is_terminal());
        assert!(registry.describe(&args).unwrap().is_default);

        match registry.instantiate_best(&args) {
            Err(GemmError::NoViableStrategy { m, n, k, nbatches, nmulti }) => {
                assert_eq!((m, n, k, nbatches, nmulti), (3, 5, 7, 2, 1));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("terminal record must not instantiate"),
        }
    }

    #[test]
    fn unpreferred_record_still_runs_when_nothing_else_is_usable() {
        let table = [Record::preferred(
            GemmMethod::GemmHybrid,
            "rarely_preferred",
            Requirements::NONE,
            None,
            |_: &GemmArgs| false,
            build,
        )];
        let registry = registry_of(&table);
        let args = args(64, 1000, 1000);
        let selected = registry.select(&args).unwrap();
        assert_eq!(selected.name, "rarely_preferred");
        assert!(!registry.describe(&args).unwrap().is_default);
        assert!(registry.instantiate_best(&args).is_ok());
    }

    #[test]
    fn unscored_records_outrank_unpreferred_ones() {
        let table = [
            Record::preferred(
                GemmMethod::GemmHybrid,
                "unpreferred",
                Requirements::NONE,
                None,
                |_: &GemmArgs| false,
                build,
            ),
            Record::new(GemmMethod::GemmInterleaved, "unscored", Requirements::NONE, None, build),
            Record::preferred(
                GemmMethod::GemmHybrid,
                "second_unpreferred",
                Requirements::NONE,
                None,
                |_: &GemmArgs| false,
                build,
            ),
        ];
        let registry = registry_of(&table);
        assert_eq!(registry.select(&args(8, 8, 8)).unwrap().name, "unscored");

        let hybrids_only = args(8, 8, 8)
            .with_config(GemmConfig::default().with_method(GemmMethod::GemmHybrid));
        assert_eq!(registry.select(&hybrids_only).unwrap().name, "unpreferred");
    }

    #[test]
    fn description_serializes_to_json() {
        let registry = registry_of(&[fixed("costed", |args: &GemmArgs| args.macs())]);
        let described = registry.describe(&args(2, 3, 4)).unwrap();
        let json = serde_json::to_string(&described).unwrap();
        assert!(json.contains(r#""method":"GemmInterleaved""#));
        let parsed: KernelDescription = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, described);
        assert_eq!(parsed.cycle_estimate, Some(24));
    }

    #[test]
    fn malformed_problems_fail_before_selection() {
        let registry = registry_of(&[fixed("any", |_: &GemmArgs| 1)]);
        let err = registry.select(&args(4, 0, 4)).unwrap_err();
        assert_eq!(err, GemmError::MalformedProblem("n must be at least 1".to_string()));
        assert!(matches!(
            registry.instantiate_best(&args(4, 4, 4).with_max_threads(0)),
            Err(GemmError::MalformedProblem(_))
        ));
        assert!(registry.compatible_kernels(&args(0, 4, 4)).is_err());
    }

    #[test]
    fn descriptions_report_estimates() {
        let table = [
            Record::new(GemmMethod::GemmInterleaved, "plain", Requirements::NONE, None, build),
            fixed("costed", |args: &GemmArgs| args.macs()),
        ];
        let registry = registry_of(&table);
        let args = args(2, 3, 4);
        let listed = registry.compatible_kernels(&args).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].cycle_estimate, None);
        assert_eq!(listed[1].cycle_estimate, Some(24));

        let chosen = registry.describe(&args).unwrap();
        assert_eq!(chosen.name, "costed");
        assert!(!chosen.is_default);
    }
}
