//! Candidate records: one registered way of running a GEMM.

use crate::capabilities::Requirements;
use gemmsel_kernels::{Accumulator, GemmArgs, GemmMethod, Operand, UniqueGemmCommon};
use std::fmt;

pub type Predicate = fn(&GemmArgs) -> bool;
pub type CostEstimate = fn(&GemmArgs) -> u64;
pub type Instantiate<To, Tr> = fn(&GemmArgs) -> UniqueGemmCommon<To, Tr>;

/// How a usable record competes during selection.
#[derive(Clone, Copy)]
pub enum Scoring {
    /// Neither preferred nor costed: an unconditional fallback.
    None,
    /// Wins outright, in list order, whenever the predicate holds.
    Preferred(Predicate),
    /// Competes on estimated cycles.
    Estimated(CostEstimate),
}

impl fmt::Debug for Scoring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scoring::None => f.write_str("None"),
            Scoring::Preferred(_) => f.write_str("Preferred"),
            Scoring::Estimated(_) => f.write_str("Estimated"),
        }
    }
}

/// A statically defined registry entry.
pub struct GemmImplementation<To: Operand, Tr: Accumulator<To>> {
    pub method: GemmMethod,
    pub name: &'static str,
    pub requires: Requirements,
    pub is_supported: Option<Predicate>,
    pub scoring: Scoring,
    pub instantiate: Option<Instantiate<To, Tr>>,
}

impl<To: Operand, Tr: Accumulator<To>> Clone for GemmImplementation<To, Tr> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<To: Operand, Tr: Accumulator<To>> Copy for GemmImplementation<To, Tr> {}

impl<To: Operand, Tr: Accumulator<To>> fmt::Debug for GemmImplementation<To, Tr> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GemmImplementation")
            .field("method", &self.method)
            .field("name", &self.name)
            .field("requires", &self.requires)
            .field("scoring", &self.scoring)
            .finish()
    }
}

impl<To: Operand, Tr: Accumulator<To>> GemmImplementation<To, Tr> {
    /// Unconditional fallback with no scoring.
    pub const fn new(
        method: GemmMethod,
        name: &'static str,
        requires: Requirements,
        is_supported: Option<Predicate>,
        instantiate: Instantiate<To, Tr>,
    ) -> Self {
        Self {
            method,
            name,
            requires,
            is_supported,
            scoring: Scoring::None,
            instantiate: Some(instantiate),
        }
    }

    pub const fn preferred(
        method: GemmMethod,
        name: &'static str,
        requires: Requirements,
        is_supported: Option<Predicate>,
        is_preferred: Predicate,
        instantiate: Instantiate<To, Tr>,
    ) -> Self {
        Self {
            method,
            name,
            requires,
            is_supported,
            scoring: Scoring::Preferred(is_preferred),
            instantiate: Some(instantiate),
        }
    }

    pub const fn with_estimate(
        method: GemmMethod,
        name: &'static str,
        requires: Requirements,
        is_supported: Option<Predicate>,
        estimate: CostEstimate,
        instantiate: Instantiate<To, Tr>,
    ) -> Self {
        Self {
            method,
            name,
            requires,
            is_supported,
            scoring: Scoring::Estimated(estimate),
            instantiate: Some(instantiate),
        }
    }

    /// The end-of-table sentinel.
    pub const fn terminal() -> Self {
        Self {
            method: GemmMethod::Default,
            name: "",
            requires: Requirements::NONE,
            is_supported: None,
            scoring: Scoring::None,
            instantiate: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.method == GemmMethod::Default && self.instantiate.is_none()
    }

    /// Run-time applicability: the CPU has every required extension, the
    /// caller's configuration admits the record and its own test passes.
    pub fn is_usable(&self, args: &GemmArgs) -> bool {
        if self.is_terminal() {
            return true;
        }
        args.ci.has_all(self.requires.extensions)
            && args.cfg.admits(self.method, self.name)
            && self.is_supported.map_or(true, |supported| supported(args))
    }

    pub fn is_preferred(&self, args: &GemmArgs) -> Option<bool> {
        match self.scoring {
            Scoring::Preferred(predicate) => Some(predicate(args)),
            _ => None,
        }
    }

    pub fn estimate_cost(&self, args: &GemmArgs) -> Option<u64> {
        match self.scoring {
            Scoring::Estimated(estimate) => Some(estimate(args)),
            _ => None,
        }
    }

    pub fn instantiate(&self, args: &GemmArgs) -> Option<UniqueGemmCommon<To, Tr>> {
        self.instantiate.map(|factory| factory(args))
    }
}
