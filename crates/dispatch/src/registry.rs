//! Ordered, capability-filtered candidate lists per element pairing.

use crate::capabilities::BuildCapabilities;
use crate::implementation::GemmImplementation;
use gemmsel_kernels::{Accumulator, Operand};
use tracing::debug;

/// Candidate records for one `(To, Tr)` pairing, in priority order and
/// always ending with the terminal record.
#[derive(Debug, Clone)]
pub struct Registry<To: Operand, Tr: Accumulator<To>> {
    capabilities: BuildCapabilities,
    records: Vec<GemmImplementation<To, Tr>>,
}

impl<To: Operand, Tr: Accumulator<To>> Registry<To, Tr> {
    pub fn builder(capabilities: BuildCapabilities) -> RegistryBuilder<To, Tr> {
        RegistryBuilder::new(capabilities)
    }

    /// Keep the records of `table` this build can run.
    pub fn from_table(table: &[GemmImplementation<To, Tr>], capabilities: BuildCapabilities) -> Self {
        Self::builder(capabilities).extend(table).build()
    }

    pub fn capabilities(&self) -> BuildCapabilities {
        self.capabilities
    }

    /// All records, terminal included.
    pub fn records(&self) -> &[GemmImplementation<To, Tr>] {
        &self.records
    }

    /// Records that can actually be instantiated.
    pub fn candidates(&self) -> impl Iterator<Item = &GemmImplementation<To, Tr>> {
        self.records.iter().filter(|record| !record.is_terminal())
    }

    pub fn len(&self) -> usize {
        self.candidates().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find(&self, name: &str) -> Option<&GemmImplementation<To, Tr>> {
        self.candidates().find(|record| record.name == name)
    }

    pub fn terminal(&self) -> &GemmImplementation<To, Tr> {
        // `build` always appends the terminal record.
        &self.records[self.records.len() - 1]
    }
}

pub struct RegistryBuilder<To: Operand, Tr: Accumulator<To>> {
    capabilities: BuildCapabilities,
    records: Vec<GemmImplementation<To, Tr>>,
}

impl<To: Operand, Tr: Accumulator<To>> RegistryBuilder<To, Tr> {
    pub fn new(capabilities: BuildCapabilities) -> Self {
        Self {
            capabilities,
            records: Vec::new(),
        }
    }

    /// Append `record` if this build satisfies its requirements.
    pub fn push(mut self, record: GemmImplementation<To, Tr>) -> Self {
        if record.is_terminal() {
            return self;
        }
        if self.capabilities.satisfies(&record.requires) {
            self.records.push(record);
        } else {
            debug!(
                kernel = record.name,
                arch = %self.capabilities.arch,
                "kernel not compiled into registry"
            );
        }
        self
    }

    pub fn extend(self, table: &[GemmImplementation<To, Tr>]) -> Self {
        table.iter().fold(self, |builder, record| builder.push(*record))
    }

    pub fn build(mut self) -> Registry<To, Tr> {
        self.records.push(GemmImplementation::terminal());
        Registry {
            capabilities: self.capabilities,
            records: self.records,
        }
    }
}
