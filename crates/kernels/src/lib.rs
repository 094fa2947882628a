//! Problem descriptors, CPU characterization, micro-kernel catalog and
//! strategy executors for gemmsel.

pub mod catalog;
pub mod config;
pub mod cost;
pub mod cpu;
pub mod element;
pub mod perf;
pub mod strategy;
pub mod utils;

pub use config::*;
pub use cpu::*;
pub use element::*;
pub use perf::*;
pub use strategy::*;
pub use utils::*;
