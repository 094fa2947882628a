//! gemmsel session, evaluation and CLI facade.

#[cfg(feature = "cli")]
pub mod cli;
pub mod eval;
pub mod session;

#[cfg(feature = "cli")]
pub use cli::*;
pub use eval::*;
pub use session::*;
