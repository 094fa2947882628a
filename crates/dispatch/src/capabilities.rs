//! Build-time capability description used to assemble registries.

use gemmsel_kernels::{Extension, ExtensionSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Instruction-set family a set of kernels is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetArch {
    Aarch64,
    Aarch32,
    /// No architecture-specific kernels.
    Portable,
}

impl fmt::Display for TargetArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TargetArch::Aarch64 => "aarch64",
            TargetArch::Aarch32 => "aarch32",
            TargetArch::Portable => "portable",
        };
        f.write_str(name)
    }
}

impl FromStr for TargetArch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aarch64" | "arm64" => Ok(TargetArch::Aarch64),
            "aarch32" | "arm" => Ok(TargetArch::Aarch32),
            "portable" | "generic" => Ok(TargetArch::Portable),
            other => Err(format!("unknown target architecture: {}", other)),
        }
    }
}

/// What a candidate record needs to be compiled into a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirements {
    pub arch: Option<TargetArch>,
    pub extensions: ExtensionSet,
}

impl Requirements {
    /// Runs everywhere.
    pub const NONE: Requirements = Requirements {
        arch: None,
        extensions: ExtensionSet::EMPTY,
    };

    pub const fn arch(arch: TargetArch) -> Self {
        Requirements {
            arch: Some(arch),
            extensions: ExtensionSet::EMPTY,
        }
    }

    pub const fn with(self, ext: Extension) -> Self {
        Requirements {
            arch: self.arch,
            extensions: self.extensions.with(ext),
        }
    }
}

/// Target architecture and extensions compiled into this build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildCapabilities {
    pub arch: TargetArch,
    pub extensions: ExtensionSet,
}

impl BuildCapabilities {
    pub fn new(arch: TargetArch) -> Self {
        Self {
            arch,
            extensions: ExtensionSet::EMPTY,
        }
    }

    /// Capabilities of the running binary. On aarch64 every extension is
    /// compiled in and run-time detection decides which ones are usable.
    pub fn native() -> Self {
        if cfg!(target_arch = "aarch64") {
            Self::all_aarch64()
        } else if cfg!(target_arch = "arm") {
            Self::new(TargetArch::Aarch32)
        } else {
            Self::portable()
        }
    }

    pub fn portable() -> Self {
        Self::new(TargetArch::Portable)
    }

    /// Superset aarch64 build with every optional extension.
    pub fn all_aarch64() -> Self {
        Self::new(TargetArch::Aarch64).with_extensions(Extension::ALL.into_iter().collect())
    }

    pub fn with_extension(mut self, ext: Extension) -> Self {
        self.extensions = self.extensions.with(ext);
        self
    }

    pub fn with_extensions(mut self, extensions: ExtensionSet) -> Self {
        self.extensions = self.extensions.union(extensions);
        self
    }

    pub fn without_extension(self, ext: Extension) -> Self {
        let extensions = self.extensions.iter().filter(|have| *have != ext).collect();
        Self {
            arch: self.arch,
            extensions,
        }
    }

    pub fn satisfies(&self, requires: &Requirements) -> bool {
        let arch_ok = requires.arch.map_or(true, |arch| arch == self.arch);
        arch_ok && self.extensions.contains_all(requires.extensions)
    }
}

impl Default for BuildCapabilities {
    fn default() -> Self {
        Self::native()
    }
}
