//! CPU characterization consumed by applicability tests and cost estimators.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Micro-architecture identity used to pick performance profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CpuModel {
    #[default]
    Generic,
    A53,
    A55r0,
    A55r1,
    A73,
    A510,
    X1,
    V1,
}

impl FromStr for CpuModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "generic" => Ok(CpuModel::Generic),
            "a53" => Ok(CpuModel::A53),
            "a55r0" => Ok(CpuModel::A55r0),
            "a55r1" => Ok(CpuModel::A55r1),
            "a73" => Ok(CpuModel::A73),
            "a510" => Ok(CpuModel::A510),
            "x1" => Ok(CpuModel::X1),
            "v1" => Ok(CpuModel::V1),
            other => Err(format!("unknown cpu model: {}", other)),
        }
    }
}

/// Optional instruction-set extensions beyond the base vector ISA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Extension {
    Sve,
    Dotprod,
    Fp16,
    I8mm,
    F32mm,
}

impl Extension {
    pub const ALL: [Extension; 5] = [
        Extension::Sve,
        Extension::Dotprod,
        Extension::Fp16,
        Extension::I8mm,
        Extension::F32mm,
    ];

    const fn bit(self) -> u32 {
        match self {
            Extension::Sve => 1 << 0,
            Extension::Dotprod => 1 << 1,
            Extension::Fp16 => 1 << 2,
            Extension::I8mm => 1 << 3,
            Extension::F32mm => 1 << 4,
        }
    }
}

impl FromStr for Extension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sve" => Ok(Extension::Sve),
            "dotprod" | "dot" => Ok(Extension::Dotprod),
            "fp16" => Ok(Extension::Fp16),
            "i8mm" => Ok(Extension::I8mm),
            "f32mm" => Ok(Extension::F32mm),
            other => Err(format!("unknown extension: {}", other)),
        }
    }
}

/// A set of [`Extension`]s, usable in `const` registry tables.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Extension>", into = "Vec<Extension>")]
pub struct ExtensionSet(u32);

impl ExtensionSet {
    pub const EMPTY: ExtensionSet = ExtensionSet(0);

    pub const fn of(ext: Extension) -> Self {
        ExtensionSet(ext.bit())
    }

    pub const fn with(self, ext: Extension) -> Self {
        ExtensionSet(self.0 | ext.bit())
    }

    pub const fn union(self, other: ExtensionSet) -> Self {
        ExtensionSet(self.0 | other.0)
    }

    pub const fn contains(self, ext: Extension) -> bool {
        self.0 & ext.bit() != 0
    }

    pub const fn contains_all(self, other: ExtensionSet) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Extension> {
        Extension::ALL
            .into_iter()
            .filter(move |ext| self.contains(*ext))
    }
}

impl FromIterator<Extension> for ExtensionSet {
    fn from_iter<I: IntoIterator<Item = Extension>>(iter: I) -> Self {
        iter.into_iter()
            .fold(ExtensionSet::EMPTY, |set, ext| set.with(ext))
    }
}

impl From<Vec<Extension>> for ExtensionSet {
    fn from(value: Vec<Extension>) -> Self {
        value.into_iter().collect()
    }
}

impl From<ExtensionSet> for Vec<Extension> {
    fn from(value: ExtensionSet) -> Self {
        value.iter().collect()
    }
}

impl fmt::Debug for ExtensionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Detected (or declared) characteristics of the executing CPU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuInfo {
    pub model: CpuModel,
    pub extensions: ExtensionSet,
    pub l1_cache_bytes: usize,
    pub l2_cache_bytes: usize,
    /// SVE vector length in bits; ignored when SVE is absent.
    #[serde(default = "default_sve_vector_bits")]
    pub sve_vector_bits: usize,
}

fn default_sve_vector_bits() -> usize {
    128
}

impl CpuInfo {
    /// Baseline core with no optional extensions and common cache sizes.
    pub fn generic() -> Self {
        Self {
            model: CpuModel::Generic,
            extensions: ExtensionSet::EMPTY,
            l1_cache_bytes: 32 * 1024,
            l2_cache_bytes: 512 * 1024,
            sve_vector_bits: default_sve_vector_bits(),
        }
    }

    /// Detect the running CPU. Only the extension set is detected; the
    /// model stays `Generic` and cache sizes keep their defaults.
    pub fn detect() -> Self {
        let mut info = Self::generic();

        #[cfg(target_arch = "aarch64")]
        {
            let mut extensions = ExtensionSet::EMPTY;
            if std::arch::is_aarch64_feature_detected!("sve") {
                extensions = extensions.with(Extension::Sve);
            }
            if std::arch::is_aarch64_feature_detected!("dotprod") {
                extensions = extensions.with(Extension::Dotprod);
            }
            if std::arch::is_aarch64_feature_detected!("fp16") {
                extensions = extensions.with(Extension::Fp16);
            }
            if std::arch::is_aarch64_feature_detected!("i8mm") {
                extensions = extensions.with(Extension::I8mm);
            }
            if std::arch::is_aarch64_feature_detected!("f32mm") {
                extensions = extensions.with(Extension::F32mm);
            }
            info.extensions = extensions;
        }

        info
    }

    pub fn with_model(mut self, model: CpuModel) -> Self {
        self.model = model;
        self
    }

    pub fn with_extension(mut self, ext: Extension) -> Self {
        self.extensions = self.extensions.with(ext);
        self
    }

    pub fn with_extensions(mut self, extensions: ExtensionSet) -> Self {
        self.extensions = self.extensions.union(extensions);
        self
    }

    pub fn with_l1_cache_bytes(mut self, bytes: usize) -> Self {
        self.l1_cache_bytes = bytes;
        self
    }

    pub fn with_sve_vector_bits(mut self, bits: usize) -> Self {
        self.sve_vector_bits = bits;
        self
    }

    pub fn has(&self, ext: Extension) -> bool {
        self.extensions.contains(ext)
    }

    pub fn has_all(&self, extensions: ExtensionSet) -> bool {
        self.extensions.contains_all(extensions)
    }

    pub fn has_sve(&self) -> bool {
        self.has(Extension::Sve)
    }

    pub fn has_dotprod(&self) -> bool {
        self.has(Extension::Dotprod)
    }

    pub fn has_fp16(&self) -> bool {
        self.has(Extension::Fp16)
    }

    /// Elements of `element_bytes` width in one SVE vector (never below 128 bits).
    pub fn vector_lanes(&self, element_bytes: usize) -> usize {
        let bits = self.sve_vector_bits.max(128);
        (bits / 8 / element_bytes.max(1)).max(1)
    }
}

impl Default for CpuInfo {
    fn default() -> Self {
        Self::generic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_set_tracks_membership() {
        let set = ExtensionSet::of(Extension::Sve).with(Extension::Dotprod);
        assert!(set.contains(Extension::Sve));
        assert!(set.contains(Extension::Dotprod));
        assert!(!set.contains(Extension::I8mm));
        assert!(set.contains_all(ExtensionSet::of(Extension::Sve)));
        assert!(!set.contains_all(ExtensionSet::of(Extension::Sve).with(Extension::F32mm)));
        assert!(set.contains_all(ExtensionSet::EMPTY));
        assert_eq!(set.iter().count(), 2);
    }

    #[test]
    fn extension_set_serializes_as_list() {
        let set = ExtensionSet::of(Extension::Fp16).with(Extension::I8mm);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["Fp16","I8mm"]"#);
        let parsed: ExtensionSet = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, set);
    }

    #[test]
    fn cpu_profile_parses_without_vector_length() {
        let json = r#"{
            "model": "A55r1",
            "extensions": ["Dotprod", "Fp16"],
            "l1_cache_bytes": 32768,
            "l2_cache_bytes": 262144
        }"#;
        let info: CpuInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.model, CpuModel::A55r1);
        assert!(info.has_dotprod());
        assert!(info.has_fp16());
        assert!(!info.has_sve());
        assert_eq!(info.sve_vector_bits, 128);
    }

    #[test]
    fn vector_lanes_follow_vector_length() {
        let info = CpuInfo::generic().with_sve_vector_bits(512);
        assert_eq!(info.vector_lanes(4), 16);
        assert_eq!(info.vector_lanes(2), 32);
        let narrow = CpuInfo::generic().with_sve_vector_bits(0);
        assert_eq!(narrow.vector_lanes(4), 4);
    }

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!("A55R1".parse::<CpuModel>().unwrap(), CpuModel::A55r1);
        assert_eq!("dot".parse::<Extension>().unwrap(), Extension::Dotprod);
        assert!("avx2".parse::<Extension>().is_err());
    }

    #[test]
    fn detect_is_stable() {
        assert_eq!(CpuInfo::detect(), CpuInfo::detect());
    }
}
