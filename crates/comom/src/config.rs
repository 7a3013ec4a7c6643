//! Solver configuration, loadable from TOML.

use std::path::Path;

use anyhow::{Context, Result};
use comom_btf::LupOptions;
use comom_core::VectorOrdering;
use comom_modular::ModularOptions;
use serde::{Deserialize, Serialize};

/// Which engine computes the normalising constant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Block-triangular master structure, assembled once
    #[default]
    Btf,
    /// Dense system per step, solved modulo several primes
    Modular,
}

/// Top-level solver configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub backend: Backend,
    /// Basis order; the block-triangular backend needs `support_colex`
    pub ordering: VectorOrdering,
    pub lup: LupOptions,
    pub modular: ModularOptions,
}

impl SolverConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("failed to parse solver configuration")
    }

    /// Load a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).context("failed to serialise solver configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use comom_btf::Pivoting;

    #[test]
    fn test_empty_document_gives_defaults() {
        assert_eq!(SolverConfig::from_toml_str("").unwrap(), SolverConfig::default());
    }

    #[test]
    fn test_partial_document() {
        let config = SolverConfig::from_toml_str(
            r#"
backend = "modular"
ordering = "binary_support"

[modular]
threads = 2
"#,
        )
        .unwrap();
        assert_eq!(config.backend, Backend::Modular);
        assert_eq!(config.ordering, VectorOrdering::BinarySupport);
        assert_eq!(config.modular.threads, 2);
        assert_eq!(config.modular.prime_bits, ModularOptions::default().prime_bits);
        assert_eq!(config.lup.pivoting, Pivoting::MaxAbs);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = SolverConfig {
            backend: Backend::Modular,
            ordering: VectorOrdering::LeftmostNonzero,
            lup: LupOptions {
                pivoting: Pivoting::FirstNonzero,
            },
            modular: ModularOptions {
                threads: 3,
                prime_bits: 31,
                seed: 11,
            },
        };
        let restored = SolverConfig::from_toml_str(&config.to_toml_string().unwrap()).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let err = SolverConfig::from_toml_str("backend = \"gpu\"").unwrap_err();
        assert!(err.to_string().contains("solver configuration"));
    }
}
