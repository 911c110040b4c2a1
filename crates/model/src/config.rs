//! Engine configuration.

use std::{collections::HashSet, path::PathBuf};

use capflow_factor::FactorConfig;
use capflow_primitives::{Leg, Strategy, TransactionCosts};
use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Quantile selection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Share of the cross-section held on each side.
    pub quantile: f64,
    /// Smallest eligible universe that yields a full-size portfolio. Smaller
    /// universes are still selected from, with a warning.
    pub min_viable: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self { quantile: 0.05, min_viable: 10 }
    }
}

/// A published portfolio: the strategy leg it reports and its report identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTarget {
    /// Strategy published.
    pub strategy: Strategy,
    /// Leg published.
    pub leg: Leg,
    /// Identifier in the reporting store.
    pub id: u32,
    /// Display name.
    pub name: String,
}

/// Which strategy legs are published, and under which identity.
///
/// Legs with no entry are not published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportMapping(Vec<ReportTarget>);

impl ReportMapping {
    /// Create a mapping from explicit entries.
    #[must_use]
    pub const fn new(entries: Vec<ReportTarget>) -> Self {
        Self(entries)
    }

    /// Report identity of a strategy leg, or `None` if it is not published.
    #[must_use]
    pub fn lookup(&self, strategy: Strategy, leg: Leg) -> Option<&ReportTarget> {
        self.0.iter().find(|t| t.strategy == strategy && t.leg == leg)
    }

    /// All entries.
    #[must_use]
    pub fn entries(&self) -> &[ReportTarget] {
        &self.0
    }
}

impl Default for ReportMapping {
    fn default() -> Self {
        Self(vec![
            ReportTarget {
                strategy: Strategy::Absneu,
                leg: Leg::LongShort,
                id: 2,
                name: "Absneu Inflow Factor Portfolio".to_string(),
            },
            ReportTarget {
                strategy: Strategy::Absneu,
                leg: Leg::Long,
                id: 3,
                name: "Absneu Inflow Factor Portfolio (Long-only)".to_string(),
            },
        ])
    }
}

/// Locations of the persistent stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database holding market data, positions and returns.
    pub database: PathBuf,
    /// JSON-lines file receiving published report documents.
    pub report_log: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { database: PathBuf::from("capflow.db"), report_log: PathBuf::from("reports.jsonl") }
    }
}

/// Complete engine configuration, passed explicitly to [`crate::Engine::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Factor construction.
    pub factor: FactorConfig,
    /// Quantile selection.
    pub selection: SelectionConfig,
    /// One-way transaction costs.
    pub costs: TransactionCosts,
    /// Strategies run by each job, in order.
    pub strategies: Vec<Strategy>,
    /// Published portfolios.
    pub reporting: ReportMapping,
    /// Store locations.
    pub storage: StorageConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            factor: FactorConfig::default(),
            selection: SelectionConfig::default(),
            costs: TransactionCosts::default(),
            strategies: Strategy::ALL.to_vec(),
            reporting: ReportMapping::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidConfig` if parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ModelError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ModelError::InvalidConfig(format!("parse config TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidConfig` if the file cannot be read, parsed
    /// or validated.
    pub fn load(path: &std::path::Path) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ModelError::InvalidConfig(format!("read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Check parameter ranges.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidConfig` naming the first bad field.
    pub fn validate(&self) -> Result<(), ModelError> {
        self.factor.validate()?;

        let q = self.selection.quantile;
        if !(q > 0.0 && q <= 0.5) {
            return Err(ModelError::InvalidConfig(format!(
                "selection.quantile must be in (0, 0.5], got {q}"
            )));
        }

        for (side, rate) in [("long", self.costs.long), ("short", self.costs.short)] {
            if !(rate.is_finite() && rate >= 0.0) {
                return Err(ModelError::InvalidConfig(format!(
                    "costs.{side} must be non-negative, got {rate}"
                )));
            }
        }

        if self.strategies.is_empty() {
            return Err(ModelError::InvalidConfig("strategies must not be empty".to_string()));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.strategies.iter().find(|s| !seen.insert(**s)) {
            return Err(ModelError::InvalidConfig(format!("strategy {dup} listed twice")));
        }

        let mut seen = HashSet::new();
        for target in self.reporting.entries() {
            if !seen.insert((target.strategy, target.leg)) {
                return Err(ModelError::InvalidConfig(format!(
                    "reporting entry for {} {} listed twice",
                    target.strategy, target.leg
                )));
            }
        }

        Ok(())
    }
}
