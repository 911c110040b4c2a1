#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/capflow/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod config;
pub use config::{EngineConfig, ReportMapping, ReportTarget, SelectionConfig, StorageConfig};

mod universe;
pub use universe::{CrossSection, ObservationWindow, check_complete_records, load_cross_section};

mod selector;
pub use selector::{PortfolioSelector, Selection};

mod holding;
pub use holding::{PricedHolding, price_holdings};

mod discount;
pub use discount::DiscountEngine;

mod returns;
pub use returns::{PriorStates, ReturnCalculator};

mod reporting;
pub use reporting::{performance_update, portfolio_snapshot};

mod engine;
pub use engine::{Engine, JobReport, StrategyOutcome, WriteSummary};

mod error;
pub use error::ModelError;

/// Re-export commonly used types.
pub mod prelude {
    pub use capflow_traits::{MarketDataStore, PortfolioStore, ReportingSink};

    pub use super::{Engine, EngineConfig, JobReport, ModelError};
}
