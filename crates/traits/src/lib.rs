#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/capflow/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod error;
pub use error::{StoreError, WriteReport};

mod market;
pub use market::{InflowTotal, MarketDataStore, Quote};

mod portfolio;
pub use portfolio::PortfolioStore;

mod reporting;
pub use reporting::ReportingSink;
