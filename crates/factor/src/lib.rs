#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/capflow/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod config;
pub use config::{FactorConfig, MAX_LOOKBACK_DAYS};

mod neutralize;
pub use neutralize::{abs_neutralize, neutralize};

mod constructor;
pub use constructor::FactorConstructor;

mod error;
pub use error::FactorError;
