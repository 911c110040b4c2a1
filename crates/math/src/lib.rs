#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/capflow/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod cross_section;
pub use cross_section::{Standardizer, mean_std, percentile_rank_xsection, standardize};

mod winsorize;
pub use winsorize::{Winsorizer, winsorize};

mod linalg;
pub use linalg::{UnivariateFit, correlation, simple_regression};

mod error;
pub use error::MathError;
