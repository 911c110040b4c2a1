#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/capflow/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod memory;
pub use memory::{MemoryMarketData, MemoryPortfolioStore, MemoryReportingSink};

mod sqlite;
pub use sqlite::SqliteStore;

mod jsonl;
pub use jsonl::JsonLinesSink;

mod validate;
