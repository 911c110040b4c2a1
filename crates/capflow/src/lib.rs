//! # capflow
//!
//! An inflow-factor long/short portfolio engine.
//!
//! This crate provides a unified interface to the capflow crates. Individual
//! components can be enabled via feature flags.
//!
//! ## Features
//!
//! - `full` (default): Enables all components
//! - `primitives`: Core value types
//! - `traits`: Store abstractions
//! - `math`: Cross-sectional statistics
//! - `factor`: Factor construction
//! - `model`: Selection, discounts, returns and the batch engine
//! - `store`: In-memory, SQLite and JSON-lines stores
//! - `cli`: The `capflow` binary
//!
//! ## Example
//!
//! ```rust,ignore
//! use capflow::model::{Engine, EngineConfig};
//! use capflow::store::{MemoryMarketData, MemoryPortfolioStore, MemoryReportingSink};
//!
//! let mut engine = Engine::new(
//!     EngineConfig::default(),
//!     MemoryMarketData::new(),
//!     MemoryPortfolioStore::new(),
//!     MemoryReportingSink::new(),
//! )?;
//! let report = engine.select_portfolios(date)?;
//! ```

#![doc(issue_tracker_base_url = "https://github.com/factordynamics/capflow/issues/")]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[cfg(feature = "primitives")]
#[doc(inline)]
pub use capflow_primitives as primitives;
#[cfg(feature = "traits")]
#[doc(inline)]
pub use capflow_traits as traits;
#[cfg(feature = "math")]
#[doc(inline)]
pub use capflow_math as math;
#[cfg(feature = "factor")]
#[doc(inline)]
pub use capflow_factor as factor;
#[cfg(feature = "model")]
#[doc(inline)]
pub use capflow_model as model;
#[cfg(feature = "store")]
#[doc(inline)]
pub use capflow_store as store;

// Used by the binary only.
#[cfg(feature = "cli")]
use {anyhow as _, chrono as _, clap as _, tracing as _, tracing_subscriber as _};
