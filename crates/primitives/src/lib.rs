#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/capflow/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod instrument;
pub use instrument::InstrumentId;

mod strategy;
pub use strategy::{Leg, ParseError, Side, Strategy};

mod observation;
pub use observation::{FactorValue, Observation};

mod position;
pub use position::Position;

mod discount;
pub use discount::{DiscountFactor, DiscountSet, TransactionCosts};

mod returns;
pub use returns::{PriorState, ReturnRecord};

mod report;
pub use report::{PerformanceUpdate, PortfolioSnapshot, ReportDocument};

mod calendar;
pub use calendar::{friday_of_week, is_weekday, round_to};

/// Re-export common date type.
pub type Date = chrono::NaiveDate;
