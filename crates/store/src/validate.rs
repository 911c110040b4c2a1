//! Row checks shared by the portfolio stores.

use capflow_primitives::{Position, ReturnRecord};
use capflow_traits::StoreError;

pub(crate) fn check_position(position: &Position) -> Result<(), StoreError> {
    let fields = [
        ("factor_value", position.factor_value),
        ("rank", position.rank),
        ("change_amount", position.change_amount),
    ];
    match fields.iter().find(|(_, v)| !v.is_finite()) {
        Some((field, value)) => Err(StoreError::InvalidRecord(format!(
            "position {} on {}: {field} is {value}",
            position.instrument_id, position.date
        ))),
        None => Ok(()),
    }
}

pub(crate) fn check_return(record: &ReturnRecord) -> Result<(), StoreError> {
    let fields =
        [("daily_return", record.daily_return), ("cumulative_value", record.cumulative_value)];
    match fields.iter().find(|(_, v)| !v.is_finite()) {
        Some((field, value)) => Err(StoreError::InvalidRecord(format!(
            "{} {} return on {}: {field} is {value}",
            record.strategy, record.leg, record.date
        ))),
        None => Ok(()),
    }
}
