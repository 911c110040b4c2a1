//! Published portfolio documents.

use capflow_primitives::{
    Leg, PerformanceUpdate, PortfolioSnapshot, Position, ReturnRecord, round_to,
};

use crate::{ReportTarget, Selection};

const SNAPSHOT_SIZE: usize = 10;

/// Top constituents of the selection leg `target` publishes.
///
/// - long-short: the five highest-ranked longs and five lowest-ranked shorts,
///   ordered by rank, weighted `±100 / total_positions`
/// - long: the ten highest-ranked longs, weighted `100 / long_count`
/// - short: the ten lowest-ranked shorts, weighted `100 / short_count`
///
/// Weights are percentages rounded to 2 dp. Returns `None` when the leg holds
/// nothing.
#[must_use]
pub fn portfolio_snapshot(
    target: &ReportTarget,
    selection: &Selection,
) -> Option<PortfolioSnapshot> {
    let constituents: Vec<(String, f64)> = match target.leg {
        Leg::LongShort => {
            let total = selection.len() as f64;
            let half = SNAPSHOT_SIZE / 2;
            let mut top: Vec<&Position> = tail(&selection.long, half)
                .iter()
                .chain(selection.short.iter().take(half))
                .collect();
            top.sort_by(|a, b| a.rank.total_cmp(&b.rank));
            top.into_iter()
                .map(|p| (p.name.clone(), round_to(p.side.sign() * 100.0 / total, 2)))
                .collect()
        }
        Leg::Long => equal_weighted(tail(&selection.long, SNAPSHOT_SIZE), selection.long.len()),
        Leg::Short => {
            let count = selection.short.len();
            equal_weighted(&selection.short[..count.min(SNAPSHOT_SIZE)], count)
        }
    };

    if constituents.is_empty() {
        return None;
    }

    Some(PortfolioSnapshot {
        id: target.id,
        name: target.name.clone(),
        last_rebalance_date: selection.date,
        constituents,
    })
}

/// Performance document for a return record: daily return in percent and
/// cumulative value, both rounded to 4 dp.
#[must_use]
pub fn performance_update(target: &ReportTarget, record: &ReturnRecord) -> PerformanceUpdate {
    PerformanceUpdate {
        trading_date: record.date,
        portfolio_id: f64::from(target.id),
        portfolio_name: target.name.clone(),
        daily_return: round_to(record.daily_return * 100.0, 4),
        cumulative_value: round_to(record.cumulative_value, 4),
    }
}

fn tail(positions: &[Position], n: usize) -> &[Position] {
    &positions[positions.len().saturating_sub(n)..]
}

fn equal_weighted(shown: &[Position], count: usize) -> Vec<(String, f64)> {
    let weight = round_to(100.0 / count as f64, 2);
    shown.iter().map(|p| (p.name.clone(), weight)).collect()
}

#[cfg(test)]
mod tests {
    use capflow_primitives::{Date, InstrumentId, Side, Strategy};

    use super::*;

    fn date() -> Date {
        Date::from_ymd_opt(2022, 7, 8).unwrap()
    }

    fn position(id: u64, side: Side, rank: f64) -> Position {
        Position {
            date: date(),
            instrument_id: InstrumentId::new(id),
            name: format!("S{id}"),
            strategy: Strategy::Absneu,
            side,
            factor_value: 0.0,
            rank,
            change_amount: 0.0,
        }
    }

    /// 12 longs and 8 shorts out of 200 ranked instruments.
    fn selection() -> Selection {
        let rank = |k: u64| k as f64 / 200.0;
        Selection {
            date: date(),
            strategy: Strategy::Absneu,
            long: (0..12).map(|i| position(100 + i, Side::Long, rank(189 + i))).collect(),
            short: (0..8).map(|i| position(200 + i, Side::Short, rank(1 + i))).collect(),
            universe_size: 200,
        }
    }

    fn target(leg: Leg) -> ReportTarget {
        ReportTarget { strategy: Strategy::Absneu, leg, id: 2, name: "Absneu".to_string() }
    }

    fn names(snapshot: &PortfolioSnapshot) -> Vec<&str> {
        snapshot.constituents.iter().map(|(n, _)| n.as_str()).collect()
    }

    #[test]
    fn long_short_snapshot_mixes_extremes() {
        let snapshot = portfolio_snapshot(&target(Leg::LongShort), &selection()).unwrap();

        assert_eq!(
            names(&snapshot),
            vec!["S200", "S201", "S202", "S203", "S204", "S107", "S108", "S109", "S110", "S111"]
        );
        assert_eq!(snapshot.constituents[0].1, -5.0);
        assert_eq!(snapshot.constituents[9].1, 5.0);
        assert_eq!(snapshot.last_rebalance_date, date());
        assert_eq!(snapshot.id, 2);
    }

    #[test]
    fn long_only_snapshot_shows_top_ten() {
        let snapshot = portfolio_snapshot(&target(Leg::Long), &selection()).unwrap();

        assert_eq!(snapshot.constituents.len(), 10);
        assert_eq!(snapshot.constituents[0].0, "S102");
        assert_eq!(snapshot.constituents[0].1, 8.33);
    }

    #[test]
    fn short_only_snapshot_shows_bottom() {
        let snapshot = portfolio_snapshot(&target(Leg::Short), &selection()).unwrap();

        assert_eq!(snapshot.constituents.len(), 8);
        assert_eq!(snapshot.constituents[0].0, "S200");
        assert_eq!(snapshot.constituents[0].1, 12.5);
    }

    #[test]
    fn empty_leg_has_no_snapshot() {
        let mut selection = selection();
        selection.short.clear();
        assert!(portfolio_snapshot(&target(Leg::Short), &selection).is_none());
    }

    #[test]
    fn performance_is_in_percent() {
        let record = ReturnRecord {
            date: date(),
            strategy: Strategy::Absneu,
            leg: Leg::LongShort,
            daily_return: 0.001_234_56,
            cumulative_value: 1.023_456_7,
        };

        let update = performance_update(&target(Leg::LongShort), &record);

        assert_eq!(update.daily_return, 0.1235);
        assert_eq!(update.cumulative_value, 1.0235);
        assert_eq!(update.portfolio_id, 2.0);
        assert_eq!(update.trading_date, date());
    }
}
