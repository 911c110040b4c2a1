//! SQLite-backed market data and portfolio store.

use std::collections::HashSet;
use std::path::Path;

use capflow_primitives::{Date, InstrumentId, Leg, Position, ReturnRecord, Strategy};
use capflow_traits::{InflowTotal, MarketDataStore, PortfolioStore, Quote, StoreError};
use rusqlite::{Connection, OptionalExtension, Row, params, types::Type};
use tracing::{debug, info};

use crate::validate::{check_position, check_return};

const CREATE_TABLES_SQL: &str = r#"
-- End-of-day quotes; one row per instrument and trading day
CREATE TABLE IF NOT EXISTS quotes (
    date TEXT NOT NULL,
    instrument_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    close REAL NOT NULL,
    market_cap REAL,
    PRIMARY KEY (date, instrument_id)
);

-- Raw inflow events; several per instrument and day are allowed
CREATE TABLE IF NOT EXISTS inflows (
    date TEXT NOT NULL,
    instrument_id INTEGER NOT NULL,
    amount REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_inflows_date ON inflows(date);
CREATE INDEX IF NOT EXISTS idx_inflows_instrument ON inflows(instrument_id, date);

CREATE TABLE IF NOT EXISTS positions (
    date TEXT NOT NULL,
    instrument_id INTEGER NOT NULL,
    strategy TEXT NOT NULL,
    name TEXT NOT NULL,
    side TEXT NOT NULL,
    factor_value REAL NOT NULL,
    rank REAL NOT NULL,
    change_amount REAL NOT NULL,
    PRIMARY KEY (date, instrument_id, strategy)
);

CREATE INDEX IF NOT EXISTS idx_positions_strategy ON positions(strategy, date);

CREATE TABLE IF NOT EXISTS returns (
    date TEXT NOT NULL,
    strategy TEXT NOT NULL,
    leg TEXT NOT NULL,
    daily_return REAL NOT NULL,
    cumulative_value REAL NOT NULL,
    PRIMARY KEY (date, strategy, leg)
);
"#;

/// Market data and portfolio tables in one SQLite database.
///
/// Writes replace on primary-key conflict.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create a database file and ensure the schema exists.
    ///
    /// # Errors
    /// Returns `StoreError::Backend` if the file cannot be opened or the
    /// schema cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(backend)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(backend)?;
        let store = Self::with_connection(conn)?;
        info!(path = %path.display(), "opened sqlite store");
        Ok(store)
    }

    /// Create a private in-memory database.
    ///
    /// # Errors
    /// Returns `StoreError::Backend` if the schema cannot be created.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory().map_err(backend)?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(CREATE_TABLES_SQL).map_err(backend)?;
        Ok(Self { conn })
    }

    /// Insert or replace a quote.
    ///
    /// # Errors
    /// Returns `StoreError` if the row cannot be written.
    pub fn insert_quote(&self, date: Date, quote: &Quote) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO quotes (date, instrument_id, name, close, market_cap)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    date.to_string(),
                    to_sql_id(quote.instrument_id)?,
                    quote.name,
                    quote.close,
                    quote.market_cap
                ],
            )
            .map_err(backend)?;
        Ok(())
    }

    /// Append an inflow event.
    ///
    /// # Errors
    /// Returns `StoreError` if the row cannot be written.
    pub fn insert_inflow(
        &self,
        date: Date,
        instrument_id: InstrumentId,
        amount: f64,
    ) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT INTO inflows (date, instrument_id, amount) VALUES (?1, ?2, ?3)",
                params![date.to_string(), to_sql_id(instrument_id)?, amount],
            )
            .map_err(backend)?;
        Ok(())
    }

    fn dates(&self, sql: &str, start: Date, end: Date) -> Result<Vec<Date>, StoreError> {
        let mut stmt = self.conn.prepare(sql).map_err(backend)?;
        let rows = stmt
            .query_map(params![start.to_string(), end.to_string()], |row| date_at(row, 0))
            .map_err(backend)?;
        rows.collect::<Result<_, _>>().map_err(backend)
    }
}

impl MarketDataStore for SqliteStore {
    fn trading_days(&self, start: Date, end: Date) -> Result<Vec<Date>, StoreError> {
        self.dates(
            "SELECT DISTINCT date FROM quotes WHERE date BETWEEN ?1 AND ?2 ORDER BY date",
            start,
            end,
        )
    }

    fn inflow_days(&self, start: Date, end: Date) -> Result<Vec<Date>, StoreError> {
        self.dates(
            "SELECT DISTINCT date FROM inflows WHERE date BETWEEN ?1 AND ?2 ORDER BY date",
            start,
            end,
        )
    }

    fn inflow_totals(&self, start: Date, end: Date) -> Result<Vec<InflowTotal>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT instrument_id, SUM(amount), MIN(date), MAX(date) FROM inflows
                 WHERE date BETWEEN ?1 AND ?2
                 GROUP BY instrument_id ORDER BY instrument_id",
            )
            .map_err(backend)?;
        let rows = stmt
            .query_map(params![start.to_string(), end.to_string()], |row| {
                Ok(InflowTotal {
                    instrument_id: id_at(row, 0)?,
                    total: row.get(1)?,
                    first_date: date_at(row, 2)?,
                    last_date: date_at(row, 3)?,
                })
            })
            .map_err(backend)?;
        rows.collect::<Result<_, _>>().map_err(backend)
    }

    fn quotes(&self, date: Date) -> Result<Vec<Quote>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT instrument_id, name, close, market_cap FROM quotes
                 WHERE date = ?1 ORDER BY instrument_id",
            )
            .map_err(backend)?;
        let rows = stmt
            .query_map(params![date.to_string()], |row| {
                Ok(Quote {
                    instrument_id: id_at(row, 0)?,
                    name: row.get(1)?,
                    close: row.get(2)?,
                    market_cap: row.get(3)?,
                })
            })
            .map_err(backend)?;
        rows.collect::<Result<_, _>>().map_err(backend)
    }

    fn recently_listed(
        &self,
        as_of: Date,
        trading_days: usize,
    ) -> Result<HashSet<InstrumentId>, StoreError> {
        let Some(offset) = trading_days.checked_sub(1) else {
            return Ok(HashSet::new());
        };
        let offset = i64::try_from(offset).map_err(|e| StoreError::InvalidRecord(e.to_string()))?;

        let cutoff: Option<String> = self
            .conn
            .query_row(
                "SELECT DISTINCT date FROM inflows WHERE date <= ?1
                 ORDER BY date DESC LIMIT 1 OFFSET ?2",
                params![as_of.to_string(), offset],
                |row| row.get(0),
            )
            .optional()
            .map_err(backend)?;
        let Some(cutoff) = cutoff else {
            debug!(as_of = %as_of, trading_days, "inflow history shorter than listing age");
            return Ok(HashSet::new());
        };

        let mut stmt = self
            .conn
            .prepare(
                "SELECT instrument_id FROM inflows WHERE date <= ?1
                 GROUP BY instrument_id HAVING MIN(date) >= ?2",
            )
            .map_err(backend)?;
        let rows = stmt
            .query_map(params![as_of.to_string(), cutoff], |row| id_at(row, 0))
            .map_err(backend)?;
        rows.collect::<Result<_, _>>().map_err(backend)
    }
}

impl PortfolioStore for SqliteStore {
    fn upsert_position(&mut self, position: &Position) -> Result<(), StoreError> {
        check_position(position)?;
        self.conn
            .execute(
                "INSERT OR REPLACE INTO positions
                 (date, instrument_id, strategy, name, side, factor_value, rank, change_amount)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    position.date.to_string(),
                    to_sql_id(position.instrument_id)?,
                    position.strategy.as_str(),
                    position.name,
                    position.side.as_str(),
                    position.factor_value,
                    position.rank,
                    position.change_amount
                ],
            )
            .map_err(backend)?;
        Ok(())
    }

    fn upsert_return(&mut self, record: &ReturnRecord) -> Result<(), StoreError> {
        check_return(record)?;
        self.conn
            .execute(
                "INSERT OR REPLACE INTO returns
                 (date, strategy, leg, daily_return, cumulative_value)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.date.to_string(),
                    record.strategy.as_str(),
                    record.leg.as_str(),
                    record.daily_return,
                    record.cumulative_value
                ],
            )
            .map_err(backend)?;
        Ok(())
    }

    fn positions(&self, strategy: Strategy, date: Date) -> Result<Vec<Position>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT date, instrument_id, strategy, name, side, factor_value, rank, change_amount
                 FROM positions WHERE strategy = ?1 AND date = ?2 ORDER BY rank",
            )
            .map_err(backend)?;
        let rows = stmt
            .query_map(params![strategy.as_str(), date.to_string()], row_to_position)
            .map_err(backend)?;
        rows.collect::<Result<_, _>>().map_err(backend)
    }

    fn last_rebalance_before(
        &self,
        strategy: Strategy,
        before: Date,
    ) -> Result<Option<Date>, StoreError> {
        let latest: Option<String> = self
            .conn
            .query_row(
                "SELECT MAX(date) FROM positions WHERE strategy = ?1 AND date < ?2",
                params![strategy.as_str(), before.to_string()],
                |row| row.get(0),
            )
            .map_err(backend)?;
        latest.map(|s| parse_date(&s)).transpose()
    }

    fn return_on(
        &self,
        strategy: Strategy,
        leg: Leg,
        date: Date,
    ) -> Result<Option<ReturnRecord>, StoreError> {
        self.conn
            .query_row(
                "SELECT date, strategy, leg, daily_return, cumulative_value FROM returns
                 WHERE strategy = ?1 AND leg = ?2 AND date = ?3",
                params![strategy.as_str(), leg.as_str(), date.to_string()],
                row_to_return,
            )
            .optional()
            .map_err(backend)
    }

    fn last_return_before(
        &self,
        strategy: Strategy,
        leg: Leg,
        before: Date,
    ) -> Result<Option<ReturnRecord>, StoreError> {
        self.conn
            .query_row(
                "SELECT date, strategy, leg, daily_return, cumulative_value FROM returns
                 WHERE strategy = ?1 AND leg = ?2 AND date < ?3
                 ORDER BY date DESC LIMIT 1",
                params![strategy.as_str(), leg.as_str(), before.to_string()],
                row_to_return,
            )
            .optional()
            .map_err(backend)
    }
}

fn backend(err: rusqlite::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn to_sql_id(id: InstrumentId) -> Result<i64, StoreError> {
    i64::try_from(id.get())
        .map_err(|_| StoreError::InvalidRecord(format!("instrument id {id} out of range")))
}

fn parse_date(s: &str) -> Result<Date, StoreError> {
    s.parse().map_err(|e| StoreError::Serialization(format!("bad date {s:?}: {e}")))
}

fn conversion<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn date_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Date> {
    row.get::<_, String>(idx)?.parse().map_err(|e| conversion(idx, e))
}

fn id_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<InstrumentId> {
    let raw: i64 = row.get(idx)?;
    u64::try_from(raw)
        .map(InstrumentId::new)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(e)))
}

fn row_to_position(row: &Row<'_>) -> rusqlite::Result<Position> {
    Ok(Position {
        date: date_at(row, 0)?,
        instrument_id: id_at(row, 1)?,
        strategy: row.get::<_, String>(2)?.parse().map_err(|e| conversion(2, e))?,
        name: row.get(3)?,
        side: row.get::<_, String>(4)?.parse().map_err(|e| conversion(4, e))?,
        factor_value: row.get(5)?,
        rank: row.get(6)?,
        change_amount: row.get(7)?,
    })
}

fn row_to_return(row: &Row<'_>) -> rusqlite::Result<ReturnRecord> {
    Ok(ReturnRecord {
        date: date_at(row, 0)?,
        strategy: row.get::<_, String>(1)?.parse().map_err(|e| conversion(1, e))?,
        leg: row.get::<_, String>(2)?.parse().map_err(|e| conversion(2, e))?,
        daily_return: row.get(3)?,
        cumulative_value: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use capflow_primitives::Side;

    use super::*;

    fn d(day: u32) -> Date {
        Date::from_ymd_opt(2022, 7, day).unwrap()
    }

    fn id(raw: u64) -> InstrumentId {
        InstrumentId::new(raw)
    }

    fn quote(raw: u64, close: f64, market_cap: Option<f64>) -> Quote {
        Quote { instrument_id: id(raw), name: format!("S{raw}"), close, market_cap }
    }

    fn position(date: Date, raw: u64, side: Side, rank: f64) -> Position {
        Position {
            date,
            instrument_id: id(raw),
            name: format!("S{raw}"),
            strategy: Strategy::Absneu,
            side,
            factor_value: -0.25,
            rank,
            change_amount: 1234.5,
        }
    }

    #[test]
    fn schema_creates_tables() {
        let store = SqliteStore::open_in_memory().unwrap();
        let tables: Vec<String> = store
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(tables, vec!["inflows", "positions", "quotes", "returns"]);
    }

    #[test]
    fn market_reads() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_quote(d(4), &quote(1, 10.0, Some(5e9))).unwrap();
        store.insert_quote(d(4), &quote(2, 20.0, None)).unwrap();
        store.insert_quote(d(5), &quote(1, 11.0, Some(5.5e9))).unwrap();
        store.insert_inflow(d(4), id(1), 10.0).unwrap();
        store.insert_inflow(d(4), id(1), 5.0).unwrap();
        store.insert_inflow(d(5), id(2), -2.0).unwrap();
        store.insert_inflow(d(6), id(1), 1.0).unwrap();

        assert_eq!(store.trading_days(d(1), d(31)).unwrap(), vec![d(4), d(5)]);
        assert_eq!(store.inflow_days(d(5), d(6)).unwrap(), vec![d(5), d(6)]);

        let quotes = store.quotes(d(4)).unwrap();
        assert_eq!(quotes, vec![quote(1, 10.0, Some(5e9)), quote(2, 20.0, None)]);

        let totals = store.inflow_totals(d(4), d(5)).unwrap();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].total, 15.0);
        assert_eq!(totals[0].first_date, d(4));
        assert_eq!(totals[0].last_date, d(4));
        assert_eq!(totals[1].instrument_id, id(2));

        let prices = store.close_prices(d(5), &[id(1), id(2)]).unwrap();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices[&id(1)], 11.0);
    }

    #[test]
    fn recently_listed_uses_inflow_history() {
        let store = SqliteStore::open_in_memory().unwrap();
        for day in 4..=8 {
            store.insert_inflow(d(day), id(1), 1.0).unwrap();
            if day >= 7 {
                store.insert_inflow(d(day), id(2), 1.0).unwrap();
            }
        }

        let recent = store.recently_listed(d(8), 3).unwrap();
        assert_eq!(recent, HashSet::from([id(2)]));
        assert!(store.recently_listed(d(8), 10).unwrap().is_empty());
        assert!(store.recently_listed(d(8), 0).unwrap().is_empty());
    }

    #[test]
    fn positions_round_trip_and_replace() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.upsert_position(&position(d(8), 1, Side::Long, 0.98)).unwrap();
        store.upsert_position(&position(d(8), 2, Side::Short, 0.01)).unwrap();
        store.upsert_position(&position(d(8), 2, Side::Short, 0.02)).unwrap();

        let held = store.positions(Strategy::Absneu, d(8)).unwrap();

        assert_eq!(
            held,
            vec![position(d(8), 2, Side::Short, 0.02), position(d(8), 1, Side::Long, 0.98)]
        );
        assert!(store.positions(Strategy::Pure, d(8)).unwrap().is_empty());
    }

    #[test]
    fn rebalance_and_return_lookups() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.upsert_position(&position(d(1), 1, Side::Long, 0.9)).unwrap();
        store.upsert_position(&position(d(15), 1, Side::Long, 0.9)).unwrap();
        let record = |date, cumulative_value| ReturnRecord {
            date,
            strategy: Strategy::Absneu,
            leg: Leg::LongShort,
            daily_return: 0.001,
            cumulative_value,
        };
        store.upsert_return(&record(d(4), 1.01)).unwrap();
        store.upsert_return(&record(d(5), 1.02)).unwrap();
        store.upsert_return(&record(d(5), 1.03)).unwrap();

        let before = |date| store.last_rebalance_before(Strategy::Absneu, date).unwrap();
        assert_eq!(before(d(15)), Some(d(1)));
        assert_eq!(before(d(18)), Some(d(15)));
        assert_eq!(before(d(1)), None);

        let on = store.return_on(Strategy::Absneu, Leg::LongShort, d(5)).unwrap();
        assert_eq!(on, Some(record(d(5), 1.03)));
        assert!(store.return_on(Strategy::Absneu, Leg::Long, d(5)).unwrap().is_none());

        let last = store.last_return_before(Strategy::Absneu, Leg::LongShort, d(5)).unwrap();
        assert_eq!(last, Some(record(d(4), 1.01)));
    }

    #[test]
    fn rejects_non_finite_position() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut bad = position(d(8), 1, Side::Long, 0.5);
        bad.factor_value = f64::INFINITY;

        let err = store.upsert_position(&bad).unwrap_err();

        assert!(matches!(err, StoreError::InvalidRecord(_)));
        assert!(store.positions(Strategy::Absneu, d(8)).unwrap().is_empty());
    }

    #[test]
    fn reopens_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capflow.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.insert_quote(d(4), &quote(1, 10.0, None)).unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.trading_days(d(1), d(31)).unwrap(), vec![d(4)]);
    }
}
