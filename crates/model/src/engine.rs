//! Batch jobs: weekly portfolio selection and daily return computation.

use capflow_factor::FactorConstructor;
use capflow_primitives::{
    Date, DiscountSet, FactorValue, Leg, PriorState, ReportDocument, ReturnRecord, Strategy,
    is_weekday, round_to,
};
use capflow_traits::{MarketDataStore, PortfolioStore, ReportingSink, WriteReport};
use chrono::Duration;
use tracing::{debug, info, warn};

use crate::{
    DiscountEngine, EngineConfig, ModelError, PortfolioSelector, PriorStates, ReturnCalculator,
    load_cross_section, performance_update, portfolio_snapshot, price_holdings,
};

/// Days between scheduled rebalances.
const REBALANCE_INTERVAL_DAYS: i64 = 14;

/// Rows written and documents published for one strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Rows attempted.
    pub attempted: usize,
    /// Rows written.
    pub written: usize,
    /// Report documents published.
    pub published: usize,
}

/// Outcome of a job for one strategy.
#[derive(Debug)]
pub struct StrategyOutcome {
    /// Strategy processed.
    pub strategy: Strategy,
    /// What was written, or why the strategy failed.
    pub result: Result<WriteSummary, ModelError>,
}

/// Per-strategy outcomes of one job run.
#[derive(Debug)]
pub struct JobReport {
    /// Date the job ran for.
    pub date: Date,
    /// One outcome per configured strategy, in configuration order.
    pub outcomes: Vec<StrategyOutcome>,
}

impl JobReport {
    /// Strategies that completed.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Strategies that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Whether every strategy completed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Outcome of one strategy.
    #[must_use]
    pub fn outcome(&self, strategy: Strategy) -> Option<&StrategyOutcome> {
        self.outcomes.iter().find(|o| o.strategy == strategy)
    }

    /// Whether every failure only means there was nothing to compute.
    #[must_use]
    pub fn is_non_trading_day(&self) -> bool {
        !self.outcomes.is_empty()
            && self
                .outcomes
                .iter()
                .all(|o| o.result.as_ref().is_err_and(ModelError::is_non_trading_day))
    }
}

/// Runs the selection and return jobs over the store seams.
///
/// Jobs are sequential: returns for a date read the state persisted for
/// earlier dates, so backfills must run in date order.
#[derive(Debug)]
pub struct Engine<M, P, R> {
    config: EngineConfig,
    market: M,
    portfolios: P,
    sink: R,
    constructor: FactorConstructor,
    selector: PortfolioSelector,
    discounts: DiscountEngine,
    calculator: ReturnCalculator,
}

impl<M, P, R> Engine<M, P, R>
where
    M: MarketDataStore,
    P: PortfolioStore,
    R: ReportingSink,
{
    /// Create an engine.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidConfig` if the configuration is invalid.
    pub fn new(
        config: EngineConfig,
        market: M,
        portfolios: P,
        sink: R,
    ) -> Result<Self, ModelError> {
        config.validate()?;
        let constructor = FactorConstructor::with_config(config.factor.clone())?;
        let selector = PortfolioSelector::with_config(&config.selection)?;
        let discounts = DiscountEngine::new(config.costs);
        Ok(Self {
            config,
            market,
            portfolios,
            sink,
            constructor,
            selector,
            discounts,
            calculator: ReturnCalculator::new(),
        })
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Market data store.
    #[must_use]
    pub const fn market(&self) -> &M {
        &self.market
    }

    /// Portfolio store.
    #[must_use]
    pub const fn portfolios(&self) -> &P {
        &self.portfolios
    }

    /// Reporting sink.
    #[must_use]
    pub const fn sink(&self) -> &R {
        &self.sink
    }

    /// Take the stores back.
    pub fn into_parts(self) -> (M, P, R) {
        (self.market, self.portfolios, self.sink)
    }

    /// Rebalance every configured strategy on `ref_date`.
    ///
    /// Factor values are constructed once and shared by all strategies.
    ///
    /// # Errors
    /// Returns `ModelError` if the cross-section cannot be loaded or its
    /// factor values cannot be constructed; nothing is persisted in that case.
    /// Per-strategy failures are reported in the [`JobReport`].
    pub fn select_portfolios(&mut self, ref_date: Date) -> Result<JobReport, ModelError> {
        info!(date = %ref_date, "Selecting portfolios");

        let section = load_cross_section(&self.market, ref_date, &self.config.factor)?;
        let values = self.constructor.construct(&section.observations, &section.excluded)?;

        let mut outcomes = Vec::with_capacity(self.config.strategies.len());
        for strategy in self.config.strategies.clone() {
            let result = self.select_strategy(ref_date, strategy, &values);
            if let Err(err) = &result {
                warn!(strategy = %strategy, date = %ref_date, %err, "selection failed");
            }
            outcomes.push(StrategyOutcome { strategy, result });
        }

        info!(next = %(ref_date + Duration::days(REBALANCE_INTERVAL_DAYS)), "next rebalance date");
        Ok(JobReport { date: ref_date, outcomes })
    }

    /// Compute returns of every configured strategy on `date`.
    pub fn compute_returns(&mut self, date: Date) -> JobReport {
        info!(date = %date, "Computing returns");

        let mut outcomes = Vec::with_capacity(self.config.strategies.len());
        for strategy in self.config.strategies.clone() {
            let result = self.compute_strategy(strategy, date);
            match &result {
                Err(err) if err.is_non_trading_day() => {
                    info!(strategy = %strategy, date = %date, "not a trading day");
                }
                Err(err) => warn!(strategy = %strategy, date = %date, %err, "return update failed"),
                Ok(_) => {}
            }
            outcomes.push(StrategyOutcome { strategy, result });
        }

        JobReport { date, outcomes }
    }

    /// Compute returns for every weekday in `[start, end]`, oldest first.
    pub fn compute_returns_range(&mut self, start: Date, end: Date) -> Vec<JobReport> {
        let mut reports = Vec::new();
        let mut date = start;
        while date <= end {
            if is_weekday(date) {
                reports.push(self.compute_returns(date));
            } else {
                debug!(date = %date, "skipping weekend");
            }
            let Some(next) = date.succ_opt() else { break };
            date = next;
        }

        let computed = reports.iter().filter(|r| r.is_success()).count();
        info!(from = %start, to = %end, computed, dates = reports.len(), "backfill finished");
        reports
    }

    fn select_strategy(
        &mut self,
        ref_date: Date,
        strategy: Strategy,
        values: &[FactorValue],
    ) -> Result<WriteSummary, ModelError> {
        let selection = self.selector.select(ref_date, strategy, values)?;
        let positions: Vec<_> = selection.positions().cloned().collect();

        let report = self.portfolios.upsert_positions(&positions);
        let mut summary = check_write(&report)?;

        for leg in Leg::ALL {
            let Some(target) = self.config.reporting.lookup(strategy, leg) else {
                debug!(strategy = %strategy, leg = %leg, "not scheduled for publishing");
                continue;
            };
            let Some(snapshot) = portfolio_snapshot(target, &selection) else {
                warn!(strategy = %strategy, leg = %leg, "nothing to publish");
                continue;
            };
            if self.publish(&ReportDocument::Snapshot(snapshot)) {
                summary.published += 1;
            }
        }

        Ok(summary)
    }

    fn compute_strategy(
        &mut self,
        strategy: Strategy,
        date: Date,
    ) -> Result<WriteSummary, ModelError> {
        let Some(rebalance) = self.portfolios.last_rebalance_before(strategy, date)? else {
            return Err(ModelError::NonTradingDay(date));
        };

        let held = self.portfolios.positions(strategy, rebalance)?;
        let realized = price_holdings(&self.market, &held, rebalance, date)?;
        if realized.is_empty() {
            return Err(ModelError::NonTradingDay(date));
        }

        let discounts = self.discounts_at(strategy, rebalance)?;
        let priors = self.priors(strategy, rebalance, date)?;
        let records = self.calculator.calculate(date, strategy, &realized, &discounts, &priors)?;

        let rounded: Vec<ReturnRecord> = records
            .iter()
            .map(|r| ReturnRecord {
                daily_return: round_to(r.daily_return, 4),
                cumulative_value: round_to(r.cumulative_value, 4),
                ..*r
            })
            .collect();
        let report = self.portfolios.upsert_returns(&rounded);
        let mut summary = check_write(&report)?;

        for record in &records {
            let Some(target) = self.config.reporting.lookup(strategy, record.leg) else {
                continue;
            };
            let document = ReportDocument::Performance(performance_update(target, record));
            if self.publish(&document) {
                summary.published += 1;
            }
        }

        Ok(summary)
    }

    /// Discounts for the holding period starting at `rebalance`.
    fn discounts_at(&self, strategy: Strategy, rebalance: Date) -> Result<DiscountSet, ModelError> {
        let Some(previous) = self.portfolios.last_rebalance_before(strategy, rebalance)? else {
            return Ok(self.discounts.first_rebalance(rebalance));
        };

        let old = self.portfolios.positions(strategy, previous)?;
        let old = price_holdings(&self.market, &old, previous, rebalance)?;
        let current = self.portfolios.positions(strategy, rebalance)?;
        Ok(self.discounts.compute(rebalance, &old, &current))
    }

    fn priors(
        &self,
        strategy: Strategy,
        rebalance: Date,
        date: Date,
    ) -> Result<PriorStates, ModelError> {
        let mut priors = PriorStates::default();
        for leg in Leg::ALL {
            let initial = self.portfolios.return_on(strategy, leg, rebalance)?;
            let last = self.portfolios.last_return_before(strategy, leg, date)?;
            priors.set(
                leg,
                PriorState::from_history(
                    initial.map(|r| r.cumulative_value),
                    last.map(|r| r.cumulative_value),
                ),
            );
        }
        Ok(priors)
    }

    fn publish(&mut self, document: &ReportDocument) -> bool {
        match self.sink.publish(document) {
            Ok(id) => {
                debug!(collection = document.collection(), id = %id, "published");
                true
            }
            Err(err) => {
                warn!(collection = document.collection(), %err, "publish failed");
                false
            }
        }
    }
}

/// Log a bulk write and fail only if no row made it.
fn check_write(report: &WriteReport) -> Result<WriteSummary, ModelError> {
    let (written, attempted) = (report.succeeded(), report.attempted());
    info!("Uploaded {written}/{attempted} records into table [{}]", report.table());

    for (row, err) in report.failures() {
        warn!(table = report.table(), row, %err, "row write failed");
    }

    if attempted > 0 && written == 0 {
        return Err(ModelError::PersistenceWrite {
            table: report.table(),
            failed: report.failed(),
            attempted,
        });
    }
    Ok(WriteSummary { attempted, written, published: 0 })
}
