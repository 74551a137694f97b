//! Per-run context handed down to every stage.
//!
//! Holds the run's notion of "now" and its tracing span, so stages never read
//! the clock or global logging state themselves and tests can pin both.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::Span;

#[derive(Debug, Clone)]
pub struct RunContext {
    /// Calendar day the run is filed under.
    pub date: NaiveDate,
    pub now: DateTime<Utc>,
    pub lookback: Duration,
    /// Parent span for everything the run logs.
    pub span: Span,
}

impl RunContext {
    pub fn new(now: DateTime<Utc>, days_back: u32) -> Self {
        let date = now.date_naive();
        let span = tracing::info_span!("crawl_run", date = %date);
        Self {
            date,
            now,
            lookback: Duration::days(i64::from(days_back)),
            span,
        }
    }

    /// Oldest publish time still considered fresh. Clamped to the earliest
    /// representable instant when the lookback reaches past it.
    pub fn cutoff(&self) -> DateTime<Utc> {
        self.now
            .checked_sub_signed(self.lookback)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}
