use diesel::backend::Backend;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::TimestamptzSqlite;
use serde::{Deserialize, Serialize};
use std::ops::Deref;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::serde::rfc3339;
use time::{Duration, OffsetDateTime};
use tracing::debug;

/// Logs how long the enclosing scope took when dropped.
pub struct Timer<'a> {
    name: &'a str,
    start: std::time::Instant,
}

impl<'a> Timer<'a> {
    pub fn new(name: &'a str) -> Self {
        Self {
            name,
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for Timer<'_> {
    fn drop(&mut self) {
        let elapsed_time = self.start.elapsed();
        let time_in_s = elapsed_time.as_secs_f32();
        match elapsed_time.as_nanos().checked_ilog10().unwrap_or(0) {
            0..3 => debug!("{} took {:.1}ns", self.name, time_in_s * 1e9),
            3..6 => debug!("{} took {:.1}μs", self.name, time_in_s * 1e6),
            6..9 => debug!("{} took {:.1}ms", self.name, time_in_s * 1e3),
            9..12 => debug!("{} took {:.1}s", self.name, time_in_s),
            12.. => debug!("{} took {:.0}s", self.name, time_in_s),
        }
    }
}

// A wrapper for time::OffsetDateTime that serializes/deserializes according to RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = TimestamptzSqlite)]
pub struct DateTime(#[serde(with = "rfc3339")] OffsetDateTime);

impl DateTime {
    pub fn now() -> Self {
        OffsetDateTime::now_utc().into()
    }

    pub fn days_from_now(days: i64) -> Self {
        Self::now().0.saturating_add(Duration::days(days)).into()
    }

    /// Human readable form used on rendered pages, e.g. "18 Oct 2026 14:03".
    pub fn display(&self) -> String {
        const FORMAT: &[BorrowedFormatItem<'_>] =
            format_description!("[day padding:none] [month repr:short] [year] [hour]:[minute]");
        self.0.format(FORMAT).unwrap_or_else(|_| self.0.to_string())
    }
}

impl Deref for DateTime {
    type Target = OffsetDateTime;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<OffsetDateTime> for DateTime {
    fn from(value: OffsetDateTime) -> Self {
        DateTime(value)
    }
}

impl<DB: Backend> ToSql<TimestamptzSqlite, DB> for DateTime
where
    OffsetDateTime: ToSql<TimestamptzSqlite, DB>,
{
    fn to_sql<'a>(&'a self, out: &mut Output<'a, '_, DB>) -> serialize::Result {
        self.0.to_sql(out)
    }
}

impl<DB: Backend> FromSql<TimestamptzSqlite, DB> for DateTime
where
    OffsetDateTime: FromSql<TimestamptzSqlite, DB>,
{
    fn from_sql(bytes: DB::RawValue<'_>) -> deserialize::Result<Self> {
        OffsetDateTime::from_sql(bytes).map(DateTime)
    }
}
