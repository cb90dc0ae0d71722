//! Trend ranking
//!
//! Trend is a time-decayed popularity signal: activity on a question
//! (score, answers, views) divided by its age raised to a gravity exponent.
//! It is exposed to SQL as `qeta_trend(score, answers, views, created_ms, now_ms)`
//! so listings can sort and paginate by it inside the database.

use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, Result};

/// SQL name of the registered trend function
pub const TREND_FUNCTION: &str = "qeta_trend";

/// Views are worth a tenth of a vote
const VIEW_WEIGHT: f64 = 0.1;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Compute the trend score of a question
pub fn trend(score: i64, answers: i64, views: i64, created_ms: i64, now_ms: i64, gravity: f64) -> f64 {
    let age_hours = (now_ms.saturating_sub(created_ms) as f64 / MILLIS_PER_HOUR).max(0.0);
    let activity = score as f64 + answers as f64 + views as f64 * VIEW_WEIGHT;
    activity / (age_hours + 2.0).powf(gravity)
}

/// Register `qeta_trend` on a connection
pub fn register_trend_function(conn: &Connection, gravity: f64) -> Result<()> {
    conn.create_scalar_function(
        TREND_FUNCTION,
        5,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        move |ctx| {
            let score: i64 = ctx.get(0)?;
            let answers: i64 = ctx.get(1)?;
            let views: i64 = ctx.get(2)?;
            let created_ms: i64 = ctx.get(3)?;
            let now_ms: i64 = ctx.get(4)?;
            Ok(trend(score, answers, views, created_ms, now_ms, gravity))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: i64 = 3_600_000;

    #[test]
    fn test_newer_question_trends_higher() {
        let now = 1_000 * HOUR;
        let fresh = trend(10, 2, 100, now - HOUR, now, 1.8);
        let stale = trend(10, 2, 100, now - 100 * HOUR, now, 1.8);
        assert!(fresh > stale);
    }

    #[test]
    fn test_activity_raises_trend() {
        let now = 10 * HOUR;
        let quiet = trend(0, 0, 0, now, now, 1.8);
        let busy = trend(5, 1, 30, now, now, 1.8);
        assert_eq!(quiet, 0.0);
        assert!(busy > quiet);
    }

    #[test]
    fn test_future_timestamps_do_not_go_negative() {
        let value = trend(1, 0, 0, 10 * HOUR, 0, 1.8);
        assert_eq!(value, 1.0 / 2f64.powf(1.8));
    }

    #[test]
    fn test_sql_function_matches_rust() {
        let conn = Connection::open_in_memory().unwrap();
        register_trend_function(&conn, 1.5).unwrap();

        let value: f64 = conn
            .query_row("SELECT qeta_trend(4, 2, 50, 0, ?1)", [5 * HOUR], |row| {
                row.get(0)
            })
            .unwrap();
        assert!((value - trend(4, 2, 50, 0, 5 * HOUR, 1.5)).abs() < 1e-12);
    }
}
