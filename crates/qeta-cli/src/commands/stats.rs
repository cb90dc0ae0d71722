//! Statistics command handlers

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::ValueEnum;

use qeta_core::{Granularity, StatisticsOptions, StatisticsRequest, Store};

use crate::output::Output;

/// Which rollup to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Metric {
    TotalQuestions,
    TotalAnswers,
    UpvotedQuestions,
    UpvotedAnswers,
    UpvotedCorrectAnswers,
}

/// Parse a `YYYY-MM-DD` day as midnight UTC
pub fn parse_day(s: &str) -> Result<DateTime<Utc>> {
    let day = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))?;
    Ok(day.and_time(chrono::NaiveTime::MIN).and_utc())
}

/// Build the store request from command-line values
pub fn build_request(
    author: Option<String>,
    granularity: &str,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<StatisticsRequest> {
    let granularity: Granularity = granularity.parse().map_err(anyhow::Error::msg)?;
    Ok(StatisticsRequest {
        author,
        options: StatisticsOptions {
            from: from.map(parse_day).transpose()?,
            to: to.map(parse_day).transpose()?,
            granularity,
        },
    })
}

/// Show one statistics rollup
pub fn show(store: &Store, metric: Metric, request: &StatisticsRequest, output: &Output) -> Result<()> {
    let stats = match metric {
        Metric::TotalQuestions => store.get_total_questions(request)?,
        Metric::TotalAnswers => store.get_total_answers(request)?,
        Metric::UpvotedQuestions => store.get_most_upvoted_questions(request)?,
        Metric::UpvotedAnswers => store.get_most_upvoted_answers(request)?,
        Metric::UpvotedCorrectAnswers => store.get_most_upvoted_correct_answers(request)?,
    };
    output.print_statistics(&stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_day() {
        assert_eq!(
            parse_day("2024-03-04").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap()
        );
        assert!(parse_day("04/03/2024").is_err());
    }

    #[test]
    fn test_build_request() {
        let request =
            build_request(Some("alice".to_string()), "week", Some("2024-01-01"), None).unwrap();
        assert_eq!(request.author.as_deref(), Some("alice"));
        assert_eq!(request.options.granularity, Granularity::Week);
        assert!(request.options.from.is_some());
        assert!(request.options.to.is_none());

        assert!(build_request(None, "fortnight", None, None).is_err());
    }
}
