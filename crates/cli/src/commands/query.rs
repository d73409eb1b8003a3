//! `dossier search|overdue|upcoming|stats` — Run one query shape against a domain.
//!
//! The report goes to stdout exactly as a tool would return it. Failures
//! keep their kind: bad arguments and an unavailable store read differently.

use super::runtime::Runtime;
use dossier_core::Error;
use dossier_domains::QueryOutcome;
use dossier_engine::{Accepted, Query};

pub async fn search(
    now: Option<&str>,
    domain: &str,
    text: Option<&str>,
    filters: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = Runtime::build(now)?;
    let service = runtime.service(domain)?;
    let query = parse_filters(Query::text(text.unwrap_or_default()), filters)?;
    print_outcome(service.search(&query).await)
}

pub async fn overdue(
    now: Option<&str>,
    domain: &str,
    assigned_to: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = Runtime::build(now)?;
    let service = runtime.service(domain)?;
    print_outcome(service.overdue_items(assigned_to).await)
}

pub async fn upcoming(
    now: Option<&str>,
    domain: &str,
    days: Option<i64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = Runtime::build(now)?;
    let service = runtime.service(domain)?;
    print_outcome(service.upcoming_window(days).await)
}

pub async fn stats(now: Option<&str>, domain: &str) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = Runtime::build(now)?;
    let service = runtime.service(domain)?;
    print_outcome(service.stats_summary().await)
}

/// `field=value` or `field=a,b` → an exact-match filter.
pub fn parse_filters(mut query: Query, filters: &[String]) -> Result<Query, String> {
    for raw in filters {
        let (field, values) = raw
            .split_once('=')
            .ok_or_else(|| format!("Invalid filter '{raw}' (expected field=value)"))?;
        let field = field.trim();
        if field.is_empty() {
            return Err(format!("Invalid filter '{raw}': empty field name"));
        }
        let values: Vec<String> = values
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
            .collect();
        let accepted = match values.len() {
            0 => return Err(format!("Invalid filter '{raw}': no values")),
            1 => Accepted::One(values.into_iter().next().unwrap_or_default()),
            _ => Accepted::AnyOf(values),
        };
        query = query.filter(field, accepted);
    }
    Ok(query)
}

fn print_outcome(outcome: Result<QueryOutcome, Error>) -> Result<(), Box<dyn std::error::Error>> {
    match outcome {
        Ok(outcome) => {
            println!("{}", outcome.report.text());
            Ok(())
        }
        Err(Error::Query(e)) => Err(format!("Invalid arguments: {e}").into()),
        Err(Error::Store(e)) => Err(format!("Records unavailable: {e}").into()),
        Err(other) => Err(other.into()),
    }
}
