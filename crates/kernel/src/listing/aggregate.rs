//! Aggregation reporter.
//!
//! Statistics are computed over the same filtered subset as the list:
//! - breakdowns (group-by-count ordered by key)
//! - top-N (group-by-count ordered by count, truncated)
//! - a trailing-window trend bucketed by local calendar day
//! - rates (`round(part / total × 100)`, 0 for an empty set)
//!
//! The SQL rendering lives in the query builder; this module holds the
//! declarations, the result shapes, and the in-memory evaluator used for
//! merged sets.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Serialize;
use serde_json::Value;

use super::filter::{as_timestamp, lookup, scalar_string};
use super::types::{Constraint, QueryContext};

/// Length of the trend window, in days before "now".
pub const TREND_WINDOW_DAYS: i64 = 30;

/// Default size of a top-N breakdown.
pub const DEFAULT_TOP_N: usize = 10;

/// Statistics block of a response, keyed by statistic name.
pub type Statistics = BTreeMap<String, StatValue>;

/// How group counts are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupOrder {
    /// Ascending by key.
    ByKey,
    /// Descending by count (ties by key), truncated.
    ByCountDesc { limit: usize },
}

/// What a statistic computes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatKind {
    Groups {
        field: &'static str,
        order: GroupOrder,
    },
    Trend { field: &'static str },
    Rate {
        field: &'static str,
        values: &'static [&'static str],
    },
}

/// One declared statistic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatSpec {
    pub name: &'static str,
    pub kind: StatKind,
}

impl StatSpec {
    /// Counts per value of `field`, ordered by value.
    pub fn breakdown(name: &'static str, field: &'static str) -> Self {
        Self {
            name,
            kind: StatKind::Groups {
                field,
                order: GroupOrder::ByKey,
            },
        }
    }

    /// The `limit` most frequent values of `field`.
    pub fn top(name: &'static str, field: &'static str, limit: usize) -> Self {
        Self {
            name,
            kind: StatKind::Groups {
                field,
                order: GroupOrder::ByCountDesc { limit },
            },
        }
    }

    /// Daily counts of timestamp `field` over the trailing window.
    pub fn trend(name: &'static str, field: &'static str) -> Self {
        Self {
            name,
            kind: StatKind::Trend { field },
        }
    }

    /// Percentage of records whose `field` is one of `values`.
    pub fn rate(name: &'static str, field: &'static str, values: &'static [&'static str]) -> Self {
        Self {
            name,
            kind: StatKind::Rate { field, values },
        }
    }

    /// Document path the statistic reads.
    pub fn field(&self) -> &'static str {
        match self.kind {
            StatKind::Groups { field, .. }
            | StatKind::Trend { field }
            | StatKind::Rate { field, .. } => field,
        }
    }
}

/// One `{_id, count}` group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    #[serde(rename = "_id")]
    pub key: Option<String>,
    pub count: u64,
}

/// Calendar day of a trend bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DayKey {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

/// One `{_id: {year, month, day}, count}` bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendBucket {
    #[serde(rename = "_id")]
    pub day: DayKey,
    pub count: u64,
}

/// Value of one statistic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StatValue {
    Groups(Vec<GroupCount>),
    Trend(Vec<TrendBucket>),
    Rate(u32),
}

/// `round(numerator / denominator × 100)`; 0 when the denominator is 0.
pub fn rate(numerator: u64, denominator: u64) -> u32 {
    if denominator == 0 {
        return 0;
    }
    let percent = (numerator as f64 / denominator as f64 * 100.0).round();
    percent.clamp(0.0, f64::from(u32::MAX)) as u32
}

/// Start of the trailing trend window.
pub fn window_start(ctx: &QueryContext) -> DateTime<Utc> {
    ctx.now - Duration::days(TREND_WINDOW_DAYS)
}

/// Order and truncate raw group counts.
pub fn order_groups(mut groups: Vec<GroupCount>, order: GroupOrder) -> Vec<GroupCount> {
    match order {
        GroupOrder::ByKey => groups.sort_by(|a, b| a.key.cmp(&b.key)),
        GroupOrder::ByCountDesc { limit } => {
            groups.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
            groups.truncate(limit);
        }
    }
    groups
}

/// Count documents per value of `field`.
pub fn group_counts(records: &[Value], field: &str, order: GroupOrder) -> Vec<GroupCount> {
    let mut counts: HashMap<Option<String>, u64> = HashMap::new();
    for record in records {
        let key = lookup(record, field).and_then(scalar_string);
        *counts.entry(key).or_default() += 1;
    }

    let groups = counts
        .into_iter()
        .map(|(key, count)| GroupCount { key, count })
        .collect();
    order_groups(groups, order)
}

/// Daily counts of `field` within the trailing window, oldest first.
/// Days without records are omitted.
pub fn trend(records: &[Value], field: &str, ctx: &QueryContext) -> Vec<TrendBucket> {
    let since = window_start(ctx);
    let mut buckets: BTreeMap<DayKey, u64> = BTreeMap::new();

    for ts in records
        .iter()
        .filter_map(|r| lookup(r, field).and_then(as_timestamp))
        .filter(|ts| *ts >= since && *ts <= ctx.now)
    {
        let local = ts.with_timezone(&ctx.offset);
        let day = DayKey {
            year: local.year(),
            month: local.month(),
            day: local.day(),
        };
        *buckets.entry(day).or_default() += 1;
    }

    buckets
        .into_iter()
        .map(|(day, count)| TrendBucket { day, count })
        .collect()
}

/// Evaluate declared statistics over an in-memory set.
pub fn report(records: &[Value], stats: &[StatSpec], ctx: &QueryContext) -> Statistics {
    stats
        .iter()
        .map(|stat| {
            let value = match stat.kind {
                StatKind::Groups { field, order } => {
                    StatValue::Groups(group_counts(records, field, order))
                }
                StatKind::Trend { field } => StatValue::Trend(trend(records, field, ctx)),
                StatKind::Rate { field, values } => {
                    let part = rate_constraint(field, values);
                    let matching = records.iter().filter(|r| part.matches(r)).count();
                    StatValue::Rate(rate(matching as u64, records.len() as u64))
                }
            };
            (stat.name.to_string(), value)
        })
        .collect()
}

/// The constraint selecting the numerator of a rate.
pub fn rate_constraint(field: &str, values: &[&str]) -> Constraint {
    Constraint::OneOf {
        field: field.to_string(),
        values: values.iter().map(|v| v.to_string()).collect(),
    }
}
