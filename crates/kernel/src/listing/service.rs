//! Listing service for executing list requests.
//!
//! Runs one request end to end against the document store:
//! compile the filter, resolve sort and pager, then fetch the page,
//! the total count and every declared statistic concurrently.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{FixedOffset, Utc};
use futures::future::try_join_all;
use serde_json::Value;
use sqlx::PgPool;

use super::aggregate::{
    DayKey, GroupCount, StatKind, StatSpec, StatValue, Statistics, TrendBucket, order_groups,
    rate, rate_constraint,
};
use super::filter::compile;
use super::pager::PageSpec;
use super::query_builder::ListingQueryBuilder;
use super::schema::ResourceSchema;
use super::sort::{self, SortSpec};
use super::types::{FilterSpec, ListingParams, ListingResult, QueryContext};

/// A statistic as fetched; rates still need the total.
enum StatOutcome {
    Ready(StatValue),
    RateOf(u64),
}

/// Service executing listing requests against Postgres.
pub struct ListingService {
    pool: PgPool,
    offset: FixedOffset,
}

impl ListingService {
    /// Create a new ListingService; `offset` fixes local day boundaries.
    pub fn new(pool: PgPool, offset: FixedOffset) -> Arc<Self> {
        Arc::new(Self { pool, offset })
    }

    /// Context for a request arriving now.
    pub fn context(&self) -> QueryContext {
        QueryContext::new(Utc::now(), self.offset)
    }

    /// Execute a list request for `schema`.
    pub async fn list(
        &self,
        schema: &ResourceSchema,
        params: &ListingParams,
    ) -> Result<ListingResult> {
        self.list_at(schema, params, &self.context()).await
    }

    /// Execute a list request at a fixed point in time.
    pub async fn list_at(
        &self,
        schema: &ResourceSchema,
        params: &ListingParams,
        ctx: &QueryContext,
    ) -> Result<ListingResult> {
        let errors = schema.validate();
        if !errors.is_empty() {
            anyhow::bail!(
                "invalid listing declaration for '{}': {}",
                schema.collection(),
                errors.join("; ")
            );
        }

        let filter = compile(schema, params, ctx);
        let sort = sort::resolve(params.get("sortBy"), params.get("sortOrder"), schema);
        let page = PageSpec::resolve(params.get("page"), params.get("limit"), schema.pager());

        tracing::debug!(
            collection = schema.collection(),
            constraints = filter.constraints().len(),
            sort = %sort.field,
            page = page.page,
            per_page = page.per_page,
            "executing listing"
        );

        let builder = ListingQueryBuilder::new(schema, &filter);
        let stat_queries = schema
            .stats()
            .iter()
            .map(|stat| self.fetch_stat(&builder, stat, ctx));

        let (total_items, data, outcomes) = tokio::try_join!(
            self.count(&builder),
            self.fetch_page(&builder, &sort, &page),
            try_join_all(stat_queries),
        )?;

        let statistics: Statistics = schema
            .stats()
            .iter()
            .zip(outcomes)
            .map(|(stat, outcome)| {
                let value = match outcome {
                    StatOutcome::Ready(value) => value,
                    StatOutcome::RateOf(part) => StatValue::Rate(rate(part, total_items)),
                };
                (stat.name.to_string(), value)
            })
            .collect();

        Ok(ListingResult::new(
            data,
            total_items,
            &page,
            statistics,
            filter,
        ))
    }

    async fn count(&self, builder: &ListingQueryBuilder<'_>) -> Result<u64> {
        let total: i64 = sqlx::query_scalar(&builder.build_count())
            .fetch_one(&self.pool)
            .await
            .context("failed to execute count query")?;
        Ok(total.max(0) as u64)
    }

    async fn fetch_page(
        &self,
        builder: &ListingQueryBuilder<'_>,
        sort: &SortSpec,
        page: &PageSpec,
    ) -> Result<Vec<Value>> {
        sqlx::query_scalar(&builder.build(sort, page))
            .fetch_all(&self.pool)
            .await
            .context("failed to execute page query")
    }

    async fn fetch_stat(
        &self,
        builder: &ListingQueryBuilder<'_>,
        stat: &StatSpec,
        ctx: &QueryContext,
    ) -> Result<StatOutcome> {
        match stat.kind {
            StatKind::Groups { field, order } => {
                let sql = builder.build_group_count(field, order);
                let rows: Vec<(Option<String>, i64)> = sqlx::query_as(&sql)
                    .fetch_all(&self.pool)
                    .await
                    .context(format!("failed to compute statistic '{}'", stat.name))?;
                let groups = rows
                    .into_iter()
                    .map(|(key, count)| GroupCount {
                        key,
                        count: count.max(0) as u64,
                    })
                    .collect();
                let ordered = order_groups(groups, order);
                Ok(StatOutcome::Ready(StatValue::Groups(ordered)))
            }
            StatKind::Trend { field } => {
                let sql = builder.build_trend(field, ctx);
                let rows: Vec<(i32, i32, i32, i64)> = sqlx::query_as(&sql)
                    .fetch_all(&self.pool)
                    .await
                    .context(format!("failed to compute statistic '{}'", stat.name))?;
                let buckets = rows
                    .into_iter()
                    .map(|(year, month, day, count)| TrendBucket {
                        day: DayKey {
                            year,
                            month: month.max(0) as u32,
                            day: day.max(0) as u32,
                        },
                        count: count.max(0) as u64,
                    })
                    .collect();
                Ok(StatOutcome::Ready(StatValue::Trend(buckets)))
            }
            StatKind::Rate { field, values } => {
                let sql = builder.build_count_where(&rate_constraint(field, values));
                let part: i64 = sqlx::query_scalar(&sql)
                    .fetch_one(&self.pool)
                    .await
                    .context(format!("failed to compute statistic '{}'", stat.name))?;
                Ok(StatOutcome::RateOf(part.max(0) as u64))
            }
        }
    }
}

/// Fetch every document of `schema` matching `filter`, in `sort` order.
pub async fn fetch_documents(
    pool: &PgPool,
    schema: &ResourceSchema,
    filter: &FilterSpec,
    sort: &SortSpec,
) -> Result<Vec<Value>> {
    let sql = ListingQueryBuilder::new(schema, filter).build_all(sort);
    sqlx::query_scalar(&sql)
        .fetch_all(pool)
        .await
        .context(format!("failed to fetch from '{}'", schema.collection()))
}
