//! Listing query builder using SeaQuery.
//!
//! Renders a compiled [`FilterSpec`] against a document collection
//! (`id uuid`, `doc jsonb`) with support for:
//! - JSONB path extraction (dotted paths)
//! - Case-insensitive search across scalar and list fields
//! - Priority-rank ordering
//! - Count, group-by, trend and rate statistics
//! - Pagination

use sea_query::{
    Alias, Asterisk, Cond, Expr, Order, PostgresQueryBuilder, Query, SelectStatement, SimpleExpr,
};

use super::aggregate::{GroupOrder, window_start};
use super::pager::PageSpec;
use super::schema::ResourceSchema;
use super::sort::{Priority, SortDirection, SortSpec};
use super::types::{Constraint, FilterSpec, QueryContext, SearchField};

/// Column holding the document body.
const DOC_COLUMN: &str = "doc";

/// Query builder for one resource and one compiled filter.
pub struct ListingQueryBuilder<'a> {
    schema: &'a ResourceSchema,
    filter: &'a FilterSpec,
}

impl<'a> ListingQueryBuilder<'a> {
    pub fn new(schema: &'a ResourceSchema, filter: &'a FilterSpec) -> Self {
        Self { schema, filter }
    }

    /// Build the page query. Each row is one JSON document with `_id`.
    pub fn build(&self, sort: &SortSpec, page: &PageSpec) -> String {
        let mut query = self.select_documents();
        self.add_sorts(&mut query, sort);

        query.limit(u64::from(page.per_page));
        query.offset(page.skip());

        query.to_string(PostgresQueryBuilder)
    }

    /// Build an unpaged query over every matching document.
    pub fn build_all(&self, sort: &SortSpec) -> String {
        let mut query = self.select_documents();
        self.add_sorts(&mut query, sort);
        query.to_string(PostgresQueryBuilder)
    }

    /// Build a COUNT query for total results.
    pub fn build_count(&self) -> String {
        self.count_statement().to_string(PostgresQueryBuilder)
    }

    /// Build a COUNT query restricted further by `extra`.
    pub fn build_count_where(&self, extra: &Constraint) -> String {
        let mut query = self.count_statement();
        query.and_where(constraint_expr(extra));
        query.to_string(PostgresQueryBuilder)
    }

    /// Build a group-by-count query over `field`.
    ///
    /// Rows: `(group_key text, group_count bigint)`.
    pub fn build_group_count(&self, field: &str, order: GroupOrder) -> String {
        let key = jsonb_text(field);
        let mut query = Query::select();
        query
            .expr_as(Expr::cust(key.clone()), Alias::new("group_key"))
            .expr_as(Expr::col(Asterisk).count(), Alias::new("group_count"))
            .from(Alias::new(self.schema.collection()));
        self.add_filters(&mut query);
        query.add_group_by([Expr::cust(key.clone())]);

        match order {
            GroupOrder::ByKey => {
                query.order_by_expr(Expr::cust("group_key"), Order::Asc);
            }
            GroupOrder::ByCountDesc { limit } => {
                query
                    .order_by_expr(Expr::cust("group_count"), Order::Desc)
                    .order_by_expr(Expr::cust(format!("({key} IS NOT NULL)")), Order::Asc)
                    .order_by_expr(Expr::cust(format!("({key}) COLLATE \"C\"")), Order::Asc)
                    .limit(limit as u64);
            }
        }

        query.to_string(PostgresQueryBuilder)
    }

    /// Build a daily trend query over timestamp `field` for the trailing
    /// window ending at `ctx.now`, bucketed at `ctx.offset`.
    ///
    /// Rows: `(bucket_year int4, bucket_month int4, bucket_day int4,
    /// bucket_count bigint)`.
    pub fn build_trend(&self, field: &str, ctx: &QueryContext) -> String {
        let ts = timestamp_expr(field);
        let local = format!("({ts} AT TIME ZONE INTERVAL '{}')", ctx.offset);

        let mut query = Query::select();
        for (part, alias) in [
            ("YEAR", "bucket_year"),
            ("MONTH", "bucket_month"),
            ("DAY", "bucket_day"),
        ] {
            query.expr_as(
                Expr::cust(format!("EXTRACT({part} FROM {local})::int4")),
                Alias::new(alias),
            );
        }
        query
            .expr_as(Expr::col(Asterisk).count(), Alias::new("bucket_count"))
            .from(Alias::new(self.schema.collection()));
        self.add_filters(&mut query);
        query
            .and_where(Expr::cust_with_values(
                format!("{ts} >= $1::timestamptz"),
                [window_start(ctx).to_rfc3339()],
            ))
            .and_where(Expr::cust_with_values(
                format!("{ts} <= $1::timestamptz"),
                [ctx.now.to_rfc3339()],
            ));
        query.add_group_by([
            Expr::cust("bucket_year"),
            Expr::cust("bucket_month"),
            Expr::cust("bucket_day"),
        ]);
        for alias in ["bucket_year", "bucket_month", "bucket_day"] {
            query.order_by_expr(Expr::cust(alias), Order::Asc);
        }

        query.to_string(PostgresQueryBuilder)
    }

    fn select_documents(&self) -> SelectStatement {
        let mut query = Query::select();
        query
            .expr_as(
                Expr::cust(format!("{DOC_COLUMN} || jsonb_build_object('_id', id)")),
                Alias::new("record"),
            )
            .from(Alias::new(self.schema.collection()));
        self.add_filters(&mut query);
        query
    }

    fn count_statement(&self) -> SelectStatement {
        let mut query = Query::select();
        query
            .expr(Expr::col(Asterisk).count())
            .from(Alias::new(self.schema.collection()));
        self.add_filters(&mut query);
        query
    }

    /// Add WHERE conditions from the compiled filter.
    fn add_filters(&self, query: &mut SelectStatement) {
        for constraint in self.filter.constraints() {
            query.and_where(constraint_expr(constraint));
        }
    }

    /// Add ORDER BY clauses; always ends with `id` so ties are stable.
    fn add_sorts(&self, query: &mut SelectStatement, sort: &SortSpec) {
        let order = match sort.direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        };

        match sort.tiebreak {
            Some(ref tiebreak) => {
                query.order_by_expr(Expr::cust(rank_case(&sort.field)), order);
                order_by_text(query, tiebreak, Order::Asc);
            }
            None => order_by_text(query, &sort.field, order),
        }

        query.order_by(Alias::new("id"), Order::Asc);
    }
}

/// Order by a text path the way the in-memory comparator does: absent
/// values before present ones when ascending, byte-wise string order.
fn order_by_text(query: &mut SelectStatement, path: &str, order: Order) {
    let text = jsonb_text(path);
    query
        .order_by_expr(Expr::cust(format!("({text} IS NOT NULL)")), order.clone())
        .order_by_expr(Expr::cust(format!("({text}) COLLATE \"C\"")), order);
}

/// Render one constraint as a WHERE expression.
fn constraint_expr(constraint: &Constraint) -> SimpleExpr {
    match constraint {
        Constraint::Equals { field, value } => {
            Expr::cust_with_values(format!("{} = $1", jsonb_text(field)), [value.clone()])
        }
        Constraint::OneOf { field, values } => {
            Expr::expr(Expr::cust(jsonb_text(field))).is_in(values.iter().cloned())
        }
        Constraint::Search { pattern, fields } => {
            let like = format!("%{}%", escape_like_wildcards(pattern));
            let mut any = Cond::any();
            for field in fields {
                any = any.add(search_expr(field, &like));
            }
            any.into()
        }
        Constraint::DateRange { field, from, to } => {
            let ts = timestamp_expr(field);
            let mut all = Cond::all();
            if let Some(from) = from {
                all = all.add(Expr::cust_with_values(
                    format!("{ts} >= $1::timestamptz"),
                    [from.to_rfc3339()],
                ));
            }
            if let Some(to) = to {
                all = all.add(Expr::cust_with_values(
                    format!("{ts} <= $1::timestamptz"),
                    [to.to_rfc3339()],
                ));
            }
            all.into()
        }
        Constraint::Boolean { field, value } => {
            Expr::cust(format!("{} = '{value}'::jsonb", jsonb_value(field)))
        }
    }
}

fn search_expr(field: &SearchField, like: &str) -> SimpleExpr {
    if field.list {
        let json = jsonb_value(&field.path);
        Expr::cust_with_values(
            format!(
                "EXISTS (SELECT 1 FROM jsonb_array_elements_text(\
                 CASE WHEN jsonb_typeof({json}) = 'array' THEN {json} ELSE '[]'::jsonb END\
                 ) AS elem(value) WHERE elem.value ILIKE $1)"
            ),
            [like.to_string()],
        )
    } else {
        Expr::cust_with_values(
            format!("{} ILIKE $1", jsonb_text(&field.path)),
            [like.to_string()],
        )
    }
}

/// `CASE` mapping the priority vocabulary onto its rank.
fn rank_case(field: &str) -> String {
    let arms: Vec<String> = Priority::ALL
        .iter()
        .map(|p| format!("WHEN '{}' THEN {}", p.as_str(), p.rank()))
        .collect();
    format!(
        "CASE {} {} ELSE {} END",
        jsonb_text(field),
        arms.join(" "),
        Priority::UNRANKED
    )
}

/// Quote a path segment as a SQL string literal.
fn quote_segment(segment: &str) -> String {
    format!("'{}'", segment.replace('\'', "''"))
}

/// Text extraction of a document path:
/// `doc->>'status'`, `(doc->'dateTime'->>'scheduled')`.
fn jsonb_text(path: &str) -> String {
    let parts: Vec<&str> = path.split('.').collect();
    match parts.split_last() {
        Some((last, [])) => format!("{DOC_COLUMN}->>{}", quote_segment(last)),
        Some((last, parents)) => {
            let mut expr = DOC_COLUMN.to_string();
            for parent in parents {
                expr = format!("{expr}->{}", quote_segment(parent));
            }
            format!("({expr}->>{})", quote_segment(last))
        }
        None => DOC_COLUMN.to_string(),
    }
}

/// JSONB extraction of a document path: `(doc->'tags')`.
fn jsonb_value(path: &str) -> String {
    let mut expr = DOC_COLUMN.to_string();
    for segment in path.split('.') {
        expr = format!("{expr}->{}", quote_segment(segment));
    }
    format!("({expr})")
}

/// Timestamp of a document path; NULL unless the text is RFC 3339.
fn timestamp_expr(path: &str) -> String {
    format!("doc_timestamptz({})", jsonb_text(path))
}

/// Escape SQL LIKE wildcard characters (`%`, `_`, `\`) in a value.
fn escape_like_wildcards(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
