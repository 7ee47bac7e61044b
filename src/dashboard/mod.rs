use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_builder::{BoxedSqlQuery, SqlQuery};
use diesel::sql_types::{BigInt, Date, Double, Nullable, Text};
use serde::{Deserialize, Serialize};

use crate::shared::error::ServiceError;
use crate::shared::models::schema::sales;
use crate::shared::models::{ChartRow, ChartTable, Sale};
use crate::shared::state::AppState;

/// Optional dashboard filters; `locations` and `products` are comma-separated
/// lists.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub locations: Option<String>,
    pub products: Option<String>,
    pub view_by: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub total_sales: f64,
    pub unique_locations: i64,
    pub expected_revenue: f64,
}

#[derive(QueryableByName)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct TotalRow {
    #[diesel(sql_type = Double)]
    total: f64,
}

#[derive(QueryableByName)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    count: i64,
}

#[derive(QueryableByName)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct GroupedRow {
    #[diesel(sql_type = Text)]
    label: String,
    #[diesel(sql_type = Double)]
    total: f64,
}

/// Every dashboard statement carries the same four filter binds so each
/// endpoint stays a single parameterized query.
const SALES_FILTER: &str = "($1::date IS NULL OR sale_date >= $1) \
 AND ($2::date IS NULL OR sale_date <= $2) \
 AND ($3 = '' OR location = ANY(string_to_array($3, ','))) \
 AND ($4 = '' OR product_id::text = ANY(string_to_array($4, ',')))";

fn filtered(sql: &str, q: &DashboardQuery) -> BoxedSqlQuery<'static, Pg, SqlQuery> {
    diesel::sql_query(sql.to_string())
        .into_boxed()
        .bind::<Nullable<Date>, _>(q.start_date)
        .bind::<Nullable<Date>, _>(q.end_date)
        .bind::<Text, _>(q.locations.clone().unwrap_or_default())
        .bind::<Text, _>(q.products.clone().unwrap_or_default())
}

pub fn period_query(view_by: &str) -> Option<(String, &'static str)> {
    let (label_expr, group_order, label_column) = match view_by.to_lowercase().as_str() {
        "day" => (
            "TO_CHAR(sale_date, 'YYYY-MM-DD')",
            "GROUP BY sale_date ORDER BY sale_date",
            "Sale Date",
        ),
        "month" => (
            "TO_CHAR(sale_date, 'YYYY-MM')",
            "GROUP BY TO_CHAR(sale_date, 'YYYY-MM') ORDER BY label",
            "Month",
        ),
        "year" => (
            "TO_CHAR(sale_date, 'YYYY')",
            "GROUP BY TO_CHAR(sale_date, 'YYYY') ORDER BY label",
            "Year",
        ),
        _ => return None,
    };
    let sql = format!(
        "SELECT {label_expr} AS label, SUM(sale_amount)::float8 AS total \
         FROM sales WHERE {SALES_FILTER} {group_order}"
    );
    Some((sql, label_column))
}

fn series(label_column: &str, value_column: &str, rows: Vec<GroupedRow>) -> ChartTable {
    ChartTable {
        label_column: label_column.to_string(),
        value_column: value_column.to_string(),
        rows: rows
            .into_iter()
            .map(|r| ChartRow {
                label: r.label,
                value: r.total,
            })
            .collect(),
    }
}

async fn run_grouped(
    state: &AppState,
    sql: String,
    q: DashboardQuery,
) -> Result<Vec<GroupedRow>, ServiceError> {
    let pool = state.conn.clone();
    tokio::task::spawn_blocking(move || -> Result<Vec<GroupedRow>, ServiceError> {
        let mut conn = pool.get()?;
        Ok(filtered(&sql, &q).load(&mut conn)?)
    })
    .await
    .map_err(|e| ServiceError::Internal(format!("query task failed: {e}")))?
}

pub fn configure_dashboard_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/dashboard/metrics", get(handle_metrics))
        .route("/api/dashboard/sales", get(handle_sales_series))
        .route("/api/dashboard/locations", get(handle_sales_by_location))
        .route("/api/dashboard/top-products", get(handle_top_products))
        .route("/api/dashboard/channels", get(handle_sales_by_channel))
        .route(
            "/api/dashboard/demographics/gender",
            get(handle_sales_by_gender),
        )
        .route("/api/dashboard/demographics/age", get(handle_sales_by_age))
        .route("/api/dashboard/sales/recent", get(handle_recent_sales))
}

/// GET /api/dashboard/metrics - metric cards
async fn handle_metrics(
    State(state): State<Arc<AppState>>,
    Query(q): Query<DashboardQuery>,
) -> Result<Json<MetricsResponse>, ServiceError> {
    let pool = state.conn.clone();
    let (total, unique_locations) = tokio::task::spawn_blocking(
        move || -> Result<(f64, i64), ServiceError> {
            let mut conn = pool.get()?;
            let total_sql = format!(
                "SELECT COALESCE(SUM(sale_amount), 0)::float8 AS total FROM sales WHERE {SALES_FILTER}"
            );
            let total: TotalRow = filtered(&total_sql, &q).get_result(&mut conn)?;
            let count_sql = format!(
                "SELECT COUNT(DISTINCT location) AS count FROM sales WHERE {SALES_FILTER}"
            );
            let count: CountRow = filtered(&count_sql, &q).get_result(&mut conn)?;
            Ok((total.total, count.count))
        },
    )
    .await
    .map_err(|e| ServiceError::Internal(format!("query task failed: {e}")))??;

    Ok(Json(MetricsResponse {
        total_sales: total,
        unique_locations,
        expected_revenue: total,
    }))
}

/// GET /api/dashboard/sales?view_by=day|month|year - sales over time
async fn handle_sales_series(
    State(state): State<Arc<AppState>>,
    Query(q): Query<DashboardQuery>,
) -> Result<Json<ChartTable>, ServiceError> {
    let view_by = q.view_by.clone().unwrap_or_else(|| "day".to_string());
    let (sql, label_column) = period_query(&view_by)
        .ok_or_else(|| ServiceError::validation("view_by must be day, month, or year"))?;
    let rows = run_grouped(&state, sql, q).await?;
    Ok(Json(series(label_column, "Total Sales", rows)))
}

/// GET /api/dashboard/locations - sales totals per location
async fn handle_sales_by_location(
    State(state): State<Arc<AppState>>,
    Query(q): Query<DashboardQuery>,
) -> Result<Json<ChartTable>, ServiceError> {
    let sql = format!(
        "SELECT location AS label, SUM(sale_amount)::float8 AS total \
         FROM sales WHERE {SALES_FILTER} GROUP BY location ORDER BY location"
    );
    let rows = run_grouped(&state, sql, q).await?;
    Ok(Json(series("Location", "Total Sales", rows)))
}

/// GET /api/dashboard/top-products - quantity sold per product, largest first
async fn handle_top_products(
    State(state): State<Arc<AppState>>,
    Query(q): Query<DashboardQuery>,
) -> Result<Json<ChartTable>, ServiceError> {
    let sql = format!(
        "SELECT product_id::text AS label, SUM(quantity)::float8 AS total \
         FROM sales WHERE {SALES_FILTER} GROUP BY product_id ORDER BY total DESC"
    );
    let rows = run_grouped(&state, sql, q).await?;
    Ok(Json(series("Product ID", "Quantity Sold", rows)))
}

/// GET /api/dashboard/channels - sales split by sale channel
async fn handle_sales_by_channel(
    State(state): State<Arc<AppState>>,
    Query(q): Query<DashboardQuery>,
) -> Result<Json<ChartTable>, ServiceError> {
    let sql = format!(
        "SELECT sale_channel AS label, SUM(sale_amount)::float8 AS total \
         FROM sales WHERE {SALES_FILTER} GROUP BY sale_channel ORDER BY sale_channel"
    );
    let rows = run_grouped(&state, sql, q).await?;
    Ok(Json(series("Sale Channel", "Total Sales", rows)))
}

/// GET /api/dashboard/demographics/gender
async fn handle_sales_by_gender(
    State(state): State<Arc<AppState>>,
    Query(q): Query<DashboardQuery>,
) -> Result<Json<ChartTable>, ServiceError> {
    let sql = format!(
        "SELECT customer_gender AS label, SUM(sale_amount)::float8 AS total \
         FROM sales WHERE {SALES_FILTER} GROUP BY customer_gender ORDER BY customer_gender"
    );
    let rows = run_grouped(&state, sql, q).await?;
    Ok(Json(series("Customer Gender", "Total Sales", rows)))
}

/// GET /api/dashboard/demographics/age
async fn handle_sales_by_age(
    State(state): State<Arc<AppState>>,
    Query(q): Query<DashboardQuery>,
) -> Result<Json<ChartTable>, ServiceError> {
    let sql = format!(
        "SELECT customer_age::text AS label, SUM(sale_amount)::float8 AS total \
         FROM sales WHERE {SALES_FILTER} GROUP BY customer_age ORDER BY customer_age"
    );
    let rows = run_grouped(&state, sql, q).await?;
    Ok(Json(series("Customer Age", "Total Sales", rows)))
}

/// GET /api/dashboard/sales/recent - latest raw sales rows
async fn handle_recent_sales(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Sale>>, ServiceError> {
    let pool = state.conn.clone();
    let rows = tokio::task::spawn_blocking(move || -> Result<Vec<Sale>, ServiceError> {
        let mut conn = pool.get()?;
        Ok(sales::table
            .order(sales::sale_date.desc())
            .limit(100)
            .load(&mut conn)?)
    })
    .await
    .map_err(|e| ServiceError::Internal(format!("query task failed: {e}")))??;
    Ok(Json(rows))
}
