use diesel::prelude::*;
use diesel::sql_types::{Double, Nullable, Text};

use crate::chat::format::{chart_table, format_money, grouped_summary};
use crate::shared::error::ServiceError;
use crate::shared::models::ChartTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalesIntent {
    TotalSales,
    SalesByLocation,
    SalesByProduct,
    SalesByDay,
    SalesByMonth,
    SalesByYear,
}

/// Phrases are tested in this order; the first containment match wins.
pub const INTENT_PHRASES: [(&str, SalesIntent); 6] = [
    ("total sales", SalesIntent::TotalSales),
    ("sales by location", SalesIntent::SalesByLocation),
    ("sales by product", SalesIntent::SalesByProduct),
    ("sales by day", SalesIntent::SalesByDay),
    ("sales by month", SalesIntent::SalesByMonth),
    ("sales by year", SalesIntent::SalesByYear),
];

pub const HELP_MESSAGE: &str = "I can only answer questions related to 'total sales', \
'sales by location', 'sales by product', or 'sales by day/month/year' for now.";

pub fn classify(question: &str) -> Option<SalesIntent> {
    let normalized = question.to_lowercase();
    INTENT_PHRASES
        .iter()
        .find(|(phrase, _)| normalized.contains(phrase))
        .map(|(_, intent)| *intent)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SalesReport {
    pub summary: String,
    pub chart: Option<ChartTable>,
}

#[derive(QueryableByName)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct SumRow {
    #[diesel(sql_type = Nullable<Double>)]
    total: Option<f64>,
}

#[derive(QueryableByName)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct GroupedRow {
    #[diesel(sql_type = Text)]
    label: String,
    #[diesel(sql_type = Double)]
    total: f64,
}

pub fn answer(conn: &mut PgConnection, question: &str) -> Result<SalesReport, ServiceError> {
    match classify(question) {
        Some(intent) => run_intent(conn, intent),
        None => Ok(SalesReport {
            summary: HELP_MESSAGE.to_string(),
            chart: None,
        }),
    }
}

pub fn run_intent(
    conn: &mut PgConnection,
    intent: SalesIntent,
) -> Result<SalesReport, ServiceError> {
    if intent == SalesIntent::TotalSales {
        let row: SumRow = diesel::sql_query("SELECT SUM(sale_amount)::float8 AS total FROM sales")
            .get_result(conn)?;
        return Ok(SalesReport {
            summary: format!(
                "Total sales amount is {}",
                format_money(row.total.unwrap_or(0.0))
            ),
            chart: None,
        });
    }

    let (sql, header, label_column) = grouped_query(intent);
    let rows: Vec<GroupedRow> = diesel::sql_query(sql).load(conn)?;
    let pairs: Vec<(String, f64)> = rows.into_iter().map(|r| (r.label, r.total)).collect();
    Ok(SalesReport {
        summary: grouped_summary(header, &pairs),
        chart: chart_table(label_column, "Total Sales", &pairs),
    })
}

/// Date granularities order by the truncated date ascending; location and
/// product order by label so replies are deterministic.
fn grouped_query(intent: SalesIntent) -> (&'static str, &'static str, &'static str) {
    match intent {
        SalesIntent::SalesByLocation => (
            "SELECT location AS label, SUM(sale_amount)::float8 AS total \
             FROM sales GROUP BY location ORDER BY location",
            "Sales by location:",
            "Location",
        ),
        SalesIntent::SalesByProduct => (
            "SELECT product_id::text AS label, SUM(sale_amount)::float8 AS total \
             FROM sales GROUP BY product_id ORDER BY label",
            "Sales by product:",
            "Product ID",
        ),
        SalesIntent::SalesByDay => (
            "SELECT TO_CHAR(sale_date, 'YYYY-MM-DD') AS label, SUM(sale_amount)::float8 AS total \
             FROM sales GROUP BY sale_date ORDER BY sale_date",
            "Sales by day:",
            "Sale Date",
        ),
        SalesIntent::SalesByMonth => (
            "SELECT TO_CHAR(sale_date, 'YYYY-MM') AS label, SUM(sale_amount)::float8 AS total \
             FROM sales GROUP BY TO_CHAR(sale_date, 'YYYY-MM') ORDER BY label",
            "Sales by month:",
            "Month",
        ),
        SalesIntent::SalesByYear => (
            "SELECT TO_CHAR(sale_date, 'YYYY') AS label, SUM(sale_amount)::float8 AS total \
             FROM sales GROUP BY TO_CHAR(sale_date, 'YYYY') ORDER BY label",
            "Sales by year:",
            "Year",
        ),
        SalesIntent::TotalSales => unreachable!("total sales is not a grouped intent"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::test_util;

    #[test]
    fn recognizes_each_phrase() {
        test_util::setup();
        assert_eq!(classify("total sales"), Some(SalesIntent::TotalSales));
        assert_eq!(
            classify("sales by location"),
            Some(SalesIntent::SalesByLocation)
        );
        assert_eq!(
            classify("sales by product"),
            Some(SalesIntent::SalesByProduct)
        );
        assert_eq!(classify("sales by day"), Some(SalesIntent::SalesByDay));
        assert_eq!(classify("sales by month"), Some(SalesIntent::SalesByMonth));
        assert_eq!(classify("sales by year"), Some(SalesIntent::SalesByYear));
    }

    #[test]
    fn classification_is_case_insensitive() {
        test_util::setup();
        assert_eq!(
            classify("Total sales please"),
            Some(SalesIntent::TotalSales)
        );
        assert_eq!(
            classify("WHAT ARE SALES BY YEAR"),
            Some(SalesIntent::SalesByYear)
        );
    }

    #[test]
    fn matches_phrases_anywhere_in_the_question() {
        test_util::setup();
        assert_eq!(
            classify("could you show sales by location for me"),
            Some(SalesIntent::SalesByLocation)
        );
    }

    #[test]
    fn first_table_entry_wins_on_ties() {
        test_util::setup();
        assert_eq!(
            classify("total sales and sales by location"),
            Some(SalesIntent::TotalSales)
        );
        assert_eq!(
            classify("sales by location then sales by year"),
            Some(SalesIntent::SalesByLocation)
        );
    }

    #[test]
    fn unrecognized_questions_classify_to_none() {
        test_util::setup();
        assert_eq!(classify("what is the weather today"), None);
        assert_eq!(classify("sales"), None);
        assert_eq!(classify("sales by customer"), None);
    }

    #[test]
    fn every_intent_has_exactly_one_table_entry() {
        test_util::setup();
        let intents = [
            SalesIntent::TotalSales,
            SalesIntent::SalesByLocation,
            SalesIntent::SalesByProduct,
            SalesIntent::SalesByDay,
            SalesIntent::SalesByMonth,
            SalesIntent::SalesByYear,
        ];
        for intent in intents {
            let count = INTENT_PHRASES
                .iter()
                .filter(|(_, mapped)| *mapped == intent)
                .count();
            assert_eq!(count, 1, "{intent:?}");
        }
    }

    #[test]
    fn grouped_queries_name_their_chart_columns() {
        test_util::setup();
        let (_, header, label) = grouped_query(SalesIntent::SalesByLocation);
        assert_eq!(header, "Sales by location:");
        assert_eq!(label, "Location");
        let (_, header, label) = grouped_query(SalesIntent::SalesByMonth);
        assert_eq!(header, "Sales by month:");
        assert_eq!(label, "Month");
    }
}
