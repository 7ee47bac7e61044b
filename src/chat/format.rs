use num_format::{Locale, ToFormattedString};

use crate::shared::models::{ChartRow, ChartTable};

/// Renders an amount as "$1,234.50": two decimals, thousands separators.
pub fn format_money(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let whole = cents / 100;
    let frac = (cents % 100).abs();
    format!("${}.{:02}", whole.to_formatted_string(&Locale::en), frac)
}

/// Header line plus one "- {label}: ${amount}" line per row. An empty result
/// set yields the header line alone.
pub fn grouped_summary(header: &str, rows: &[(String, f64)]) -> String {
    let mut text = String::from(header);
    for (label, amount) in rows {
        text.push('\n');
        text.push_str(&format!("- {}: {}", label, format_money(*amount)));
    }
    text
}

/// Chart payload for a grouped result; empty result sets produce no chart.
pub fn chart_table(
    label_column: &str,
    value_column: &str,
    rows: &[(String, f64)],
) -> Option<ChartTable> {
    if rows.is_empty() {
        return None;
    }
    Some(ChartTable {
        label_column: label_column.to_string(),
        value_column: value_column.to_string(),
        rows: rows
            .iter()
            .map(|(label, value)| ChartRow {
                label: label.clone(),
                value: *value,
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::test_util;

    #[test]
    fn formats_with_thousands_separator_and_two_decimals() {
        test_util::setup();
        assert_eq!(format_money(1234.5), "$1,234.50");
        assert_eq!(format_money(3.0), "$3.00");
        assert_eq!(format_money(0.0), "$0.00");
        assert_eq!(format_money(1_234_567.891), "$1,234,567.89");
    }

    #[test]
    fn rounding_carries_into_the_whole_part() {
        test_util::setup();
        assert_eq!(format_money(0.999), "$1.00");
        assert_eq!(format_money(999.995), "$1,000.00");
    }

    #[test]
    fn grouped_summary_lists_one_line_per_row() {
        test_util::setup();
        let rows = vec![("A".to_string(), 15.0), ("B".to_string(), 3.0)];
        let text = grouped_summary("Sales by location:", &rows);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec!["Sales by location:", "- A: $15.00", "- B: $3.00"]
        );
    }

    #[test]
    fn empty_rows_yield_header_only() {
        test_util::setup();
        let text = grouped_summary("Sales by location:", &[]);
        assert_eq!(text, "Sales by location:");
        assert!(chart_table("Location", "Total Sales", &[]).is_none());
    }

    #[test]
    fn chart_table_carries_grouping_column_names() {
        test_util::setup();
        let rows = vec![("A".to_string(), 15.0), ("B".to_string(), 3.0)];
        let table = chart_table("Location", "Total Sales", &rows).expect("chart");
        assert_eq!(table.label_column, "Location");
        assert_eq!(table.value_column, "Total Sales");
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].label, "A");
        assert_eq!(table.rows[0].value, 15.0);
    }
}
