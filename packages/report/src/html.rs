//! HTML table serializer for the document renderer.
//!
//! Output follows the `dataframe` table markup the renderer's templates are
//! styled for: a `thead` with one `th` per column, a `tbody` of `td` cells,
//! and no index column.

use incident_report_models::{PoliceDivisionRow, ReportTable};

/// Separator placed between concatenated tables.
pub const SECTION_SEPARATOR: &str = "<br><br><br><br>";

const TABLE_OPEN: &str = "<table border=\"1\" class=\"dataframe\">\n";
const TABLE_CLOSE: &str = "</table>";

/// Police-division report headers: index columns, then value columns.
const POLICE_DIVISION_INDEX: [&str; 3] = ["Province", "DI Division", "Police Division"];
const POLICE_DIVISION_COLUMNS: [&str; 7] = [
    "Police Stations Count",
    "Incidents Received",
    "Incidents Pending",
    "Incidents Closed",
    "Other",
    "Total Count",
    "Province Total",
];

/// Escapes text for use in element content.
#[must_use]
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn header_row<'a>(headers: impl IntoIterator<Item = &'a str>) -> String {
    let mut html = String::from("  <thead>\n    <tr style=\"text-align: right;\">\n");
    for header in headers {
        html.push_str(&format!("      <th>{}</th>\n", html_escape(header)));
    }
    html.push_str("    </tr>\n  </thead>\n");
    html
}

fn cell(value: &str) -> String {
    format!("      <td>{value}</td>\n")
}

/// Serializes one table, with its title as a caption when set.
#[must_use]
pub fn table_to_html(table: &ReportTable) -> String {
    let mut html = String::from(TABLE_OPEN);

    if let Some(title) = &table.title {
        html.push_str(&format!("  <caption>{}</caption>\n", html_escape(title)));
    }

    let headers = std::iter::once(table.label_header.as_str())
        .chain(table.columns.iter().map(String::as_str));
    html.push_str(&header_row(headers));

    html.push_str("  <tbody>\n");
    for row in &table.rows {
        html.push_str("    <tr>\n");
        html.push_str(&cell(&html_escape(&row.label)));
        for value in &row.values {
            html.push_str(&cell(&value.to_string()));
        }
        html.push_str("    </tr>\n");
    }
    html.push_str("  </tbody>\n");

    html.push_str(TABLE_CLOSE);
    html
}

/// Serializes several tables joined by [`SECTION_SEPARATOR`].
#[must_use]
pub fn tables_to_html(tables: &[ReportTable]) -> String {
    tables
        .iter()
        .map(table_to_html)
        .collect::<Vec<_>>()
        .join(SECTION_SEPARATOR)
}

/// Serializes the police-division report with its province / DI division /
/// police division index columns.
#[must_use]
pub fn police_division_to_html(rows: &[PoliceDivisionRow]) -> String {
    let mut html = String::from(TABLE_OPEN);
    html.push_str(&header_row(
        POLICE_DIVISION_INDEX
            .into_iter()
            .chain(POLICE_DIVISION_COLUMNS),
    ));

    html.push_str("  <tbody>\n");
    for row in rows {
        html.push_str("    <tr>\n");
        for index in [&row.province, &row.di_division, &row.police_division] {
            html.push_str(&format!(
                "      <th>{}</th>\n",
                html_escape(index.as_deref().unwrap_or_default())
            ));
        }
        for value in [
            row.police_station_count,
            row.division_total,
            row.open_total,
            row.closed_total,
            row.division_total - row.open_total - row.closed_total,
            row.division_total,
            row.province_total,
        ] {
            html.push_str(&cell(&value.to_string()));
        }
        html.push_str("    </tr>\n");
    }
    html.push_str("  </tbody>\n");

    html.push_str(TABLE_CLOSE);
    html
}

#[cfg(test)]
mod tests {
    use incident_report_models::{ReportRow, TOTAL_COLUMN, TOTAL_ROW_LABEL};

    use super::*;

    fn sample() -> ReportTable {
        let mut table = ReportTable::new("Category", vec![TOTAL_COLUMN.to_string()]);
        table.rows.push(ReportRow::data("Violence <armed>", vec![3]));
        table.rows.push(ReportRow::total(TOTAL_ROW_LABEL, vec![3]));
        table
    }

    #[test]
    fn renders_header_and_escaped_rows() {
        let html = table_to_html(&sample());

        assert!(html.starts_with("<table border=\"1\" class=\"dataframe\">"));
        assert!(html.contains("<th>Category</th>"));
        assert!(html.contains("<th>Total</th>"));
        assert!(html.contains("<td>Violence &lt;armed&gt;</td>"));
        assert!(html.contains("<td>(Total No. of Incidents)</td>"));
        assert!(!html.contains("<caption>"));
        assert!(html.ends_with("</table>"));
    }

    #[test]
    fn joins_sections_with_separator() {
        let tables = vec![sample().with_title("A"), sample().with_title("B")];
        let html = tables_to_html(&tables);

        assert_eq!(html.matches(SECTION_SEPARATOR).count(), 1);
        assert!(html.contains("<caption>A</caption>"));
        assert!(html.contains("<caption>B</caption>"));
    }

    #[test]
    fn police_division_rows_carry_index_cells() {
        let rows = vec![PoliceDivisionRow {
            province: Some("Western".to_string()),
            di_division: Some("Colombo".to_string()),
            police_division: None,
            police_station_count: 2,
            division_total: 5,
            open_total: 1,
            closed_total: 3,
            province_total: 9,
        }];
        let html = police_division_to_html(&rows);

        assert!(html.contains("<th>Police Stations Count</th>"));
        assert!(html.contains("<th>Western</th>"));
        assert!(html.contains("<th></th>"));
        // Other = total - pending - closed.
        assert!(html.contains("<td>1</td>\n      <td>5</td>\n      <td>9</td>"));
    }
}
