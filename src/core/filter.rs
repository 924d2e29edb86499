use crate::core::format::CellFormatter;
use crate::domain::model::{CanonicalRow, ColumnDescriptor, DateRange};
use crate::domain::schema::ReportSchema;
use chrono::{DateTime, NaiveTime, Utc};

/// Indices of the rows that contain `query` (case-insensitive) in a raw value
/// or in any column's formatted value. An empty query keeps every row.
pub fn matching_indices(
    schema: &ReportSchema,
    formatter: &CellFormatter,
    rows: &[CanonicalRow],
    columns: &[ColumnDescriptor],
    query: &str,
) -> Vec<usize> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return (0..rows.len()).collect();
    }

    rows.iter()
        .enumerate()
        .filter(|(_, row)| row_matches(schema, formatter, row, columns, &needle))
        .map(|(i, _)| i)
        .collect()
}

pub fn filter_rows(
    schema: &ReportSchema,
    formatter: &CellFormatter,
    rows: &[CanonicalRow],
    columns: &[ColumnDescriptor],
    query: &str,
) -> Vec<CanonicalRow> {
    matching_indices(schema, formatter, rows, columns, query)
        .into_iter()
        .map(|i| rows[i].clone())
        .collect()
}

fn row_matches(
    schema: &ReportSchema,
    formatter: &CellFormatter,
    row: &CanonicalRow,
    columns: &[ColumnDescriptor],
    needle: &str,
) -> bool {
    row.values()
        .any(|value| value.raw_text().to_lowercase().contains(needle))
        || columns.iter().any(|column| {
            formatter
                .format_column(schema, row, &column.key)
                .to_lowercase()
                .contains(needle)
        })
}

/// 後端可能忽略日期參數，所以本地端再依 start_time 過濾一次；
/// 只有兩端日期都有時才生效
pub fn filter_by_date_range(
    formatter: &CellFormatter,
    rows: Vec<CanonicalRow>,
    range: &DateRange,
    date_key: &str,
) -> Vec<CanonicalRow> {
    let Some((window_start, window_end)) = window(formatter, range) else {
        return rows;
    };

    let before = rows.len();
    let kept: Vec<CanonicalRow> = rows
        .into_iter()
        .filter(|row| {
            row.get(date_key)
                .and_then(|value| formatter.coerce_to_instant(value))
                .is_some_and(|instant| instant >= window_start && instant <= window_end)
        })
        .collect();
    tracing::debug!(
        "📅 Date window {} .. {} kept {} of {} rows",
        window_start,
        window_end,
        kept.len(),
        before
    );
    kept
}

fn window(formatter: &CellFormatter, range: &DateRange) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let (from, to) = range.bounds()?;
    let start_of_day = NaiveTime::from_hms_opt(0, 0, 0)?;
    let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999)?;
    let start = formatter.assume_zone(from.and_time(start_of_day))?;
    let end = formatter.assume_zone(to.and_time(end_of_day))?;
    Some((start, end))
}
