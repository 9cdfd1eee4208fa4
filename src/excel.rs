use calamine::{open_workbook_auto, Data, DataType, Reader};

use crate::config::StatementSource;
use crate::error::{ReportError, Result};
use crate::types::StatementRow;

/// Read the statement sheet as (label, value) rows, in sheet order.
/// Rows above `header_rows` are skipped; every other row is returned, even blank ones.
pub fn read_statement_rows(source: &StatementSource) -> Result<Vec<StatementRow>> {
    let path = source.path.as_path();
    if !path.exists() {
        return Err(ReportError::NotFound(path.to_path_buf()));
    }
    let mut workbook = open_workbook_auto(path)?;
    if !workbook.sheet_names().iter().any(|s| s == &source.sheet) {
        tracing::warn!(
            sheet = %source.sheet,
            available = ?workbook.sheet_names(),
            "statement sheet missing"
        );
        return Err(ReportError::SheetNotFound(source.sheet.clone()));
    }
    let range = workbook
        .worksheet_range(&source.sheet)
        .map_err(|e| ReportError::SheetNotFound(format!("{}: {}", source.sheet, e)))?;

    let rows: Vec<StatementRow> = range
        .rows()
        .skip(source.header_rows)
        .map(|row| StatementRow {
            label: row
                .get(source.label_column)
                .map(cell_label)
                .unwrap_or_default(),
            value: row.get(source.value_column).and_then(cell_value),
        })
        .collect();
    tracing::debug!(path = %path.display(), rows = rows.len(), "statement rows read");
    Ok(rows)
}

/// Label text of a cell. Numbers are rendered as text; empty cells give "".
fn cell_label(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Empty => String::new(),
        other => other.as_string().unwrap_or_default(),
    }
}

/// Numeric value of a cell. Text is not parsed: a "12,5" string is treated as absent.
fn cell_value(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) if f.is_finite() => Some(*f),
        Data::Int(i) => Some(*i as f64),
        _ => None,
    }
}
