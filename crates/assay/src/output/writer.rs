//! CSV export.

use std::io::Write;
use std::path::Path;

use crate::error::{AssayError, Result};
use crate::table::{Table, Value};

/// Write a table as CSV: index column first (empty header), then the columns in order.
pub fn write_csv(table: &Table, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path).map_err(|e| AssayError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    write_to(table, file)?;
    tracing::info!(path = %path.display(), rows = table.row_count(), "Wrote CSV");
    Ok(())
}

/// Render a table as a CSV string.
pub fn to_csv_string(table: &Table) -> Result<String> {
    let mut buffer = Vec::new();
    write_to(table, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| AssayError::Runtime(format!("CSV output is not UTF-8: {}", e)))
}

fn write_to<W: Write>(table: &Table, sink: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(sink);

    let mut header = vec![String::new()];
    header.extend(table.column_names().map(str::to_string));
    writer.write_record(&header)?;

    let columns: Vec<&[Value]> = table.columns().map(|(_, cells)| cells).collect();
    for (row, label) in table.index().iter().enumerate() {
        let mut record = Vec::with_capacity(columns.len() + 1);
        record.push(label.to_string());
        record.extend(columns.iter().map(|cells| render(&cells[row])));
        writer.write_record(&record)?;
    }

    writer.flush().map_err(|e| AssayError::Csv(e.into()))?;
    Ok(())
}

fn render(value: &Value) -> String {
    if value.is_missing() {
        String::new()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::column;

    #[test]
    fn test_csv_layout() {
        let table = Table::from_columns(vec![
            ("document_id", column(["a", "b"])),
            ("organization_type", vec![Value::from(vec!["sme", "ngo"]), Value::from(vec!["x"])]),
            ("min_entities", vec![Value::from(vec![3]), Value::Null]),
        ])
        .unwrap()
        .with_index(vec![4, 9])
        .unwrap();
        let csv = to_csv_string(&table).unwrap();
        assert_eq!(
            csv,
            ",document_id,organization_type,min_entities\n\
             4,a,\"['sme', 'ngo']\",[3]\n\
             9,b,['x'],\n"
        );
    }
}
