//! Polars DataFrame row source.

use std::io::Cursor;

use polars::prelude::{AnyValue, DataFrame, IpcReader, SerReader};
use tracing::debug;

use crate::error::{ExportError, ExportResult};
use crate::spec::{EnumCellValue, SpecRowRecord};

/// Convert every row of `df` into a [`SpecRowRecord`] keyed by column name.
///
/// Nulls become blanks, numeric dtypes become numbers, everything else is
/// rendered as text.
pub fn derive_rows_from_dataframe(df: &DataFrame) -> ExportResult<Vec<SpecRowRecord>> {
    let l_colnames: Vec<String> = df
        .get_column_names_str()
        .into_iter()
        .map(ToString::to_string)
        .collect();
    let l_cols = df.get_columns();

    let mut l_rows = Vec::with_capacity(df.height());
    for n_idx_row in 0..df.height() {
        let mut row = SpecRowRecord::with_capacity(l_colnames.len());
        for (c_name, col) in l_colnames.iter().zip(l_cols) {
            let value = col.get(n_idx_row).map_err(|err| {
                ExportError::generation_from(
                    format!("failed to read column {c_name:?} at row {n_idx_row}"),
                    err,
                )
            })?;
            row.insert(c_name.clone(), derive_cell_value_from_any_value(value));
        }
        l_rows.push(row);
    }

    debug!(
        n_rows = l_rows.len(),
        n_cols = l_colnames.len(),
        "converted dataframe rows"
    );
    Ok(l_rows)
}

/// Decode a Polars IPC payload and convert its rows.
pub fn derive_rows_from_ipc_bytes(v_ipc_df: &[u8]) -> ExportResult<Vec<SpecRowRecord>> {
    let df = IpcReader::new(Cursor::new(v_ipc_df))
        .finish()
        .map_err(|err| ExportError::generation_from("failed to read IPC DataFrame bytes", err))?;
    derive_rows_from_dataframe(&df)
}

fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::String(val) => EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellValue::String(val.to_string()),
        AnyValue::Boolean(val) => {
            EnumCellValue::String(if val { "True" } else { "False" }.to_string())
        }
        AnyValue::UInt8(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt16(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt32(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int8(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int16(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int128(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float64(val) => EnumCellValue::Number(val),
        _ => EnumCellValue::String(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use polars::prelude::{IpcWriter, SerWriter, df};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_rows_follow_frame_order_and_dtypes() {
        let df = df!(
            "ou" => ["North", "South"],
            "n" => [Some(3i64), None],
            "p" => [62.5f64, 80.0],
            "ok" => [true, false],
        )
        .unwrap();

        let l_rows = derive_rows_from_dataframe(&df).unwrap();
        assert_eq!(l_rows.len(), 2);
        assert_eq!(
            l_rows[0].keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["ou", "n", "p", "ok"]
        );
        assert_eq!(l_rows[0]["ou"], EnumCellValue::from("North"));
        assert_eq!(l_rows[0]["n"], EnumCellValue::Number(3.0));
        assert_eq!(l_rows[1]["n"], EnumCellValue::None);
        assert_eq!(l_rows[1]["p"], EnumCellValue::Number(80.0));
        assert_eq!(l_rows[1]["ok"], EnumCellValue::from("False"));
    }

    #[test]
    fn test_ipc_bytes_round_into_rows() {
        let mut df = df!("k" => ["a", "b", "c"]).unwrap();
        let mut buf = Vec::new();
        IpcWriter::new(&mut buf).finish(&mut df).unwrap();

        let l_rows = derive_rows_from_ipc_bytes(&buf).unwrap();
        let l_values: Vec<_> = l_rows.iter().map(|row| row["k"].clone()).collect();
        assert_eq!(l_values, vec![EnumCellValue::from("a"), "b".into(), "c".into()]);
    }

    #[test]
    fn test_garbage_ipc_bytes_fail_generation() {
        assert!(matches!(
            derive_rows_from_ipc_bytes(b"not arrow"),
            Err(ExportError::ExportGenerationFailed { .. })
        ));
    }
}
