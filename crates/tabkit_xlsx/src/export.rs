//! Public export operations.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, info_span, warn};

use crate::conf::C_MIME_XLSX;
use crate::document::assemble_export_document;
use crate::error::{ExportError, ExportResult};
use crate::header::{find_duplicate_keys, validate_header_forest};
use crate::layout::resolve_header_layout;
use crate::spec::{SpecExportBlob, SpecExportConfig, SpecHeaderNode, SpecRowRecord};
use crate::writer::write_export_document;

/// Build an `.xlsx` workbook from a header forest and data rows.
///
/// Header problems fail before any layout work with
/// [`ExportError::InvalidHeaderShape`]. Per-cell style problems never fail the
/// export; they are listed in the blob's report.
pub fn generate_export(
    headers: &[SpecHeaderNode],
    rows: &[SpecRowRecord],
    config: &SpecExportConfig,
) -> ExportResult<SpecExportBlob> {
    let span = info_span!("export", sheet_name = %config.sheet_name, n_rows = rows.len());
    let _guard = span.enter();

    let nodes = validate_header_forest(headers)?;
    let dict_dup = find_duplicate_keys(&nodes);
    let layout = resolve_header_layout(&nodes, &config.layout_options());

    let mut doc = assemble_export_document(layout, rows, config)?;
    for (c_key, l_cols) in &dict_dup {
        warn!(key = %c_key, cols = ?l_cols, "duplicate column key");
        doc.report.warn(format!(
            "Key {c_key:?} is bound by several columns {l_cols:?}; each shows the same field."
        ));
    }

    let bytes = write_export_document(&doc)?;
    info!(
        n_bytes = bytes.len(),
        n_columns = doc.report.n_columns,
        n_rows_header = doc.report.n_rows_header,
        n_warnings = doc.report.warnings.len(),
        "export generated"
    );

    Ok(SpecExportBlob {
        bytes,
        mime_type: C_MIME_XLSX,
        filename: config.filename.clone(),
        report: doc.report,
    })
}

/// Generate an export and save it as `dir_out/<filename>`.
///
/// `filename` falls back to `config.filename`. Returns the written path.
pub fn download_export(
    headers: &[SpecHeaderNode],
    rows: &[SpecRowRecord],
    dir_out: impl AsRef<Path>,
    filename: Option<&str>,
    config: &SpecExportConfig,
) -> ExportResult<PathBuf> {
    let mut blob = generate_export(headers, rows, config)?;
    if let Some(c_name) = filename {
        blob.filename = c_name.to_string();
    }
    save_export_blob(&blob, dir_out)
}

/// Write `blob` to `dir_out/<blob.filename>` through a temporary sibling file.
///
/// An existing file at the target path is replaced.
pub fn save_export_blob(blob: &SpecExportBlob, dir_out: impl AsRef<Path>) -> ExportResult<PathBuf> {
    let c_name = validate_filename(&blob.filename)?;
    let dir_out = dir_out.as_ref();

    fs::create_dir_all(dir_out).map_err(|err| {
        ExportError::generation_from(
            format!("failed to create output directory {}", dir_out.display()),
            err,
        )
    })?;

    let path_out = dir_out.join(c_name);
    let path_tmp = dir_out.join(format!(".{c_name}.{}.part", std::process::id()));

    if let Err(err) = fs::write(&path_tmp, &blob.bytes) {
        let _ = fs::remove_file(&path_tmp);
        return Err(ExportError::generation_from(
            format!("failed to write {}", path_tmp.display()),
            err,
        ));
    }
    if let Err(err) = fs::rename(&path_tmp, &path_out) {
        let _ = fs::remove_file(&path_tmp);
        return Err(ExportError::generation_from(
            format!("failed to move export into {}", path_out.display()),
            err,
        ));
    }

    info!(path = %path_out.display(), n_bytes = blob.bytes.len(), "export saved");
    Ok(path_out)
}

fn validate_filename(filename: &str) -> ExportResult<&str> {
    let c_name = filename.trim();
    if c_name.is_empty() || c_name == "." || c_name == ".." {
        return Err(ExportError::generation(format!(
            "invalid export filename {filename:?}"
        )));
    }
    if c_name.contains(['/', '\\']) {
        return Err(ExportError::generation(format!(
            "export filename {filename:?} must not contain path separators"
        )));
    }
    Ok(c_name)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::conf::C_FILENAME_DEFAULT;

    fn headers() -> Vec<SpecHeaderNode> {
        vec![
            SpecHeaderNode::leaf("Name", "name"),
            SpecHeaderNode::group(
                "Totals",
                vec![SpecHeaderNode::leaf("N", "n"), SpecHeaderNode::leaf("D", "d")],
            ),
        ]
    }

    #[test]
    fn test_generate_export_blob_metadata() {
        let rows = vec![SpecRowRecord::from_iter([
            ("name".to_string(), "X".into()),
            ("n".to_string(), 5i64.into()),
            ("d".to_string(), 10i64.into()),
        ])];
        let blob = generate_export(&headers(), &rows, &SpecExportConfig::default()).unwrap();

        assert!(blob.bytes.starts_with(b"PK"));
        assert_eq!(blob.mime_type, C_MIME_XLSX);
        assert_eq!(blob.filename, C_FILENAME_DEFAULT);
        assert_eq!(blob.report.n_rows_header, 2);
        assert_eq!(blob.report.n_columns, 3);
        assert_eq!(blob.report.n_rows_data, 1);
        assert!(blob.report.warnings.is_empty());
    }

    #[test]
    fn test_invalid_headers_fail_before_serialization() {
        let headers = vec![
            SpecHeaderNode::group("G", vec![SpecHeaderNode::leaf("A", "a")]).with_span(4),
        ];
        assert!(matches!(
            generate_export(&headers, &[], &SpecExportConfig::default()),
            Err(ExportError::InvalidHeaderShape { .. })
        ));
    }

    #[test]
    fn test_duplicate_keys_are_reported() {
        let headers = vec![SpecHeaderNode::leaf("A", "k"), SpecHeaderNode::leaf("B", "k")];
        let blob = generate_export(&headers, &[], &SpecExportConfig::default()).unwrap();
        assert_eq!(blob.report.warnings.len(), 1);
        assert!(blob.report.warnings[0].contains("\"k\""));
    }

    #[test]
    fn test_validate_filename() {
        assert_eq!(validate_filename(" report.xlsx ").unwrap(), "report.xlsx");
        assert!(validate_filename("").is_err());
        assert!(validate_filename("..").is_err());
        assert!(validate_filename("a/b.xlsx").is_err());
    }
}
