//! Document assembler: binds rows to the resolved header layout.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::conf::{N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX};
use crate::error::{ExportError, ExportResult};
use crate::spec::{
    EnumCellValue, SpecAutofitCellsPolicy, SpecCellFormat, SpecExportConfig, SpecExportReport,
    SpecHeaderLayout, SpecRowRecord,
};
use crate::style::{resolve_data_cell_style, resolve_header_cell_style};
use crate::util::{convert_cell_value, sanitize_sheet_name};

/// One styled data cell at a 1-based sheet position.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecDataCell {
    /// 1-based sheet row.
    pub row: usize,
    /// 1-based sheet column.
    pub col: usize,
    /// Value to write.
    pub value: EnumCellValue,
    /// Resolved format.
    pub format: SpecCellFormat,
}

/// Everything the writer needs for one worksheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecExportDocument {
    /// Sanitized worksheet name.
    pub sheet_name: String,
    /// Resolved header layout.
    pub layout: SpecHeaderLayout,
    /// Format of every header cell.
    pub fmt_header: SpecCellFormat,
    /// Data rows in caller order, one cell per column descriptor.
    pub rows: Vec<Vec<SpecDataCell>>,
    /// Freeze panes below the header.
    pub if_freeze_header: bool,
    /// Column autofit policy.
    pub policy_autofit: SpecAutofitCellsPolicy,
    /// Warnings and counts collected so far.
    pub report: SpecExportReport,
}

#[derive(Default)]
struct FallbackTally {
    n_cells: usize,
    first_row: usize,
    first_reason: String,
}

/// Bind `rows` to `layout` and style every data cell.
///
/// Missing keys become blank cells. Rows keep caller order; nothing is sorted,
/// filtered or deduplicated.
pub fn assemble_export_document(
    layout: SpecHeaderLayout,
    rows: &[SpecRowRecord],
    config: &SpecExportConfig,
) -> ExportResult<SpecExportDocument> {
    let mut report = SpecExportReport::default();

    if layout.total_columns > N_NCOLS_EXCEL_MAX {
        return Err(ExportError::generation(format!(
            "{} columns exceed the Excel limit of {N_NCOLS_EXCEL_MAX}",
            layout.total_columns
        )));
    }
    if layout.n_rows_header + rows.len() > N_NROWS_EXCEL_MAX {
        return Err(ExportError::generation(format!(
            "{} header rows and {} data rows exceed the Excel limit of {N_NROWS_EXCEL_MAX}",
            layout.n_rows_header,
            rows.len()
        )));
    }

    let sheet_name = sanitize_sheet_name(&config.sheet_name, "_");
    if sheet_name != config.sheet_name {
        report.warn(format!(
            "Sheet name {:?} sanitized to {sheet_name:?}.",
            config.sheet_name
        ));
    }

    let mut dict_fallbacks: BTreeMap<&str, FallbackTally> = BTreeMap::new();
    let mut n_non_finite = 0usize;
    let mut l_rows = Vec::with_capacity(rows.len());

    for (n_idx_row, row) in rows.iter().enumerate() {
        let n_row_sheet = layout.n_rows_header + n_idx_row + 1;
        let mut l_cells = Vec::with_capacity(layout.columns.len());

        for column in &layout.columns {
            let value_raw = row.get(&column.key).cloned().unwrap_or_default();
            let resolution = resolve_data_cell_style(column, &value_raw);
            if matches!(value_raw, EnumCellValue::Number(n) if !n.is_finite()) {
                n_non_finite += 1;
            }

            if let Some(reason) = resolution.fallback_reason {
                let tally = dict_fallbacks.entry(column.key.as_str()).or_default();
                if tally.n_cells == 0 {
                    tally.first_row = n_row_sheet;
                    tally.first_reason = reason;
                }
                tally.n_cells += 1;
            }

            l_cells.push(SpecDataCell {
                row: n_row_sheet,
                col: column.col,
                value: convert_cell_value(&value_raw, &config.value_policy),
                format: resolution.format,
            });
        }
        l_rows.push(l_cells);
    }

    for (c_key, tally) in dict_fallbacks {
        warn!(
            key = c_key,
            n_cells = tally.n_cells,
            first_row = tally.first_row,
            reason = %tally.first_reason,
            "conditional format skipped"
        );
        report.warn(format!(
            "Column {c_key:?}: conditional format skipped for {} cell(s), first at row {} ({}).",
            tally.n_cells, tally.first_row, tally.first_reason
        ));
    }

    if n_non_finite > 0 {
        let c_rendering = if config.value_policy.if_keep_non_finite {
            "written as text"
        } else {
            "left blank"
        };
        report.warn(format!(
            "{n_non_finite} non-finite number(s) {c_rendering}."
        ));
    }

    report.sheet_name = sheet_name.clone();
    report.n_rows_header = layout.n_rows_header;
    report.n_columns = layout.total_columns;
    report.n_rows_data = l_rows.len();

    debug!(
        sheet_name = %sheet_name,
        n_rows = l_rows.len(),
        n_columns = layout.columns.len(),
        "assembled export document"
    );

    Ok(SpecExportDocument {
        sheet_name,
        layout,
        fmt_header: resolve_header_cell_style(),
        rows: l_rows,
        if_freeze_header: config.if_freeze_header,
        policy_autofit: config.policy_autofit.clone(),
        report,
    })
}
