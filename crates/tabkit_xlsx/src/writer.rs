//! XLSX serializer: renders an assembled export document into workbook bytes.

use std::collections::HashMap;

use rust_xlsxwriter::{
    Color, Format, FormatAlign, FormatBorder, FormatUnderline, Workbook, Worksheet,
};
use tracing::debug;

use crate::conf::N_WIDTH_COLUMN_DEFAULT;
use crate::document::SpecExportDocument;
use crate::error::{ExportError, ExportResult};
use crate::spec::{
    EnumAutofitColumnsRule, EnumCellValue, SpecAutofitCellsPolicy, SpecCellFormat,
    SpecColumnDescriptor,
};
use crate::util::{
    cast_col_num, cast_row_num, estimate_unicode_string_width, estimate_width_len,
    parse_color_rgb,
};

/// Serialize `doc` into a single-sheet `.xlsx` workbook held in memory.
///
/// Header cells share one format; data cell formats are deduplicated so each
/// distinct style is registered once.
pub fn write_export_document(doc: &SpecExportDocument) -> ExportResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&doc.sheet_name)?;

        write_header(worksheet, doc)?;
        write_column_widths(worksheet, doc)?;

        if doc.if_freeze_header && doc.layout.n_rows_header > 0 {
            worksheet.set_freeze_panes(
                u32::try_from(doc.layout.n_rows_header).map_err(|_| {
                    ExportError::generation(format!(
                        "header height out of range: {}",
                        doc.layout.n_rows_header
                    ))
                })?,
                0,
            )?;
        }

        write_body(worksheet, doc)?;
    }

    let bytes = workbook.save_to_buffer()?;
    debug!(
        sheet_name = %doc.sheet_name,
        n_bytes = bytes.len(),
        "serialized workbook"
    );
    Ok(bytes)
}

////////////////////////////////////////////////////////////////////////////////
// #region HeaderRendering

fn write_header(worksheet: &mut Worksheet, doc: &SpecExportDocument) -> ExportResult<()> {
    let layout = &doc.layout;
    let fmt_header = derive_rust_xlsx_format(&doc.fmt_header).map_err(ExportError::generation)?;

    // Every header grid cell carries the header style, including cells under
    // shallow leaves that no merge covers.
    for n_row in 1..=layout.n_rows_header {
        for n_col in 1..=layout.total_columns {
            worksheet.write_blank(cast_row(n_row)?, cast_col(n_col)?, &fmt_header)?;
        }
    }

    let dict_text: HashMap<(usize, usize), &str> = layout
        .header_cells
        .iter()
        .map(|cell| ((cell.row, cell.col), cell.text.as_str()))
        .collect();

    for cell in &layout.header_cells {
        worksheet.write_string_with_format(
            cast_row(cell.row)?,
            cast_col(cell.col)?,
            &cell.text,
            &fmt_header,
        )?;
    }

    // Single-cell regions are plain cells; the writer rejects one-cell merges.
    for merge in layout.merges.iter().filter(|m| !m.is_single_cell()) {
        let c_text = dict_text
            .get(&(merge.start.row, merge.start.col))
            .copied()
            .unwrap_or_default();
        worksheet.merge_range(
            cast_row(merge.start.row)?,
            cast_col(merge.start.col)?,
            cast_row(merge.end.row)?,
            cast_col(merge.end.col)?,
            c_text,
            &fmt_header,
        )?;
    }

    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region BodyRendering

fn write_body(worksheet: &mut Worksheet, doc: &SpecExportDocument) -> ExportResult<()> {
    let mut dict_formats: HashMap<&SpecCellFormat, Format> = HashMap::new();

    for l_cells in &doc.rows {
        for cell in l_cells {
            if matches!(cell.value, EnumCellValue::None) && cell.format.is_empty() {
                continue;
            }

            if !dict_formats.contains_key(&cell.format) {
                let format = derive_rust_xlsx_format(&cell.format).map_err(|err| {
                    ExportError::generation(format!(
                        "invalid style at row {} column {}: {err}",
                        cell.row, cell.col
                    ))
                })?;
                dict_formats.insert(&cell.format, format);
            }
            let Some(format) = dict_formats.get(&cell.format) else {
                continue;
            };

            let n_row = cast_row(cell.row)?;
            let n_col = cast_col(cell.col)?;
            match &cell.value {
                EnumCellValue::None => {
                    worksheet.write_blank(n_row, n_col, format)?;
                }
                EnumCellValue::String(val) => {
                    worksheet.write_string_with_format(n_row, n_col, val, format)?;
                }
                EnumCellValue::Number(val) => {
                    worksheet.write_number_with_format(n_row, n_col, *val, format)?;
                }
            }
        }
    }

    debug!(n_formats = dict_formats.len(), "wrote data cells");
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnWidth

fn write_column_widths(worksheet: &mut Worksheet, doc: &SpecExportDocument) -> ExportResult<()> {
    for n_col in 1..=doc.layout.total_columns {
        worksheet.set_column_width(cast_col(n_col)?, N_WIDTH_COLUMN_DEFAULT)?;
    }

    for (n_idx_col, column) in doc.layout.columns.iter().enumerate() {
        let n_width = match derive_autofit_rule(column, &doc.policy_autofit) {
            Some(rule) => derive_autofit_width(doc, n_idx_col, column, rule),
            None => column.width,
        };
        worksheet.set_column_width(cast_col(column.col)?, n_width)?;
    }
    Ok(())
}

fn derive_autofit_rule(
    column: &SpecColumnDescriptor,
    policy: &SpecAutofitCellsPolicy,
) -> Option<EnumAutofitColumnsRule> {
    if column.if_width_explicit {
        return None;
    }
    match policy.rule_columns {
        EnumAutofitColumnsRule::None if column.if_auto_width => Some(EnumAutofitColumnsRule::All),
        EnumAutofitColumnsRule::None => None,
        rule => Some(rule),
    }
}

/// Inferred width of one column, clamped by the autofit policy.
fn derive_autofit_width(
    doc: &SpecExportDocument,
    n_idx_col: usize,
    column: &SpecColumnDescriptor,
    rule: EnumAutofitColumnsRule,
) -> f64 {
    let policy = &doc.policy_autofit;

    // A wide leaf's title is shared by all the grid columns it spans.
    let n_width_header = estimate_unicode_string_width(&column.title).div_ceil(column.span);

    let n_rows_inspected = policy
        .height_body_inferred_max
        .map_or(doc.rows.len(), |n_max| usize::min(n_max, doc.rows.len()));
    let n_width_body = doc.rows[..n_rows_inspected]
        .iter()
        .filter_map(|l_cells| l_cells.get(n_idx_col))
        .map(|cell| estimate_width_len(&cell.value))
        .max()
        .unwrap_or(0);

    let n_width_recorded = match rule {
        EnumAutofitColumnsRule::Header | EnumAutofitColumnsRule::None => n_width_header,
        EnumAutofitColumnsRule::Body => n_width_body,
        EnumAutofitColumnsRule::All => usize::max(n_width_header, n_width_body),
    };

    let n_min = usize::max(1, policy.width_cell_min);
    let n_max = usize::min(255, usize::max(n_min, policy.width_cell_max));
    usize::min(n_max, usize::max(n_min, n_width_recorded + policy.width_cell_padding)) as f64
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FormatConversion

/// Convert a [`SpecCellFormat`] into a `rust_xlsxwriter` format.
///
/// Colors that do not parse as hex RGB are rejected.
pub fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Result<Format, String> {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }
    if spec.italic.unwrap_or(false) {
        format = format.set_italic();
    }
    if spec.underline.unwrap_or(false) {
        format = format.set_underline(FormatUnderline::Single);
    }

    for c_align in [&spec.align, &spec.valign].into_iter().flatten() {
        match derive_format_align(c_align) {
            Some(align) => format = format.set_align(align),
            None => return Err(format!("unknown alignment {c_align:?}")),
        }
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(derive_color(val)?);
    }
    if let Some(val) = &spec.font_color {
        format = format.set_font_color(derive_color(val)?);
    }

    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }
    if let Some(val) = spec.top {
        format = format.set_border_top(derive_format_border(val));
    }
    if let Some(val) = spec.bottom {
        format = format.set_border_bottom(derive_format_border(val));
    }
    if let Some(val) = spec.left {
        format = format.set_border_left(derive_format_border(val));
    }
    if let Some(val) = spec.right {
        format = format.set_border_right(derive_format_border(val));
    }

    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    Ok(format)
}

fn derive_color(color: &str) -> Result<Color, String> {
    parse_color_rgb(color)
        .map(Color::RGB)
        .ok_or_else(|| format!("invalid color {color:?}"))
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        7 => FormatBorder::Hair,
        8 => FormatBorder::MediumDashed,
        9 => FormatBorder::DashDot,
        10 => FormatBorder::MediumDashDot,
        11 => FormatBorder::DashDotDot,
        12 => FormatBorder::MediumDashDotDot,
        13 => FormatBorder::SlantDashDot,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    match align.trim().to_ascii_lowercase().as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "fill" => Some(FormatAlign::Fill),
        "justify" => Some(FormatAlign::Justify),
        "center_across" => Some(FormatAlign::CenterAcross),
        "distributed" => Some(FormatAlign::Distributed),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "middle" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        "vjustify" | "vertical_justify" => Some(FormatAlign::VerticalJustify),
        "vdistributed" | "vertical_distributed" => Some(FormatAlign::VerticalDistributed),
        _ => None,
    }
}

fn cast_row(row_1based: usize) -> ExportResult<u32> {
    cast_row_num(row_1based).map_err(ExportError::generation)
}

fn cast_col(col_1based: usize) -> ExportResult<u16> {
    cast_col_num(col_1based).map_err(ExportError::generation)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::assemble_export_document;
    use crate::header::validate_header_forest;
    use crate::layout::resolve_header_layout;
    use crate::spec::{SpecExportConfig, SpecHeaderNode, SpecRowRecord};

    fn document_of(
        headers: &[SpecHeaderNode],
        rows: &[SpecRowRecord],
        config: &SpecExportConfig,
    ) -> SpecExportDocument {
        let nodes = validate_header_forest(headers).unwrap();
        let layout = resolve_header_layout(&nodes, &config.layout_options());
        assemble_export_document(layout, rows, config).unwrap()
    }

    #[test]
    fn test_writes_zip_container() {
        let rows = vec![SpecRowRecord::from_iter([("a".to_string(), 1i64.into())])];
        let doc = document_of(
            &[SpecHeaderNode::leaf("A", "a")],
            &rows,
            &SpecExportConfig::default(),
        );
        let bytes = write_export_document(&doc).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_empty_document_still_serializes() {
        let doc = document_of(&[], &[], &SpecExportConfig::default());
        let bytes = write_export_document(&doc).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_invalid_column_style_fails_generation() {
        let headers = vec![SpecHeaderNode::leaf("A", "a")];
        let rows = vec![SpecRowRecord::from_iter([("a".to_string(), "x".into())])];
        let mut doc = document_of(&headers, &rows, &SpecExportConfig::default());
        doc.rows[0][0].format.bg_color = Some("not-a-color".to_string());

        match write_export_document(&doc) {
            Err(ExportError::ExportGenerationFailed { message, .. }) => {
                assert!(message.contains("invalid color"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_derive_rust_xlsx_format_rejects_unknown_alignment() {
        let spec = SpecCellFormat {
            align: Some("sideways".to_string()),
            ..Default::default()
        };
        assert!(derive_rust_xlsx_format(&spec).is_err());
        assert!(derive_rust_xlsx_format(&crate::conf::derive_default_header_format()).is_ok());
    }

    #[test]
    fn test_autofit_rule_resolution() {
        let mut column = SpecColumnDescriptor {
            key: "a".to_string(),
            title: "A".to_string(),
            width: N_WIDTH_COLUMN_DEFAULT,
            if_width_explicit: false,
            if_auto_width: false,
            col: 1,
            span: 1,
            style: None,
            conditional_formats: vec![],
        };
        let policy = SpecAutofitCellsPolicy::default();
        assert_eq!(derive_autofit_rule(&column, &policy), None);

        column.if_auto_width = true;
        assert_eq!(
            derive_autofit_rule(&column, &policy),
            Some(EnumAutofitColumnsRule::All)
        );

        column.if_width_explicit = true;
        assert_eq!(derive_autofit_rule(&column, &policy), None);
    }

    #[test]
    fn test_autofit_width_is_clamped() {
        let headers = vec![
            SpecHeaderNode {
                auto_width: Some(true),
                ..SpecHeaderNode::leaf("Id", "id")
            },
            SpecHeaderNode {
                auto_width: Some(true),
                ..SpecHeaderNode::leaf("Text", "text")
            },
        ];
        let rows = vec![SpecRowRecord::from_iter([
            ("id".to_string(), 7i64.into()),
            ("text".to_string(), "x".repeat(200).into()),
        ])];
        let doc = document_of(&headers, &rows, &SpecExportConfig::default());

        let n_width_id = derive_autofit_width(&doc, 0, &doc.layout.columns[0], EnumAutofitColumnsRule::All);
        let n_width_text =
            derive_autofit_width(&doc, 1, &doc.layout.columns[1], EnumAutofitColumnsRule::All);
        assert_eq!(n_width_id, 8.0);
        assert_eq!(n_width_text, 60.0);
    }
}
