//! Export constants and default preset factories.

use crate::spec::{EnumCellIsOperator, EnumConditionalFormat, SpecCellFormat, SpecCellIsRule};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Excel maximum column width in character units.
pub const N_WIDTH_EXCEL_MAX: f64 = 255.0;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Width of a column without a width hint.
pub const N_WIDTH_COLUMN_DEFAULT: f64 = 15.0;
/// Worksheet name when none is configured.
pub const C_SHEET_NAME_DEFAULT: &str = "Sheet1";
/// Filename used by the save-as step when none is configured.
pub const C_FILENAME_DEFAULT: &str = "download.xlsx";
/// MIME type of the produced workbook.
pub const C_MIME_XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
/// Prefix of synthetic column keys.
pub const C_KEY_PREFIX_SYNTHETIC: &str = "col";

/// Fill of percentage cells at or below the low threshold.
pub const C_COLOR_PERCENT_LOW: &str = "FFFF0000";
/// Fill of percentage cells strictly between the thresholds.
pub const C_COLOR_PERCENT_MID: &str = "FFFFFF00";
/// Fill of percentage cells at or above the high threshold.
pub const C_COLOR_PERCENT_HIGH: &str = "FF00FF00";
/// Upper bound (inclusive) of the low percentage bucket.
pub const N_PERCENT_THRESHOLD_LOW: f64 = 50.0;
/// Lower bound (inclusive) of the high percentage bucket.
pub const N_PERCENT_THRESHOLD_HIGH: f64 = 75.0;

/// Fixed base style applied to every header cell.
pub fn derive_default_header_format() -> SpecCellFormat {
    SpecCellFormat {
        bold: Some(true),
        font_color: Some("000000".to_string()),
        bg_color: Some("FFE0E0E0".to_string()),
        align: Some("center".to_string()),
        valign: Some("vcenter".to_string()),
        border: Some(1),
        ..Default::default()
    }
}

/// Traffic-light rules for percentage columns.
///
/// Buckets: `<= 50` low, `50 < v < 75` mid, `>= 75` high. The mid rule is an
/// inclusive `between` declared last, so both boundaries are claimed by the
/// earlier rules under first-match-wins.
pub fn derive_percent_conditional_formats() -> Vec<EnumConditionalFormat> {
    let fn_fill = |color: &str| SpecCellFormat {
        bg_color: Some(color.to_string()),
        ..Default::default()
    };

    vec![
        EnumConditionalFormat::CellIs(SpecCellIsRule {
            operator: EnumCellIsOperator::LessThanOrEqual,
            value: Some(N_PERCENT_THRESHOLD_LOW.into()),
            min_value: None,
            max_value: None,
            style: fn_fill(C_COLOR_PERCENT_LOW),
        }),
        EnumConditionalFormat::CellIs(SpecCellIsRule {
            operator: EnumCellIsOperator::GreaterThanOrEqual,
            value: Some(N_PERCENT_THRESHOLD_HIGH.into()),
            min_value: None,
            max_value: None,
            style: fn_fill(C_COLOR_PERCENT_HIGH),
        }),
        EnumConditionalFormat::CellIs(SpecCellIsRule {
            operator: EnumCellIsOperator::Between,
            value: None,
            min_value: Some(N_PERCENT_THRESHOLD_LOW),
            max_value: Some(N_PERCENT_THRESHOLD_HIGH),
            style: fn_fill(C_COLOR_PERCENT_MID),
        }),
    ]
}
