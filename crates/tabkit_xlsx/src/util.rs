//! Stateless helper utilities shared by the export stages.

use crate::conf::{N_LEN_EXCEL_SHEET_NAME_MAX, TUP_EXCEL_ILLEGAL};
use crate::spec::{EnumCellValue, SpecValuePolicy};

////////////////////////////////////////////////////////////////////////////////
// #region CellValueConversion

/// Convert `NaN`/`Inf` to policy string; return error for finite values.
pub fn convert_nan_inf_to_str(x: f64, value_policy: &SpecValuePolicy) -> Result<String, String> {
    if x.is_nan() {
        return Ok(value_policy.nan_str.clone());
    }
    if x.is_infinite() {
        return Ok(if x.is_sign_positive() {
            value_policy.posinf_str.clone()
        } else {
            value_policy.neginf_str.clone()
        });
    }
    Err("Input is neither NaN nor Inf.".to_string())
}

/// Normalize a bound data value for writing. Non-finite numbers become blank or policy text.
pub fn convert_cell_value(value: &EnumCellValue, value_policy: &SpecValuePolicy) -> EnumCellValue {
    match value {
        EnumCellValue::Number(n) if !n.is_finite() => {
            if value_policy.if_keep_non_finite {
                EnumCellValue::String(
                    convert_nan_inf_to_str(*n, value_policy)
                        .unwrap_or_else(|_| value_policy.nan_str.clone()),
                )
            } else {
                EnumCellValue::None
            }
        }
        _ => value.clone(),
    }
}

/// Parse a numeric operand from a cell value. Strings are trimmed first.
pub fn parse_numeric_value(value: &EnumCellValue) -> Option<f64> {
    let n_value = match value {
        EnumCellValue::None => return None,
        EnumCellValue::Number(n) => *n,
        EnumCellValue::String(s) => s.trim().parse::<f64>().ok()?,
    };
    n_value.is_finite().then_some(n_value)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().trim_matches('\'').to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Convert a 1-based sheet row to the writer's 0-based row type.
pub fn cast_row_num(row_1based: usize) -> Result<u32, String> {
    row_1based
        .checked_sub(1)
        .and_then(|val| u32::try_from(val).ok())
        .ok_or_else(|| format!("row index out of range: {row_1based}"))
}

/// Convert a 1-based sheet column to the writer's 0-based column type.
pub fn cast_col_num(col_1based: usize) -> Result<u16, String> {
    col_1based
        .checked_sub(1)
        .and_then(|val| u16::try_from(val).ok())
        .ok_or_else(|| format!("column index out of range: {col_1based}"))
}

/// Parse `RRGGBB`, `#RRGGBB` or ARGB `AARRGGBB` into a 24-bit RGB value.
///
/// The alpha byte of ARGB input is dropped.
pub fn parse_color_rgb(color: &str) -> Option<u32> {
    let c_hex = color.trim().trim_start_matches('#');
    if !c_hex.chars().all(|chr| chr.is_ascii_hexdigit()) {
        return None;
    }
    let c_rgb = match c_hex.len() {
        6 => c_hex,
        8 => &c_hex[2..],
        _ => return None,
    };
    u32::from_str_radix(c_rgb, 16).ok()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnWidth

/// Estimate displayed width units for one cell value.
pub fn estimate_width_len(value: &EnumCellValue) -> usize {
    match value {
        EnumCellValue::None => 0,
        EnumCellValue::String(s) => estimate_unicode_string_width(s),
        EnumCellValue::Number(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                (*n as i64).to_string().len()
            } else {
                format!("{n:.4}").len()
            }
        }
    }
}

/// Width estimate where non-ASCII glyphs count as 1.6 units.
pub fn estimate_unicode_string_width(s: &str) -> usize {
    let n_ascii = s.chars().filter(|chr| chr.is_ascii()).count();
    let n_non_ascii = s.chars().count().saturating_sub(n_ascii);
    n_ascii + (n_non_ascii as f64 * 1.6).round() as usize
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
