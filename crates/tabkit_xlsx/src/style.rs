//! Style and conditional-format engine.
//!
//! Header cells all receive the fixed base header style. Data cells start
//! from their column's style and take the style of the first conditional
//! rule that matches. A rule that cannot be evaluated for a cell degrades
//! that cell to the column style instead of failing the export.

use crate::conf::derive_default_header_format;
use crate::error::StyleEvalError;
use crate::spec::{
    EnumCellIsOperator, EnumCellValue, EnumConditionalFormat, SpecCellFormat, SpecCellIsRule,
    SpecColumnDescriptor,
};
use crate::util::parse_numeric_value;
use crate::writer::derive_rust_xlsx_format;

/// Outcome of styling one data cell.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecCellStyleResolution {
    /// Final format for the cell.
    pub format: SpecCellFormat,
    /// 0-based index of the rule that matched, if any.
    pub n_rule_matched: Option<usize>,
    /// Why conditional styling was skipped for this cell.
    pub fallback_reason: Option<String>,
}

/// Style applied to every header cell.
pub fn resolve_header_cell_style() -> SpecCellFormat {
    derive_default_header_format()
}

/// Overlay `override_style` onto `base`, returning a new format.
pub fn resolve_cell_style(base: &SpecCellFormat, override_style: &SpecCellFormat) -> SpecCellFormat {
    base.merge(override_style)
}

/// Style of one data cell of `column` holding `value`.
pub fn resolve_data_cell_style(
    column: &SpecColumnDescriptor,
    value: &EnumCellValue,
) -> SpecCellStyleResolution {
    let fmt_base = column.style.clone().unwrap_or_default();

    let result = evaluate_conditional_formats(&column.conditional_formats, value).and_then(
        |matched| match matched {
            Some((n_idx, style)) => {
                validate_style(style)?;
                Ok(Some((n_idx, style)))
            }
            None => Ok(None),
        },
    );

    match result {
        Ok(Some((n_idx, style))) => SpecCellStyleResolution {
            format: resolve_cell_style(&fmt_base, style),
            n_rule_matched: Some(n_idx),
            fallback_reason: None,
        },
        Ok(None) => SpecCellStyleResolution {
            format: fmt_base,
            n_rule_matched: None,
            fallback_reason: None,
        },
        Err(err) => SpecCellStyleResolution {
            format: fmt_base,
            n_rule_matched: None,
            fallback_reason: Some(err.to_string()),
        },
    }
}

/// First rule in declaration order whose predicate matches `value`.
///
/// Blank cells match nothing.
pub(crate) fn evaluate_conditional_formats<'a>(
    formats: &'a [EnumConditionalFormat],
    value: &EnumCellValue,
) -> Result<Option<(usize, &'a SpecCellFormat)>, StyleEvalError> {
    if matches!(value, EnumCellValue::None) {
        return Ok(None);
    }

    for (n_idx, rule) in formats.iter().enumerate() {
        if evaluate_rule(rule, value)? {
            return Ok(Some((n_idx, rule.style())));
        }
    }
    Ok(None)
}

fn evaluate_rule(rule: &EnumConditionalFormat, value: &EnumCellValue) -> Result<bool, StyleEvalError> {
    match rule {
        EnumConditionalFormat::ContainsText(rule) => Ok(value.to_text().contains(&rule.text)),
        EnumConditionalFormat::CellIs(rule) => evaluate_cell_is_rule(rule, value),
    }
}

fn evaluate_cell_is_rule(rule: &SpecCellIsRule, value: &EnumCellValue) -> Result<bool, StyleEvalError> {
    if rule.operator == EnumCellIsOperator::Between {
        let n_min = rule.min_value.ok_or(StyleEvalError::MissingThreshold("minValue"))?;
        let n_max = rule.max_value.ok_or(StyleEvalError::MissingThreshold("maxValue"))?;
        let n_value = derive_numeric_operand(value)?;
        return Ok(n_min <= n_value && n_value <= n_max);
    }

    let threshold = rule
        .value
        .as_ref()
        .filter(|val| !matches!(val, EnumCellValue::None))
        .ok_or(StyleEvalError::MissingThreshold("value"))?;

    let Some(n_threshold) = parse_numeric_value(threshold) else {
        return match (rule.operator, threshold) {
            (EnumCellIsOperator::Equal, EnumCellValue::String(c_text)) => {
                Ok(value.to_text() == *c_text)
            }
            _ => Err(StyleEvalError::MissingThreshold("numeric value")),
        };
    };

    let n_value = derive_numeric_operand(value)?;
    Ok(match rule.operator {
        EnumCellIsOperator::Equal => (n_value - n_threshold).abs() < f64::EPSILON,
        EnumCellIsOperator::LessThan => n_value < n_threshold,
        EnumCellIsOperator::GreaterThan => n_value > n_threshold,
        EnumCellIsOperator::LessThanOrEqual => n_value <= n_threshold,
        EnumCellIsOperator::GreaterThanOrEqual => n_value >= n_threshold,
        EnumCellIsOperator::Between => unreachable!("handled above"),
    })
}

fn derive_numeric_operand(value: &EnumCellValue) -> Result<f64, StyleEvalError> {
    parse_numeric_value(value).ok_or_else(|| StyleEvalError::NotNumeric(value.to_text()))
}

fn validate_style(style: &SpecCellFormat) -> Result<(), StyleEvalError> {
    derive_rust_xlsx_format(style)
        .map(|_| ())
        .map_err(StyleEvalError::InvalidStyle)
}
