//! Header forest validation.
//!
//! Turns the wire-form [`SpecHeaderNode`] forest into validated
//! [`EnumHeaderNode`] trees. Leaves without a key receive a synthetic key
//! derived from their 1-based grid column, so identical header shapes always
//! produce identical keys.

use std::collections::BTreeMap;

use tracing::debug;

use crate::conf::{C_KEY_PREFIX_SYNTHETIC, N_NCOLS_EXCEL_MAX, N_WIDTH_EXCEL_MAX};
use crate::error::{ExportError, ExportResult};
use crate::spec::{
    EnumCellIsOperator, EnumCellValue, EnumConditionalFormat, EnumHeaderNode, SpecHeaderGroup,
    SpecHeaderLeaf, SpecHeaderNode,
};
use crate::util::parse_numeric_value;
use crate::writer::derive_rust_xlsx_format;

/// Synthetic key for a leaf starting at 1-based grid column `col`.
pub fn default_key_for(col: usize) -> String {
    format!("{C_KEY_PREFIX_SYNTHETIC}{col}")
}

/// Validate a header forest and resolve leaf keys.
///
/// A group's explicit `span` must agree with the sum of its children's spans;
/// a disagreeing value is rejected rather than silently overridden.
pub fn validate_header_forest(headers: &[SpecHeaderNode]) -> ExportResult<Vec<EnumHeaderNode>> {
    let mut l_path = Vec::new();
    let mut n_col_cursor = 1usize;
    let l_nodes = validate_nodes(headers, &mut l_path, &mut n_col_cursor)?;
    debug!(
        n_roots = l_nodes.len(),
        n_cols = n_col_cursor - 1,
        "validated header forest"
    );
    Ok(l_nodes)
}

fn validate_nodes(
    nodes: &[SpecHeaderNode],
    path: &mut Vec<usize>,
    n_col_cursor: &mut usize,
) -> ExportResult<Vec<EnumHeaderNode>> {
    let mut l_validated = Vec::with_capacity(nodes.len());

    for (n_idx, node) in nodes.iter().enumerate() {
        path.push(n_idx);

        let validated = match node.children.as_deref() {
            Some(l_children) if !l_children.is_empty() => {
                let l_children_validated = validate_nodes(l_children, path, n_col_cursor)?;
                let group = EnumHeaderNode::Group(SpecHeaderGroup {
                    title: node.title.clone(),
                    children: l_children_validated,
                });

                let n_span_computed = group.span();
                if let Some(n_span_declared) = node.span
                    && n_span_declared != n_span_computed
                {
                    return Err(ExportError::invalid_header(
                        path,
                        format!(
                            "group {:?} declares span {n_span_declared} but its children span {n_span_computed}",
                            node.title
                        ),
                    ));
                }
                group
            }
            _ => {
                let leaf = validate_leaf(node, path, *n_col_cursor)?;
                *n_col_cursor = n_col_cursor
                    .checked_add(leaf.span)
                    .filter(|n_col_next| *n_col_next - 1 <= N_NCOLS_EXCEL_MAX)
                    .ok_or_else(|| {
                        ExportError::invalid_header(
                            path,
                            format!(
                                "leaf {:?} ends past the Excel limit of {N_NCOLS_EXCEL_MAX} columns",
                                node.title
                            ),
                        )
                    })?;
                EnumHeaderNode::Leaf(leaf)
            }
        };

        l_validated.push(validated);
        path.pop();
    }

    Ok(l_validated)
}

fn validate_leaf(
    node: &SpecHeaderNode,
    path: &[usize],
    n_col_start: usize,
) -> ExportResult<SpecHeaderLeaf> {
    let n_span = node.span.unwrap_or(1);
    if n_span == 0 || n_span > N_NCOLS_EXCEL_MAX {
        return Err(ExportError::invalid_header(
            path,
            format!("leaf {:?} declares span {n_span}", node.title),
        ));
    }

    if let Some(n_width) = node.width
        && !(n_width.is_finite() && n_width > 0.0 && n_width <= N_WIDTH_EXCEL_MAX)
    {
        return Err(ExportError::invalid_header(
            path,
            format!("leaf {:?} has invalid width {n_width}", node.title),
        ));
    }

    if let Some(style) = &node.style {
        derive_rust_xlsx_format(style).map_err(|reason| {
            ExportError::invalid_header(path, format!("leaf {:?} style: {reason}", node.title))
        })?;
    }

    let l_formats = node.conditional_formats.clone().unwrap_or_default();
    for (n_idx_rule, rule) in l_formats.iter().enumerate() {
        validate_conditional_format(rule).map_err(|reason| {
            ExportError::invalid_header(
                path,
                format!(
                    "leaf {:?} conditional format #{}: {reason}",
                    node.title,
                    n_idx_rule + 1
                ),
            )
        })?;
    }

    let key = match node.key.as_deref() {
        Some(c_key) if !c_key.trim().is_empty() => c_key.to_string(),
        _ => default_key_for(n_col_start),
    };

    Ok(SpecHeaderLeaf {
        title: node.title.clone(),
        key,
        width: node.width,
        span: n_span,
        if_auto_width: node.auto_width.unwrap_or(false),
        style: node.style.clone().filter(|style| !style.is_empty()),
        conditional_formats: l_formats,
    })
}

fn validate_conditional_format(rule: &EnumConditionalFormat) -> Result<(), String> {
    derive_rust_xlsx_format(rule.style()).map_err(|reason| format!("style: {reason}"))?;

    match rule {
        EnumConditionalFormat::ContainsText(rule) => {
            if rule.text.is_empty() {
                return Err("containsText needs a non-empty text".to_string());
            }
        }
        EnumConditionalFormat::CellIs(rule) => match rule.operator {
            EnumCellIsOperator::Between => {
                let (Some(n_min), Some(n_max)) = (rule.min_value, rule.max_value) else {
                    return Err("between needs minValue and maxValue".to_string());
                };
                if !(n_min.is_finite() && n_max.is_finite()) || n_min > n_max {
                    return Err(format!("between bounds {n_min}..{n_max} are not ordered"));
                }
            }
            EnumCellIsOperator::Equal => {
                if matches!(rule.value, None | Some(EnumCellValue::None)) {
                    return Err("equal needs a value".to_string());
                }
            }
            _ => {
                if rule.value.as_ref().and_then(parse_numeric_value).is_none() {
                    return Err(format!("{:?} needs a numeric value", rule.operator));
                }
            }
        },
    }
    Ok(())
}

/// Keys bound by more than one leaf, with their 1-based grid columns.
pub fn find_duplicate_keys(nodes: &[EnumHeaderNode]) -> BTreeMap<String, Vec<usize>> {
    let mut dict_pos: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    let mut n_col_cursor = 1usize;
    collect_leaf_positions(nodes, &mut n_col_cursor, &mut dict_pos);
    dict_pos.retain(|_, l_cols| l_cols.len() > 1);
    dict_pos
}

fn collect_leaf_positions(
    nodes: &[EnumHeaderNode],
    n_col_cursor: &mut usize,
    dict_pos: &mut BTreeMap<String, Vec<usize>>,
) {
    for node in nodes {
        match node {
            EnumHeaderNode::Leaf(leaf) => {
                dict_pos
                    .entry(leaf.key.clone())
                    .or_default()
                    .push(*n_col_cursor);
                *n_col_cursor += leaf.span;
            }
            EnumHeaderNode::Group(group) => {
                collect_leaf_positions(&group.children, n_col_cursor, dict_pos);
            }
        }
    }
}
