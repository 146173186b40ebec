//! Shared export specification models.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::conf::{C_FILENAME_DEFAULT, C_SHEET_NAME_DEFAULT};

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification. Every field is optional; unset fields inherit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct SpecCellFormat {
    /// Font family name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_name: Option<String>,
    /// Font size in points.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<i64>,
    /// Bold style.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    /// Italic style.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    /// Single underline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    /// Font color (`RRGGBB`, `#RRGGBB` or `AARRGGBB`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_color: Option<String>,
    /// Solid background fill color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<String>,

    /// Horizontal alignment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<String>,
    /// Vertical alignment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valign: Option<String>,
    /// Text wrap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_wrap: Option<bool>,
    /// Number format code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_format: Option<String>,

    /// Border style for all sides.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border: Option<i64>,
    /// Top border override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<i64>,
    /// Bottom border override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom: Option<i64>,
    /// Left border override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<i64>,
    /// Right border override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<i64>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            underline: other.underline.or(self.underline),
            font_color: other.font_color.clone().or_else(|| self.font_color.clone()),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            text_wrap: other.text_wrap.or(self.text_wrap),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
            border: other.border.or(self.border),
            top: other.top.or(self.top),
            bottom: other.bottom.or(self.bottom),
            left: other.left.or(self.left),
            right: other.right.or(self.right),
        }
    }

    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        *self == SpecCellFormat::default()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellValueSpecification

/// Scalar cell value. Serialized untagged: `null`, number or string.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumCellValue {
    /// Missing/blank value.
    #[default]
    None,
    /// Numeric value.
    Number(f64),
    /// Text value.
    String(String),
}

impl EnumCellValue {
    /// Literal display text used by text predicates and width estimation.
    pub fn to_text(&self) -> String {
        match self {
            EnumCellValue::None => String::new(),
            EnumCellValue::Number(n) => n.to_string(),
            EnumCellValue::String(s) => s.clone(),
        }
    }
}

impl From<f64> for EnumCellValue {
    fn from(value: f64) -> Self {
        EnumCellValue::Number(value)
    }
}

impl From<i64> for EnumCellValue {
    fn from(value: i64) -> Self {
        EnumCellValue::Number(value as f64)
    }
}

impl From<&str> for EnumCellValue {
    fn from(value: &str) -> Self {
        EnumCellValue::String(value.to_string())
    }
}

impl From<String> for EnumCellValue {
    fn from(value: String) -> Self {
        EnumCellValue::String(value)
    }
}

/// One data row: column key to scalar value, in insertion order.
pub type SpecRowRecord = IndexMap<String, EnumCellValue>;

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ConditionalFormatSpecification

/// Comparison operator of a `cellIs` rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnumCellIsOperator {
    /// `value == threshold` (numeric or literal text).
    Equal,
    /// `value < threshold`.
    LessThan,
    /// `value > threshold`.
    GreaterThan,
    /// `value <= threshold`.
    LessThanOrEqual,
    /// `value >= threshold`.
    GreaterThanOrEqual,
    /// `min_value <= value <= max_value`.
    Between,
}

/// Value-comparison rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecCellIsRule {
    /// Comparison operator.
    pub operator: EnumCellIsOperator,
    /// Threshold for all operators except `between`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<EnumCellValue>,
    /// Inclusive lower bound for `between`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    /// Inclusive upper bound for `between`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    /// Style applied when the rule matches.
    #[serde(default, alias = "customStyle")]
    pub style: SpecCellFormat,
}

/// Case-sensitive substring rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecContainsTextRule {
    /// Needle searched in the literal cell text.
    pub text: String,
    /// Style applied when the rule matches.
    #[serde(default, alias = "customStyle")]
    pub style: SpecCellFormat,
}

/// Conditional format rule attached to a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EnumConditionalFormat {
    /// Compare the cell value against thresholds.
    CellIs(SpecCellIsRule),
    /// Search the cell text.
    ContainsText(SpecContainsTextRule),
}

impl EnumConditionalFormat {
    /// Style applied when the rule matches.
    pub fn style(&self) -> &SpecCellFormat {
        match self {
            EnumConditionalFormat::CellIs(rule) => &rule.style,
            EnumConditionalFormat::ContainsText(rule) => &rule.style,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region HeaderSpecification

/// Caller-supplied header node as it arrives over the wire.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpecHeaderNode {
    /// Display text.
    pub title: String,
    /// Data-row field bound by a leaf.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Column width hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Explicit width in grid columns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<usize>,
    /// Nested header nodes; non-empty makes this node a group.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<SpecHeaderNode>>,
    /// Base style of the data cells under a leaf.
    #[serde(skip_serializing_if = "Option::is_none", alias = "customStyle")]
    pub style: Option<SpecCellFormat>,
    /// Conditional formats evaluated per data cell under a leaf.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditional_formats: Option<Vec<EnumConditionalFormat>>,
    /// Infer the column width from content when no width is given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_width: Option<bool>,
}

impl SpecHeaderNode {
    /// Leaf bound to `key`.
    pub fn leaf(title: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            key: Some(key.into()),
            ..Default::default()
        }
    }

    /// Group over `children`.
    pub fn group(title: impl Into<String>, children: Vec<SpecHeaderNode>) -> Self {
        Self {
            title: title.into(),
            children: Some(children),
            ..Default::default()
        }
    }

    /// Builder-style explicit span.
    pub fn with_span(mut self, span: usize) -> Self {
        self.span = Some(span);
        self
    }

    /// Builder-style width hint.
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    /// Builder-style conditional formats.
    pub fn with_conditional_formats(mut self, formats: Vec<EnumConditionalFormat>) -> Self {
        self.conditional_formats = Some(formats);
        self
    }

    /// Builder-style column style.
    pub fn with_style(mut self, style: SpecCellFormat) -> Self {
        self.style = Some(style);
        self
    }
}

/// Validated leaf node: exactly one data column.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecHeaderLeaf {
    /// Display text.
    pub title: String,
    /// Resolved (possibly synthetic) column key.
    pub key: String,
    /// Explicit width hint.
    pub width: Option<f64>,
    /// Width in grid columns, >= 1.
    pub span: usize,
    /// Infer width from content.
    pub if_auto_width: bool,
    /// Base style of the data cells.
    pub style: Option<SpecCellFormat>,
    /// Conditional formats in declaration order.
    pub conditional_formats: Vec<EnumConditionalFormat>,
}

/// Validated group node: spans all descendant leaf columns.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecHeaderGroup {
    /// Display text.
    pub title: String,
    /// Owned, non-empty children.
    pub children: Vec<EnumHeaderNode>,
}

/// Validated header node.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumHeaderNode {
    /// Data column.
    Leaf(SpecHeaderLeaf),
    /// Structural grouping header.
    Group(SpecHeaderGroup),
}

impl EnumHeaderNode {
    /// Effective span: explicit span of a leaf, or sum of child spans.
    pub fn span(&self) -> usize {
        match self {
            EnumHeaderNode::Leaf(leaf) => leaf.span,
            EnumHeaderNode::Group(group) => group.children.iter().map(Self::span).sum(),
        }
    }

    /// Number of header rows occupied by this subtree.
    pub fn depth(&self) -> usize {
        match self {
            EnumHeaderNode::Leaf(_) => 1,
            EnumHeaderNode::Group(group) => {
                1 + group.children.iter().map(Self::depth).max().unwrap_or(0)
            }
        }
    }

    /// Display text.
    pub fn title(&self) -> &str {
        match self {
            EnumHeaderNode::Leaf(leaf) => &leaf.title,
            EnumHeaderNode::Group(group) => &group.title,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region LayoutSpecification

/// 1-based sheet coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpecCellPosition {
    /// 1-based row.
    pub row: usize,
    /// 1-based column.
    pub col: usize,
}

/// Inclusive rectangle rendered as one joined header cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpecMergeRegion {
    /// Top-left corner.
    pub start: SpecCellPosition,
    /// Bottom-right corner.
    pub end: SpecCellPosition,
}

impl SpecMergeRegion {
    /// Region covering `row_start..=row_end` x `col_start..=col_end`.
    pub fn new(row_start: usize, col_start: usize, row_end: usize, col_end: usize) -> Self {
        Self {
            start: SpecCellPosition {
                row: row_start,
                col: col_start,
            },
            end: SpecCellPosition {
                row: row_end,
                col: col_end,
            },
        }
    }

    /// Whether the region covers exactly one cell.
    pub fn is_single_cell(&self) -> bool {
        self.start == self.end
    }

    /// Whether `pos` lies inside the region.
    pub fn contains(&self, pos: SpecCellPosition) -> bool {
        pos.row >= self.start.row
            && pos.row <= self.end.row
            && pos.col >= self.start.col
            && pos.col <= self.end.col
    }

    /// Whether two regions share at least one cell.
    pub fn overlaps(&self, other: &SpecMergeRegion) -> bool {
        self.start.row <= other.end.row
            && other.start.row <= self.end.row
            && self.start.col <= other.end.col
            && other.start.col <= self.end.col
    }
}

/// Flattened data column derived from one leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecColumnDescriptor {
    /// Row field bound to this column.
    pub key: String,
    /// Leaf title.
    pub title: String,
    /// Display width.
    pub width: f64,
    /// Whether `width` came from the header rather than the default.
    pub if_width_explicit: bool,
    /// Width requested from content.
    pub if_auto_width: bool,
    /// First 1-based grid column occupied by the leaf.
    pub col: usize,
    /// Grid columns occupied by the leaf header.
    pub span: usize,
    /// Base style of the data cells.
    pub style: Option<SpecCellFormat>,
    /// Conditional formats in declaration order.
    pub conditional_formats: Vec<EnumConditionalFormat>,
}

/// Placed header title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecHeaderCell {
    /// 1-based header row (tree depth).
    pub row: usize,
    /// 1-based first grid column.
    pub col: usize,
    /// Display text.
    pub text: String,
}

/// Resolver output.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecHeaderLayout {
    /// Data columns in left-to-right leaf order.
    pub columns: Vec<SpecColumnDescriptor>,
    /// Header merges in pre-order.
    pub merges: Vec<SpecMergeRegion>,
    /// Header titles in pre-order.
    pub header_cells: Vec<SpecHeaderCell>,
    /// Grid width in columns.
    pub total_columns: usize,
    /// Header height in rows (deepest tree level).
    pub n_rows_header: usize,
}

/// Resolver switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpecLayoutOptions {
    /// Merge leaves above the deepest header row down to that row.
    pub if_extend_leaf_rows: bool,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ExportOptions

/// Autofit rule for column width inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnumAutofitColumnsRule {
    /// Only columns flagged `autoWidth` are inferred (default).
    #[default]
    None,
    /// Infer width from header cells.
    Header,
    /// Infer width from body cells.
    Body,
    /// Infer width from both header and body cells.
    All,
}

/// Autofit policy for columns without an explicit width.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpecAutofitCellsPolicy {
    /// Autofit width inference rule.
    pub rule_columns: EnumAutofitColumnsRule,
    /// Max body rows inspected when body-based inference is active.
    pub height_body_inferred_max: Option<usize>,
    /// Minimum final width.
    pub width_cell_min: usize,
    /// Maximum final width.
    pub width_cell_max: usize,
    /// Width padding added after inference.
    pub width_cell_padding: usize,
}

impl Default for SpecAutofitCellsPolicy {
    fn default() -> Self {
        Self {
            rule_columns: EnumAutofitColumnsRule::None,
            height_body_inferred_max: Some(20_000),
            width_cell_min: 8,
            width_cell_max: 60,
            width_cell_padding: 2,
        }
    }
}

/// Rendering of non-finite numbers in data cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpecValuePolicy {
    /// Write NaN/Inf as text instead of blank.
    pub if_keep_non_finite: bool,
    /// Replacement text for NaN.
    pub nan_str: String,
    /// Replacement text for positive infinity.
    pub posinf_str: String,
    /// Replacement text for negative infinity.
    pub neginf_str: String,
}

impl Default for SpecValuePolicy {
    fn default() -> Self {
        Self {
            if_keep_non_finite: false,
            nan_str: "NaN".to_string(),
            posinf_str: "Inf".to_string(),
            neginf_str: "-Inf".to_string(),
        }
    }
}

/// Per-export configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpecExportConfig {
    /// Worksheet name.
    pub sheet_name: String,
    /// Filename used by the save-as step.
    pub filename: String,
    /// Freeze panes below the header rows.
    pub if_freeze_header: bool,
    /// Merge shallow leaves down to the deepest header row.
    pub if_extend_leaf_rows: bool,
    /// Column autofit policy.
    pub policy_autofit: SpecAutofitCellsPolicy,
    /// Non-finite number rendering.
    pub value_policy: SpecValuePolicy,
}

impl Default for SpecExportConfig {
    fn default() -> Self {
        Self {
            sheet_name: C_SHEET_NAME_DEFAULT.to_string(),
            filename: C_FILENAME_DEFAULT.to_string(),
            if_freeze_header: false,
            if_extend_leaf_rows: false,
            policy_autofit: SpecAutofitCellsPolicy::default(),
            value_policy: SpecValuePolicy::default(),
        }
    }
}

impl SpecExportConfig {
    /// Config with a custom sheet name and defaults elsewhere.
    pub fn with_sheet_name(sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            ..Default::default()
        }
    }

    /// Resolver switches derived from this config.
    pub fn layout_options(&self) -> SpecLayoutOptions {
        SpecLayoutOptions {
            if_extend_leaf_rows: self.if_extend_leaf_rows,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Per-export report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecExportReport {
    /// Sheet name actually written.
    pub sheet_name: String,
    /// Header height in rows.
    pub n_rows_header: usize,
    /// Grid width in columns.
    pub n_columns: usize,
    /// Data rows written.
    pub n_rows_data: usize,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecExportReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

/// Serialized export ready for hand-off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecExportBlob {
    /// Workbook bytes.
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`.
    pub mime_type: &'static str,
    /// Suggested filename.
    pub filename: String,
    /// Export report.
    pub report: SpecExportReport,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_header_node_reads_camel_case_wire_form() {
        let c_json = r#"[
            {"title": "Org", "key": "ou", "width": 30},
            {"title": "Q1", "children": [
                {"title": "%", "key": "q1_p", "autoWidth": true,
                 "customStyle": {"numFormat": "0.0"},
                 "conditionalFormats": [
                    {"type": "cellIs", "operator": "lessThanOrEqual", "value": 50,
                     "style": {"bgColor": "FFFF0000"}},
                    {"type": "cellIs", "operator": "between", "minValue": 50, "maxValue": 75,
                     "style": {"bgColor": "FFFFFF00"}},
                    {"type": "containsText", "text": "n/a", "style": {"italic": true}}
                 ]}
            ]}
        ]"#;

        let headers: Vec<SpecHeaderNode> = serde_json::from_str(c_json).unwrap();
        assert_eq!(headers[0], SpecHeaderNode::leaf("Org", "ou").with_width(30.0));

        let leaf = &headers[1].children.as_ref().unwrap()[0];
        assert_eq!(leaf.auto_width, Some(true));
        assert_eq!(
            leaf.style.as_ref().and_then(|s| s.num_format.as_deref()),
            Some("0.0")
        );

        let l_formats = leaf.conditional_formats.as_ref().unwrap();
        assert_eq!(l_formats.len(), 3);
        match &l_formats[0] {
            EnumConditionalFormat::CellIs(rule) => {
                assert_eq!(rule.operator, EnumCellIsOperator::LessThanOrEqual);
                assert_eq!(rule.value, Some(EnumCellValue::Number(50.0)));
            }
            other => panic!("unexpected rule: {other:?}"),
        }
        assert!(matches!(
            &l_formats[2],
            EnumConditionalFormat::ContainsText(rule) if rule.text == "n/a"
        ));
    }

    #[test]
    fn test_cell_format_rejects_unknown_fields() {
        let err = serde_json::from_str::<SpecCellFormat>(r#"{"fill": {"fgColor": {"argb": "FFFF0000"}}}"#);
        assert!(err.is_err());

        let c_json = r#"[{"title": "A", "key": "a", "customStyle": {"font": {"bold": true}}}]"#;
        assert!(serde_json::from_str::<Vec<SpecHeaderNode>>(c_json).is_err());

        let format: SpecCellFormat =
            serde_json::from_str(r#"{"bold": true, "fontColor": "FF0000FF"}"#).unwrap();
        assert_eq!(format.bold, Some(true));
        assert_eq!(format.font_color.as_deref(), Some("FF0000FF"));
    }

    #[test]
    fn test_row_record_keeps_order_and_value_kinds() {
        let row: SpecRowRecord =
            serde_json::from_str(r#"{"b": "text", "a": 1.5, "c": null, "d": 7}"#).unwrap();
        assert_eq!(
            row.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["b", "a", "c", "d"]
        );
        assert_eq!(row["a"], EnumCellValue::Number(1.5));
        assert_eq!(row["c"], EnumCellValue::None);
        assert_eq!(row["d"], EnumCellValue::Number(7.0));
    }

    #[test]
    fn test_export_config_defaults_fill_missing_fields() {
        let config: SpecExportConfig =
            serde_json::from_str(r#"{"sheetName": "Report", "ifFreezeHeader": true}"#).unwrap();
        assert_eq!(config.sheet_name, "Report");
        assert!(config.if_freeze_header);
        assert_eq!(config.filename, C_FILENAME_DEFAULT);
        assert_eq!(config.policy_autofit, SpecAutofitCellsPolicy::default());
    }

    #[test]
    fn test_cell_format_merge_overlays_set_fields() {
        let base = SpecCellFormat {
            bold: Some(true),
            bg_color: Some("FFFFFF".to_string()),
            ..Default::default()
        };
        let merged = base.with_(SpecCellFormat {
            bg_color: Some("FF0000".to_string()),
            ..Default::default()
        });
        assert_eq!(merged.bold, Some(true));
        assert_eq!(merged.bg_color.as_deref(), Some("FF0000"));
        assert_eq!(base.bg_color.as_deref(), Some("FFFFFF"));
        assert!(SpecCellFormat::default().is_empty());
    }

    #[test]
    fn test_merge_region_geometry() {
        let region = SpecMergeRegion::new(1, 2, 1, 4);
        assert!(!region.is_single_cell());
        assert!(region.contains(SpecCellPosition { row: 1, col: 3 }));
        assert!(!region.contains(SpecCellPosition { row: 2, col: 3 }));
        assert!(region.overlaps(&SpecMergeRegion::new(1, 4, 2, 4)));
        assert!(!region.overlaps(&SpecMergeRegion::new(2, 2, 2, 4)));
        assert!(SpecMergeRegion::new(3, 3, 3, 3).is_single_cell());
    }
}
