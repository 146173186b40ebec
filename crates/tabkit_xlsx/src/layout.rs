//! Header layout resolver.
//!
//! Walks the validated header forest depth-first, pre-order, left to right.
//! Row `i` of the header region holds every node at tree depth `i`. Each leaf
//! becomes one [`SpecColumnDescriptor`] no matter how many grid columns its
//! header spans; groups and wide leaves emit a [`SpecMergeRegion`].

use tracing::debug;

use crate::conf::N_WIDTH_COLUMN_DEFAULT;
use crate::spec::{
    EnumHeaderNode, SpecColumnDescriptor, SpecHeaderCell, SpecHeaderLayout, SpecHeaderLeaf,
    SpecLayoutOptions, SpecMergeRegion,
};

/// Resolve column descriptors, merge regions and header placement.
///
/// Sibling order is preserved exactly. An empty forest yields an empty layout.
pub fn resolve_header_layout(
    nodes: &[EnumHeaderNode],
    options: &SpecLayoutOptions,
) -> SpecHeaderLayout {
    let mut layout = SpecHeaderLayout {
        n_rows_header: nodes.iter().map(EnumHeaderNode::depth).max().unwrap_or(0),
        ..Default::default()
    };

    let mut n_col_cursor = 1usize;
    layout_nodes(nodes, 1, &mut n_col_cursor, options, &mut layout);

    debug!(
        n_columns = layout.columns.len(),
        n_merges = layout.merges.len(),
        total_columns = layout.total_columns,
        n_rows_header = layout.n_rows_header,
        "resolved header layout"
    );
    layout
}

fn layout_nodes(
    nodes: &[EnumHeaderNode],
    n_row: usize,
    n_col_cursor: &mut usize,
    options: &SpecLayoutOptions,
    layout: &mut SpecHeaderLayout,
) {
    for node in nodes {
        let n_col_start = *n_col_cursor;
        let n_span = node.span();

        layout.header_cells.push(SpecHeaderCell {
            row: n_row,
            col: n_col_start,
            text: node.title().to_string(),
        });

        match node {
            EnumHeaderNode::Group(group) => {
                layout.merges.push(SpecMergeRegion::new(
                    n_row,
                    n_col_start,
                    n_row,
                    n_col_start + n_span - 1,
                ));
                layout_nodes(&group.children, n_row + 1, n_col_cursor, options, layout);
                debug_assert_eq!(*n_col_cursor, n_col_start + n_span);
            }
            EnumHeaderNode::Leaf(leaf) => {
                let n_row_end = if options.if_extend_leaf_rows {
                    usize::max(n_row, layout.n_rows_header)
                } else {
                    n_row
                };
                if n_span > 1 || n_row_end > n_row {
                    layout.merges.push(SpecMergeRegion::new(
                        n_row,
                        n_col_start,
                        n_row_end,
                        n_col_start + n_span - 1,
                    ));
                }
                layout
                    .columns
                    .push(create_column_descriptor(leaf, n_col_start));
                *n_col_cursor += n_span;
            }
        }

        layout.total_columns = usize::max(layout.total_columns, *n_col_cursor - 1);
    }
}

fn create_column_descriptor(leaf: &SpecHeaderLeaf, n_col_start: usize) -> SpecColumnDescriptor {
    SpecColumnDescriptor {
        key: leaf.key.clone(),
        title: leaf.title.clone(),
        width: leaf.width.unwrap_or(N_WIDTH_COLUMN_DEFAULT),
        if_width_explicit: leaf.width.is_some(),
        if_auto_width: leaf.if_auto_width,
        col: n_col_start,
        span: leaf.span,
        style: leaf.style.clone(),
        conditional_formats: leaf.conditional_formats.clone(),
    }
}

/// Inclusive 1-based grid column range of every leaf, left to right.
pub fn derive_leaf_column_ranges(layout: &SpecHeaderLayout) -> Vec<(usize, usize)> {
    layout
        .columns
        .iter()
        .map(|column| (column.col, column.col + column.span - 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::header::validate_header_forest;
    use crate::spec::SpecHeaderNode;

    fn resolve(headers: &[SpecHeaderNode], options: SpecLayoutOptions) -> SpecHeaderLayout {
        let nodes = validate_header_forest(headers).expect("valid headers");
        resolve_header_layout(&nodes, &options)
    }

    fn keys(layout: &SpecHeaderLayout) -> Vec<&str> {
        layout.columns.iter().map(|c| c.key.as_str()).collect()
    }

    fn nested_headers() -> Vec<SpecHeaderNode> {
        vec![
            SpecHeaderNode::leaf("Org", "ou").with_width(30.0),
            SpecHeaderNode::group(
                "2024",
                vec![
                    SpecHeaderNode::group(
                        "Q1",
                        vec![
                            SpecHeaderNode::leaf("N", "q1_n"),
                            SpecHeaderNode::leaf("D", "q1_d"),
                        ],
                    ),
                    SpecHeaderNode::leaf("Notes", "notes").with_span(2),
                    SpecHeaderNode::group("Q2", vec![SpecHeaderNode::leaf("%", "q2_p")]),
                ],
            ),
            SpecHeaderNode::leaf("Tail", "tail"),
        ]
    }

    #[test]
    fn test_scenario_group_with_two_leaves() {
        let headers = vec![
            SpecHeaderNode::leaf("Name", "name"),
            SpecHeaderNode::group(
                "Totals",
                vec![SpecHeaderNode::leaf("N", "n"), SpecHeaderNode::leaf("D", "d")],
            ),
        ];
        let layout = resolve(&headers, SpecLayoutOptions::default());

        assert_eq!(keys(&layout), vec!["name", "n", "d"]);
        assert_eq!(layout.total_columns, 3);
        assert_eq!(layout.n_rows_header, 2);
        assert_eq!(layout.merges, vec![SpecMergeRegion::new(1, 2, 1, 3)]);
        assert_eq!(
            layout.header_cells,
            vec![
                SpecHeaderCell { row: 1, col: 1, text: "Name".to_string() },
                SpecHeaderCell { row: 1, col: 2, text: "Totals".to_string() },
                SpecHeaderCell { row: 2, col: 2, text: "N".to_string() },
                SpecHeaderCell { row: 2, col: 3, text: "D".to_string() },
            ]
        );
    }

    #[test]
    fn test_scenario_wide_leaf_is_one_column() {
        let headers = vec![SpecHeaderNode::leaf("Wide", "w").with_span(3)];
        let layout = resolve(&headers, SpecLayoutOptions::default());

        assert_eq!(keys(&layout), vec!["w"]);
        assert_eq!(layout.total_columns, 3);
        assert_eq!(layout.merges, vec![SpecMergeRegion::new(1, 1, 1, 3)]);
        assert_eq!(layout.columns[0].col, 1);
        assert_eq!(layout.columns[0].span, 3);
        assert_eq!(layout.columns[0].width, N_WIDTH_COLUMN_DEFAULT);
    }

    #[test]
    fn test_scenario_empty_forest() {
        let layout = resolve(&[], SpecLayoutOptions::default());
        assert_eq!(layout, SpecHeaderLayout::default());
    }

    #[test]
    fn test_nested_layout_merges_in_pre_order() {
        let layout = resolve(&nested_headers(), SpecLayoutOptions::default());

        assert_eq!(
            keys(&layout),
            vec!["ou", "q1_n", "q1_d", "notes", "q2_p", "tail"]
        );
        assert_eq!(layout.total_columns, 7);
        assert_eq!(layout.n_rows_header, 3);
        assert_eq!(
            layout.merges,
            vec![
                SpecMergeRegion::new(1, 2, 1, 6),
                SpecMergeRegion::new(2, 2, 2, 3),
                SpecMergeRegion::new(2, 4, 2, 5),
                SpecMergeRegion::new(2, 6, 2, 6),
            ]
        );
        assert_eq!(layout.columns[0].width, 30.0);
        assert!(layout.columns[0].if_width_explicit);
        assert_eq!(layout.columns[4].col, 6);
        assert_eq!(layout.columns[5].col, 7);
    }

    #[test]
    fn test_span_conservation_and_contiguous_coverage() {
        let layout = resolve(&nested_headers(), SpecLayoutOptions::default());

        let l_ranges = derive_leaf_column_ranges(&layout);
        assert_eq!(l_ranges.len(), layout.columns.len());

        let n_span_sum: usize = l_ranges.iter().map(|(a, b)| b - a + 1).sum();
        assert_eq!(n_span_sum, layout.total_columns);

        let mut n_expected_start = 1;
        for (n_start, n_end) in l_ranges {
            assert_eq!(n_start, n_expected_start);
            n_expected_start = n_end + 1;
        }
        assert_eq!(n_expected_start, layout.total_columns + 1);
    }

    #[test]
    fn test_merges_never_overlap() {
        for options in [
            SpecLayoutOptions::default(),
            SpecLayoutOptions { if_extend_leaf_rows: true },
        ] {
            let layout = resolve(&nested_headers(), options);
            for (n_idx, merge) in layout.merges.iter().enumerate() {
                assert!(merge.end.row <= layout.n_rows_header);
                for other in &layout.merges[n_idx + 1..] {
                    assert!(!merge.overlaps(other), "{merge:?} overlaps {other:?}");
                }
            }
        }
    }

    #[test]
    fn test_resolver_is_deterministic() {
        let nodes = validate_header_forest(&nested_headers()).unwrap();
        let layout_a = resolve_header_layout(&nodes, &SpecLayoutOptions::default());
        let layout_b = resolve_header_layout(&nodes, &SpecLayoutOptions::default());
        assert_eq!(layout_a, layout_b);
    }

    #[test]
    fn test_extend_leaf_rows_merges_down_to_last_header_row() {
        let layout = resolve(
            &nested_headers(),
            SpecLayoutOptions { if_extend_leaf_rows: true },
        );

        assert!(layout.merges.contains(&SpecMergeRegion::new(1, 1, 3, 1)));
        assert!(layout.merges.contains(&SpecMergeRegion::new(2, 4, 3, 5)));
        assert!(layout.merges.contains(&SpecMergeRegion::new(1, 7, 3, 7)));
        // Leaves already on the last row stay unmerged.
        assert!(
            !layout
                .merges
                .iter()
                .any(|m| m.start.row == 3 && m.start.col == 2)
        );

        let n_cols_covered_last_row: usize = (1..=layout.total_columns)
            .filter(|n_col| {
                layout.merges.iter().any(|m| {
                    m.contains(crate::spec::SpecCellPosition { row: 3, col: *n_col })
                }) || layout
                    .header_cells
                    .iter()
                    .any(|c| c.row == 3 && c.col == *n_col)
            })
            .count();
        assert_eq!(n_cols_covered_last_row, layout.total_columns);
    }
}
