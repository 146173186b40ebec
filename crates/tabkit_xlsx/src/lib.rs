//! `tabkit_xlsx` v1:
//! Header-driven tabular export to `.xlsx`.
//!
//! A forest of header nodes describes a multi-row grouped header. Leaves bind
//! data columns; groups span their descendants. The export pipeline runs in
//! stages:
//! - `header`   : header forest validation and key resolution
//! - `layout`   : column descriptors, merge regions and header placement
//! - `style`    : base styles and first-match conditional formats
//! - `document` : rows bound to the layout, one styled cell per column
//! - `writer`   : `rust_xlsxwriter` serialization into workbook bytes
//! - `export`   : `generate_export` / `download_export`
//!
//! Supporting modules:
//! - `conf`  : constants and default presets
//! - `spec`  : specs/models/options
//! - `error` : error taxonomy
//! - `util`  : pure helper functions
//! - `frame` : Polars DataFrame row source
pub mod conf;
pub mod document;
pub mod error;
pub mod export;
pub mod frame;
pub mod header;
pub mod layout;
pub mod spec;
pub mod style;
pub mod util;
pub mod writer;

pub use conf::{
    C_FILENAME_DEFAULT, C_MIME_XLSX, C_SHEET_NAME_DEFAULT, N_WIDTH_COLUMN_DEFAULT,
    derive_default_header_format, derive_percent_conditional_formats,
};
pub use document::{SpecDataCell, SpecExportDocument, assemble_export_document};
pub use error::{ExportError, ExportResult};
pub use export::{download_export, generate_export, save_export_blob};
pub use frame::{derive_rows_from_dataframe, derive_rows_from_ipc_bytes};
pub use header::{default_key_for, validate_header_forest};
pub use layout::resolve_header_layout;
pub use spec::{
    EnumAutofitColumnsRule, EnumCellIsOperator, EnumCellValue, EnumConditionalFormat,
    EnumHeaderNode, SpecAutofitCellsPolicy, SpecCellFormat, SpecCellIsRule, SpecCellPosition,
    SpecColumnDescriptor, SpecContainsTextRule, SpecExportBlob, SpecExportConfig,
    SpecExportReport, SpecHeaderCell, SpecHeaderLayout, SpecHeaderNode, SpecLayoutOptions,
    SpecMergeRegion, SpecRowRecord, SpecValuePolicy,
};
pub use style::{resolve_cell_style, resolve_data_cell_style};
pub use writer::write_export_document;
