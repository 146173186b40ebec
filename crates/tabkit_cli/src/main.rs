//! Tabkit CLI - header-driven xlsx export tool

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tabkit_xlsx::{
    SpecExportConfig, SpecHeaderNode, SpecRowRecord, derive_rows_from_ipc_bytes, download_export,
    resolve_header_layout, validate_header_forest,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tabkit")]
#[command(author, version, about = "Header-driven tabular export to xlsx")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a workbook from a header forest and rows and save it
    Export(ExportArgs),

    /// Print the resolved columns and header merges of a header forest
    Layout {
        /// Header forest (JSON array of header nodes)
        #[arg(long)]
        headers: PathBuf,

        /// Merge shallow leaves down to the deepest header row
        #[arg(long)]
        extend_leaf_rows: bool,
    },
}

#[derive(Args)]
struct ExportArgs {
    /// Header forest (JSON array of header nodes)
    #[arg(long)]
    headers: PathBuf,

    /// Rows as a JSON array of objects
    #[arg(long, conflicts_with = "rows_ipc", required_unless_present = "rows_ipc")]
    rows: Option<PathBuf>,

    /// Rows as a Polars IPC file
    #[arg(long)]
    rows_ipc: Option<PathBuf>,

    /// Export config (JSON); flags below override it
    #[arg(long, env = "TABKIT_CONFIG")]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Output filename (default: config filename, then download.xlsx)
    #[arg(short, long)]
    filename: Option<String>,

    /// Worksheet name
    #[arg(long)]
    sheet_name: Option<String>,

    /// Freeze panes below the header rows
    #[arg(long)]
    freeze_header: bool,

    /// Merge shallow leaves down to the deepest header row
    #[arg(long)]
    extend_leaf_rows: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Export(args) => run_export(&args),
        Commands::Layout {
            headers,
            extend_leaf_rows,
        } => show_layout(&headers, extend_leaf_rows),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run_export(args: &ExportArgs) -> Result<()> {
    let headers = read_headers(&args.headers)?;

    let rows: Vec<SpecRowRecord> = match (&args.rows, &args.rows_ipc) {
        (Some(path), _) => read_json(path).context("Failed to parse rows")?,
        (None, Some(path)) => {
            let bytes =
                fs::read(path).with_context(|| format!("Failed to read '{}'", path.display()))?;
            derive_rows_from_ipc_bytes(&bytes)?
        }
        (None, None) => bail!("one of --rows or --rows-ipc is required"),
    };

    let mut config = match &args.config {
        Some(path) => read_json::<SpecExportConfig>(path).context("Failed to parse config")?,
        None => SpecExportConfig::default(),
    };
    if let Some(sheet_name) = &args.sheet_name {
        config.sheet_name = sheet_name.clone();
    }
    config.if_freeze_header |= args.freeze_header;
    config.if_extend_leaf_rows |= args.extend_leaf_rows;

    let path_out = download_export(
        &headers,
        &rows,
        &args.out_dir,
        args.filename.as_deref(),
        &config,
    )?;

    info!(n_rows = rows.len(), "export finished");
    println!("{}", path_out.display());
    Ok(())
}

fn show_layout(path: &Path, extend_leaf_rows: bool) -> Result<()> {
    let headers = read_headers(path)?;
    let nodes = validate_header_forest(&headers)?;
    let config = SpecExportConfig {
        if_extend_leaf_rows: extend_leaf_rows,
        ..Default::default()
    };
    let layout = resolve_header_layout(&nodes, &config.layout_options());

    println!(
        "{} header row(s), {} grid column(s)",
        layout.n_rows_header, layout.total_columns
    );
    for column in &layout.columns {
        println!(
            "column {:>3}  span {}  width {:>5.1}  {:<16} {}",
            column.col, column.span, column.width, column.key, column.title
        );
    }
    for merge in &layout.merges {
        println!(
            "merge  R{}C{}:R{}C{}",
            merge.start.row, merge.start.col, merge.end.row, merge.end.col
        );
    }
    Ok(())
}

fn read_headers(path: &Path) -> Result<Vec<SpecHeaderNode>> {
    read_json(path).context("Failed to parse header forest")
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read '{}'", path.display()))?;
    let value = serde_json::from_str(&text)
        .with_context(|| format!("Invalid JSON in '{}'", path.display()))?;
    Ok(value)
}
