//! cellgraph CLI - edit and inspect sheet snapshots

use anyhow::{bail, Context, Result};
use cellgraph::prelude::*;
use clap::{Args, Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "cellgraph")]
#[command(
    author,
    version,
    about = "Apply edits to a sheet snapshot and watch the recalculation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply edits in order, printing each batch of changes as a JSON line
    Apply {
        /// Snapshot file (started empty if it does not exist)
        file: PathBuf,

        /// Edits as ADDR=INPUT, e.g. A1=5 or B1==A1*2
        #[arg(required = true)]
        edits: Vec<String>,

        /// Write the resulting state back to the file
        #[arg(short, long)]
        write: bool,

        #[command(flatten)]
        grid: GridArgs,
    },

    /// Print value, display and formula of cells
    Show {
        /// Snapshot file
        file: PathBuf,

        /// Addresses to show
        #[arg(required = true)]
        addresses: Vec<String>,

        #[command(flatten)]
        grid: GridArgs,
    },

    /// Print every non-empty cell as a table
    Dump {
        /// Snapshot file
        file: PathBuf,

        #[command(flatten)]
        grid: GridArgs,
    },
}

#[derive(Args)]
struct GridArgs {
    /// Rows in a fresh grid
    #[arg(long, default_value_t = cellgraph::DEFAULT_ROWS)]
    rows: u32,

    /// Columns in a fresh grid
    #[arg(long, default_value_t = cellgraph::DEFAULT_COLS)]
    cols: u32,

    /// Largest range a formula may reference, in cells
    #[arg(long, default_value_t = WorkbookOptions::default().max_range_cells)]
    max_range_cells: u64,
}

impl GridArgs {
    fn options(&self) -> WorkbookOptions {
        WorkbookOptions::default()
            .with_rows(self.rows)
            .with_cols(self.cols)
            .with_max_range_cells(self.max_range_cells)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Apply {
            file,
            edits,
            write,
            grid,
        } => apply(&file, &edits, write, grid.options()),
        Commands::Show {
            file,
            addresses,
            grid,
        } => show(&file, &addresses, grid.options()),
        Commands::Dump { file, grid } => dump(&file, grid.options()),
    }
}

/// Load a snapshot file, or start empty when it does not exist
fn open(path: &Path, options: WorkbookOptions, create: bool) -> Result<Workbook> {
    if !path.exists() {
        if create {
            log::info!("'{}' does not exist; starting empty", path.display());
            return Ok(Workbook::with_options(options));
        }
        bail!("'{}' does not exist", path.display());
    }

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    let state = PersistedState::from_json(&json)
        .with_context(|| format!("Failed to parse '{}'", path.display()))?;
    Ok(Workbook::restore(state, options))
}

fn parse_edit(edit: &str) -> Result<(CellAddress, &str)> {
    let Some((address, input)) = edit.split_once('=') else {
        bail!("Edit '{}' is not of the form ADDR=INPUT", edit);
    };
    let address = CellAddress::parse(address.trim())
        .with_context(|| format!("Invalid address in edit '{}'", edit))?;
    Ok((address, input))
}

fn apply(path: &Path, edits: &[String], write: bool, options: WorkbookOptions) -> Result<()> {
    // Validate everything before touching the sheet
    let edits = edits
        .iter()
        .map(|edit| parse_edit(edit))
        .collect::<Result<Vec<_>>>()?;

    let mut workbook = open(path, options, true)?;
    let mut stdout = io::stdout().lock();

    for (address, input) in edits {
        let batch = workbook.edit_at(address, input);
        let line = serde_json::to_string(&batch).context("Failed to serialize batch")?;
        writeln!(stdout, "{}", line).context("Failed to write to stdout")?;

        let stats = workbook.last_stats();
        log::info!(
            "{}: {} evaluated, {} cycles, {} errors",
            address,
            stats.cells_evaluated,
            stats.cycles,
            stats.errors
        );
    }

    if write {
        let json = workbook
            .snapshot()
            .to_json_pretty()
            .context("Failed to serialize sheet")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write '{}'", path.display()))?;
        eprintln!("Wrote '{}'", path.display());
    }

    Ok(())
}

fn show(path: &Path, addresses: &[String], options: WorkbookOptions) -> Result<()> {
    let workbook = open(path, options, false)?;
    let mut stdout = io::stdout().lock();

    for address in addresses {
        let cell = workbook
            .get_cell(address)
            .with_context(|| format!("Invalid address '{}'", address))?;
        let line = serde_json::to_string(&cell).context("Failed to serialize cell")?;
        writeln!(stdout, "{}\t{}", address, line).context("Failed to write to stdout")?;
    }

    Ok(())
}

fn dump(path: &Path, options: WorkbookOptions) -> Result<()> {
    let workbook = open(path, options, false)?;
    let mut stdout = io::stdout().lock();

    let mut count = 0;
    for (address, cell) in workbook.non_empty_cells() {
        writeln!(stdout, "{}\t{}\t{}", address, cell.raw_input, cell.display)
            .context("Failed to write to stdout")?;
        count += 1;
    }

    if count == 0 {
        eprintln!("Warning: Sheet appears to be empty");
    }

    Ok(())
}
