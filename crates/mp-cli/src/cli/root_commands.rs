use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use mp_diagram::{DetailLevel, Notation};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Run every exit step: structured document, text report, tabular export, summary.
    Export(ExportArgs),
    /// Write the tab-separated text report.
    Text(RunArgs),
    /// Write the structured JSON document.
    Json(RunArgs),
    /// Write the workbook, or the compressed bundle if the workbook fails.
    Tabular(RunArgs),
    /// Aggregate statistics sidecars and artifact paths into summary.json.
    Summary(RunArgs),
    /// Print the diagram prompt built from a run's text report.
    Prompt(PromptArgs),
    /// Sanitize model output into a bounded diagram.
    Diagram(DiagramArgs),
    /// Print the JSON schema of a step response.
    Schema(SchemaArgs),
}

/// Run context, from flags and/or the workflow engine's JSON argument map.
/// Flags override keys in `--args`.
#[derive(Clone, Debug, Default, Args)]
pub struct RunArgs {
    /// Run identifier; artifacts are written under `<artifacts_dir>/<run-id>/`
    #[arg(long)]
    pub run_id: Option<String>,

    /// Local root holding `raw/` and `transformed/` (defaults to `export.output_root`)
    #[arg(long)]
    pub output_path: Option<PathBuf>,

    /// Remote object-store prefix of the run's partitions
    #[arg(long)]
    pub output_prefix: Option<String>,

    /// JSON object with `output_path`, `output_prefix`, `run_id` (or `workflow_id`)
    #[arg(long, value_name = "JSON")]
    pub args: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Download the run's object-store prefix into the output path first
    #[arg(long)]
    pub download: bool,
}

#[derive(Clone, Debug, Args)]
pub struct PromptArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Target notation: flowchart or er
    #[arg(long, default_value = "er")]
    pub notation: Notation,

    /// Detail level (defaults to `diagram.detail`)
    #[arg(long)]
    pub detail: Option<DetailLevel>,
}

#[derive(Clone, Debug, Args)]
pub struct DiagramArgs {
    /// File holding the model output, or `-` for stdin
    #[arg(long)]
    pub input: PathBuf,

    /// Target notation: flowchart or er
    #[arg(long, default_value = "flowchart")]
    pub notation: Notation,
}

#[derive(Clone, Debug, Args)]
pub struct SchemaArgs {
    /// Response type to describe
    pub target: SchemaTarget,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SchemaTarget {
    RunContext,
    Text,
    Json,
    Tabular,
    Summary,
    ExitSteps,
}
