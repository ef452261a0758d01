//! Single-step commands: `mpt text|json|tabular|summary`.

use mp_config::MetaportConfig;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::RunArgs;
use crate::commands::run_context::exporter;
use crate::output::output;

pub fn text(args: &RunArgs, config: &MetaportConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let response = exporter(args, config)?.write_text_output()?;
    output(&response, flags.format)
}

pub fn json(args: &RunArgs, config: &MetaportConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let response = exporter(args, config)?.write_json_output()?;
    output(&response, flags.format)
}

pub fn tabular(args: &RunArgs, config: &MetaportConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let response = exporter(args, config)?.write_tabular_output()?;
    output(&response, flags.format)
}

/// Never fails on persistence; the response carries no `path` instead.
pub fn summary(args: &RunArgs, config: &MetaportConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let response = exporter(args, config)?.summarize_outputs();
    output(&response, flags.format)
}
