use anyhow::Context;
use mp_config::MetaportConfig;
use mp_diagram::{DiagramRequest, build_prompt, load_report};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::PromptArgs;
use crate::commands::run_context::exporter;
use crate::output::output;

#[derive(Debug, Serialize)]
struct PromptResponse {
    #[serde(flatten)]
    request: DiagramRequest,
    prompt: String,
}

/// Handle `mpt prompt`: build the model prompt from the run's text report.
pub fn handle(args: &PromptArgs, config: &MetaportConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let exporter = exporter(&args.run, config)?;
    let mut request = DiagramRequest::from_config(&exporter.run().run_id, args.notation, &config.diagram)?;
    if let Some(detail) = args.detail {
        request.detail = detail;
    }

    let report_path = exporter.text_path();
    let report = load_report(&report_path, request.max_input_chars)
        .context("run `mpt text` first to produce the report")?;
    let prompt = build_prompt(&report, request.notation, request.detail);

    output(&PromptResponse { request, prompt }, flags.format)
}
