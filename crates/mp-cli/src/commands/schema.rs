use mp_core::RunContext;
use mp_core::responses::{
    ExitStepsResponse, JsonOutputResponse, SummaryResponse, TabularOutputResponse, TextOutputResponse,
};
use schemars::schema_for;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::{SchemaArgs, SchemaTarget};
use crate::output::output;

/// Handle `mpt schema`: print the JSON schema of a step's input or response.
pub fn handle(args: &SchemaArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let schema = match args.target {
        SchemaTarget::RunContext => schema_for!(RunContext),
        SchemaTarget::Text => schema_for!(TextOutputResponse),
        SchemaTarget::Json => schema_for!(JsonOutputResponse),
        SchemaTarget::Tabular => schema_for!(TabularOutputResponse),
        SchemaTarget::Summary => schema_for!(SummaryResponse),
        SchemaTarget::ExitSteps => schema_for!(ExitStepsResponse),
    };
    output(&schema, flags.format)
}
