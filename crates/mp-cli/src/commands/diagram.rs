use std::io::Read;
use std::path::Path;

use anyhow::Context;
use mp_diagram::{Notation, sanitize};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::DiagramArgs;
use crate::output::output;

#[derive(Debug, Serialize)]
struct DiagramOutput {
    notation: Notation,
    diagram: String,
}

/// Handle `mpt diagram`: sanitize model output read from a file or stdin.
pub fn handle(args: &DiagramArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let text = read_input(&args.input)?;
    let diagram = sanitize(&text, args.notation);
    output(
        &DiagramOutput {
            notation: args.notation,
            diagram,
        },
        flags.format,
    )
}

/// Model output is not guaranteed to be UTF-8; invalid bytes are replaced.
fn read_input(input: &Path) -> anyhow::Result<String> {
    let bytes = if input == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("failed to read model output from stdin")?;
        buf
    } else {
        std::fs::read(input).with_context(|| format!("failed to read {}", input.display()))?
    };
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
