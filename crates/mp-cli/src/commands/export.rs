use mp_config::MetaportConfig;
use mp_core::responses::ExitStepsResponse;
use mp_lake::ObjectStoreDownloader;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ExportArgs;
use crate::commands::run_context::exporter;
use crate::output::output;

/// Handle `mpt export`: optional download, then every exit step.
///
/// The response is always printed. The command fails afterwards if any step
/// failed so an external scheduler can retry the run.
pub async fn handle(args: &ExportArgs, config: &MetaportConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let exporter = exporter(&args.run, config)?;

    let response = if args.download {
        match ObjectStoreDownloader::from_config(&config.storage) {
            Ok(downloader) => exporter.download_and_run(&downloader).await,
            Err(error) => {
                tracing::warn!(%error, "object store unavailable; exporting local partitions only");
                exporter.run_exit_steps()
            }
        }
    } else {
        exporter.run_exit_steps()
    };

    output(&response, flags.format)?;

    let failed = failed_steps(&response);
    if !failed.is_empty() {
        anyhow::bail!("export steps failed: {}", failed.join(", "));
    }
    Ok(())
}

fn failed_steps(response: &ExitStepsResponse) -> Vec<&'static str> {
    [
        ("json", response.json.is_completed()),
        ("text", response.text.is_completed()),
        ("tabular", response.tabular.is_completed()),
        ("summary", response.summary.is_completed()),
    ]
    .into_iter()
    .filter_map(|(name, completed)| (!completed).then_some(name))
    .collect()
}
