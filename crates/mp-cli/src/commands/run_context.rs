use anyhow::Context;
use mp_config::MetaportConfig;
use mp_core::RunContext;
use mp_export::Exporter;
use serde_json::{Map, Value};

use crate::cli::root_commands::RunArgs;

/// Merge `--args` with the individual flags and validate once.
///
/// `output_path` falls back to `export.output_root` when neither source
/// provides it.
pub fn resolve(args: &RunArgs, config: &MetaportConfig) -> anyhow::Result<RunContext> {
    let mut map = match &args.args {
        Some(raw) => match serde_json::from_str::<Value>(raw).context("--args is not valid JSON")? {
            Value::Object(map) => map,
            _ => anyhow::bail!("--args must be a JSON object"),
        },
        None => Map::new(),
    };

    if let Some(run_id) = &args.run_id {
        map.insert("run_id".into(), Value::String(run_id.clone()));
    }
    if let Some(prefix) = &args.output_prefix {
        map.insert("output_prefix".into(), Value::String(prefix.clone()));
    }
    if let Some(path) = &args.output_path {
        map.insert("output_path".into(), Value::String(path.to_string_lossy().into_owned()));
    }
    if !map.contains_key("output_path") {
        map.insert(
            "output_path".into(),
            Value::String(config.export.output_root.to_string_lossy().into_owned()),
        );
    }

    RunContext::from_args(&Value::Object(map)).context("invalid run context")
}

/// Resolve the run and bind it to the export configuration.
pub fn exporter(args: &RunArgs, config: &MetaportConfig) -> anyhow::Result<Exporter> {
    Ok(Exporter::new(resolve(args, config)?, &config.export))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn flags_override_json_args() {
        let args = RunArgs {
            run_id: Some("from-flag".into()),
            args: Some(r#"{"workflow_id":"wf","run_id":"from-json","output_prefix":"p","output_path":"/data"}"#.into()),
            ..Default::default()
        };
        let run = resolve(&args, &MetaportConfig::default()).unwrap();
        assert_eq!(run.run_id, "from-flag");
        assert_eq!(run.output_prefix, "p");
        assert_eq!(run.output_path, PathBuf::from("/data"));
    }

    #[test]
    fn output_path_defaults_to_config_root() {
        let args = RunArgs {
            run_id: Some("r1".into()),
            output_prefix: Some("exports/r1".into()),
            ..Default::default()
        };
        let run = resolve(&args, &MetaportConfig::default()).unwrap();
        assert_eq!(run.output_path, PathBuf::from("./local/tmp/artifacts"));
    }

    #[test]
    fn missing_prefix_fails_fast() {
        let args = RunArgs {
            run_id: Some("r1".into()),
            ..Default::default()
        };
        let err = resolve(&args, &MetaportConfig::default()).unwrap_err();
        assert!(format!("{err:#}").contains("output_prefix"));
    }

    #[test]
    fn non_object_args_rejected() {
        let args = RunArgs {
            args: Some("[1,2]".into()),
            ..Default::default()
        };
        assert!(resolve(&args, &MetaportConfig::default()).is_err());
    }
}
