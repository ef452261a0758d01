use mp_config::MetaportConfig;

/// Emit warnings for likely mistyped env var keys that silently fell back to defaults.
pub fn warn_unconfigured(config: &MetaportConfig) {
    for warning in collect_unconfigured_warnings(config, std::env::vars()) {
        tracing::warn!("{warning}");
    }
}

fn collect_unconfigured_warnings<I>(config: &MetaportConfig, env: I) -> Vec<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let env_keys = env.into_iter().map(|(key, _)| key).collect::<Vec<_>>();

    let mut warnings = Vec::new();

    if !config.storage.is_configured() && has_env_prefix(&env_keys, "METAPORT_STORAGE_") {
        warnings.push(
            "Storage config appears default while METAPORT_STORAGE* env vars exist. Use double underscores (example: METAPORT_STORAGE__BUCKET_NAME)."
                .to_string(),
        );
    }

    if config.export.fallback().is_none() && env_keys.iter().any(|k| k == "METAPORT_EXPORT_FALLBACK_ROOT") {
        warnings.push(
            "METAPORT_EXPORT_FALLBACK_ROOT is set but ignored. Use METAPORT_EXPORT__FALLBACK_ROOT."
                .to_string(),
        );
    }

    warnings
}

fn has_env_prefix(keys: &[String], prefix: &str) -> bool {
    keys.iter()
        .any(|key| key.starts_with(prefix) && !key.contains("__"))
}
