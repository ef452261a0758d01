use std::path::{Path, PathBuf};

use anyhow::Context;
use mp_config::MetaportConfig;

use crate::cli::GlobalFlags;

/// Load `.env` and the layered config rooted at `--config-dir` (or the
/// current directory).
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<MetaportConfig> {
    let root = match &flags.config_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("failed to determine current directory")?,
    };

    load_dotenv(&root)?;

    MetaportConfig::load_from(&root)
        .with_context(|| format!("failed to load configuration under {}", root.display()))
}

fn load_dotenv(root: &Path) -> anyhow::Result<()> {
    let env_path: PathBuf = root.join(".env");
    if env_path.exists() {
        dotenvy::from_path(&env_path)
            .with_context(|| format!("failed to load dotenv file at {}", env_path.display()))?;
    }
    Ok(())
}
