//! CLI Commands

pub mod catalog;
pub mod check;
pub mod init;
pub mod role;

pub use catalog::CatalogCommand;
pub use check::{CheckCommand, LoginCommand};
pub use init::InitCommand;
pub use role::RoleCommand;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use engine::AccessControl;
use shared::{EngineConfig, Role};

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG: &str = "gatehouse.yaml";

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// State file holding the store snapshot
    #[arg(long, global = true, default_value = "gatehouse-state.json")]
    pub state: PathBuf,

    /// Engine config (JSON or YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

/// An engine opened from the state file
pub struct Workspace {
    pub engine: AccessControl,
    state: PathBuf,
}

impl Workspace {
    pub fn open(global: &GlobalArgs) -> anyhow::Result<Self> {
        let config = load_config(global)?;
        tracing::debug!(state = %global.state.display(), seed = ?config.seed, "opening workspace");
        let engine = AccessControl::open(&global.state, &config)
            .with_context(|| format!("Failed to open state {:?}", global.state))?;
        Ok(Self {
            engine,
            state: global.state.clone(),
        })
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.engine
            .save(&self.state)
            .with_context(|| format!("Failed to save state {:?}", self.state))
    }

    pub fn role_by_name(&self, name: &str) -> anyhow::Result<Role> {
        self.engine
            .roles()
            .find_role_by_name(name)?
            .ok_or_else(|| anyhow::anyhow!("Role '{}' not found", name))
    }
}

fn load_config(global: &GlobalArgs) -> anyhow::Result<EngineConfig> {
    let path = match &global.config {
        Some(path) => path.clone(),
        None if Path::new(DEFAULT_CONFIG).exists() => PathBuf::from(DEFAULT_CONFIG),
        None => return Ok(EngineConfig::default()),
    };

    let mut config = EngineConfig::from_file(&path)
        .with_context(|| format!("Failed to load config {:?}", path))?;

    // Seed paths are relative to the config file
    if let (Some(seed), Some(dir)) = (&config.seed, path.parent()) {
        if seed.is_relative() {
            config.seed = Some(dir.join(seed));
        }
    }
    Ok(config)
}
