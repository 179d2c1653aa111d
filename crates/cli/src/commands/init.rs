//! gatehouse init command

use clap::Args;
use engine::CatalogSeed;
use std::path::PathBuf;

use super::DEFAULT_CONFIG;

const SEED_FILE: &str = "seed.yaml";

#[derive(Debug, Args)]
pub struct InitCommand {
    /// Directory to initialize
    #[arg(default_value = ".")]
    pub directory: PathBuf,

    /// Write an empty seed instead of the example back office
    #[arg(long)]
    pub minimal: bool,

    /// Overwrite existing files
    #[arg(long)]
    pub force: bool,
}

impl InitCommand {
    pub fn run(&self) -> anyhow::Result<()> {
        println!("Initializing Gatehouse in {:?}", self.directory);
        std::fs::create_dir_all(&self.directory)?;

        let config_path = self.directory.join(DEFAULT_CONFIG);
        let seed_path = self.directory.join(SEED_FILE);
        for path in [&config_path, &seed_path] {
            if path.exists() && !self.force {
                anyhow::bail!("{:?} already exists (use --force to overwrite)", path);
            }
        }

        std::fs::write(
            &config_path,
            format!(
                "audit:\n  maxEntries: 10000\n  recordGranted: false\nseed: {}\n",
                SEED_FILE
            ),
        )?;

        let seed = if self.minimal {
            CatalogSeed::default()
        } else {
            CatalogSeed::example()
        };
        std::fs::write(&seed_path, serde_yaml::to_string(&seed)?)?;

        println!("{} Gatehouse initialized", console::style("✓").green());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_loadable_files() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = InitCommand {
            directory: dir.path().to_path_buf(),
            minimal: false,
            force: false,
        };
        cmd.run().unwrap();

        let config = shared::EngineConfig::from_file(&dir.path().join(DEFAULT_CONFIG)).unwrap();
        assert_eq!(config.seed, Some(PathBuf::from(SEED_FILE)));

        let seed = CatalogSeed::from_file(&dir.path().join(SEED_FILE)).unwrap();
        assert_eq!(seed, CatalogSeed::example());

        assert!(cmd.run().is_err());
    }
}
