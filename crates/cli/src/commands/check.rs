//! gatehouse check / login commands

use clap::Args;
use engine::RequestContext;
use shared::PrincipalId;

use super::{GlobalArgs, Workspace};

#[derive(Debug, Args)]
pub struct CheckCommand {
    /// Principal id (omit to check an anonymous request)
    #[arg(short, long)]
    pub principal: Option<u64>,

    /// Module code
    pub module: String,

    /// Action code
    pub action: String,
}

impl CheckCommand {
    pub fn run(&self, global: &GlobalArgs) -> anyhow::Result<()> {
        let workspace = Workspace::open(global)?;
        let mut ctx = match self.principal {
            Some(id) => RequestContext::for_principal(PrincipalId::new(id)),
            None => RequestContext::anonymous(),
        };

        let key = shared::Permission::key_for(&self.module, &self.action);
        match workspace.engine.authorize(&mut ctx, &self.module, &self.action) {
            Ok(()) => {
                if global.json {
                    println!("{}", serde_json::json!({ "allowed": true, "permission": key }));
                } else {
                    let who = ctx.principal().map(|p| p.username.as_str()).unwrap_or("?");
                    println!("{} {} may {}", console::style("ALLOW").green().bold(), who, key);
                }
                Ok(())
            }
            Err(err) => {
                if global.json {
                    let out = serde_json::json!({
                        "allowed": false,
                        "permission": key,
                        "status": err.status_code(),
                        "error": err.to_body(),
                    });
                    println!("{}", out);
                } else {
                    println!(
                        "{} {} ({})",
                        console::style("DENY").red().bold(),
                        err,
                        err.status_code()
                    );
                }
                anyhow::bail!("denied with status {}: {}", err.status_code(), err)
            }
        }
    }
}

#[derive(Debug, Args)]
pub struct LoginCommand {
    /// Principal id
    #[arg(short, long)]
    pub principal: u64,
}

impl LoginCommand {
    pub fn run(&self, global: &GlobalArgs) -> anyhow::Result<()> {
        let workspace = Workspace::open(global)?;
        let response = workspace.engine.login(PrincipalId::new(self.principal))?;

        if global.json {
            println!("{}", serde_json::to_string_pretty(&response)?);
            return Ok(());
        }

        println!(
            "Logged in as {} (role {})",
            console::style(&response.principal.username).bold(),
            response
                .principal
                .role_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "none".to_string())
        );
        for key in shared::access_tree_keys(&response.access) {
            println!("  {}", key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global(dir: &std::path::Path) -> GlobalArgs {
        let config = dir.join("gatehouse.json");
        std::fs::write(&config, "{}").unwrap();
        GlobalArgs {
            state: dir.join("state.json"),
            config: Some(config),
            json: true,
        }
    }

    #[test]
    fn test_denied_check_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = CheckCommand {
            principal: None,
            module: "users".to_string(),
            action: "view".to_string(),
        };

        let err = cmd.run(&global(dir.path())).unwrap_err();
        assert!(err.to_string().contains("401"));
    }
}
