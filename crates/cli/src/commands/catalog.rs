//! gatehouse catalog command

use clap::{Args, Subcommand};
use shared::{NewAction, NewModule};

use super::{GlobalArgs, Workspace};

#[derive(Debug, Args)]
pub struct CatalogCommand {
    #[command(subcommand)]
    pub command: CatalogSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum CatalogSubcommand {
    /// List modules, actions and permissions
    List,
    /// Add a module
    AddModule {
        code: String,
        title: String,
    },
    /// Add an action
    AddAction {
        code: String,
        title: String,
    },
    /// Add the permission pairing a module and an action
    AddPermission {
        module: String,
        action: String,
        /// Defaults to "<Module title> - <Action title>"
        #[arg(short, long, default_value = "")]
        label: String,
    },
    /// Delete a permission by key (refused while a role holds it)
    RemovePermission {
        key: String,
    },
}

impl CatalogCommand {
    pub fn run(&self, global: &GlobalArgs) -> anyhow::Result<()> {
        let workspace = Workspace::open(global)?;
        let engine = &workspace.engine;

        match &self.command {
            CatalogSubcommand::List => {
                let modules = engine.catalog().list_modules()?;
                let actions = engine.catalog().list_actions()?;
                let permissions = engine.catalog().list_permissions()?;

                if global.json {
                    let out = serde_json::json!({
                        "modules": modules,
                        "actions": actions,
                        "permissions": permissions,
                    });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                    return Ok(());
                }

                println!("{}", console::style("Modules").bold());
                for m in &modules {
                    println!("  {:>4}  {:<16} {}", m.id, m.code, m.title);
                }
                println!("{}", console::style("Actions").bold());
                for a in &actions {
                    println!("  {:>4}  {:<16} {}", a.id, a.code, a.title);
                }
                println!("{}", console::style("Permissions").bold());
                for p in &permissions {
                    println!("  {:>4}  {:<24} {}", p.id, p.permission_key, p.label);
                }
                return Ok(());
            }
            CatalogSubcommand::AddModule { code, title } => {
                let module = engine.change_catalog(&format!("create module '{}'", code), |c| {
                    c.create_module(NewModule::new(code, title))
                })?;
                println!("{} Module '{}' created (id {})", ok(), module.code, module.id);
            }
            CatalogSubcommand::AddAction { code, title } => {
                let action = engine.change_catalog(&format!("create action '{}'", code), |c| {
                    c.create_action(NewAction::new(code, title))
                })?;
                println!("{} Action '{}' created (id {})", ok(), action.code, action.id);
            }
            CatalogSubcommand::AddPermission {
                module,
                action,
                label,
            } => {
                let key = shared::Permission::key_for(module, action);
                let permission = engine.change_catalog(&format!("create permission '{}'", key), |c| {
                    c.create_permission_by_codes(module, action, label.clone())
                })?;
                println!(
                    "{} Permission '{}' created (id {})",
                    ok(),
                    permission.permission_key,
                    permission.id
                );
            }
            CatalogSubcommand::RemovePermission { key } => {
                engine.change_catalog(&format!("delete permission '{}'", key), |c| {
                    let permission = c
                        .find_permission_by_key(key)?
                        .ok_or_else(|| shared::AccessError::not_found("Permission", key))?;
                    c.delete_permission(permission.id)
                })?;
                println!("{} Permission '{}' deleted", ok(), key);
            }
        }

        workspace.save()
    }
}

fn ok() -> console::StyledObject<&'static str> {
    console::style("✓").green()
}
