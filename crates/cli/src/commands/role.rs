//! gatehouse role command

use clap::{Args, Subcommand};
use shared::NewRole;

use super::{GlobalArgs, Workspace};

#[derive(Debug, Args)]
pub struct RoleCommand {
    #[command(subcommand)]
    pub command: RoleSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum RoleSubcommand {
    /// List all roles
    List,
    /// Create a role
    Create {
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Show a role and its assigned permission ids
    Show { name: String },
    /// Show the access tree a role logs in with
    Tree { name: String },
    /// Replace every permission of a role (no keys clears it)
    Grant {
        name: String,
        /// Permission keys (module.action)
        keys: Vec<String>,
    },
}

impl RoleCommand {
    pub fn run(&self, global: &GlobalArgs) -> anyhow::Result<()> {
        let workspace = Workspace::open(global)?;
        let engine = &workspace.engine;

        match &self.command {
            RoleSubcommand::List => {
                let roles = engine.roles().list_roles()?;
                if global.json {
                    println!("{}", serde_json::to_string_pretty(&roles)?);
                    return Ok(());
                }
                println!("Available roles:");
                for role in &roles {
                    let status = if role.is_active() {
                        console::style(role.status.to_string()).green()
                    } else {
                        console::style(role.status.to_string()).dim()
                    };
                    println!("  {:>4}  {:<16} {:<10} {}", role.id, role.name, status, role.description);
                }
                return Ok(());
            }
            RoleSubcommand::Create { name, description } => {
                let role = engine
                    .roles()
                    .create_role(NewRole::new(name).with_description(description))?;
                println!("{} Role '{}' created (id {})", console::style("✓").green(), role.name, role.id);
            }
            RoleSubcommand::Show { name } => {
                let role = workspace.role_by_name(name)?;
                let ids = engine.assignments().role_permission_ids(role.id)?;
                if global.json {
                    let out = serde_json::json!({ "role": role, "permissionIds": ids });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                } else {
                    println!("Role: {} (id {}, {})", role.name, role.id, role.status);
                    if !role.description.is_empty() {
                        println!("  {}", role.description);
                    }
                    let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
                    println!("  Permission ids: [{}]", ids.join(", "));
                }
                return Ok(());
            }
            RoleSubcommand::Tree { name } => {
                let role = workspace.role_by_name(name)?;
                let tree = engine.resolver().compute_access_tree(role.id)?;
                if global.json {
                    println!("{}", serde_json::to_string_pretty(&tree)?);
                    return Ok(());
                }
                if tree.is_empty() {
                    println!("Role '{}' holds no permissions", role.name);
                }
                for module in &tree {
                    println!("{} ({})", console::style(&module.module_title).bold(), module.module_code);
                    for action in &module.actions {
                        println!("  - {} ({})", action.action_title, action.action_code);
                    }
                }
                return Ok(());
            }
            RoleSubcommand::Grant { name, keys } => {
                let role = workspace.role_by_name(name)?;
                let final_set = engine.replace_role_permissions_by_keys(role.id, keys.as_slice())?;
                println!(
                    "{} Role '{}' now holds {} permission(s)",
                    console::style("✓").green(),
                    role.name,
                    final_set.len()
                );
            }
        }

        workspace.save()
    }
}
