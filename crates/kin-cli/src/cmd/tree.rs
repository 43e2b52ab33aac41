//! `kin tree` — create, inspect, rename and delete family trees.

use super::{CmdContext, ReportExt};
use crate::output::{
    OutputMode, Renderable, pretty_kv, pretty_section, render_item, render_list, render_mode,
    render_success,
};
use clap::{Args, Subcommand};
use kin_core::{Person, Tree};
use serde::Serialize;

#[derive(Subcommand, Debug)]
pub enum TreeCommand {
    /// Create a tree owned by the resolved owner.
    Create(CreateArgs),
    /// List the owner's trees, newest first.
    List,
    /// Show one tree and its members.
    Show(TreeIdArg),
    /// Rename a tree.
    Rename(RenameArgs),
    /// Delete a tree with every person and link in it.
    Rm(TreeIdArg),
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Display name (1-255 characters).
    pub name: String,
}

#[derive(Args, Debug)]
pub struct TreeIdArg {
    /// Numeric tree id.
    pub id: i64,
}

#[derive(Args, Debug)]
pub struct RenameArgs {
    /// Numeric tree id.
    pub id: i64,
    /// New display name.
    pub name: String,
}

#[derive(Debug, Serialize)]
struct TreeDetail {
    #[serde(flatten)]
    tree: Tree,
    persons: Vec<Person>,
}

/// Execute a `kin tree` subcommand.
///
/// # Errors
///
/// Returns an error (already rendered) if the project cannot be opened or
/// the service rejects the request.
pub fn run_tree(command: &TreeCommand, ctx: &CmdContext) -> anyhow::Result<()> {
    let project = ctx.open_project()?;
    let services = project.services(ctx);
    let output = ctx.output;

    match command {
        TreeCommand::Create(args) => {
            let tree = services.trees().create_tree(&args.name).reported(output)?;
            render_item(&tree, output)?;
        }
        TreeCommand::List => {
            let trees = services.trees().list_trees().reported(output)?;
            render_list(&trees, output)?;
        }
        TreeCommand::Show(args) => {
            let tree = services.trees().get_tree(args.id).reported(output)?;
            let persons = services.persons().list_persons(tree.id).reported(output)?;
            render_detail(&TreeDetail { tree, persons }, output)?;
        }
        TreeCommand::Rename(args) => {
            let tree = services
                .trees()
                .rename_tree(args.id, &args.name)
                .reported(output)?;
            render_item(&tree, output)?;
        }
        TreeCommand::Rm(args) => {
            services.trees().delete_tree(args.id).reported(output)?;
            render_success(output, &format!("deleted tree {}", args.id))?;
        }
    }

    Ok(())
}

fn render_detail(detail: &TreeDetail, output: OutputMode) -> anyhow::Result<()> {
    render_mode(
        output,
        detail,
        |d, w| {
            d.tree.render_table(w)?;
            for person in &d.persons {
                person.render_table(w)?;
            }
            Ok(())
        },
        |d, w| {
            d.tree.render_human(w)?;
            pretty_section(w, &format!("Members ({})", d.persons.len()))?;
            if d.persons.is_empty() {
                pretty_kv(w, "Hint", "add one with `kin person add`")?;
            }
            for person in &d.persons {
                person.render_human(w)?;
            }
            Ok(())
        },
    )
}
