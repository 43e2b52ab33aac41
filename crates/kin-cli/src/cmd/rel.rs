//! `kin rel` — parent/child links and link candidates.

use super::person::PersonArgs;
use super::{CmdContext, ReportExt};
use crate::output::{
    OutputMode, Renderable, pretty_section, render_item, render_list, render_mode, render_success,
};
use clap::{Args, Subcommand};
use kin_core::Relationship;
use kin_core::service::LinkedPerson;
use serde::Serialize;
use std::io::{self, Write};

#[derive(Subcommand, Debug)]
pub enum RelCommand {
    /// Link an existing person as a child of PARENT.
    AddChild(LinkArgs),
    /// Link an existing person as a parent of CHILD.
    AddParent(ReverseLinkArgs),
    /// Create a person and link them as a child of ANCHOR.
    NewChild(NewRelativeArgs),
    /// Create a person and link them as a parent of ANCHOR.
    NewParent(NewRelativeArgs),
    /// Remove the link between PARENT and CHILD.
    Rm(UnlinkArgs),
    /// Show the parent and child links of a person.
    List(PersonRef),
    /// Persons that could be linked as children of a person.
    AvailableChildren(PersonRef),
    /// Persons that could be linked as parents of a person.
    AvailableParents(PersonRef),
}

#[derive(Args, Debug)]
pub struct LinkArgs {
    pub parent: i64,
    pub child: i64,
    /// `biological` or `not_biological`; defaults to the project setting.
    #[arg(long = "type")]
    pub relationship_type: Option<String>,
}

#[derive(Args, Debug)]
pub struct ReverseLinkArgs {
    pub child: i64,
    pub parent: i64,
    /// `biological` or `not_biological`; defaults to the project setting.
    #[arg(long = "type")]
    pub relationship_type: Option<String>,
}

#[derive(Args, Debug)]
pub struct NewRelativeArgs {
    /// The existing person the new one is linked to.
    pub anchor: i64,
    #[command(flatten)]
    pub person: PersonArgs,
    /// `biological` or `not_biological`; defaults to the project setting.
    #[arg(long = "type")]
    pub relationship_type: Option<String>,
}

#[derive(Args, Debug)]
pub struct UnlinkArgs {
    pub parent: i64,
    pub child: i64,
}

#[derive(Args, Debug)]
pub struct PersonRef {
    /// Numeric person id.
    pub id: i64,
}

#[derive(Debug, Serialize)]
struct PersonLinks {
    person_id: i64,
    parents: Vec<Relationship>,
    children: Vec<Relationship>,
}

impl Renderable for Relationship {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "#{} → #{}  ({})",
            self.parent_id, self.child_id, self.relationship_type
        )
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer(&mut *w, self).map_err(io::Error::other)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}  {}  {}  {}",
            self.id, self.parent_id, self.child_id, self.relationship_type
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "PARENT", "CHILD", "TYPE"]
    }
}

/// Execute a `kin rel` subcommand.
///
/// # Errors
///
/// Returns an error (already rendered) if the project cannot be opened or
/// a link rule rejects the request.
pub fn run_rel(command: &RelCommand, ctx: &CmdContext) -> anyhow::Result<()> {
    let project = ctx.open_project()?;
    let services = project.services(ctx);
    let rels = services.relationships();
    let output = ctx.output;

    match command {
        RelCommand::AddChild(args) => {
            let rel = rels
                .link_existing_child(
                    args.parent,
                    args.child,
                    project.relationship_type(args.relationship_type.as_deref()),
                )
                .reported(output)?;
            render_item(&rel, output)?;
        }
        RelCommand::AddParent(args) => {
            let rel = rels
                .link_existing_parent(
                    args.child,
                    args.parent,
                    project.relationship_type(args.relationship_type.as_deref()),
                )
                .reported(output)?;
            render_item(&rel, output)?;
        }
        RelCommand::NewChild(args) => {
            let linked = rels
                .create_child_and_link(
                    args.anchor,
                    args.person.to_fields(),
                    project.relationship_type(args.relationship_type.as_deref()),
                )
                .reported(output)?;
            render_linked(&linked, output)?;
        }
        RelCommand::NewParent(args) => {
            let linked = rels
                .create_parent_and_link(
                    args.anchor,
                    args.person.to_fields(),
                    project.relationship_type(args.relationship_type.as_deref()),
                )
                .reported(output)?;
            render_linked(&linked, output)?;
        }
        RelCommand::Rm(args) => {
            rels.unlink(args.parent, args.child).reported(output)?;
            render_success(
                output,
                &format!("removed link {} → {}", args.parent, args.child),
            )?;
        }
        RelCommand::List(args) => {
            let (parents, children) = rels.edges_of(args.id).reported(output)?;
            render_links(
                &PersonLinks {
                    person_id: args.id,
                    parents,
                    children,
                },
                output,
            )?;
        }
        RelCommand::AvailableChildren(args) => {
            let candidates = rels.available_children(args.id).reported(output)?;
            render_list(&candidates, output)?;
        }
        RelCommand::AvailableParents(args) => {
            let candidates = rels.available_parents(args.id).reported(output)?;
            render_list(&candidates, output)?;
        }
    }

    Ok(())
}

fn render_linked(linked: &LinkedPerson, output: OutputMode) -> anyhow::Result<()> {
    render_mode(
        output,
        linked,
        |l, w| {
            l.person.render_table(w)?;
            l.relationship.render_table(w)
        },
        |l, w| {
            writeln!(w, "✓ Created and linked:")?;
            l.person.render_human(w)?;
            l.relationship.render_human(w)
        },
    )
}

fn render_links(links: &PersonLinks, output: OutputMode) -> anyhow::Result<()> {
    render_mode(
        output,
        links,
        |l, w| {
            for rel in l.parents.iter().chain(&l.children) {
                rel.render_table(w)?;
            }
            Ok(())
        },
        |l, w| {
            pretty_section(w, &format!("Parents of #{} ({})", l.person_id, l.parents.len()))?;
            for rel in &l.parents {
                rel.render_human(w)?;
            }
            writeln!(w)?;
            pretty_section(w, &format!("Children of #{} ({})", l.person_id, l.children.len()))?;
            for rel in &l.children {
                rel.render_human(w)?;
            }
            Ok(())
        },
    )
}
