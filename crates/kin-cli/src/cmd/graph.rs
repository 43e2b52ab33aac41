use super::{CmdContext, ReportExt};
use crate::output::{pretty_rule, pretty_section, render_mode, sex_label};
use clap::Args;
use kin_core::graph::{GraphNode, TreeGraph, build_graph};
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Tree to assemble.
    pub tree: i64,
}

/// Execute `kin graph <tree>`: every person of the tree as a node and every
/// parent/child link as an edge.
///
/// # Errors
///
/// Returns an error (already rendered) if the tree is missing or belongs to
/// another owner.
pub fn run_graph(args: &GraphArgs, ctx: &CmdContext) -> anyhow::Result<()> {
    let project = ctx.open_project()?;
    let services = project.services(ctx);
    let tree = services.trees().get_tree(args.tree).reported(ctx.output)?;
    let graph = build_graph(&project.conn, tree.id).reported(ctx.output)?;

    render_mode(
        ctx.output,
        &graph,
        render_graph_text,
        |g, w| render_graph_human(g, &tree.name, w),
    )
}

fn render_graph_text(graph: &TreeGraph, w: &mut dyn Write) -> io::Result<()> {
    for node in &graph.nodes {
        writeln!(
            w,
            "node  {}  {}  {}  {}",
            node.id,
            node.first_name,
            node.last_name,
            node.birth_date
                .map_or_else(|| "-".to_string(), |d| d.to_string())
        )?;
    }
    for edge in &graph.edges {
        writeln!(
            w,
            "edge  {}  {}  {}",
            edge.parent_id, edge.child_id, edge.relationship_type
        )?;
    }
    Ok(())
}

fn label(node: Option<&GraphNode>, id: i64) -> String {
    node.map_or_else(
        || format!("#{id}"),
        |n| format!("#{} {} {}", n.id, n.first_name, n.last_name),
    )
}

fn render_graph_human(graph: &TreeGraph, name: &str, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(
        w,
        &format!(
            "{name}: {} persons, {} links",
            graph.nodes.len(),
            graph.edges.len()
        ),
    )?;
    for node in &graph.nodes {
        writeln!(
            w,
            "{:<40} {}",
            label(Some(node), node.id),
            sex_label(node.is_male)
        )?;
        for edge in graph.edges.iter().filter(|e| e.parent_id == node.id) {
            writeln!(
                w,
                "  └─ {} ({})",
                label(graph.node(edge.child_id), edge.child_id),
                edge.relationship_type
            )?;
        }
    }
    pretty_rule(w)?;
    writeln!(w, "{}", graph.content_hash)
}
