use super::{CmdContext, ReportExt};
use crate::output::{pretty_section, render_mode};
use clap::Args;
use kin_core::graph::{Lineage, TreeGraph, build_graph};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct LineageArgs {
    /// Person whose lineage to walk.
    pub person: i64,
    /// Only walk upwards.
    #[arg(long, conflicts_with = "descendants")]
    pub ancestors: bool,
    /// Only walk downwards.
    #[arg(long)]
    pub descendants: bool,
    /// Stop after this many generations.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub depth: Option<u32>,
}

#[derive(Debug, Serialize)]
struct Relative {
    id: i64,
    generation: u32,
    name: String,
}

#[derive(Debug, Serialize)]
struct LineageReport {
    person_id: i64,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    ancestors: Option<Vec<Relative>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    descendants: Option<Vec<Relative>>,
}

fn relatives(graph: &TreeGraph, walk: Vec<(i64, u32)>) -> Vec<Relative> {
    walk.into_iter()
        .map(|(id, generation)| Relative {
            id,
            generation,
            name: graph
                .node(id)
                .map_or_else(String::new, |n| format!("{} {}", n.first_name, n.last_name)),
        })
        .collect()
}

/// Execute `kin lineage <person>`. Both directions are walked unless one
/// is selected.
///
/// # Errors
///
/// Returns an error (already rendered) if the person does not exist.
pub fn run_lineage(args: &LineageArgs, ctx: &CmdContext) -> anyhow::Result<()> {
    let project = ctx.open_project()?;
    let services = project.services(ctx);
    let person = services.persons().get_person(args.person).reported(ctx.output)?;
    let graph = build_graph(&project.conn, person.tree_id).reported(ctx.output)?;
    let lineage = Lineage::from_tree_graph(&graph);

    let both = !args.ancestors && !args.descendants;
    let report = LineageReport {
        person_id: person.id,
        name: person.full_name(),
        ancestors: (both || args.ancestors)
            .then(|| relatives(&graph, lineage.ancestors(person.id, args.depth))),
        descendants: (both || args.descendants)
            .then(|| relatives(&graph, lineage.descendants(person.id, args.depth))),
    };

    render_mode(ctx.output, &report, render_text, render_human)
}

fn render_text(report: &LineageReport, w: &mut dyn Write) -> io::Result<()> {
    let sides = [
        ("ancestor", &report.ancestors),
        ("descendant", &report.descendants),
    ];
    for (kind, side) in sides {
        for rel in side.iter().flatten() {
            writeln!(w, "{kind}  {}  {}  {}", rel.generation, rel.id, rel.name)?;
        }
    }
    Ok(())
}

fn render_human(report: &LineageReport, w: &mut dyn Write) -> io::Result<()> {
    let sides = [
        ("Ancestors", &report.ancestors),
        ("Descendants", &report.descendants),
    ];
    for (heading, side) in sides {
        let Some(side) = side else {
            continue;
        };
        pretty_section(
            w,
            &format!("{heading} of #{} {} ({})", report.person_id, report.name, side.len()),
        )?;
        for rel in side {
            writeln!(
                w,
                "{}#{} {}",
                "  ".repeat(rel.generation.saturating_sub(1) as usize),
                rel.id,
                rel.name
            )?;
        }
        writeln!(w)?;
    }
    Ok(())
}
