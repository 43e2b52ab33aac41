//! `kin person` — add, inspect, edit and remove persons.

use super::{CmdContext, ReportExt};
use crate::output::{
    OutputMode, Renderable, life_span, pretty_kv, pretty_section, render_item, render_list,
    render_mode, render_success, sex_label,
};
use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};
use kin_core::{Person, PersonFields};
use serde::Serialize;

#[derive(Subcommand, Debug)]
pub enum PersonCommand {
    /// Add a person to a tree.
    Add(AddArgs),
    /// Show a person with their parents and children.
    Show(PersonIdArg),
    /// List the persons of a tree, newest first.
    List(ListArgs),
    /// Change a person's attributes.
    Edit(EditArgs),
    /// Delete a person and every link that touches them.
    Rm(PersonIdArg),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub const fn is_male(self) -> bool {
        matches!(self, Self::Male)
    }
}

/// Attributes of a person created from the command line.
#[derive(Args, Debug, Clone)]
pub struct PersonArgs {
    /// Given name.
    #[arg(long = "first")]
    pub first_name: String,
    /// Family name.
    #[arg(long = "last")]
    pub last_name: String,
    /// Birth date (YYYY-MM-DD).
    #[arg(long)]
    pub born: Option<NaiveDate>,
    /// Death date (YYYY-MM-DD).
    #[arg(long)]
    pub died: Option<NaiveDate>,
    #[arg(long, value_enum)]
    pub sex: Sex,
    /// Free-form biography.
    #[arg(long)]
    pub bio: Option<String>,
}

impl PersonArgs {
    pub fn to_fields(&self) -> PersonFields {
        PersonFields {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            birth_date: self.born,
            death_date: self.died,
            is_male: self.sex.is_male(),
            biography: self.bio.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Tree to add the person to.
    #[arg(long)]
    pub tree: i64,
    #[command(flatten)]
    pub person: PersonArgs,
}

#[derive(Args, Debug)]
pub struct PersonIdArg {
    /// Numeric person id.
    pub id: i64,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Tree whose members to list.
    #[arg(long)]
    pub tree: i64,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Numeric person id.
    pub id: i64,
    #[arg(long = "first")]
    pub first_name: Option<String>,
    #[arg(long = "last")]
    pub last_name: Option<String>,
    #[arg(long, conflicts_with = "clear_born")]
    pub born: Option<NaiveDate>,
    #[arg(long, conflicts_with = "clear_died")]
    pub died: Option<NaiveDate>,
    #[arg(long, value_enum)]
    pub sex: Option<Sex>,
    #[arg(long, conflicts_with = "clear_bio")]
    pub bio: Option<String>,
    /// Forget the birth date.
    #[arg(long)]
    pub clear_born: bool,
    /// Forget the death date.
    #[arg(long)]
    pub clear_died: bool,
    /// Remove the biography.
    #[arg(long)]
    pub clear_bio: bool,
}

impl EditArgs {
    /// Overlay the given flags on `current`; absent flags keep the stored value.
    fn apply(&self, mut current: PersonFields) -> PersonFields {
        if let Some(first) = &self.first_name {
            current.first_name.clone_from(first);
        }
        if let Some(last) = &self.last_name {
            current.last_name.clone_from(last);
        }
        if self.clear_born {
            current.birth_date = None;
        } else if self.born.is_some() {
            current.birth_date = self.born;
        }
        if self.clear_died {
            current.death_date = None;
        } else if self.died.is_some() {
            current.death_date = self.died;
        }
        if let Some(sex) = self.sex {
            current.is_male = sex.is_male();
        }
        if self.clear_bio {
            current.biography = None;
        } else if self.bio.is_some() {
            current.biography.clone_from(&self.bio);
        }
        current
    }
}

#[derive(Debug, Serialize)]
struct PersonDetail {
    #[serde(flatten)]
    person: Person,
    parents: Vec<Person>,
    children: Vec<Person>,
}

/// Execute a `kin person` subcommand.
///
/// # Errors
///
/// Returns an error (already rendered) if the project cannot be opened or
/// the service rejects the request.
pub fn run_person(command: &PersonCommand, ctx: &CmdContext) -> anyhow::Result<()> {
    let project = ctx.open_project()?;
    let services = project.services(ctx);
    let persons = services.persons();
    let output = ctx.output;

    match command {
        PersonCommand::Add(args) => {
            let person = persons
                .create_person(args.tree, args.person.to_fields())
                .reported(output)?;
            render_item(&person, output)?;
        }
        PersonCommand::Show(args) => {
            let person = persons.get_person(args.id).reported(output)?;
            let parents = persons.parents_of(person.id).reported(output)?;
            let children = persons.children_of(person.id).reported(output)?;
            render_detail(
                &PersonDetail {
                    person,
                    parents,
                    children,
                },
                output,
            )?;
        }
        PersonCommand::List(args) => {
            let members = persons.list_persons(args.tree).reported(output)?;
            render_list(&members, output)?;
        }
        PersonCommand::Edit(args) => {
            let current = persons.get_person(args.id).reported(output)?;
            let person = persons
                .update_person(args.id, args.apply(current.fields()))
                .reported(output)?;
            render_item(&person, output)?;
        }
        PersonCommand::Rm(args) => {
            persons.delete_person(args.id).reported(output)?;
            render_success(output, &format!("deleted person {}", args.id))?;
        }
    }

    Ok(())
}

fn render_detail(detail: &PersonDetail, output: OutputMode) -> anyhow::Result<()> {
    render_mode(
        output,
        detail,
        |d, w| {
            d.person.render_table(w)?;
            for parent in &d.parents {
                write!(w, "parent  ")?;
                parent.render_table(w)?;
            }
            for child in &d.children {
                write!(w, "child  ")?;
                child.render_table(w)?;
            }
            Ok(())
        },
        |d, w| {
            let p = &d.person;
            pretty_section(w, &format!("#{} {}", p.id, p.full_name()))?;
            pretty_kv(w, "Tree", p.tree_id.to_string())?;
            pretty_kv(w, "Sex", sex_label(p.is_male))?;
            pretty_kv(w, "Life", life_span(p))?;
            if let Some(bio) = &p.biography {
                pretty_kv(w, "Biography", bio)?;
            }
            writeln!(w)?;
            pretty_section(w, &format!("Parents ({})", d.parents.len()))?;
            for parent in &d.parents {
                parent.render_human(w)?;
            }
            writeln!(w)?;
            pretty_section(w, &format!("Children ({})", d.children.len()))?;
            for child in &d.children {
                child.render_human(w)?;
            }
            Ok(())
        },
    )
}
