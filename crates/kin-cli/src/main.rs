#![forbid(unsafe_code)]

mod cmd;
mod output;
mod owner;

use clap::{CommandFactory, Parser, Subcommand};
use cmd::{CmdContext, Reported};
use kin_core::ErrorCode;
use kin_core::config::load_user_config;
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use std::env;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "kin: family trees with plausible parent/child links",
    long_about = None
)]
struct Cli {
    /// Enable debug logging for kin crates.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output (shorthand for `--format json`).
    #[arg(long, global = true)]
    json: bool,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Act as this owner (skips env and config resolution).
    #[arg(long, global = true)]
    owner: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Initialize a kin project",
        long_about = "Create .kin/ in the current directory with a default config and a migrated database.",
        after_help = "EXAMPLES:\n    # Initialize a project in the current directory\n    kin init\n\n    # Reset the config to defaults\n    kin init --force"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Trees",
        about = "Manage family trees",
        long_about = "Create, list, show, rename and delete the trees of the current owner.",
        after_help = "EXAMPLES:\n    # Create a tree\n    kin tree create \"Lovelace family\"\n\n    # List your trees as JSON\n    kin tree list --json\n\n    # Delete a tree and everything in it\n    kin tree rm 3"
    )]
    Tree {
        #[command(subcommand)]
        command: cmd::tree::TreeCommand,
    },

    #[command(
        next_help_heading = "Persons",
        about = "Manage persons",
        long_about = "Add, show, list, edit and remove the persons of a tree.",
        after_help = "EXAMPLES:\n    # Add a person\n    kin person add --tree 1 --first Ada --last Lovelace --born 1815-12-10 --sex female\n\n    # Forget a birth date\n    kin person edit 4 --clear-born\n\n    # List a tree's members\n    kin person list --tree 1"
    )]
    Person {
        #[command(subcommand)]
        command: cmd::person::PersonCommand,
    },

    #[command(
        next_help_heading = "Links",
        about = "Manage parent/child links",
        long_about = "Link persons as parent and child. Every link is checked: same tree, parent born first, at most two parents of opposite sex, no duplicates.",
        after_help = "EXAMPLES:\n    # Link person 2 as a child of person 1\n    kin rel add-child 1 2\n\n    # Create a mother for person 2\n    kin rel new-parent 2 --first Anne --last Milbanke --sex female\n\n    # Who could be a parent of person 2?\n    kin rel available-parents 2"
    )]
    Rel {
        #[command(subcommand)]
        command: cmd::rel::RelCommand,
    },

    #[command(
        next_help_heading = "Views",
        about = "Show the graph of a tree",
        long_about = "Assemble every person of a tree as a node and every parent/child link as an edge.",
        after_help = "EXAMPLES:\n    # Render a tree\n    kin graph 1\n\n    # Feed the graph to another tool\n    kin graph 1 --json"
    )]
    Graph(cmd::graph::GraphArgs),

    #[command(
        next_help_heading = "Views",
        about = "Show ancestors and descendants",
        long_about = "Walk the links of a person's tree upwards, downwards, or both.",
        after_help = "EXAMPLES:\n    # Everyone related by descent\n    kin lineage 4\n\n    # Parents and grandparents only\n    kin lineage 4 --ancestors --depth 2"
    )]
    Lineage(cmd::lineage::LineageArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    # Install bash completions\n    kin completions bash > ~/.local/share/bash-completion/completions/kin"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("KIN_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "kin=debug,info"
        } else {
            "kin=info,warn"
        })
    });

    let format = env::var("KIN_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Exit status for a failed command: 1 when the request can be fixed by the
/// caller, 3 when storage failed underneath it.
const fn exit_code(code: ErrorCode) -> u8 {
    match code {
        ErrorCode::StorageFailure => 3,
        _ => 1,
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let user_config = match load_user_config() {
        Ok(config) => config,
        Err(err) => {
            let output = resolve_output_mode(cli.format, cli.json, None);
            return Err(cmd::fail_with_code(
                output,
                ErrorCode::ConfigParseError,
                format!("{err:#}"),
            ));
        }
    };

    let ctx = CmdContext {
        output: resolve_output_mode(cli.format, cli.json, user_config.output.as_deref()),
        owner: owner::resolve_owner(cli.owner.as_deref(), user_config.owner.as_deref()),
        cwd: env::current_dir()?,
    };
    debug!(output = ?ctx.output, owner = ?ctx.owner, "resolved context");

    match cli.command {
        Commands::Init(args) => cmd::init::run_init(&args, &ctx),
        Commands::Tree { command } => cmd::tree::run_tree(&command, &ctx),
        Commands::Person { command } => cmd::person::run_person(&command, &ctx),
        Commands::Rel { command } => cmd::rel::run_rel(&command, &ctx),
        Commands::Graph(args) => cmd::graph::run_graph(&args, &ctx),
        Commands::Lineage(args) => cmd::lineage::run_lineage(&args, &ctx),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let fallback_output = cli.format.unwrap_or(if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    });

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(Reported(code)) = err.downcast_ref::<Reported>() {
                return ExitCode::from(exit_code(*code));
            }
            // Not rendered yet: I/O and other failures outside the services.
            let cli_err = CliError {
                message: format!("{err:#}"),
                suggestion: None,
                error_code: None,
            };
            if render_error(fallback_output, &cli_err).is_err() {
                eprintln!("error: {err:#}");
            }
            ExitCode::from(exit_code(ErrorCode::StorageFailure))
        }
    }
}
