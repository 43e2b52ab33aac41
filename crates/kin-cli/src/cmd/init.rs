use super::{CmdContext, fail_with_code};
use crate::output::{pretty_kv, render_mode};
use anyhow::Context as _;
use clap::Args;
use kin_core::config::{self, KIN_DIR};
use kin_core::db::migrations::current_schema_version;
use kin_core::{ErrorCode, db};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Rewrite `.kin/config.toml` with defaults even if it already exists.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
struct InitReport {
    root: PathBuf,
    database: PathBuf,
    config_written: bool,
    schema_version: u32,
}

/// Execute `kin init`. Creates the project skeleton in the current directory:
///
/// ```text
/// .kin/
///   config.toml     (default project config)
///   kin.sqlite3     (database, migrated to the latest schema)
/// ```
///
/// Running it again is harmless: the config is kept unless `--force` is
/// given, and migrations only apply what is missing.
///
/// # Errors
///
/// Returns an error if the config cannot be written or parsed, or the
/// database cannot be created.
pub fn run_init(args: &InitArgs, ctx: &CmdContext) -> anyhow::Result<()> {
    let root = ctx.cwd.clone();
    let config_path = root.join(KIN_DIR).join("config.toml");

    if args.force && config_path.exists() {
        std::fs::remove_file(&config_path)
            .with_context(|| format!("Failed to remove {}", config_path.display()))?;
    }
    let config_written = config::write_default_project_config(&root)?;

    let project_config = config::load_project_config(&root)
        .map_err(|err| fail_with_code(ctx.output, ErrorCode::ConfigParseError, format!("{err:#}")))?;

    let database = project_config.database_path(&root);
    let conn = db::open_db(&database, project_config.busy_timeout())
        .map_err(|err| fail_with_code(ctx.output, ErrorCode::StorageFailure, format!("{err:#}")))?;
    let schema_version = current_schema_version(&conn).context("read schema version")?;

    info!(root = %root.display(), config_written, "project initialized");

    let report = InitReport {
        root,
        database,
        config_written,
        schema_version,
    };

    render_mode(
        ctx.output,
        &report,
        |r, w| writeln!(w, "{}  schema={}", r.database.display(), r.schema_version),
        |r, w| {
            if r.config_written {
                writeln!(w, "✓ Initialized {KIN_DIR}/ project structure.")?;
            } else {
                writeln!(w, "✓ {KIN_DIR}/ already initialized; config kept.")?;
            }
            writeln!(w)?;
            pretty_kv(w, "Database", r.database.display().to_string())?;
            pretty_kv(w, "Schema", r.schema_version.to_string())?;
            writeln!(w)?;
            writeln!(w, "Next steps:")?;
            writeln!(w, "  Set the owner of the trees you create:")?;
            writeln!(w, "    export KIN_OWNER=your-name")?;
            writeln!(w, "  Create a tree:")?;
            writeln!(w, "    kin tree create \"My family\"")
        },
    )
}
