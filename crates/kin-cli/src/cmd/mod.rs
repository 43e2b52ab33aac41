pub mod completions;
pub mod graph;
pub mod init;
pub mod lineage;
pub mod person;
pub mod rel;
pub mod tree;

use crate::output::{CliError, OutputMode, render_error};
use kin_core::config::{self, KIN_DIR, ProjectConfig};
use kin_core::{ErrorCode, KinError, KinResult, ServiceContext, Services, db};
use rusqlite::Connection;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Marker error for failures already rendered to stderr.
///
/// `main` uses the carried code to pick the exit status without printing
/// the error a second time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reported(pub ErrorCode);

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0.message(), self.0)
    }
}

impl std::error::Error for Reported {}

/// Render `err` and turn it into a [`Reported`] marker.
pub fn fail(output: OutputMode, err: &KinError) -> anyhow::Error {
    if let Err(render_err) = render_error(output, &CliError::from(err)) {
        return render_err;
    }
    Reported(err.code()).into()
}

/// Render a failure that has no [`KinError`] behind it.
pub fn fail_with_code(output: OutputMode, code: ErrorCode, message: String) -> anyhow::Error {
    let suggestion = code.hint().unwrap_or_else(|| code.message());
    if let Err(render_err) = render_error(
        output,
        &CliError::with_details(message, suggestion, code.code()),
    ) {
        return render_err;
    }
    Reported(code).into()
}

/// Route service errors through [`fail`].
pub trait ReportExt<T> {
    fn reported(self, output: OutputMode) -> anyhow::Result<T>;
}

impl<T> ReportExt<T> for KinResult<T> {
    fn reported(self, output: OutputMode) -> anyhow::Result<T> {
        self.map_err(|err| fail(output, &err))
    }
}

/// Settings resolved once in `main` and shared by every command.
#[derive(Debug, Clone)]
pub struct CmdContext {
    pub output: OutputMode,
    pub owner: Option<String>,
    pub cwd: PathBuf,
}

/// An opened project: its config and migrated database.
pub struct Project {
    pub config: ProjectConfig,
    pub conn: Connection,
}

impl CmdContext {
    /// Locate the enclosing project and open its database.
    ///
    /// # Errors
    ///
    /// Renders `E1001` when no `.kin/` is found, `E1002` for a broken
    /// config, and `E5001` when the database cannot be opened.
    pub fn open_project(&self) -> anyhow::Result<Project> {
        let Some(root) = config::find_project_root(&self.cwd) else {
            return Err(fail_with_code(
                self.output,
                ErrorCode::NotInitialized,
                format!(
                    "no {KIN_DIR}/ directory in {} or any parent",
                    self.cwd.display()
                ),
            ));
        };

        let config = config::load_project_config(&root).map_err(|err| {
            fail_with_code(self.output, ErrorCode::ConfigParseError, format!("{err:#}"))
        })?;

        let conn = open_database(&root, &config)
            .map_err(|err| fail_with_code(self.output, ErrorCode::StorageFailure, format!("{err:#}")))?;

        debug!(root = %root.display(), "opened project");
        Ok(Project { config, conn })
    }

    pub fn service_context(&self) -> ServiceContext {
        ServiceContext::new(self.owner.clone())
    }
}

impl Project {
    pub fn services(&self, ctx: &CmdContext) -> Services<'_> {
        Services::new(&self.conn, ctx.service_context())
    }

    /// Relationship tag to use when the command line leaves it out.
    pub fn relationship_type<'a>(&self, flag: Option<&'a str>) -> &'a str {
        flag.unwrap_or_else(|| self.config.tree.default_relationship_type.as_str())
    }
}

fn open_database(root: &Path, config: &ProjectConfig) -> anyhow::Result<Connection> {
    db::open_db(&config.database_path(root), config.busy_timeout())
}
