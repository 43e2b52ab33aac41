use super::ServiceContext;
use crate::db;
use crate::error::{KinError, KinResult};
use crate::model::Tree;
use crate::validate::{validate_id, validate_tree_name};
use rusqlite::Connection;
use tracing::{info, instrument};

pub struct TreeService<'a> {
    conn: &'a Connection,
    ctx: &'a ServiceContext,
}

impl<'a> TreeService<'a> {
    pub const fn new(conn: &'a Connection, ctx: &'a ServiceContext) -> Self {
        Self { conn, ctx }
    }

    /// Create a tree owned by the context owner.
    ///
    /// # Errors
    ///
    /// `Validation` for a bad name or a missing owner.
    #[instrument(skip(self), fields(owner = ?self.ctx.owner))]
    pub fn create_tree(&self, name: &str) -> KinResult<Tree> {
        let owner = self.require_owner()?;
        let name = name.trim();
        validate_tree_name(name)?;

        let tree = db::tree::insert_tree(self.conn, owner, name)?;
        info!(tree_id = tree.id, "created tree");
        Ok(tree)
    }

    /// # Errors
    ///
    /// `TreeNotFound`, or `TreeAccessDenied` when owned by someone else.
    #[instrument(skip(self))]
    pub fn get_tree(&self, tree_id: i64) -> KinResult<Tree> {
        validate_id("tree_id", tree_id)?;
        let tree = db::tree::get_tree(self.conn, tree_id)?.ok_or(KinError::TreeNotFound(tree_id))?;

        if let Some(owner) = self.ctx.owner.as_deref() {
            if !tree.is_owned_by(owner) {
                return Err(KinError::TreeAccessDenied {
                    tree_id,
                    owner: owner.to_string(),
                });
            }
        }
        Ok(tree)
    }

    /// Trees of the context owner, newest first.
    ///
    /// # Errors
    ///
    /// `Validation` when no owner is set.
    #[instrument(skip(self))]
    pub fn list_trees(&self) -> KinResult<Vec<Tree>> {
        let owner = self.require_owner()?;
        Ok(db::tree::list_trees_by_owner(self.conn, owner)?)
    }

    /// # Errors
    ///
    /// As [`Self::get_tree`], plus `Validation` for a bad name.
    #[instrument(skip(self))]
    pub fn rename_tree(&self, tree_id: i64, name: &str) -> KinResult<Tree> {
        let name = name.trim();
        validate_tree_name(name)?;
        self.get_tree(tree_id)?;

        if !db::tree::rename_tree(self.conn, tree_id, name)? {
            return Err(KinError::TreeNotFound(tree_id));
        }
        info!(tree_id, "renamed tree");
        self.get_tree(tree_id)
    }

    /// Delete a tree with all of its persons and relationships.
    ///
    /// # Errors
    ///
    /// As [`Self::get_tree`].
    #[instrument(skip(self))]
    pub fn delete_tree(&self, tree_id: i64) -> KinResult<()> {
        self.get_tree(tree_id)?;
        if !db::tree::delete_tree(self.conn, tree_id)? {
            return Err(KinError::TreeNotFound(tree_id));
        }
        info!(tree_id, "deleted tree");
        Ok(())
    }

    fn require_owner(&self) -> KinResult<&'a str> {
        self.ctx
            .owner
            .as_deref()
            .filter(|owner| !owner.trim().is_empty())
            .ok_or_else(|| KinError::validation("owner", "an owner identity is required"))
    }
}
