use crate::config::RestackConfig;
use crate::error::{RestackError, Result};
use git2::{Delta, ErrorCode, Index, Oid, Repository as Git2Repository, Signature};
use graph::{AncestryBuilder, AncestryGraph, ParentLookup};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Kind of change a file went through between two trees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeStatus {
    Added,
    Deleted,
    Modified,
    Renamed,
    Copied,
    TypeChange,
    Other,
}

impl From<Delta> for ChangeStatus {
    fn from(delta: Delta) -> Self {
        match delta {
            Delta::Added => ChangeStatus::Added,
            Delta::Deleted => ChangeStatus::Deleted,
            Delta::Modified => ChangeStatus::Modified,
            Delta::Renamed => ChangeStatus::Renamed,
            Delta::Copied => ChangeStatus::Copied,
            Delta::Typechange => ChangeStatus::TypeChange,
            _ => ChangeStatus::Other,
        }
    }
}

/// One file touched by a tree diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub old_path: Option<String>,
    pub status: ChangeStatus,
}

/// Result of replaying a commit's change on top of a tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The change applied cleanly, producing this tree
    Clean(Oid),
    /// The change conflicts in these paths
    Conflicted(Vec<String>),
}

/// The object store every other part of restack talks to.
///
/// Handles handed out (`git2::Commit`, trees, indexes) borrow the store and are
/// released when dropped; long-lived values hold plain `Oid`s.
pub struct CommitStore {
    path: PathBuf,
    repo: Git2Repository,
    config: RestackConfig,
}

impl CommitStore {
    /// Open a repository, reading `restack.toml` from its git directory
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repository::open(path.as_ref())?;
        let config = RestackConfig::discover(repo.path())?;
        Ok(Self::from_repository(repo, config))
    }

    pub fn from_repository(repo: Git2Repository, config: RestackConfig) -> Self {
        let path = repo
            .workdir()
            .unwrap_or_else(|| repo.path())
            .to_path_buf();
        CommitStore { path, repo, config }
    }

    pub fn with_config(mut self, config: RestackConfig) -> Self {
        self.config = config;
        self
    }

    /// Working directory, or the git directory for bare repositories
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &RestackConfig {
        &self.config
    }

    pub fn repository(&self) -> &Git2Repository {
        &self.repo
    }

    /// Resolve a full hash, short hash or ref name to a commit ID
    pub fn resolve(&self, spec: &str) -> Result<Oid> {
        Ok(self.repo.resolve(spec)?)
    }

    pub fn find_commit(&self, id: Oid) -> Result<git2::Commit<'_>> {
        self.repo.find_commit(id).map_err(|e| match e.code() {
            ErrorCode::NotFound => RestackError::NotFound(id.to_string()),
            _ => RestackError::Git(e),
        })
    }

    pub fn parents_of(&self, id: Oid) -> Result<Vec<Oid>> {
        Ok(self.repo.parent_ids(id)?)
    }

    /// Tree of a commit; the zero ID stands for the synthetic root's empty tree
    pub fn tree_of(&self, id: Oid) -> Result<Oid> {
        if id.is_zero() {
            return self.empty_tree();
        }
        Ok(self.find_commit(id)?.tree_id())
    }

    pub fn empty_tree(&self) -> Result<Oid> {
        Ok(self.repo.treebuilder(None)?.write()?)
    }

    /// Files changed between two trees
    pub fn diff(&self, old_tree: Oid, new_tree: Oid) -> Result<Vec<FileChange>> {
        let old_tree = self.repo.find_tree(old_tree)?;
        let new_tree = self.repo.find_tree(new_tree)?;
        let diff = self
            .repo
            .diff_tree_to_tree(Some(&old_tree), Some(&new_tree), None)?;

        let changes = diff
            .deltas()
            .map(|delta| {
                let new_path = delta.new_file().path().map(|p| p.to_string_lossy().into_owned());
                let old_path = delta.old_file().path().map(|p| p.to_string_lossy().into_owned());
                FileChange {
                    path: new_path.clone().or_else(|| old_path.clone()).unwrap_or_default(),
                    old_path: if old_path != new_path { old_path } else { None },
                    status: delta.status().into(),
                }
            })
            .collect();

        Ok(changes)
    }

    /// Replay `commit`'s change (against its first parent) on top of `base_tree`
    pub fn try_apply(&self, base_tree: Oid, commit: Oid) -> Result<ApplyOutcome> {
        let commit = self.find_commit(commit)?;
        let ancestor = if commit.parent_count() == 0 {
            self.repo.find_tree(self.empty_tree()?)?
        } else {
            commit.parent(0)?.tree()?
        };
        let ours = self.repo.find_tree(base_tree)?;
        let theirs = commit.tree()?;

        let mut index = self.repo.merge_trees(&ancestor, &ours, &theirs, None)?;
        if index.has_conflicts() {
            let paths = conflict_paths(&index)?;
            debug!(commit = %commit.id(), conflicts = paths.len(), "change does not apply cleanly");
            return Ok(ApplyOutcome::Conflicted(paths));
        }

        Ok(ApplyOutcome::Clean(index.write_tree_to(&self.repo)?))
    }

    /// Write a commit object without moving any ref
    pub fn create_commit(
        &self,
        tree: Oid,
        parents: &[Oid],
        author: &Signature<'_>,
        message: &str,
    ) -> Result<Oid> {
        let tree = self.repo.find_tree(tree)?;
        let parents = parents
            .iter()
            .map(|id| self.find_commit(*id))
            .collect::<Result<Vec<_>>>()?;
        let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();
        let committer = self.signature()?;

        Ok(self
            .repo
            .commit(None, author, &committer, message, &tree, &parent_refs)?)
    }

    /// Point `refs/heads/<branch>` at `target`
    pub fn update_branch(&self, branch: &str, target: Oid, log_message: &str) -> Result<()> {
        let name = format!("refs/heads/{}", branch);
        self.repo.reference(&name, target, true, log_message)?;
        Ok(())
    }

    /// Abbreviated hash at the configured width
    pub fn short_hash(&self, id: Oid) -> String {
        self.short_hash_with(id, self.config.hash_width())
    }

    pub fn short_hash_with(&self, id: Oid, width: usize) -> String {
        let full = id.to_string();
        full[..width.min(full.len())].to_string()
    }

    /// First line of a commit message
    pub fn summary(&self, id: Oid) -> Result<String> {
        Ok(self.find_commit(id)?.summary().unwrap_or("").to_string())
    }

    pub fn full_message(&self, id: Oid) -> Result<String> {
        Ok(self.find_commit(id)?.message().unwrap_or("").to_string())
    }

    /// Committer identity from git config, falling back to the configured one
    pub fn signature(&self) -> Result<Signature<'static>> {
        let config = self.repo.config()?;

        let name = config
            .get_string("user.name")
            .unwrap_or_else(|_| self.config.identity.name.clone());
        let email = config
            .get_string("user.email")
            .unwrap_or_else(|_| self.config.identity.email.clone());

        Ok(Signature::now(&name, &email)?)
    }

    /// Ancestry graph between `start` and its ancestor `end`
    pub fn ancestry(&self, start: Oid, end: Oid) -> Result<AncestryGraph> {
        let builder = AncestryBuilder::new(&self.repo).with_root_policy(self.config.graph_policy());
        if end.is_zero() {
            Ok(builder.build_to_root(start)?)
        } else {
            Ok(builder.build(start, end)?)
        }
    }
}

/// Paths of every conflicted entry in an index
fn conflict_paths(index: &Index) -> Result<Vec<String>> {
    let mut paths = Vec::new();

    for conflict in index.conflicts()? {
        let conflict = conflict?;
        let entry = conflict.our.or(conflict.their).or(conflict.ancestor);
        if let Some(entry) = entry {
            let path = String::from_utf8_lossy(&entry.path).into_owned();
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }

    Ok(paths)
}
