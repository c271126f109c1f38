//! Throw-away repositories for unit tests

use crate::config::RestackConfig;
use crate::store::CommitStore;
use anyhow::Result;
use git2::{Oid, Repository, Signature};
use std::path::Path;
use tempfile::TempDir;

pub(crate) struct TestRepo {
    dir: TempDir,
    repo: Repository,
}

impl TestRepo {
    pub fn new() -> Result<Self> {
        let dir = TempDir::new()?;
        let repo = Repository::init(dir.path())?;

        let mut config = repo.config()?;
        config.set_str("user.name", "Test User")?;
        config.set_str("user.email", "test@example.com")?;

        Ok(TestRepo { dir, repo })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Commit on top of HEAD and advance it
    pub fn commit(&self, message: &str, files: &[(&str, &str)]) -> Result<Oid> {
        let parent = self.repo.head().ok().and_then(|head| head.target());
        self.write_commit(parent, message, files, Some("HEAD"))
    }

    /// Commit on top of an explicit parent without touching any ref
    pub fn commit_on(&self, parent: Oid, message: &str, files: &[(&str, &str)]) -> Result<Oid> {
        self.write_commit(Some(parent), message, files, None)
    }

    /// A merge commit of two parents, keeping the first parent's tree
    pub fn merge(&self, first: Oid, second: Oid, message: &str) -> Result<Oid> {
        let sig = Signature::now("Test User", "test@example.com")?;
        let first = self.repo.find_commit(first)?;
        let second = self.repo.find_commit(second)?;
        let tree = first.tree()?;
        Ok(self
            .repo
            .commit(None, &sig, &sig, message, &tree, &[&first, &second])?)
    }

    pub fn store(&self) -> CommitStore {
        let repo = Repository::open(self.dir.path()).expect("reopen test repository");
        CommitStore::from_repository(repo, RestackConfig::default())
    }

    fn write_commit(
        &self,
        parent: Option<Oid>,
        message: &str,
        files: &[(&str, &str)],
        update_ref: Option<&str>,
    ) -> Result<Oid> {
        let parent = match parent {
            Some(id) => Some(self.repo.find_commit(id)?),
            None => None,
        };
        let base_tree = match &parent {
            Some(commit) => Some(commit.tree()?),
            None => None,
        };

        let mut builder = self.repo.treebuilder(base_tree.as_ref())?;
        for (name, content) in files {
            let blob = self.repo.blob(content.as_bytes())?;
            builder.insert(name, blob, 0o100644)?;
        }
        let tree = self.repo.find_tree(builder.write()?)?;

        let sig = Signature::now("Test User", "test@example.com")?;
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        Ok(self
            .repo
            .commit(update_ref, &sig, &sig, message, &tree, &parents)?)
    }
}
