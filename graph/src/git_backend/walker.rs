use git2::{ErrorCode, Oid, Repository};
use crate::core::{AncestryBuilder, AncestryGraph, GraphError, ParentLookup, Result, RootPolicy};

impl ParentLookup for Repository {
    fn resolve(&self, spec: &str) -> Result<Oid> {
        let object = self
            .revparse_single(spec)
            .map_err(|_| GraphError::CommitNotFound(spec.to_string()))?;
        let commit = object
            .peel_to_commit()
            .map_err(|_| GraphError::CommitNotFound(spec.to_string()))?;
        Ok(commit.id())
    }

    fn parent_ids(&self, id: Oid) -> Result<Vec<Oid>> {
        let commit = self.find_commit(id).map_err(|e| match e.code() {
            ErrorCode::NotFound => GraphError::CommitNotFound(id.to_string()),
            _ => GraphError::Git(e),
        })?;
        Ok(commit.parent_ids().collect())
    }
}

/// Builds ancestry graphs straight from a git repository
pub struct GitWalker {
    repo: Repository,
    policy: RootPolicy,
}

impl GitWalker {
    pub fn new(repo_path: Option<&str>) -> Result<Self> {
        let repo = match repo_path {
            Some(path) => Repository::open(path),
            None => Repository::open_from_env(),
        }?;

        Ok(Self {
            repo,
            policy: RootPolicy::default(),
        })
    }

    pub fn with_root_policy(mut self, policy: RootPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Graph of the commits between `start` and its ancestor `end`
    pub fn ancestry(&self, start: &str, end: &str) -> Result<AncestryGraph> {
        AncestryBuilder::new(&self.repo)
            .with_root_policy(self.policy)
            .build_from_specs(start, end)
    }

    /// Graph of every commit from `start` down to the root of history
    pub fn ancestry_to_root(&self, start: &str) -> Result<AncestryGraph> {
        let start = self.repo.resolve(start)?;
        AncestryBuilder::new(&self.repo).build_to_root(start)
    }
}
