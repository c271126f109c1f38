pub mod core;
pub mod git_backend;

pub use core::{
    AncestryBuilder, AncestryGraph, ChildSet, DepthGroups, GraphError, GraphNode, ParentLookup,
    RootPolicy,
};
pub use git_backend::GitWalker;
