pub mod node;
pub mod error;
pub mod ancestry;
pub mod builder;

pub use node::{GraphNode, ChildSet};
pub use error::{GraphError, Result};
pub use ancestry::{AncestryGraph, DepthGroups};
pub use builder::{AncestryBuilder, ParentLookup, RootPolicy};
