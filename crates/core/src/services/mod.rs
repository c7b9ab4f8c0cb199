pub mod backends;
pub mod edit_distance;
pub mod executor;
pub mod inspector;
pub mod ranker;
pub mod resolver;
pub mod runner;
pub mod similarity;
pub mod walker;

pub use executor::{apply, apply_with, AppliedRename, FileOps, RenameError, StdFileOps};
pub use inspector::{BinaryIdentity, BinaryInspector, InspectError};
pub use resolver::NameResolver;
pub use runner::{RenameRunner, RunSummary};
pub use walker::{walk, CandidateSet, WalkError};
