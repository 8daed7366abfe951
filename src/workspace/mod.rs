pub mod branch;
pub mod git;
pub mod manager;

pub use branch::{BranchResolver, BranchStatus};
pub use git::GitCli;
pub use manager::{CommitAndPush, PushSummary, WorkspaceManager};
