pub mod pull_request;
pub mod types;

pub use pull_request::{PrCreateRequest, PullRequestManager};
