//! Git and GitHub workflow orchestration for coding-agent workspaces, plus
//! detection of installed agent CLIs.
//!
//! Every operation drives external tools (`git`, `gh`, agent CLIs) through a
//! [`process::ProcessRunner`], so the whole crate can be exercised against a
//! scripted runner in tests.

pub mod agent;
pub mod config;
pub mod error;
pub mod platform;
pub mod process;
pub mod server;
pub mod shutdown;
pub mod workflow;
pub mod workspace;
