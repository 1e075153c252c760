pub mod actions;
pub mod cache;
pub mod client;
pub mod types;

pub use actions::{GithubActions, IssueSource};
pub use cache::GithubQueryKey;

/// Query cache keyed by GitHub queries
pub type GithubCache = crate::cache::QueryCache<GithubQueryKey>;
