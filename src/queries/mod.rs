//! Issue queries used by the views.
//!
//! Each type here owns its local position state (filter, page counter) and
//! reads everything else through the shared [`GithubCache`](crate::github::GithubCache).

pub mod detail;
pub mod filter;
pub mod infinite;
pub mod labels;
pub mod paged;
pub mod prime;

#[cfg(test)]
pub mod fake;

pub use filter::IssueFilter;
pub use infinite::InfiniteIssues;
pub use paged::PagedIssues;
pub use prime::prime_issue;
