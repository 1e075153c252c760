mod issue_detail;
mod issue_list;

pub use issue_detail::IssueDetailView;
pub use issue_list::IssueListView;
