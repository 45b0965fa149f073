//! Rendering of ranking results.

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::ranking::RankEntry;

#[derive(Debug, Clone, Tabled)]
struct RankRow<'a> {
    #[tabled(rename = "user")]
    user: &'a str,
    #[tabled(rename = "count")]
    count: u64,
}

/// Render the ranking as a markdown table with headers `user` and `count`.
///
/// Rows keep the order of `entries`.
pub fn markdown_table(entries: &[RankEntry]) -> String {
    let rows = entries.iter().map(|e| RankRow {
        user: &e.user,
        count: e.count,
    });

    let mut table = Table::new(rows);
    table.with(Style::markdown());
    table.to_string()
}

/// Related repositories, one per line.
pub fn related_repos_list(repos: &[String]) -> String {
    repos.join("\n")
}
