//! Applies the rule list to files on disk.

use std::path::Path;

use crate::error::Result;
use crate::io;
use crate::rules::{apply_rules, Rule};
use crate::walker;

/// Outcome of rewriting a subtree.
#[derive(Debug, Clone, Default)]
pub struct RewriteSummary {
    /// Number of text files visited.
    pub scanned: usize,
    /// Changed files relative to the repository root, in visit order.
    pub changed: Vec<String>,
}

/// Rewrite one file in place. Returns `true` when the content changed.
///
/// Line endings are normalized before comparison, so a file is only written
/// when a rule actually matched.
pub fn rewrite_file(path: &Path, rules: &[Rule]) -> Result<bool> {
    let original = io::read_text(path)?;
    let rewritten = apply_rules(rules, &original);
    if rewritten == original {
        return Ok(false);
    }
    io::write_text(path, &rewritten)?;
    Ok(true)
}

/// Rewrite every text file under `subtree`, recording paths relative to `repo`.
pub fn rewrite_tree(repo: &Path, subtree: &Path, rules: &[Rule]) -> Result<RewriteSummary> {
    let mut summary = RewriteSummary::default();

    for file in walker::walk_text_files(subtree)? {
        summary.scanned += 1;
        if rewrite_file(&file, rules)? {
            summary.changed.push(walker::relative_display(&file, repo));
        }
    }

    log_status!(
        "rewrite",
        "Scanned {} files, changed {}",
        summary.scanned,
        summary.changed.len()
    );

    Ok(summary)
}
