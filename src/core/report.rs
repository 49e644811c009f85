//! Markdown run report.

use chrono::Local;
use std::path::{Path, PathBuf};

use crate::config::PatchConfig;
use crate::error::Result;
use crate::io;

pub const DEFAULT_REPORT_NAME: &str = "todd_patch_report.md";

/// Changed files listed before the remainder is summarized.
pub const MAX_LISTED_CHANGES: usize = 400;

/// Everything the report shows, borrowed from the finished run.
#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
    pub config: &'a PatchConfig,
    pub changed_files: &'a [String],
    pub move_notes: &'a [String],
    pub validation_notes: &'a [String],
}

pub fn render(input: &ReportInput<'_>, generated_at: &str) -> String {
    let cfg = input.config;
    let mut out = String::new();

    out.push_str("# Todd Android Patch Report\n\n");
    out.push_str(&format!("_Generated {}_\n\n", generated_at));

    out.push_str("## Targets\n\n");
    let targets = [
        ("old_package", &cfg.old_package),
        ("new_package", &cfg.new_package),
        ("old_app_name", &cfg.old_app_name),
        ("new_app_name", &cfg.new_app_name),
        ("old_scheme", &cfg.old_scheme),
        ("new_scheme", &cfg.new_scheme),
        ("old_service", &cfg.old_service),
        ("new_service", &cfg.new_service),
        ("accessibility_desc", &cfg.accessibility_desc),
    ];
    for (key, value) in targets {
        out.push_str(&format!("- {}: `{}`\n", key, value));
    }

    out.push_str("\n## File changes\n\n");
    out.push_str(&format!(
        "- changed_files_count: **{}**\n",
        input.changed_files.len()
    ));
    for file in input.changed_files.iter().take(MAX_LISTED_CHANGES) {
        out.push_str(&format!("  - `{}`\n", file));
    }
    if input.changed_files.len() > MAX_LISTED_CHANGES {
        out.push_str(&format!(
            "  - ... and {} more\n",
            input.changed_files.len() - MAX_LISTED_CHANGES
        ));
    }

    out.push_str("\n## Directory move / notes\n\n");
    push_notes(&mut out, input.move_notes);

    out.push_str("\n## Validation\n\n");
    push_notes(&mut out, input.validation_notes);

    out
}

fn push_notes(out: &mut String, notes: &[String]) {
    if notes.is_empty() {
        out.push_str("- (none)\n");
        return;
    }
    for note in notes {
        out.push_str(&format!("- {}\n", note));
    }
}

/// Render and write the report to `repo/name`, returning its path.
pub fn write_report(repo: &Path, name: &str, input: &ReportInput<'_>) -> Result<PathBuf> {
    let path = repo.join(name);
    let generated_at = Local::now().format("%Y-%m-%d %H:%M:%S %z").to_string();
    io::write_text(&path, &render(input, &generated_at))?;
    Ok(path)
}
