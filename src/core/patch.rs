//! End-to-end rebrand run: rewrite, migrate, validate, report.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::PatchConfig;
use crate::error::{Error, Result};
use crate::migrate;
use crate::report::{self, ReportInput};
use crate::rewrite;
use crate::rules;
use crate::validate;
use crate::walker::relative_display;

#[derive(Debug, Clone)]
pub struct PatchOptions {
    pub repo: PathBuf,
    pub config: PatchConfig,
    pub move_kotlin_dir: bool,
    pub report_name: String,
}

impl PatchOptions {
    pub fn new(repo: impl Into<PathBuf>, config: PatchConfig) -> Self {
        Self {
            repo: repo.into(),
            config,
            move_kotlin_dir: false,
            report_name: report::DEFAULT_REPORT_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PatchOutcome {
    pub scanned: usize,
    pub changed_files: Vec<String>,
    pub move_notes: Vec<String>,
    pub validation_notes: Vec<String>,
    /// Report path relative to the repository root.
    pub report: String,
}

fn validate_report_name(name: &str) -> Result<()> {
    let path = Path::new(name);
    let plain = path.file_name().map(|f| f == path.as_os_str()).unwrap_or(false);
    if name.trim().is_empty() || !plain {
        return Err(Error::validation_invalid_argument(
            "report_name",
            "must be a plain file name",
            Some(name.to_string()),
        ));
    }
    Ok(())
}

/// Run the whole pipeline. The report is only written when validation passes.
pub fn run(opts: &PatchOptions) -> Result<PatchOutcome> {
    let cfg = &opts.config;
    cfg.validate()?;
    validate_report_name(&opts.report_name)?;

    let repo = opts.repo.as_path();
    let android_root = validate::android_root(repo);
    if !android_root.is_dir() {
        return Err(Error::precondition_missing_path(
            android_root.display().to_string(),
            "flutter/android",
        )
        .with_hint("Pass --repo pointing at the repository root that contains flutter/"));
    }

    let rule_list = rules::build_rules(cfg)?;
    log_status!(
        "rewrite",
        "Applying {} rules under {}",
        rule_list.len(),
        relative_display(&android_root, repo)
    );
    let summary = rewrite::rewrite_tree(repo, &android_root, &rule_list)?;

    let mut move_notes = Vec::new();
    if opts.move_kotlin_dir {
        migrate::move_package_dir(repo, cfg, &mut move_notes)?;
    }

    let validation_notes = validate::validate(repo, cfg)?;

    report::write_report(
        repo,
        &opts.report_name,
        &ReportInput {
            config: cfg,
            changed_files: &summary.changed,
            move_notes: &move_notes,
            validation_notes: &validation_notes,
        },
    )?;

    Ok(PatchOutcome {
        scanned: summary.scanned,
        changed_files: summary.changed,
        move_notes,
        validation_notes,
        report: opts.report_name.clone(),
    })
}
