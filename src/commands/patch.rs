use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use rebrand::config::{ConfigOverrides, PatchConfig};
use rebrand::patch::{self, PatchOptions};
use rebrand::report::DEFAULT_REPORT_NAME;

use crate::commands::CmdResult;

#[derive(Args, Debug)]
pub struct PatchArgs {
    /// Repository root (must contain flutter/android)
    #[arg(long, default_value = ".")]
    pub repo: String,

    /// JSON file with any of the configuration keys (flags override it)
    #[arg(long, value_name = "FILE")]
    pub config: Option<String>,

    /// Package identifier to replace [default: com.carriez.flutter_hbb]
    #[arg(long)]
    pub old_package: Option<String>,
    /// New package identifier [default: com.celonis.work]
    #[arg(long)]
    pub new_package: Option<String>,
    /// Display name to replace [default: RustDesk]
    #[arg(long)]
    pub old_app_name: Option<String>,
    /// New display name [default: ToddDesk]
    #[arg(long)]
    pub new_app_name: Option<String>,
    /// URI scheme to replace [default: rustdesk]
    #[arg(long)]
    pub old_scheme: Option<String>,
    /// New URI scheme [default: todddesk]
    #[arg(long)]
    pub new_scheme: Option<String>,
    /// Service class to rename [default: InputService]
    #[arg(long)]
    pub old_service: Option<String>,
    /// New service class name [default: ToddService]
    #[arg(long)]
    pub new_service: Option<String>,
    /// Accessibility service description [default: Made by Todd]
    #[arg(long)]
    pub accessibility_desc: Option<String>,

    /// Move the Kotlin package directory to match the new package
    #[arg(long)]
    pub move_kotlin_dir: bool,

    /// Report file name, written to the repository root
    #[arg(long, default_value = DEFAULT_REPORT_NAME)]
    pub report_name: String,
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum PatchOutput {
    #[serde(rename = "patch")]
    Patch {
        repo: String,
        config: PatchConfig,
        scanned: usize,
        changed_files_count: usize,
        changed_files: Vec<String>,
        move_notes: Vec<String>,
        validation_notes: Vec<String>,
        report: String,
    },
}

impl PatchOutput {
    /// The single status line printed on success.
    pub fn summary_line(&self) -> String {
        match self {
            PatchOutput::Patch {
                scanned,
                changed_files_count,
                report,
                ..
            } => format!(
                "[OK] scanned={}, changed_files={}, report={}",
                scanned, changed_files_count, report
            ),
        }
    }
}

pub fn run(args: PatchArgs) -> CmdResult<PatchOutput> {
    let base = match args.config.as_deref() {
        Some(path) => {
            let expanded = shellexpand::tilde(path).to_string();
            PatchConfig::from_json_file(&PathBuf::from(expanded))?
        }
        None => PatchConfig::default(),
    };

    let config = base.with_overrides(ConfigOverrides {
        old_package: args.old_package,
        new_package: args.new_package,
        old_app_name: args.old_app_name,
        new_app_name: args.new_app_name,
        old_scheme: args.old_scheme,
        new_scheme: args.new_scheme,
        old_service: args.old_service,
        new_service: args.new_service,
        accessibility_desc: args.accessibility_desc,
    });

    let repo = PathBuf::from(shellexpand::tilde(&args.repo).to_string());
    let repo = repo.canonicalize().unwrap_or(repo);

    let mut options = PatchOptions::new(&repo, config.clone());
    options.move_kotlin_dir = args.move_kotlin_dir;
    options.report_name = args.report_name;

    let outcome = patch::run(&options)?;

    Ok((
        PatchOutput::Patch {
            repo: repo.display().to_string(),
            config,
            scanned: outcome.scanned,
            changed_files_count: outcome.changed_files.len(),
            changed_files: outcome.changed_files,
            move_notes: outcome.move_notes,
            validation_notes: outcome.validation_notes,
            report: outcome.report,
        },
        0,
    ))
}
