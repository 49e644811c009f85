//! Post-rewrite checks. Any failure aborts the run before the report is written.
//!
//! All checks are exact, case-sensitive substring tests on lossily decoded text.

use std::path::{Path, PathBuf};

use crate::config::PatchConfig;
use crate::error::{Error, Result};
use crate::io;
use crate::rules::FALLBACK_BRAND;
use crate::walker::{self, relative_display};

/// Android project root relative to the repository root.
pub const ANDROID_ROOT: &[&str] = &["flutter", "android"];
pub const BUILD_GRADLE: &[&str] = &["flutter", "android", "app", "build.gradle"];
pub const MANIFEST: &[&str] = &[
    "flutter",
    "android",
    "app",
    "src",
    "main",
    "AndroidManifest.xml",
];

/// Offending files listed in a residue diagnostic.
pub const MAX_LISTED_FILES: usize = 50;

fn join(repo: &Path, segments: &[&str]) -> PathBuf {
    segments.iter().fold(repo.to_path_buf(), |p, s| p.join(s))
}

pub fn android_root(repo: &Path) -> PathBuf {
    join(repo, ANDROID_ROOT)
}

pub fn must_contain(repo: &Path, path: &Path, needle: &str, hint: &str) -> Result<()> {
    if !io::read_text(path)?.contains(needle) {
        return Err(Error::postcondition_missing_marker(
            relative_display(path, repo),
            needle,
            hint,
        ));
    }
    Ok(())
}

pub fn must_not_contain(repo: &Path, path: &Path, needle: &str, hint: &str) -> Result<()> {
    if io::read_text(path)?.contains(needle) {
        return Err(Error::postcondition_forbidden_marker(
            relative_display(path, repo),
            needle,
            hint,
        ));
    }
    Ok(())
}

/// Walk `root` once and return, for each needle, the files containing it.
pub fn scan(repo: &Path, root: &Path, needles: &[String]) -> Result<Vec<Vec<String>>> {
    let mut hits = vec![Vec::new(); needles.len()];
    for file in walker::walk_text_files(root)? {
        let text = io::read_text(&file)?;
        for (needle, found) in needles.iter().zip(hits.iter_mut()) {
            if text.contains(needle.as_str()) {
                found.push(relative_display(&file, repo));
            }
        }
    }
    Ok(hits)
}

/// Files containing any of the needles at `indices`, without duplicates.
fn union(hits: &[Vec<String>], indices: &[usize]) -> Vec<String> {
    let mut files: Vec<String> = Vec::new();
    for &i in indices {
        for file in &hits[i] {
            if !files.contains(file) {
                files.push(file.clone());
            }
        }
    }
    files
}

/// Run every check in order. Returns human-readable notes for the report.
pub fn validate(repo: &Path, cfg: &PatchConfig) -> Result<Vec<String>> {
    let mut notes = Vec::new();

    let gradle = join(repo, BUILD_GRADLE);
    if gradle.is_file() {
        must_contain(
            repo,
            &gradle,
            &format!(r#"applicationId "{}""#, cfg.new_package),
            "applicationId must be the new package",
        )?;
        must_not_contain(
            repo,
            &gradle,
            &format!(r#"applicationId "{}""#, cfg.old_package),
            "the old applicationId must be gone",
        )?;
        notes.push(format!("build.gradle applicationId is {}", cfg.new_package));
    } else {
        notes.push("build.gradle not found, applicationId check skipped".to_string());
    }

    let manifest = join(repo, MANIFEST);
    if manifest.is_file() {
        must_contain(
            repo,
            &manifest,
            &format!(r#"package="{}""#, cfg.new_package),
            "manifest package must be the new package",
        )?;
        must_contain(
            repo,
            &manifest,
            &format!(r#"android:name=".{}""#, cfg.new_service),
            "service android:name must be the new service",
        )?;
        must_contain(
            repo,
            &manifest,
            &format!(r#"android:scheme="{}""#, cfg.new_scheme),
            "android:scheme must be the new scheme",
        )?;
        notes.push(format!(
            "AndroidManifest.xml has package {}, service .{}, scheme {}",
            cfg.new_package, cfg.new_service, cfg.new_scheme
        ));
    } else {
        notes.push("AndroidManifest.xml not found, manifest checks skipped".to_string());
    }

    let root = android_root(repo);
    let needles = vec![
        cfg.old_package.clone(),
        format!("lib{}.so", cfg.new_scheme),
        format!("lib{}.so", FALLBACK_BRAND),
        format!(r#"System.loadLibrary("{}")"#, cfg.new_scheme),
        format!(r#"System.loadLibrary("{}")"#, FALLBACK_BRAND),
    ];
    let hits = scan(repo, &root, &needles)?;

    let residue = union(&hits, &[0]);
    if !residue.is_empty() {
        return Err(Error::postcondition_residue_found(
            format!(
                "flutter/android still contains the old package `{}` in {} file(s):",
                cfg.old_package,
                residue.len()
            ),
            vec![needles[0].clone()],
            &residue,
            MAX_LISTED_FILES,
        )
        .with_hint("Inspect the listed files; the old package appears in a form no rule rewrites"));
    }
    notes.push(format!("No residual `{}` under flutter/android", cfg.old_package));

    let library_files = union(&hits, &[1, 2]);
    if !library_files.is_empty() {
        return Err(Error::postcondition_residue_found(
            format!(
                "Native library file name was altered ({} / {} found):",
                needles[1], needles[2]
            ),
            vec![needles[1].clone(), needles[2].clone()],
            &library_files,
            MAX_LISTED_FILES,
        )
        .with_hint("The app would fail at startup with UnsatisfiedLinkError"));
    }

    let load_calls = union(&hits, &[3, 4]);
    if !load_calls.is_empty() {
        return Err(Error::postcondition_residue_found(
            format!(
                "System.loadLibrary was altered ({} / {} found):",
                needles[3], needles[4]
            ),
            vec![needles[3].clone(), needles[4].clone()],
            &load_calls,
            MAX_LISTED_FILES,
        )
        .with_hint("The app would fail at startup with UnsatisfiedLinkError"));
    }
    notes.push("Native library name and System.loadLibrary call are intact".to_string());

    log_status!("validate", "All checks passed");
    Ok(notes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(repo: &Path, segments: &[&str], body: &str) {
        let path = join(repo, segments);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    fn patched_repo() -> TempDir {
        let dir = TempDir::new().unwrap();
        let repo = dir.path();
        write(repo, BUILD_GRADLE, "applicationId \"com.celonis.work\"\n");
        write(
            repo,
            MANIFEST,
            concat!(
                "<manifest package=\"com.celonis.work\">\n",
                "<service android:name=\".ToddService\" />\n",
                "<data android:scheme=\"todddesk\" />\n",
                "</manifest>\n",
            ),
        );
        write(
            repo,
            &["flutter", "android", "app", "src", "main", "kotlin", "Main.kt"],
            "System.loadLibrary(\"rustdesk\")\n",
        );
        dir
    }

    #[test]
    fn patched_tree_passes() {
        let dir = patched_repo();
        let notes = validate(dir.path(), &PatchConfig::default()).unwrap();
        assert_eq!(notes.len(), 4);
    }

    #[test]
    fn absent_build_files_are_skipped() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(android_root(dir.path())).unwrap();
        let notes = validate(dir.path(), &PatchConfig::default()).unwrap();
        assert!(notes[0].contains("skipped"));
        assert!(notes[1].contains("skipped"));
    }

    #[test]
    fn old_application_id_fails() {
        let dir = patched_repo();
        write(
            dir.path(),
            BUILD_GRADLE,
            "applicationId \"com.celonis.work\"\n// applicationId \"com.carriez.flutter_hbb\"\n",
        );
        let err = validate(dir.path(), &PatchConfig::default()).unwrap_err();
        assert_eq!(err.code.as_str(), "postcondition.forbidden_marker");
        assert_eq!(err.details["file"], "flutter/android/app/build.gradle");
    }

    #[test]
    fn missing_manifest_marker_fails() {
        let dir = patched_repo();
        write(
            dir.path(),
            MANIFEST,
            "<manifest package=\"com.celonis.work\">\n<service android:name=\".InputService\" />\n",
        );
        let err = validate(dir.path(), &PatchConfig::default()).unwrap_err();
        assert_eq!(err.code.as_str(), "postcondition.missing_marker");
        assert_eq!(err.details["marker"], "android:name=\".ToddService\"");
        assert!(!err.hints.is_empty());
    }

    #[test]
    fn residual_old_package_fails() {
        let dir = patched_repo();
        write(
            dir.path(),
            &["flutter", "android", "README.md"],
            "see com.carriez.flutter_hbb",
        );
        let err = validate(dir.path(), &PatchConfig::default()).unwrap_err();
        assert_eq!(err.code.as_str(), "postcondition.residue_found");
        assert_eq!(err.details["files"][0], "flutter/android/README.md");
    }

    #[test]
    fn residue_outside_allow_list_is_ignored() {
        let dir = patched_repo();
        write(
            dir.path(),
            &["flutter", "android", "app", "debug.keystore"],
            "com.carriez.flutter_hbb",
        );
        assert!(validate(dir.path(), &PatchConfig::default()).is_ok());
    }

    #[test]
    fn altered_native_library_fails() {
        let dir = patched_repo();
        write(
            dir.path(),
            &["flutter", "android", "app", "jni.txt"],
            "jniLibs/arm64-v8a/libtodddesk.so",
        );
        let err = validate(dir.path(), &PatchConfig::default()).unwrap_err();
        assert!(err.message.starts_with("Native library file name was altered"));
    }

    #[test]
    fn altered_load_call_fails() {
        let cfg = PatchConfig {
            new_scheme: "acme".to_string(),
            ..Default::default()
        };
        let dir = patched_repo();
        write(
            dir.path(),
            MANIFEST,
            concat!(
                "<manifest package=\"com.celonis.work\">\n",
                "<service android:name=\".ToddService\" />\n",
                "<data android:scheme=\"acme\" />\n",
            ),
        );
        write(
            dir.path(),
            &["flutter", "android", "app", "Loader.java"],
            "System.loadLibrary(\"acme\");",
        );
        let err = validate(dir.path(), &cfg).unwrap_err();
        assert!(err.message.starts_with("System.loadLibrary was altered"));
        assert_eq!(err.details["files"][0], "flutter/android/app/Loader.java");
    }

    #[test]
    fn scan_is_case_sensitive() {
        let dir = patched_repo();
        write(
            dir.path(),
            &["flutter", "android", "notes.txt"],
            "COM.CARRIEZ.FLUTTER_HBB",
        );
        assert!(validate(dir.path(), &PatchConfig::default()).is_ok());
    }
}
