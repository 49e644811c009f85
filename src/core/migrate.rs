//! Kotlin source directory migration.
//!
//! Kotlin sources live under a directory path that mirrors the package name
//! (`kotlin/com/example/app`). After the package is renamed the tree is moved
//! to the matching path, merging into an existing destination if needed.
//!
//! Problems that leave the tree untouched are recorded as notes, not errors.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::PatchConfig;
use crate::error::{Error, Result};
use crate::walker::relative_display;

/// Kotlin source root relative to the repository root.
pub const KOTLIN_ROOT: &[&str] = &["flutter", "android", "app", "src", "main", "kotlin"];

pub fn kotlin_root(repo: &Path) -> PathBuf {
    KOTLIN_ROOT.iter().fold(repo.to_path_buf(), |p, s| p.join(s))
}

/// Directory for `package` under `root`: `com.example.app` -> `root/com/example/app`.
pub fn package_dir(root: &Path, package: &str) -> PathBuf {
    PatchConfig::package_segments(package).fold(root.to_path_buf(), |p, s| p.join(s))
}

/// Move (or merge) the old package directory into the new package directory.
pub fn move_package_dir(repo: &Path, cfg: &PatchConfig, notes: &mut Vec<String>) -> Result<()> {
    let root = kotlin_root(repo);
    let show = |p: &Path| relative_display(p, repo);

    if !root.is_dir() {
        notes.push(format!("Kotlin root not found: {}", show(&root)));
        return Ok(());
    }

    let old_dir = package_dir(&root, &cfg.old_package);
    let new_dir = package_dir(&root, &cfg.new_package);

    if !old_dir.is_dir() {
        notes.push(format!(
            "Old kotlin dir not found (skip move): {}",
            show(&old_dir)
        ));
        return Ok(());
    }

    if new_dir.starts_with(&old_dir) || old_dir.starts_with(&new_dir) {
        notes.push(format!(
            "Kotlin dirs are nested (skip move): {} -> {}",
            show(&old_dir),
            show(&new_dir)
        ));
        return Ok(());
    }

    if let Some(parent) = new_dir.parent() {
        create_dir_all(parent)?;
    }

    if new_dir.exists() {
        notes.push(format!(
            "New kotlin dir exists, merge files: {}",
            show(&new_dir)
        ));
        let copied = copy_tree(&old_dir, &new_dir)?;
        log_status!("migrate", "Merged {} files into {}", copied, show(&new_dir));

        // Every file is already in place, so a failed delete only leaves duplicates.
        match fs::remove_dir_all(&old_dir) {
            Ok(()) => notes.push(format!("Deleted old kotlin dir: {}", show(&old_dir))),
            Err(e) => notes.push(format!(
                "Could not fully delete old kotlin dir {}: {}",
                show(&old_dir),
                e
            )),
        }
    } else {
        let copied = relocate(&old_dir, &new_dir, |from, to| fs::rename(from, to))?;
        log_status!(
            "migrate",
            "{} {} -> {}",
            if copied { "Copied" } else { "Moved" },
            show(&old_dir),
            show(&new_dir)
        );
        notes.push(format!(
            "Moved kotlin dir: {} -> {}",
            show(&old_dir),
            show(&new_dir)
        ));
    }

    prune_empty_ancestors(&old_dir, &root, repo, notes)?;
    Ok(())
}

/// Rename `from` to `to`. When the rename fails (for example across
/// filesystems) the tree is copied and the source deleted instead.
///
/// Returns `true` when the copy fallback was used.
fn relocate<F>(from: &Path, to: &Path, rename: F) -> Result<bool>
where
    F: FnOnce(&Path, &Path) -> std::io::Result<()>,
{
    let err = match rename(from, to) {
        Ok(()) => return Ok(false),
        Err(err) => err,
    };
    log_status!(
        "migrate",
        "Rename failed ({}), copying {} instead",
        err,
        from.display()
    );

    create_dir_all(to)?;
    copy_tree(from, to)?;
    fs::remove_dir_all(from).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("remove {}", from.display())))
    })?;
    Ok(true)
}

fn create_dir_all(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("create {}", dir.display())))
    })
}

/// Copy every file under `src` into `dst`, keeping relative paths and metadata.
///
/// Returns the number of files copied. Fails on the first error without
/// touching `src`.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<usize> {
    let mut files = Vec::new();
    collect_files(src, &mut files)?;

    for file in &files {
        let relative = file.strip_prefix(src).unwrap_or(file);
        let target = dst.join(relative);
        if let Some(parent) = target.parent() {
            create_dir_all(parent)?;
        }
        copy_preserving_metadata(file, &target)?;
    }

    Ok(files.len())
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("list {}", dir.display())))
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("list {}", dir.display())))
        })?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("stat {}", path.display())))
        })?;

        if file_type.is_dir() {
            collect_files(&path, files)?;
        } else if file_type.is_symlink() && path.is_dir() {
            return Err(Error::internal_io(
                "refusing to merge a symlinked directory",
                Some(format!("copy {}", path.display())),
            ));
        } else {
            files.push(path);
        }
    }

    Ok(())
}

/// `fs::copy` keeps permissions; access and modification times are restored on a best-effort basis.
fn copy_preserving_metadata(src: &Path, dst: &Path) -> Result<()> {
    fs::copy(src, dst).map_err(|e| {
        Error::internal_io(
            e.to_string(),
            Some(format!("copy {} -> {}", src.display(), dst.display())),
        )
    })?;

    if let Ok(meta) = fs::metadata(src) {
        let mut times = fs::FileTimes::new();
        if let Ok(modified) = meta.modified() {
            times = times.set_modified(modified);
        }
        if let Ok(accessed) = meta.accessed() {
            times = times.set_accessed(accessed);
        }
        if let Ok(file) = fs::OpenOptions::new().write(true).open(dst) {
            let _ = file.set_times(times);
        }
    }

    Ok(())
}

/// Remove directories left empty above `moved`, stopping at `root`.
fn prune_empty_ancestors(
    moved: &Path,
    root: &Path,
    repo: &Path,
    notes: &mut Vec<String>,
) -> Result<()> {
    let mut current = moved.parent();
    while let Some(dir) = current {
        if dir == root || !dir.starts_with(root) {
            break;
        }
        let is_empty = fs::read_dir(dir)
            .map_err(|e| Error::internal_io(e.to_string(), Some(format!("list {}", dir.display()))))?
            .next()
            .is_none();
        if !is_empty {
            break;
        }
        fs::remove_dir(dir).map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("remove {}", dir.display())))
        })?;
        notes.push(format!(
            "Removed empty directory: {}",
            relative_display(dir, repo)
        ));
        current = dir.parent();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn kotlin_file(repo: &Path, package: &str, name: &str, body: &str) -> PathBuf {
        let dir = package_dir(&kotlin_root(repo), package);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn package_dir_splits_segments() {
        let dir = package_dir(Path::new("/k"), "com.celonis.work");
        assert_eq!(dir, Path::new("/k/com/celonis/work"));
    }

    #[test]
    fn missing_kotlin_root_is_a_note() {
        let dir = TempDir::new().unwrap();
        let mut notes = Vec::new();
        move_package_dir(dir.path(), &PatchConfig::default(), &mut notes).unwrap();
        assert_eq!(
            notes,
            vec!["Kotlin root not found: flutter/android/app/src/main/kotlin"]
        );
    }

    #[test]
    fn missing_old_dir_is_a_note() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(kotlin_root(dir.path())).unwrap();
        let mut notes = Vec::new();
        move_package_dir(dir.path(), &PatchConfig::default(), &mut notes).unwrap();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].starts_with("Old kotlin dir not found (skip move):"));
        assert!(notes[0].ends_with("kotlin/com/carriez/flutter_hbb"));
    }

    #[test]
    fn moves_tree_and_prunes_empty_parents() {
        let dir = TempDir::new().unwrap();
        let repo = dir.path();
        let cfg = PatchConfig::default();
        kotlin_file(repo, &cfg.old_package, "MainActivity.kt", "main");
        kotlin_file(repo, &format!("{}.sub", cfg.old_package), "Util.kt", "util");

        let mut notes = Vec::new();
        move_package_dir(repo, &cfg, &mut notes).unwrap();

        let root = kotlin_root(repo);
        let new_dir = package_dir(&root, &cfg.new_package);
        assert_eq!(fs::read_to_string(new_dir.join("MainActivity.kt")).unwrap(), "main");
        assert_eq!(fs::read_to_string(new_dir.join("sub/Util.kt")).unwrap(), "util");
        assert!(!root.join("com/carriez").exists());
        assert!(root.join("com").is_dir());
        assert!(notes[0].starts_with("Moved kotlin dir:"));
        assert!(notes
            .iter()
            .any(|n| n == "Removed empty directory: flutter/android/app/src/main/kotlin/com/carriez"));
    }

    #[test]
    fn merges_into_existing_destination() {
        let dir = TempDir::new().unwrap();
        let repo = dir.path();
        let cfg = PatchConfig::default();
        kotlin_file(repo, &cfg.old_package, "MainActivity.kt", "from old");
        kotlin_file(repo, &format!("{}.nested", cfg.old_package), "Deep.kt", "deep");
        kotlin_file(repo, &cfg.new_package, "MainActivity.kt", "stale");
        kotlin_file(repo, &cfg.new_package, "Existing.kt", "keep");

        let mut notes = Vec::new();
        move_package_dir(repo, &cfg, &mut notes).unwrap();

        let root = kotlin_root(repo);
        let new_dir = package_dir(&root, &cfg.new_package);
        assert_eq!(fs::read_to_string(new_dir.join("MainActivity.kt")).unwrap(), "from old");
        assert_eq!(fs::read_to_string(new_dir.join("Existing.kt")).unwrap(), "keep");
        assert_eq!(fs::read_to_string(new_dir.join("nested/Deep.kt")).unwrap(), "deep");
        assert!(!package_dir(&root, &cfg.old_package).exists());
        assert!(notes[0].starts_with("New kotlin dir exists, merge files:"));
        assert!(notes[1].starts_with("Deleted old kotlin dir:"));
    }

    #[test]
    fn merge_preserves_modification_time() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("A.kt"), "a").unwrap();

        let past = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000);
        let file = fs::OpenOptions::new().write(true).open(src.join("A.kt")).unwrap();
        file.set_times(fs::FileTimes::new().set_modified(past)).unwrap();
        drop(file);

        assert_eq!(copy_tree(&src, &dst).unwrap(), 1);
        let copied = fs::metadata(dst.join("A.kt")).unwrap().modified().unwrap();
        assert_eq!(copied, past);
    }

    #[test]
    fn relocate_copies_when_rename_fails() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("old");
        let dst = dir.path().join("new");
        fs::create_dir_all(src.join("sub")).unwrap();
        fs::write(src.join("A.kt"), "a").unwrap();
        fs::write(src.join("sub/B.kt"), "b").unwrap();

        let copied = relocate(&src, &dst, |_, _| {
            Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "cross-device link",
            ))
        })
        .unwrap();

        assert!(copied);
        assert!(!src.exists());
        assert_eq!(fs::read_to_string(dst.join("A.kt")).unwrap(), "a");
        assert_eq!(fs::read_to_string(dst.join("sub/B.kt")).unwrap(), "b");
    }

    #[test]
    fn relocate_prefers_rename() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("old");
        let dst = dir.path().join("new");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("A.kt"), "a").unwrap();

        assert!(!relocate(&src, &dst, |from, to| fs::rename(from, to)).unwrap());
        assert!(dst.join("A.kt").is_file());
        assert!(!src.exists());
    }

    #[test]
    fn nested_package_dirs_are_skipped() {
        let dir = TempDir::new().unwrap();
        let repo = dir.path();
        let cfg = PatchConfig {
            new_package: "com.carriez.flutter_hbb.work".to_string(),
            ..Default::default()
        };
        kotlin_file(repo, &cfg.old_package, "MainActivity.kt", "main");

        let mut notes = Vec::new();
        move_package_dir(repo, &cfg, &mut notes).unwrap();
        assert!(notes[0].starts_with("Kotlin dirs are nested (skip move):"));
        assert!(package_dir(&kotlin_root(repo), &cfg.old_package)
            .join("MainActivity.kt")
            .exists());
    }
}
