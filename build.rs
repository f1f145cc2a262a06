use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn main() {
    let hash = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".into());

    println!("cargo:rustc-env=PAGESCRIBER_GIT_HASH={hash}");

    if let Some(git_dir) = locate_git_dir() {
        for watched in ["HEAD", "refs", "packed-refs"] {
            rerun_if_exists(&git_dir.join(watched));
        }
    }
}

fn locate_git_dir() -> Option<PathBuf> {
    if let Some(explicit) = env::var_os("GIT_DIR") {
        return Some(PathBuf::from(explicit));
    }

    let dot_git = PathBuf::from(".git");
    if dot_git.is_dir() {
        return Some(dot_git);
    }

    // Worktrees and submodules store a `gitdir:` pointer file instead.
    let contents = fs::read_to_string(&dot_git).ok()?;
    let target = PathBuf::from(contents.strip_prefix("gitdir:")?.trim());
    if target.is_relative() {
        Some(Path::new(".").join(target))
    } else {
        Some(target)
    }
}

fn rerun_if_exists(path: &Path) {
    if path.exists() {
        if let Some(display) = path.to_str() {
            println!("cargo:rerun-if-changed={display}");
        }
    }
}
