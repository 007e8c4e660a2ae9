//! Build script stamping the CLI version with the source commit.
//!
//! Packagers building outside a checkout can set `RECSYNC_BUILD_COMMIT`.

use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=../../.git/HEAD");
    println!("cargo:rerun-if-env-changed=RECSYNC_BUILD_COMMIT");

    let package = env!("CARGO_PKG_VERSION");
    let version = match build_commit() {
        Some(commit) => format!("{} ({})", package, commit),
        None => package.to_string(),
    };

    println!("cargo:rustc-env=RECSYNC_VERSION={}", version);
}

fn build_commit() -> Option<String> {
    if let Ok(commit) = std::env::var("RECSYNC_BUILD_COMMIT") {
        let commit = commit.trim();
        return (!commit.is_empty()).then(|| commit.to_string());
    }

    let output = Command::new("git")
        .args(["rev-parse", "--short=10", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }

    let commit = String::from_utf8(output.stdout).ok()?;
    let commit = commit.trim();
    (!commit.is_empty()).then(|| commit.to_string())
}
