use std::path::Path;
use std::process::Command;

const COMMIT_ENV: &str = "RAILWAY_GIT_COMMIT_SHA";

fn commit_from_git() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())?;
    Some(String::from_utf8_lossy(&output.stdout).trim().to_owned())
}

fn main() {
    let commit = std::env::var(COMMIT_ENV)
        .ok()
        .or_else(commit_from_git)
        .unwrap_or_else(|| "unknown".to_owned());
    let short = commit.get(..7).unwrap_or(&commit);

    println!("cargo:rustc-env=GIT_COMMIT_HASH={commit}");
    println!("cargo:rustc-env=GIT_COMMIT_SHORT={short}");
    println!("cargo:rerun-if-env-changed={COMMIT_ENV}");

    if Path::new(".git/HEAD").exists() {
        println!("cargo:rerun-if-changed=.git/HEAD");
        println!("cargo:rerun-if-changed=.git/refs/heads");
    }
}
