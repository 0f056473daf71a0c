use std::process::Command;

/// Short commit hash from git, or `GIT_SHA` when building outside a checkout
fn commit() -> Option<String> {
    let from_git = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|out| out.status.success())
        .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string());
    from_git
        .or_else(|| std::env::var("GIT_SHA").ok())
        .filter(|sha| !sha.is_empty())
}

fn main() {
    let mut version = env!("CARGO_PKG_VERSION").to_string();

    // Development builds carry the commit hash
    let dev_build = std::env::var("SONIC_DEV_BUILD")
        .is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
    if dev_build {
        version.push_str("-dev");
        if let Some(sha) = commit() {
            version.push('+');
            version.push_str(&sha);
        }
    }

    println!("cargo:rustc-env=APP_VERSION={}", version);
    println!("cargo:rerun-if-env-changed=SONIC_DEV_BUILD");
    println!("cargo:rerun-if-env-changed=GIT_SHA");
    println!("cargo:rerun-if-changed=.git/HEAD");
}
