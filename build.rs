//! Stamps the build with a version string.
use std::process::Command;

fn main() {
    // An explicit ORCA_NIGHTLY_VERSION wins. Checkouts without it are
    // stamped with `git describe`; anything else keeps the package version.
    if let Ok(version) = std::env::var("ORCA_NIGHTLY_VERSION") {
        println!("cargo:rustc-env=ORCA_NIGHTLY_VERSION={version}");
    } else if let Ok(output) = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        && output.status.success()
    {
        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        println!("cargo:rustc-env=ORCA_NIGHTLY_VERSION={version}");
    }

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");
    println!("cargo:rerun-if-env-changed=ORCA_NIGHTLY_VERSION");
}
