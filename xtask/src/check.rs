use anyhow::Result;
use std::time::Instant;

use crate::step::{self, banner, done};

/// Library crates that must build without std.
const NO_STD_CRATES: [&str; 4] = ["platform", "topic", "comlink", "components"];
const TARGET: &str = "thumbv7em-none-eabihf";

pub fn run(host_only: bool) -> Result<()> {
    banner("🔍 Checking workspace...");
    let start = Instant::now();

    step::cargo("Host check", &["check", "--workspace", "--all-targets"])?;
    step::cargo(
        "Host check with tracing",
        &[
            "check",
            "-p",
            "topic",
            "-p",
            "comlink",
            "-p",
            "components",
            "--features",
            "topic/tracing,comlink/tracing,components/tracing",
        ],
    )?;

    let tree = step::cargo(
        "Platform dependency graph",
        &["tree", "-p", "platform", "-e", "normal", "--prefix", "none"],
    )?;
    if String::from_utf8_lossy(&tree.stdout).contains("heapless") {
        anyhow::bail!("platform pulls in heapless outside the `std` feature");
    }

    if !host_only {
        for krate in NO_STD_CRATES {
            step::cargo(
                &format!("no_std check of {krate} ({TARGET})"),
                &["check", "-p", krate, "--target", TARGET, "--features", "defmt"],
            )?;
        }
    }

    step::cargo_soft(
        "Clippy",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
        "Clippy warnings found",
    )?;
    step::cargo_soft(
        "Formatting check",
        &["fmt", "--all", "--check"],
        "Run 'cargo fmt --all' to fix",
    )?;

    done("All checks", start);
    Ok(())
}
