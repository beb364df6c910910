use std::process::Command;

use anyhow::{Context, Result};

const CRATE: &str = "pushsync-common";

/// Tiers that must build on their own; `None` is the empty default set.
const TIERS: &[Option<&str>] = &[None, Some("foundation"), Some("observability"), Some("runtime")];

/// `cargo check` each `pushsync-common` tier in isolation.
pub fn test_feature_matrix() -> Result<()> {
    for tier in TIERS {
        let label = tier.unwrap_or("default");
        println!("==> cargo check -p {CRATE} ({label})");

        let mut command = Command::new("cargo");
        command.args(["check", "-p", CRATE]);
        if let Some(feature) = tier {
            command.args(["--no-default-features", "--features", feature]);
        }

        let status = command.status().with_context(|| format!("could not run cargo for {label}"))?;
        if !status.success() {
            anyhow::bail!("{CRATE} does not build with tier '{label}'");
        }
    }

    println!("{CRATE}: all {} tiers build", TIERS.len());
    Ok(())
}
