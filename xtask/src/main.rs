//! Workspace automation for pushsync: `cargo xtask <task>`.
//!
//! Output goes straight to the terminal; this is a developer tool.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::env;
use std::process::{Command, ExitCode};

use anyhow::{bail, Context, Result};

mod features;

type Task = fn() -> Result<()>;

/// Steps of `cargo xtask ci`, in order.
const CI_STEPS: &[(&str, Task)] = &[
    ("format", run_fmt),
    ("clippy", run_clippy),
    ("agent binary", build_agent),
    ("tests", run_test),
    ("cargo-deny", run_deny),
    ("cargo-audit", run_audit),
];

fn main() -> ExitCode {
    let result = match env::args().nth(1).as_deref() {
        Some("ci") => run_ci(),
        Some("fmt") => run_fmt(),
        Some("clippy") => run_clippy(),
        Some("test") => run_test(),
        Some("deny") => run_deny(),
        Some("audit") => run_audit(),
        Some("test-features") => features::test_feature_matrix(),
        Some("help") | None => {
            print_help();
            Ok(())
        }
        Some(other) => {
            print_help();
            Err(anyhow::anyhow!("unknown task '{other}'"))
        }
    };

    if let Err(e) = result {
        eprintln!("xtask: {e:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn print_help() {
    println!("cargo xtask <task>");
    println!();
    println!("  ci             fmt, clippy, agent build, tests, deny, audit");
    println!("  fmt            rustfmt --check");
    println!("  clippy         clippy on the workspace (XTASK_CLIPPY_ALL_TARGETS=1 adds tests)");
    println!("  test           workspace tests");
    println!("  test-features  build each pushsync-common tier");
    println!("  deny           cargo-deny check");
    println!("  audit          cargo-audit");
}

fn run_ci() -> Result<()> {
    for (index, (name, step)) in CI_STEPS.iter().enumerate() {
        println!("==> [{}/{}] {name}", index + 1, CI_STEPS.len());
        step().with_context(|| format!("ci step '{name}' failed"))?;
    }
    println!("==> ci passed");
    Ok(())
}

/// Run `cargo <args>` and fail with `what` on a non-zero exit.
fn cargo(args: &[&str], what: &str) -> Result<()> {
    let status = Command::new("cargo").args(args).status().context("could not run cargo")?;
    if !status.success() {
        bail!("{what}");
    }
    Ok(())
}

/// Fail early with an install hint when a cargo subcommand is missing.
fn require_tool(tool: &str) -> Result<()> {
    let installed = Command::new("cargo")
        .args([tool, "--version"])
        .output()
        .is_ok_and(|output| output.status.success());
    if !installed {
        bail!("cargo-{tool} is not installed (cargo install cargo-{tool})");
    }
    Ok(())
}

fn run_fmt() -> Result<()> {
    cargo(&["fmt", "--all", "--", "--check"], "formatting differs; run `cargo fmt --all`")
}

fn run_clippy() -> Result<()> {
    let mut args = vec!["clippy", "--workspace", "--all-features"];
    if env::var_os("XTASK_CLIPPY_ALL_TARGETS").is_some() {
        args.push("--all-targets");
    }
    cargo(&args, "clippy reported errors")
}

fn build_agent() -> Result<()> {
    cargo(&["build", "-p", "pushsync-agent", "--bin", "pushsync-agent"], "pushsync-agent does not build")
}

fn run_test() -> Result<()> {
    cargo(&["test", "--workspace", "--all-features"], "tests failed")
}

fn run_deny() -> Result<()> {
    require_tool("deny")?;
    cargo(&["deny", "check"], "cargo-deny found issues")
}

fn run_audit() -> Result<()> {
    require_tool("audit")?;
    cargo(&["audit"], "cargo-audit found vulnerabilities")
}
