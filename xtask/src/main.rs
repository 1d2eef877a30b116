use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for swarmspace")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all checks: fmt, clippy, tests, doc
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates
    Clippy,
    /// Run all tests
    Test,
    /// Build rustdoc for the workspace
    Doc,
    /// Build the entire workspace
    Build,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            run_step("cargo fmt --check", &["fmt", "--all", "--", "--check"])?;
            run_step(
                "cargo clippy",
                &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
            )?;
            run_step("cargo test", &["test", "--workspace"])?;
            run_step("cargo doc", &["doc", "--workspace", "--no-deps"])?;
        }
        Commands::Fmt => run_step("cargo fmt --check", &["fmt", "--all", "--", "--check"])?,
        Commands::Clippy => run_step(
            "cargo clippy",
            &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
        )?,
        Commands::Test => run_step("cargo test", &["test", "--workspace"])?,
        Commands::Doc => run_step("cargo doc", &["doc", "--workspace", "--no-deps"])?,
        Commands::Build => run_step("cargo build", &["build", "--workspace"])?,
    }

    Ok(())
}

fn run_step(label: &str, args: &[&str]) -> Result<()> {
    println!("==> Running {label}");
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("{label} failed");
    }
    Ok(())
}
