//! CLI for Launch Guard
//!
//! Evaluates launch snapshots from JSON files without running the worker.

use anyhow::{Context, Result};
use chrono::Utc;
use launch_guard::observability::init_logging;
use launch_guard::rules::{
    calculate_launch_stats, generate_verification_report, meets_minimum_standards,
    TokenAuthorities,
};
use launch_guard::{LaunchConfig, LaunchSnapshot, WorkerConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A launch snapshot plus an optional attesting program
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyInput {
    #[serde(flatten)]
    launch: LaunchSnapshot,
    #[serde(default)]
    verified_by: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckOutput {
    valid: bool,
    violations: Vec<String>,
    meets_minimum_standards: bool,
    standards_violations: Vec<String>,
}

fn main() -> Result<()> {
    if let Err(e) = init_logging("warn") {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        print_usage(&args[0]);
        return Ok(());
    }

    let command = &args[1];
    let path = Path::new(&args[2]);

    match command.as_str() {
        "verify" => verify(path)?,
        "check" => check(path)?,
        "stats" => stats(path)?,
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage(&args[0]);
        }
    }

    Ok(())
}

fn print_usage(program: &str) {
    println!("Launch Guard CLI");
    println!();
    println!("Usage:");
    println!("  {} verify <input.json>   Generate a verification report", program);
    println!("  {} check <config.json>   Validate a launch config", program);
    println!("  {} stats <input.json>    Compute launch statistics", program);
    println!();
    println!("Input files hold one launch snapshot:");
    println!("  {{ \"launchId\", \"config\", \"purchases\", \"authorities\", \"verifiedBy\" }}");
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn verify(path: &Path) -> Result<()> {
    let input: VerifyInput = read_json(path)?;
    let launch = input.launch;

    let authorities = launch
        .authorities
        .unwrap_or_else(|| TokenAuthorities::unverified(Utc::now()));
    let verified_by = input
        .verified_by
        .unwrap_or_else(|| WorkerConfig::default().program_id);

    let report = generate_verification_report(
        &launch.launch_id,
        &launch.config,
        &launch.purchases,
        &authorities,
        &verified_by,
    )
    .context("Verification failed")?;

    print_json(&report)
}

fn check(path: &Path) -> Result<()> {
    let config: LaunchConfig = read_json(path)?;

    let validation = config.validate();
    let standards = meets_minimum_standards(&config);

    print_json(&CheckOutput {
        valid: validation.valid,
        violations: validation.violations,
        meets_minimum_standards: standards.meets,
        standards_violations: standards.violations,
    })
}

fn stats(path: &Path) -> Result<()> {
    let input: VerifyInput = read_json(path)?;
    let launch = input.launch;

    let stats = calculate_launch_stats(&launch.purchases, launch.config.usd1_config.total_supply)
        .context("Failed to compute statistics")?;

    print_json(&stats)
}
