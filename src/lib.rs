//! Launch Guard - launch protection rules and verification worker
//!
//! This crate evaluates token launches against anti-snipe, anti-bundle and
//! anti-rug policies, producing PASS/WARN/FAIL verification reports, and
//! runs a worker that keeps those reports fresh.

pub mod observability;
pub mod orchestrator;
pub mod rules;
pub mod security;
pub mod worker;

// Re-export main types for convenience
pub use orchestrator::{ShutdownCoordinator, WorkerConfig};
pub use rules::{
    generate_verification_report, meets_minimum_standards, LaunchConfig, RulesError,
    VerificationReport, VerificationStatus,
};
pub use worker::{InMemoryLaunchStore, LaunchSnapshot, VerificationWorker};
