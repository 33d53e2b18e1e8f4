//! Input validation for values entering the worker from outside.
//!
//! This module provides:
//! - Solana program id validation for the verifying authority
//! - Launch / wallet identifier validation
//! - Input sanitization for logging

use anyhow::{anyhow, Result};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

/// Longest identifier accepted from a snapshot
pub const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Validate a Solana program id.
///
/// # Arguments
/// * `program_id` - Base58 program id string
///
/// # Returns
/// * `Ok(Pubkey)` if valid
/// * `Err` if invalid format
pub fn validate_program_id(program_id: &str) -> Result<Pubkey> {
    Pubkey::from_str(program_id).map_err(|e| anyhow!("Invalid program id: {}", e))
}

/// Validate an opaque identifier (launch id, wallet, signature).
///
/// # Arguments
/// * `kind` - What the identifier is, used in the error message
/// * `value` - The identifier
///
/// # Returns
/// * `Ok(())` if non-empty printable ASCII within [`MAX_IDENTIFIER_LENGTH`]
/// * `Err` otherwise
pub fn validate_identifier(kind: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(anyhow!("{} must not be empty", kind));
    }

    if value.len() > MAX_IDENTIFIER_LENGTH {
        return Err(anyhow!(
            "{} must be at most {} characters",
            kind,
            MAX_IDENTIFIER_LENGTH
        ));
    }

    if !value.chars().all(|c| c.is_ascii_graphic()) {
        return Err(anyhow!(
            "{} must contain only printable ASCII characters",
            kind
        ));
    }

    Ok(())
}

/// Sanitize log output to prevent sensitive data leakage.
///
/// # Arguments
/// * `input` - The string to sanitize
///
/// # Returns
/// * Sanitized string with potential secrets redacted
pub fn sanitize_for_logging(input: &str) -> String {
    let patterns = [
        (r"[a-zA-Z0-9]{64,}", "[REDACTED-KEY]"),
        (r"Bearer [a-zA-Z0-9\-._~+/]+=*", "Bearer [REDACTED]"),
        (r"token[=:]\s*[a-zA-Z0-9\-._~+/]+=*", "token=[REDACTED]"),
        (r"key[=:]\s*[a-zA-Z0-9\-._~+/]+=*", "key=[REDACTED]"),
    ];

    let mut output = input.to_string();
    for (pattern, replacement) in patterns {
        if let Ok(re) = regex::Regex::new(pattern) {
            output = re.replace_all(&output, replacement).to_string();
        }
    }
    output
}
