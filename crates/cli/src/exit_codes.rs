//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, missing file) |
//! | 3-9     | recon            | Config, input and data-quality codes     |
//! | 10-19   | export           | Writing reports and exception files      |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use cdrecon_engine::ReconError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Recon (3-9)
// =============================================================================

/// Config file could not be parsed or failed validation.
pub const EXIT_RECON_INVALID_CONFIG: u8 = 3;

/// A CDR file could not be read, decoded or parsed.
pub const EXIT_RECON_LOAD: u8 = 4;

/// A configured key or measure column is absent from a dataset.
pub const EXIT_RECON_SCHEMA: u8 = 5;

/// A measure column holds a value that cannot be summed.
pub const EXIT_RECON_TYPE_MISMATCH: u8 = 6;

/// Exceptions were found and `--fail-on-exceptions` was given.
pub const EXIT_RECON_EXCEPTIONS: u8 = 7;

// =============================================================================
// Export (10-19)
// =============================================================================

/// JSON report could not be serialized or written.
pub const EXIT_EXPORT_REPORT: u8 = 10;

/// Exception file (xlsx/csv) could not be written.
pub const EXIT_EXPORT_EXCEPTIONS: u8 = 11;

// =============================================================================
// Engine Error Types
// =============================================================================

/// Map a ReconError to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_)
        | ReconError::ConfigValidation(_)
        | ReconError::UnknownCarrier(_) => EXIT_RECON_INVALID_CONFIG,
        ReconError::MissingDataset(_) => EXIT_RECON_LOAD,
        ReconError::MissingColumn { .. } => EXIT_RECON_SCHEMA,
        ReconError::TypeMismatch { .. } => EXIT_RECON_TYPE_MISMATCH,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_map_to_registered_codes() {
        assert_eq!(
            recon_exit_code(&ReconError::ConfigParse("x".into())),
            EXIT_RECON_INVALID_CONFIG
        );
        assert_eq!(
            recon_exit_code(&ReconError::MissingColumn {
                carrier: "MTN".into(),
                column: "A_NUMBER".into(),
            }),
            EXIT_RECON_SCHEMA
        );
        assert_eq!(
            recon_exit_code(&ReconError::TypeMismatch {
                carrier: "OCM".into(),
                column: "duration".into(),
                row: 3,
                value: "n/a".into(),
            }),
            EXIT_RECON_TYPE_MISMATCH
        );
    }
}
