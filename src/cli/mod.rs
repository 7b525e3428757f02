//! # CLI Module
//!
//! Command-line front end behind the `zen-spec` binary.
//!
//! ## Commands
//!
//! ### `check`
//!
//! Parse and compile a document, then list its operations:
//!
//! ```bash
//! zen-spec check --spec openapi.yaml
//! ```
//!
//! ### `validate`
//!
//! Validate a single request and print the outcome:
//!
//! ```bash
//! zen-spec validate --spec openapi.yaml --method POST --path '/pets?dryRun=true' \
//!     --header 'Content-Type: application/json' --body pet.json
//! ```
//!
//! Exit status is `0` for a valid request, `1` for an invalid one and `2`
//! when no operation matches.
//!
//! ### `redact`
//!
//! Print a body as it would appear in logs for an operation:
//!
//! ```bash
//! zen-spec redact --spec openapi.yaml --operation login --body login.json
//! ```

mod commands;


pub use commands::{execute, run_cli, Cli, Commands, Verdict};
