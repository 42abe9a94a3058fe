//! Error and diagnostic types for the Sintra theming system.
//!
//! Two kinds of failure exist and they are kept strictly apart:
//!
//! * [`ThemeError`] — loader- and consumer-level failures: a token source
//!   document that cannot be parsed or has the wrong shape, an unknown
//!   variant name, or an I/O failure while writing generator output. These
//!   are real errors and propagate via `Result`.
//! * [`Diagnostic`] — fail-soft resolution findings. A reference that cannot
//!   be resolved never aborts a resolution pass; it produces a diagnostic
//!   and the pass degrades gracefully (see [`crate::logic`]).

use thiserror::Error;

use crate::types::{TokenPath, VariantName};

#[derive(Error, Debug)]
pub enum ThemeError {
    #[error("Failed to parse token source '{source_name}': {source_error}")]
    TokenSourceParse {
        source_name: String,
        #[source]
        source_error: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Token source '{source_name}' has no '{region}' region")]
    MissingRegion { source_name: String, region: String },

    #[error("Token source '{source_name}': '{path}' must be a group")]
    NotAGroup { source_name: String, path: String },

    #[error("Unknown theme variant '{variant}'")]
    UnknownVariant { variant: VariantName },

    #[error("I/O error while writing '{path}': {source_error}")]
    Io {
        path: String,
        #[source]
        source_error: std::io::Error,
    },
}

/// A non-fatal finding produced while resolving references.
///
/// Diagnostics are plain values handed to the caller so tests can assert on
/// them deterministically; the public wrappers in the crate root log them
/// with `tracing::warn!` and otherwise carry on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A path segment of the reference does not exist in the tree.
    #[error("token path not found: {reference}")]
    PathNotFound { reference: String },

    /// The reference chase revisited a path it had already followed.
    #[error("reference cycle detected at {reference}: {}", format_cycle(.path))]
    CycleDetected {
        reference: String,
        /// The chain of paths followed, ending at the revisited one.
        path: Vec<TokenPath>,
    },

    /// The reference landed on a group with no usable `default` member.
    #[error("token reference {reference} resolved to a group without a default value")]
    MissingDefault { reference: String },
}

fn format_cycle(path: &[TokenPath]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}
