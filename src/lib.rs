//! # Sintra Theming (`sintra-theming`)
//!
//! Design token resolution engine for the Sintra design system.
//!
//! A token source is an immutable, arbitrarily nested tree of named values
//! (colors, spacing steps, radii, breakpoints) whose string leaves may
//! reference other tokens by dotted path, `{color.foundation.brand.50}`.
//! This crate resolves such trees into fully concrete value trees and builds
//! per-variant themes (light, dark) from them, optionally patching the
//! foundation palettes first so every derived semantic color follows.
//!
//! ## Key pieces
//!
//! - **Resolution** ([`logic`]): recursive reference chasing with cycle
//!   detection; fail-soft — unresolvable references degrade with a
//!   [`Diagnostic`] instead of failing the pass.
//! - **Customization** ([`logic`]): structural deep merge of a partial
//!   palette patch into the `color.foundation` region of a fresh tree copy.
//! - **Theme building** ([`logic`]): projection of the semantic region into
//!   the fixed output shape, one resolved theme per declared variant.
//! - **Canonical source** ([`tokens`]): the embedded default token document,
//!   parsed once into a process-wide read-only tree.
//! - **Consumers**: [`service::ThemeService`] propagates the selected theme
//!   and broadcasts changes; [`generator`] renders build-time artifacts.
//!   Both only call the public functions below.
//!
//! ## Usage
//!
//! ```rust
//! use sintra_theming::{create_custom_themes, resolve_token, FoundationOverrides, VariantName};
//!
//! // Single reference against the canonical tree.
//! let navy = resolve_token("{color.foundation.neutral.100}");
//! assert_eq!(navy.to_string(), "#0D0E0E");
//!
//! // Rebrand: patch one foundation shade, rebuild every variant.
//! let overrides = FoundationOverrides::new().set("brand", "50", "#FF0000");
//! let themes = create_custom_themes(Some(&overrides));
//! let light = &themes[&VariantName::new("light")];
//! assert_eq!(light.get("color.text.brand.default").unwrap().to_string(), "#FF0000");
//! ```

use std::collections::BTreeMap;

use tracing::warn;

pub mod errors;
pub mod events;
pub mod generator;
pub mod logic;
pub mod service;
pub mod tokens;
pub mod types;


pub use errors::{Diagnostic, ThemeError};
pub use events::ThemeChangedEvent;
pub use service::ThemeService;
pub use tokens::{canonical_tree, parse_token_tree};
pub use types::{
    FoundationOverrides, ResolvedTheme, ThemeSettings, TokenGroup, TokenLeaf, TokenNode,
    TokenPath, TokenTree, VariantName,
};

/// Resolves a single token reference against the canonical tree.
///
/// Strings not of the form `{a.b.c}` pass through verbatim. Unresolvable
/// references are logged as warnings and returned verbatim; resolution
/// never fails.
pub fn resolve_token(reference: &str) -> TokenLeaf {
    resolve_token_in(reference, canonical_tree())
}

/// Resolves a single token reference against an explicit tree.
pub fn resolve_token_in(reference: &str, tree: &TokenTree) -> TokenLeaf {
    let mut diagnostics = Vec::new();
    let value = logic::resolve_reference(reference, tree, &mut diagnostics);
    log_diagnostics(&diagnostics);
    value
}

/// Resolves every reference inside `node` against the canonical tree,
/// preserving the node's shape exactly.
pub fn resolve_tokens(node: &TokenNode) -> TokenNode {
    resolve_tokens_in(node, canonical_tree())
}

/// Resolves every reference inside `node` against an explicit tree.
pub fn resolve_tokens_in(node: &TokenNode, tree: &TokenTree) -> TokenNode {
    let mut diagnostics = Vec::new();
    let resolved = logic::resolve_node(node, tree, &mut diagnostics);
    log_diagnostics(&diagnostics);
    resolved
}

/// Returns the canonical tree with a foundation override patch applied.
///
/// With no overrides (or an empty patch) the result is value-equal to the
/// canonical tree; otherwise `color.foundation` is deep-merged with the
/// patch and every other region is carried over untouched.
pub fn create_custom_tokens(overrides: Option<&FoundationOverrides>) -> TokenTree {
    logic::customize_tree(canonical_tree(), overrides)
}

/// Builds every declared variant from the canonical tree with `overrides`
/// applied, so all variants observe the same patched foundation palette.
pub fn create_custom_themes(
    overrides: Option<&FoundationOverrides>,
) -> BTreeMap<VariantName, ResolvedTheme> {
    let tree = create_custom_tokens(overrides);
    logic::build_all_variants(&tree)
}

fn log_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        warn!("{}", diagnostic);
    }
}
