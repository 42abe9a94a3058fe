//! Canonical token source for the Sintra design system.
//!
//! The default token document ships embedded in the library and is parsed
//! exactly once into a process-wide, read-only [`TokenTree`]. Everything
//! that "modifies" it — customization, resolution — returns a new tree; the
//! canonical instance itself is never mutated after initialization.

use once_cell::sync::Lazy;
use tracing::error;

use crate::errors::ThemeError;
use crate::types::{TokenGroup, TokenNode, TokenTree, FOUNDATION_REGION, SEMANTIC_REGION};

const SINTRA_TOKENS_JSON: &str = include_str!("default_tokens/sintra.tokens.json");
const SINTRA_TOKENS_NAME: &str = "sintra.tokens.json";

static CANONICAL_TREE: Lazy<TokenTree> = Lazy::new(|| {
    match parse_token_tree(SINTRA_TOKENS_NAME, SINTRA_TOKENS_JSON) {
        Ok(tree) => tree,
        Err(e) => {
            error!(
                "Failed to load embedded token source: {}. Falling back to a minimal tree; \
                 this indicates a defect in the shipped token document.",
                e
            );
            fallback_tree()
        }
    }
});

/// The canonical default token tree, loaded once at first use.
pub fn canonical_tree() -> &'static TokenTree {
    &CANONICAL_TREE
}

/// Parses and shape-checks a token source document.
///
/// The core treats trees as opaque; a malformed *source* (not valid JSON,
/// missing or non-group `color.foundation` / `color.semantic` regions)
/// surfaces here, never inside resolution.
pub fn parse_token_tree(source_name: &str, json: &str) -> Result<TokenTree, ThemeError> {
    let tree: TokenTree =
        serde_json::from_str(json).map_err(|e| ThemeError::TokenSourceParse {
            source_name: source_name.to_string(),
            source_error: Box::new(e),
        })?;
    validate_shape(source_name, &tree)?;
    Ok(tree)
}

fn validate_shape(source_name: &str, tree: &TokenTree) -> Result<(), ThemeError> {
    require_group_region(source_name, tree, FOUNDATION_REGION)?;
    require_group_region(source_name, tree, SEMANTIC_REGION)?;

    // region() returned Some above, so this re-read cannot fail.
    if let Some(semantic) = tree.region(SEMANTIC_REGION) {
        for (variant, node) in semantic {
            if node.as_group().is_none() {
                return Err(ThemeError::NotAGroup {
                    source_name: source_name.to_string(),
                    path: format!("{}.{}", SEMANTIC_REGION.join("."), variant),
                });
            }
        }
    }
    Ok(())
}

fn require_group_region(
    source_name: &str,
    tree: &TokenTree,
    segments: &[&str],
) -> Result<(), ThemeError> {
    let path = crate::types::TokenPath::new(segments.join("."));
    match tree.lookup(&path) {
        Some(node) if node.as_group().is_some() => Ok(()),
        Some(_) => Err(ThemeError::NotAGroup {
            source_name: source_name.to_string(),
            path: path.to_string(),
        }),
        None => Err(ThemeError::MissingRegion {
            source_name: source_name.to_string(),
            region: path.to_string(),
        }),
    }
}

/// A minimal monochrome tree used only if the embedded source fails to
/// load. Keeps every caller of [`canonical_tree`] functional.
fn fallback_tree() -> TokenTree {
    let json = r##"{
        "color": {
            "foundation": {
                "base": {"base0": "#FFFFFF", "base100": "#000000"}
            },
            "semantic": {
                "light": {
                    "text": {"default": "{color.foundation.base.base100}"},
                    "background": {"default": "{color.foundation.base.base0}"},
                    "line": {"default": "{color.foundation.base.base100}"}
                },
                "dark": {
                    "text": {"default": "{color.foundation.base.base0}"},
                    "background": {"default": "{color.foundation.base.base100}"},
                    "line": {"default": "{color.foundation.base.base0}"}
                }
            }
        }
    }"##;
    serde_json::from_str(json).unwrap_or_else(|_| {
        let mut root = TokenGroup::new();
        root.insert("color".to_string(), TokenNode::Group(TokenGroup::new()));
        TokenTree::new(root)
    })
}
