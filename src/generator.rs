//! Build-time output generation.
//!
//! Renders a token source into consumer artifacts: a stylesheet declaring
//! every token as a CSS custom property (`base.css`) and a manifest of the
//! fully resolved theme variants (`themes.json`). Semantic values are
//! resolved through the same resolver the rest of the crate uses, so the
//! generated output cannot drift from runtime resolution behavior.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::errors::{Diagnostic, ThemeError};
use crate::logic::{build_all_variants, resolve_reference};
use crate::types::{TokenGroup, TokenLeaf, TokenNode, TokenTree, FOUNDATION_REGION, SEMANTIC_REGION};

/// Prefix for every generated CSS custom property (`--st-...`).
const VARIABLE_PREFIX: &str = "st";

const STYLESHEET_FILENAME: &str = "base.css";
const MANIFEST_FILENAME: &str = "themes.json";

/// Renders the full stylesheet for `tree`.
///
/// Foundation palettes and the flat regions (spacing, radius, breakpoint,
/// typography) are emitted verbatim under `:root`, followed by the resolved
/// semantic variables of the `light` variant. Every other variant gets its
/// own `[data-theme="<name>"]` block so consumers switch themes with a
/// single attribute.
pub fn render_stylesheet(tree: &TokenTree) -> String {
    let mut diagnostics = Vec::new();
    let mut out = String::from("/* Auto-generated. Do not modify directly. */\n\n");

    out.push_str(":root {\n");
    if let Some(foundation) = tree.region(FOUNDATION_REGION) {
        push_variables(&mut out, "color-foundation", foundation, None, &mut diagnostics);
    }
    for (region, node) in tree.root() {
        if region == "color" {
            continue;
        }
        if let TokenNode::Group(group) = node {
            push_variables(&mut out, region, group, None, &mut diagnostics);
        }
    }

    let variants = tree.variant_names();
    let root_variant = variants
        .iter()
        .find(|name| name.as_str() == "light")
        .or_else(|| variants.first());

    if let Some(root_variant) = root_variant {
        out.push_str(&format!("\n    /* {} theme semantic tokens */\n", root_variant));
        push_semantic_variables(&mut out, tree, root_variant.as_str(), &mut diagnostics);
    }
    out.push_str("}\n");

    for variant in &variants {
        if Some(variant) == root_variant {
            continue;
        }
        out.push_str(&format!("\n[data-theme=\"{}\"] {{\n", variant));
        out.push_str(&format!("    /* {} theme semantic tokens */\n", variant));
        push_semantic_variables(&mut out, tree, variant.as_str(), &mut diagnostics);
        out.push_str("}\n");
    }

    for diagnostic in &diagnostics {
        warn!("{}", diagnostic);
    }
    out
}

fn push_semantic_variables(
    out: &mut String,
    tree: &TokenTree,
    variant: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut region = SEMANTIC_REGION.to_vec();
    region.push(variant);
    if let Some(semantic) = tree.region(&region) {
        push_variables(out, "color-semantic", semantic, Some(tree), diagnostics);
    }
}

/// Emits one `--st-<prefix>-<key>: value;` line per leaf, recursing into
/// nested groups. With a tree supplied, text leaves are resolved against it
/// first; without one they are emitted verbatim.
fn push_variables(
    out: &mut String,
    prefix: &str,
    group: &TokenGroup,
    resolve_against: Option<&TokenTree>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for (key, node) in group {
        let name = format!("{}-{}", prefix, key);
        match node {
            TokenNode::Group(child) => {
                push_variables(out, &name, child, resolve_against, diagnostics);
            }
            TokenNode::Leaf(leaf) => {
                let value = match (resolve_against, leaf) {
                    (Some(tree), TokenLeaf::Text(text)) => {
                        resolve_reference(text, tree, diagnostics).to_string()
                    }
                    _ => leaf.to_string(),
                };
                out.push_str(&format!("    --{}-{}: {};\n", VARIABLE_PREFIX, name, value));
            }
            // A list has no single-variable representation; token sources
            // do not currently declare any.
            TokenNode::Sequence(_) => warn!("skipping sequence token '{}'", name),
        }
    }
}

/// Renders the resolved-variants manifest as pretty-printed JSON.
pub fn render_manifest(tree: &TokenTree) -> String {
    let themes = build_all_variants(tree);
    // BTreeMap of string-keyed, string/number-leafed values cannot fail to
    // serialize.
    serde_json::to_string_pretty(&themes).unwrap_or_else(|_| "{}".to_string())
}

/// Writes `base.css` and `themes.json` for `tree` into `out_dir`, creating
/// the directory as needed.
pub fn write_outputs(out_dir: &Path, tree: &TokenTree) -> Result<(), ThemeError> {
    fs::create_dir_all(out_dir).map_err(|e| ThemeError::Io {
        path: out_dir.display().to_string(),
        source_error: e,
    })?;

    let stylesheet_path = out_dir.join(STYLESHEET_FILENAME);
    fs::write(&stylesheet_path, render_stylesheet(tree)).map_err(|e| ThemeError::Io {
        path: stylesheet_path.display().to_string(),
        source_error: e,
    })?;
    info!("wrote {}", stylesheet_path.display());

    let manifest_path = out_dir.join(MANIFEST_FILENAME);
    fs::write(&manifest_path, render_manifest(tree)).map_err(|e| ThemeError::Io {
        path: manifest_path.display().to_string(),
        source_error: e,
    })?;
    info!("wrote {}", manifest_path.display());

    Ok(())
}
