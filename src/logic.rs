//! Core algorithms of the Sintra theming system.
//!
//! This module provides reference resolution against a [`TokenTree`]
//! (`resolve_reference`, `resolve_node`), the structural deep merge used to
//! patch palettes (`deep_merge`), foundation customization
//! (`customize_tree`), and theme building (`build_variant`,
//! `build_all_variants`). Resolution is fail-soft throughout: an
//! unresolvable reference produces a [`Diagnostic`] and a graceful fallback
//! value, never an error that aborts a resolution pass.

use tracing::warn;

use crate::errors::{Diagnostic, ThemeError};
use crate::types::{
    FoundationOverrides, ResolvedTheme, TokenGroup, TokenLeaf, TokenNode, TokenPath, TokenTree,
    VariantName, FOUNDATION_REGION, SEMANTIC_REGION,
};

/// Semantic groups projected into every built variant, under `color`.
pub const SEMANTIC_OUTPUT_GROUPS: &[&str] = &["text", "background", "line"];

/// Variant-independent regions copied into every built variant as-is
/// (after resolution). `typography` intentionally stays out of built themes;
/// it is consumed by the stylesheet generator only.
pub const SHARED_OUTPUT_REGIONS: &[&str] = &["spacing", "radius", "breakpoint"];

/// Group member a reference may fall through to when it lands on a group
/// instead of a leaf.
const DEFAULT_MEMBER: &str = "default";

// --- Reference resolution ---

/// Resolves a single leaf string against `tree`.
///
/// A string not of the exact form `{a.b.c}` is a literal and passes through
/// verbatim, without a diagnostic. References are chased recursively: a
/// resolved value that is itself a reference is looked up again against the
/// same tree, and a group target with a `default` member resolves through
/// that member.
///
/// Failure is soft. A missing path segment, a revisited path (reference
/// cycle), or a group without a usable default pushes one [`Diagnostic`]
/// into `diagnostics` and yields a fallback: the in-flight reference string
/// for missing paths and cycles, an empty string for defaultless groups.
pub fn resolve_reference(
    raw: &str,
    tree: &TokenTree,
    diagnostics: &mut Vec<Diagnostic>,
) -> TokenLeaf {
    match TokenPath::from_reference(raw) {
        Some(path) => {
            let mut visited = Vec::new();
            chase_reference(&path, tree, &mut visited, diagnostics)
        }
        None => TokenLeaf::text(raw),
    }
}

/// One step of the reference chase. `visited` holds every path followed
/// during the current top-level resolution; revisiting one is a cycle.
fn chase_reference(
    path: &TokenPath,
    tree: &TokenTree,
    visited: &mut Vec<TokenPath>,
    diagnostics: &mut Vec<Diagnostic>,
) -> TokenLeaf {
    if visited.contains(path) {
        let mut cycle_path = visited.clone();
        cycle_path.push(path.clone());
        diagnostics.push(Diagnostic::CycleDetected {
            reference: path.to_reference(),
            path: cycle_path,
        });
        return TokenLeaf::Text(path.to_reference());
    }
    visited.push(path.clone());

    let Some(node) = tree.lookup(path) else {
        diagnostics.push(Diagnostic::PathNotFound {
            reference: path.to_reference(),
        });
        return TokenLeaf::Text(path.to_reference());
    };

    match node {
        TokenNode::Leaf(TokenLeaf::Text(text)) => match TokenPath::from_reference(text) {
            Some(next) => chase_reference(&next, tree, visited, diagnostics),
            None => TokenLeaf::Text(text.clone()),
        },
        TokenNode::Leaf(leaf) => leaf.clone(),
        TokenNode::Group(group) if group.contains_key(DEFAULT_MEMBER) => {
            // Semantic groups may alias to a "default" shade; chase through
            // it so cycle tracking still applies.
            let default_path = TokenPath::new(format!("{}.{}", path, DEFAULT_MEMBER));
            chase_reference(&default_path, tree, visited, diagnostics)
        }
        TokenNode::Group(_) | TokenNode::Sequence(_) => {
            diagnostics.push(Diagnostic::MissingDefault {
                reference: path.to_reference(),
            });
            TokenLeaf::text("")
        }
    }
}

/// Resolves every reference inside `node` against `tree`, preserving shape.
///
/// Text leaves go through [`resolve_reference`], sequences are mapped
/// element-wise, groups key-wise; numeric leaves pass through unchanged.
/// The output has exactly the same keys and nesting as the input.
pub fn resolve_node(
    node: &TokenNode,
    tree: &TokenTree,
    diagnostics: &mut Vec<Diagnostic>,
) -> TokenNode {
    match node {
        TokenNode::Leaf(TokenLeaf::Text(text)) => {
            TokenNode::Leaf(resolve_reference(text, tree, diagnostics))
        }
        TokenNode::Leaf(leaf) => TokenNode::Leaf(leaf.clone()),
        TokenNode::Sequence(items) => TokenNode::Sequence(
            items
                .iter()
                .map(|item| resolve_node(item, tree, diagnostics))
                .collect(),
        ),
        TokenNode::Group(group) => TokenNode::Group(
            group
                .iter()
                .map(|(key, child)| (key.clone(), resolve_node(child, tree, diagnostics)))
                .collect(),
        ),
    }
}

// --- Deep merge ---

/// Deep-merges `patch` into `base`, returning a new group; neither input is
/// mutated.
///
/// Where base and patch both hold a group under the same key the merge
/// recurses; in every other case the patch value replaces the base value
/// wholly, including a scalar replacing a group or vice versa. Keys absent
/// from the patch keep their base value; keys present only in the patch are
/// added. Numeric-looking keys (shade numbers) are ordinary string keys.
pub fn deep_merge(base: &TokenGroup, patch: &TokenGroup) -> TokenGroup {
    let mut merged = base.clone();
    for (key, patch_node) in patch {
        let merged_node = match (merged.get(key), patch_node) {
            (Some(TokenNode::Group(base_group)), TokenNode::Group(patch_group)) => {
                TokenNode::Group(deep_merge(base_group, patch_group))
            }
            _ => patch_node.clone(),
        };
        merged.insert(key.clone(), merged_node);
    }
    merged
}

// --- Customization ---

/// Applies a foundation override patch to `base`, returning a new tree.
///
/// With no overrides (or a structurally empty patch) the result is
/// value-equal to `base`. Otherwise the `color.foundation` region is
/// replaced with the deep merge of the existing region and the patch; every
/// other region of the returned tree is untouched. This never fails: a base
/// without a foundation region simply gains one holding the patch.
pub fn customize_tree(base: &TokenTree, overrides: Option<&FoundationOverrides>) -> TokenTree {
    let overrides = match overrides {
        Some(patch) if !patch.is_empty() => patch,
        _ => return base.clone(),
    };

    let foundation = base.region(FOUNDATION_REGION).cloned().unwrap_or_default();
    let merged = deep_merge(&foundation, &overrides.to_group());

    let mut root = base.root().clone();
    replace_region(&mut root, FOUNDATION_REGION, merged);
    TokenTree::new(root)
}

/// Replaces the group at `segments` inside `root`, creating intermediate
/// groups as needed.
fn replace_region(root: &mut TokenGroup, segments: &[&str], replacement: TokenGroup) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    if rest.is_empty() {
        root.insert((*first).to_string(), TokenNode::Group(replacement));
        return;
    }
    let entry = root
        .entry((*first).to_string())
        .or_insert_with(|| TokenNode::Group(TokenGroup::new()));
    if !matches!(entry, TokenNode::Group(_)) {
        *entry = TokenNode::Group(TokenGroup::new());
    }
    if let TokenNode::Group(child) = entry {
        replace_region(child, rest, replacement);
    }
}

// --- Theme building ---

/// Builds one resolved theme variant from `tree`.
///
/// The output shape is fixed: the declared semantic groups of
/// `color.semantic.<variant>` land under `color`, and the shared regions
/// (`spacing`, `radius`, `breakpoint`) are carried over whole. The selected
/// structure is resolved against the full tree, so semantic references reach
/// the (possibly customized) foundation palettes.
///
/// The only failure is a `variant` that does not name a semantic group in
/// `tree`; resolution of the selected structure itself degrades gracefully,
/// with diagnostics logged as warnings.
pub fn build_variant(tree: &TokenTree, variant: &VariantName) -> Result<ResolvedTheme, ThemeError> {
    let variant_group = tree
        .region(SEMANTIC_REGION)
        .and_then(|semantic| semantic.get(variant.as_str()))
        .and_then(TokenNode::as_group)
        .ok_or_else(|| ThemeError::UnknownVariant {
            variant: variant.clone(),
        })?;

    let mut diagnostics = Vec::new();

    let mut color = TokenGroup::new();
    for group_name in SEMANTIC_OUTPUT_GROUPS {
        if let Some(node) = variant_group.get(*group_name) {
            color.insert(
                (*group_name).to_string(),
                resolve_node(node, tree, &mut diagnostics),
            );
        }
    }

    let mut output = TokenGroup::new();
    output.insert("color".to_string(), TokenNode::Group(color));
    for region in SHARED_OUTPUT_REGIONS {
        if let Some(node) = tree.root().get(*region) {
            output.insert(
                (*region).to_string(),
                resolve_node(node, tree, &mut diagnostics),
            );
        }
    }

    for diagnostic in &diagnostics {
        warn!(variant = %variant, "{}", diagnostic);
    }

    Ok(ResolvedTheme {
        variant: variant.clone(),
        tokens: output,
    })
}

/// Builds every variant declared in the semantic region of `tree`.
///
/// All variants are produced from the one tree passed in, so a single
/// customization is observed consistently across them.
pub fn build_all_variants(
    tree: &TokenTree,
) -> std::collections::BTreeMap<VariantName, ResolvedTheme> {
    let mut variants = std::collections::BTreeMap::new();
    for name in tree.variant_names() {
        match build_variant(tree, &name) {
            Ok(theme) => {
                variants.insert(name, theme);
            }
            Err(error) => warn!("skipping variant: {}", error),
        }
    }
    variants
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn sample_tree() -> TokenTree {
        serde_json::from_str(
            r##"{
                "color": {
                    "foundation": {
                        "brand": {"40": "#5194FF", "50": "#297BFF", "60": "#2266D5"},
                        "neutral": {"50": "#7F8897", "100": "#0D0E0E"}
                    },
                    "semantic": {
                        "light": {
                            "text": {
                                "default": "{color.foundation.neutral.100}",
                                "secondary": "{color.semantic.light.text.default}",
                                "brand": {
                                    "default": "{color.foundation.brand.50}",
                                    "subtle": "{color.foundation.brand.40}"
                                }
                            },
                            "background": {"default": "#FFFFFF"},
                            "line": {"default": "{color.foundation.neutral.50}"}
                        },
                        "dark": {
                            "text": {
                                "default": "{color.foundation.neutral.50}",
                                "brand": {"default": "{color.foundation.brand.50}"}
                            },
                            "background": {"default": "{color.foundation.neutral.100}"},
                            "line": {"default": "{color.foundation.neutral.50}"}
                        }
                    }
                },
                "spacing": {"small": 8, "medium": 16},
                "radius": {"full": 9999},
                "breakpoint": {"mobile": 768}
            }"##,
        )
        .unwrap()
    }

    #[rstest]
    #[case("#FFFFFF")]
    #[case("rgb(255, 255, 255)")]
    #[case("{unclosed.brace")]
    #[case("missing.open}")]
    #[case("plain text")]
    fn literals_pass_through_without_diagnostics(#[case] literal: &str) {
        let tree = sample_tree();
        let mut diagnostics = Vec::new();
        let resolved = resolve_reference(literal, &tree, &mut diagnostics);
        assert_eq!(resolved, TokenLeaf::text(literal));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn resolves_direct_reference() {
        let tree = sample_tree();
        let mut diagnostics = Vec::new();
        let resolved = resolve_reference("{color.foundation.brand.50}", &tree, &mut diagnostics);
        assert_eq!(resolved, TokenLeaf::text("#297BFF"));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn chases_indirect_references() {
        let tree = sample_tree();
        let mut diagnostics = Vec::new();
        // secondary -> text.default -> neutral.100
        let resolved =
            resolve_reference("{color.semantic.light.text.secondary}", &tree, &mut diagnostics);
        assert_eq!(resolved, TokenLeaf::text("#0D0E0E"));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn missing_path_returns_reference_and_one_diagnostic() {
        let tree = sample_tree();
        let mut diagnostics = Vec::new();
        let resolved = resolve_reference("{nonexistent.path}", &tree, &mut diagnostics);
        assert_eq!(resolved, TokenLeaf::text("{nonexistent.path}"));
        assert_eq!(
            diagnostics,
            vec![Diagnostic::PathNotFound {
                reference: "{nonexistent.path}".to_string()
            }]
        );
    }

    #[test]
    fn missing_path_midway_through_a_chain_reports_the_inner_reference() {
        let tree: TokenTree = serde_json::from_str(
            r##"{"a": {"first": "{a.gone}"}}"##,
        )
        .unwrap();
        let mut diagnostics = Vec::new();
        let resolved = resolve_reference("{a.first}", &tree, &mut diagnostics);
        assert_eq!(resolved, TokenLeaf::text("{a.gone}"));
        assert_eq!(
            diagnostics,
            vec![Diagnostic::PathNotFound {
                reference: "{a.gone}".to_string()
            }]
        );
    }

    #[test]
    fn reference_cycle_is_detected_not_recursed() {
        let tree: TokenTree = serde_json::from_str(
            r##"{"a": {"first": "{a.second}", "second": "{a.first}"}}"##,
        )
        .unwrap();
        let mut diagnostics = Vec::new();
        let resolved = resolve_reference("{a.first}", &tree, &mut diagnostics);
        // The chase stops when a.first comes around again.
        assert_eq!(resolved, TokenLeaf::text("{a.first}"));
        assert_eq!(diagnostics.len(), 1);
        match &diagnostics[0] {
            Diagnostic::CycleDetected { reference, path } => {
                assert_eq!(reference, "{a.first}");
                assert_eq!(
                    path,
                    &vec![
                        TokenPath::new("a.first"),
                        TokenPath::new("a.second"),
                        TokenPath::new("a.first"),
                    ]
                );
            }
            other => panic!("expected CycleDetected, got {:?}", other),
        }
    }

    #[test]
    fn self_referential_token_is_a_cycle() {
        let tree: TokenTree = serde_json::from_str(r##"{"a": {"loop": "{a.loop}"}}"##).unwrap();
        let mut diagnostics = Vec::new();
        let resolved = resolve_reference("{a.loop}", &tree, &mut diagnostics);
        assert_eq!(resolved, TokenLeaf::text("{a.loop}"));
        assert!(matches!(diagnostics[0], Diagnostic::CycleDetected { .. }));
    }

    #[test]
    fn group_target_resolves_through_default_member() {
        let tree = sample_tree();
        let mut diagnostics = Vec::new();
        // text.brand is a group; its default member aliases brand.50.
        let resolved =
            resolve_reference("{color.semantic.light.text.brand}", &tree, &mut diagnostics);
        assert_eq!(resolved, TokenLeaf::text("#297BFF"));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn group_target_without_default_yields_empty_fallback() {
        let tree = sample_tree();
        let mut diagnostics = Vec::new();
        let resolved = resolve_reference("{color.foundation.brand}", &tree, &mut diagnostics);
        assert_eq!(resolved, TokenLeaf::text(""));
        assert_eq!(
            diagnostics,
            vec![Diagnostic::MissingDefault {
                reference: "{color.foundation.brand}".to_string()
            }]
        );
    }

    #[test]
    fn resolution_is_idempotent() {
        let tree = sample_tree();
        let mut diagnostics = Vec::new();
        let once = resolve_reference("{color.foundation.neutral.100}", &tree, &mut diagnostics);
        let twice = resolve_reference(&format!("{}", once), &tree, &mut diagnostics);
        assert_eq!(once, twice);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn resolve_node_preserves_structure() {
        let tree = sample_tree();
        let node: TokenNode = serde_json::from_str(
            r##"{
                "simple": "{color.foundation.neutral.100}",
                "nested": {"deep": "{color.foundation.brand.50}"},
                "list": ["{color.foundation.brand.40}", "#FFFFFF"],
                "count": 3
            }"##,
        )
        .unwrap();
        let mut diagnostics = Vec::new();
        let resolved = resolve_node(&node, &tree, &mut diagnostics);

        let expected: TokenNode = serde_json::from_str(
            r##"{
                "simple": "#0D0E0E",
                "nested": {"deep": "#297BFF"},
                "list": ["#5194FF", "#FFFFFF"],
                "count": 3
            }"##,
        )
        .unwrap();
        assert_eq!(resolved, expected);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn deep_merge_recurses_into_groups() {
        let base: TokenGroup = serde_json::from_str(
            r##"{"brand": {"40": "#5194FF", "50": "#297BFF"}, "neutral": {"100": "#0D0E0E"}}"##,
        )
        .unwrap();
        let patch: TokenGroup = serde_json::from_str(r##"{"brand": {"50": "#FF0000"}}"##).unwrap();

        let merged = deep_merge(&base, &patch);
        let expected: TokenGroup = serde_json::from_str(
            r##"{"brand": {"40": "#5194FF", "50": "#FF0000"}, "neutral": {"100": "#0D0E0E"}}"##,
        )
        .unwrap();
        assert_eq!(merged, expected);
        // Inputs are untouched.
        assert_eq!(
            base.get("brand").unwrap().get_path(&["50"]),
            Some(&TokenNode::leaf("#297BFF"))
        );
    }

    #[test]
    fn deep_merge_replaces_on_kind_mismatch_and_adds_new_keys() {
        let base: TokenGroup =
            serde_json::from_str(r##"{"a": {"x": 1}, "b": "scalar", "seq": [1, 2]}"##).unwrap();
        let patch: TokenGroup =
            serde_json::from_str(r##"{"a": "now-a-scalar", "b": {"y": 2}, "seq": [3], "c": 9}"##)
                .unwrap();

        let merged = deep_merge(&base, &patch);
        let expected: TokenGroup = serde_json::from_str(
            r##"{"a": "now-a-scalar", "b": {"y": 2}, "seq": [3], "c": 9}"##,
        )
        .unwrap();
        assert_eq!(merged, expected);
    }

    #[test]
    fn customize_without_overrides_is_identity() {
        let tree = sample_tree();
        assert_eq!(customize_tree(&tree, None), tree);
        let empty = FoundationOverrides::new();
        assert_eq!(customize_tree(&tree, Some(&empty)), tree);
    }

    #[test]
    fn customize_patches_only_named_shades() {
        let tree = sample_tree();
        let overrides = FoundationOverrides::new().set("brand", "50", "#FF0000");
        let customized = customize_tree(&tree, Some(&overrides));

        let patched = customized
            .lookup(&TokenPath::new("color.foundation.brand.50"))
            .unwrap();
        assert_eq!(patched, &TokenNode::leaf("#FF0000"));

        // Sibling shades, sibling palettes, and non-foundation regions are
        // value-equal to the base.
        assert_eq!(
            customized.lookup(&TokenPath::new("color.foundation.brand.40")),
            tree.lookup(&TokenPath::new("color.foundation.brand.40"))
        );
        assert_eq!(
            customized.region(&["color", "semantic"]),
            tree.region(&["color", "semantic"])
        );
        assert_eq!(customized.root().get("spacing"), tree.root().get("spacing"));

        // The shared base tree itself is untouched.
        assert_eq!(
            tree.lookup(&TokenPath::new("color.foundation.brand.50")),
            Some(&TokenNode::leaf("#297BFF"))
        );
    }

    #[test]
    fn build_variant_projects_the_declared_shape() {
        let tree = sample_tree();
        let theme = build_variant(&tree, &VariantName::new("light")).unwrap();

        assert_eq!(theme.get("color.text.default"), Some(&TokenLeaf::text("#0D0E0E")));
        assert_eq!(theme.get("color.text.brand.default"), Some(&TokenLeaf::text("#297BFF")));
        assert_eq!(theme.get("color.line.default"), Some(&TokenLeaf::text("#7F8897")));
        assert_eq!(theme.get("spacing.medium"), Some(&TokenLeaf::Number(16.0)));
        assert_eq!(theme.get("radius.full"), Some(&TokenLeaf::Number(9999.0)));
        assert_eq!(theme.get("breakpoint.mobile"), Some(&TokenLeaf::Number(768.0)));
        // Nothing outside the declared shape leaks in.
        assert!(theme.tokens.get("typography").is_none());
    }

    #[test]
    fn build_variant_rejects_unknown_variant() {
        let tree = sample_tree();
        let result = build_variant(&tree, &VariantName::new("sepia"));
        assert!(matches!(result, Err(ThemeError::UnknownVariant { .. })));
    }

    #[test]
    fn build_all_variants_covers_every_declared_variant() {
        let tree = sample_tree();
        let themes = build_all_variants(&tree);
        assert_eq!(themes.len(), 2);
        assert!(themes.contains_key(&VariantName::new("light")));
        assert!(themes.contains_key(&VariantName::new("dark")));
    }

    #[test]
    fn variants_built_from_one_customized_tree_agree_on_overrides() {
        let tree = sample_tree();
        let overrides = FoundationOverrides::new().set("brand", "50", "#FF0000");
        let customized = customize_tree(&tree, Some(&overrides));
        let themes = build_all_variants(&customized);

        // Both variants reference brand.50 from their brand group.
        assert_eq!(
            themes[&VariantName::new("light")].get("color.text.brand.default"),
            Some(&TokenLeaf::text("#FF0000"))
        );
        assert_eq!(
            themes[&VariantName::new("dark")].get("color.text.brand.default"),
            Some(&TokenLeaf::text("#FF0000"))
        );
    }
}
