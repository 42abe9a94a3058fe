//! Defines the core data structures of the Sintra theming system.
//!
//! This module contains the token tree model (an immutable, arbitrarily nested
//! mapping of keys to leaf values or subtrees), the dotted-path type used to
//! address tokens inside a tree, the foundation override patch supplied by
//! callers, and the resolved theme produced by the builder.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Region of the tree holding the foundation palettes.
pub const FOUNDATION_REGION: &[&str] = &["color", "foundation"];
/// Region of the tree holding the per-variant semantic groups.
pub const SEMANTIC_REGION: &[&str] = &["color", "semantic"];

// --- TokenLeaf ---
/// A concrete token value: an opaque string or a number.
///
/// Leaves are never interpreted by the core beyond the reference-form check
/// on strings; whether `"#297BFF"` is a well-formed color is the consumer's
/// concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenLeaf {
    /// A string value, possibly a reference of the form `{a.b.c}`.
    Text(String),
    /// A unitless number (spacing steps, radii, breakpoints, line heights).
    Number(f64),
}

impl TokenLeaf {
    pub fn text(s: impl Into<String>) -> Self {
        TokenLeaf::Text(s.into())
    }

    /// Returns the string content if this leaf is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            TokenLeaf::Text(s) => Some(s),
            TokenLeaf::Number(_) => None,
        }
    }

    /// Returns the numeric content if this leaf is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            TokenLeaf::Number(n) => Some(*n),
            TokenLeaf::Text(_) => None,
        }
    }
}

impl fmt::Display for TokenLeaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenLeaf::Text(s) => write!(f, "{}", s),
            // Integral numbers print without a trailing ".0" so stylesheet
            // output matches the source document.
            TokenLeaf::Number(n) if n.fract() == 0.0 => write!(f, "{}", *n as i64),
            TokenLeaf::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for TokenLeaf {
    fn from(s: &str) -> Self {
        TokenLeaf::Text(s.to_string())
    }
}

impl From<String> for TokenLeaf {
    fn from(s: String) -> Self {
        TokenLeaf::Text(s)
    }
}

impl From<f64> for TokenLeaf {
    fn from(n: f64) -> Self {
        TokenLeaf::Number(n)
    }
}

// --- TokenNode / TokenGroup ---
/// A named mapping of keys to child nodes. `BTreeMap` keeps iteration order
/// deterministic, which in turn keeps generator output and test assertions
/// stable.
pub type TokenGroup = BTreeMap<String, TokenNode>;

/// One node of a token tree.
///
/// Traversal and merge logic dispatch on this tag rather than on runtime
/// type inspection. The serde representation is untagged so a token source
/// document reads naturally: JSON strings and numbers become leaves, arrays
/// become sequences, objects become groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenNode {
    /// A concrete or reference leaf value.
    Leaf(TokenLeaf),
    /// An ordered list of nodes, resolved element-wise.
    Sequence(Vec<TokenNode>),
    /// A nested group of named nodes.
    Group(TokenGroup),
}

impl TokenNode {
    pub fn leaf(value: impl Into<TokenLeaf>) -> Self {
        TokenNode::Leaf(value.into())
    }

    pub fn group(entries: TokenGroup) -> Self {
        TokenNode::Group(entries)
    }

    pub fn as_leaf(&self) -> Option<&TokenLeaf> {
        match self {
            TokenNode::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&TokenGroup> {
        match self {
            TokenNode::Group(group) => Some(group),
            _ => None,
        }
    }

    /// Walks `segments` down from this node, returning the addressed child.
    pub fn get_path(&self, segments: &[&str]) -> Option<&TokenNode> {
        let mut current = self;
        for segment in segments {
            current = current.as_group()?.get(*segment)?;
        }
        Some(current)
    }
}

// --- TokenPath ---
/// A dot-separated path addressing a node inside a [`TokenTree`]
/// (e.g. `color.foundation.brand.50`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenPath {
    segments: Vec<String>,
}

impl TokenPath {
    pub fn new(path: impl AsRef<str>) -> Self {
        let segments = path.as_ref().split('.').map(str::to_string).collect();
        TokenPath { segments }
    }

    /// Parses a reference string of the exact form `{a.b.c}`.
    ///
    /// Anything not wrapped in a single pair of braces — including strings
    /// with an unmatched brace — is not a reference and yields `None`.
    pub fn from_reference(raw: &str) -> Option<Self> {
        let interior = raw.strip_prefix('{')?.strip_suffix('}')?;
        Some(TokenPath::new(interior))
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Renders the path back into reference form, `{a.b.c}`.
    pub fn to_reference(&self) -> String {
        format!("{{{}}}", self)
    }
}

impl fmt::Display for TokenPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl From<&str> for TokenPath {
    fn from(path: &str) -> Self {
        TokenPath::new(path)
    }
}

// --- TokenTree ---
/// An immutable tree of design tokens.
///
/// All operations that "modify" a tree return a freshly built one; the
/// canonical default tree is shared process-wide and must never be mutated
/// in place (see [`crate::tokens::canonical_tree`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenTree {
    root: TokenGroup,
}

impl TokenTree {
    pub fn new(root: TokenGroup) -> Self {
        TokenTree { root }
    }

    pub fn root(&self) -> &TokenGroup {
        &self.root
    }

    /// Looks up the node addressed by `path`, walking one segment at a time.
    pub fn lookup(&self, path: &TokenPath) -> Option<&TokenNode> {
        let mut current: Option<&TokenNode> = None;
        for segment in path.segments() {
            current = match current {
                None => self.root.get(segment),
                Some(node) => node.as_group()?.get(segment),
            };
            current?;
        }
        current
    }

    /// Returns the group at `segments`, if present and a group.
    pub fn region(&self, segments: &[&str]) -> Option<&TokenGroup> {
        let (first, rest) = segments.split_first()?;
        self.root.get(*first)?.get_path(rest)?.as_group()
    }

    /// The names of the variants declared in the semantic region, in order.
    pub fn variant_names(&self) -> Vec<VariantName> {
        self.region(SEMANTIC_REGION)
            .map(|semantic| semantic.keys().map(|k| VariantName::new(k.clone())).collect())
            .unwrap_or_default()
    }
}

// --- VariantName ---
/// The name of a theme variant (e.g. "light", "dark").
///
/// Variant names must consist of ASCII alphanumeric characters or hyphens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VariantName(String);

impl VariantName {
    /// Creates a new `VariantName`.
    /// Panics in debug mode if the name is empty or contains invalid characters.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        debug_assert!(
            !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'),
            "VariantName: '{}' contains invalid characters or is empty",
            name
        );
        Self(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VariantName {
    fn from(name: &str) -> Self {
        VariantName::new(name)
    }
}

impl fmt::Display for VariantName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// --- FoundationOverrides ---
/// A partial foundation palette patch: palette name to partial shade map.
///
/// Only the shades named here change; every sibling shade and every other
/// palette keeps its base value. Shade keys are plain strings ("50",
/// "base0"), matching the source document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FoundationOverrides {
    palettes: BTreeMap<String, BTreeMap<String, TokenLeaf>>,
}

impl FoundationOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets one shade of one palette, creating the palette entry on demand.
    pub fn set(
        mut self,
        palette: impl Into<String>,
        shade: impl Into<String>,
        value: impl Into<TokenLeaf>,
    ) -> Self {
        self.palettes
            .entry(palette.into())
            .or_default()
            .insert(shade.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.palettes.values().all(|shades| shades.is_empty())
    }

    /// Converts the patch into tree form for merging.
    pub fn to_group(&self) -> TokenGroup {
        self.palettes
            .iter()
            .map(|(palette, shades)| {
                let shade_group = shades
                    .iter()
                    .map(|(shade, value)| (shade.clone(), TokenNode::Leaf(value.clone())))
                    .collect();
                (palette.clone(), TokenNode::Group(shade_group))
            })
            .collect()
    }
}

// --- ResolvedTheme ---
/// A fully resolved theme variant, ready for consumers.
///
/// The token group is structurally identical to the declared output shape;
/// every leaf is concrete (no remaining references).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTheme {
    /// The variant this theme was built for.
    pub variant: VariantName,
    /// The resolved output tree.
    pub tokens: TokenGroup,
}

impl ResolvedTheme {
    /// Convenience lookup into the resolved output, e.g.
    /// `theme.get("color.text.default")`.
    pub fn get(&self, path: impl AsRef<str>) -> Option<&TokenLeaf> {
        let path = TokenPath::new(path);
        let segments: Vec<&str> = path.segments().iter().map(String::as_str).collect();
        let (first, rest) = segments.split_first()?;
        self.tokens.get(*first)?.get_path(rest)?.as_leaf()
    }
}

// --- ThemeSettings ---
/// Consumer-facing theme preferences: the selected variant and an optional
/// foundation override patch applied before resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeSettings {
    /// The variant to expose (e.g. "light" or "dark").
    pub variant: VariantName,
    /// Foundation shades to patch before themes are built.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foundation_overrides: Option<FoundationOverrides>,
}

impl Default for ThemeSettings {
    fn default() -> Self {
        Self {
            variant: VariantName::new("light"),
            foundation_overrides: None,
        }
    }
}
