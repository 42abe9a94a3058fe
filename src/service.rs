//! Theme state propagation for consumers.
//!
//! [`ThemeService`] is a thin stateful layer over the core: it holds the
//! caller's [`ThemeSettings`], rebuilds the variant set through the crate's
//! public functions whenever the foundation overrides change, and exposes
//! the currently selected variant. Every rebuild goes through a memo cache
//! keyed by the override patch, since a rebuild performs a full clone of the
//! canonical tree plus a full resolution. Theme changes are broadcast as
//! [`ThemeChangedEvent`]s.
//!
//! All methods are synchronous; the broadcast channel is only awaited on the
//! receiving side, if the consumer chooses to.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;
use tracing::debug;

use crate::errors::ThemeError;
use crate::events::ThemeChangedEvent;
use crate::types::{
    FoundationOverrides, ResolvedTheme, TokenGroup, TokenLeaf, TokenNode, ThemeSettings,
    VariantName,
};

const EVENT_CHANNEL_CAPACITY: usize = 16;

// Hashing for the override patch, used as the memo-cache key. f64 leaves
// hash by bit representation so equal patches always collide.
fn hash_overrides(overrides: &Option<FoundationOverrides>) -> u64 {
    let mut hasher = DefaultHasher::new();
    match overrides {
        Some(patch) => {
            1u8.hash(&mut hasher);
            hash_group(&patch.to_group(), &mut hasher);
        }
        // Distinguish None from Some(empty patch).
        None => 0u8.hash(&mut hasher),
    }
    hasher.finish()
}

fn hash_group(group: &TokenGroup, hasher: &mut DefaultHasher) {
    for (key, node) in group {
        key.hash(hasher);
        hash_node(node, hasher);
    }
}

fn hash_node(node: &TokenNode, hasher: &mut DefaultHasher) {
    match node {
        TokenNode::Leaf(TokenLeaf::Text(text)) => {
            0u8.hash(hasher);
            text.hash(hasher);
        }
        TokenNode::Leaf(TokenLeaf::Number(number)) => {
            1u8.hash(hasher);
            number.to_bits().hash(hasher);
        }
        TokenNode::Sequence(items) => {
            2u8.hash(hasher);
            for item in items {
                hash_node(item, hasher);
            }
        }
        TokenNode::Group(group) => {
            3u8.hash(hasher);
            hash_group(group, hasher);
        }
    }
}

struct ThemeServiceInternalState {
    settings: ThemeSettings,
    themes: BTreeMap<VariantName, ResolvedTheme>,
    /// Variant sets previously built for an override patch, keyed by the
    /// patch hash. Entries belong to exactly one customized tree; a new
    /// patch gets a new entry, never a shared one.
    resolved_cache: HashMap<u64, BTreeMap<VariantName, ResolvedTheme>>,
}

/// Holds the active theme selection and propagates changes to subscribers.
#[derive(Clone)]
pub struct ThemeService {
    internal_state: Arc<Mutex<ThemeServiceInternalState>>,
    event_sender: broadcast::Sender<ThemeChangedEvent>,
}

impl ThemeService {
    /// Creates a service from initial settings, building all variants once.
    ///
    /// Fails only if the selected variant is not declared by the token
    /// source.
    pub fn new(settings: ThemeSettings) -> Result<Self, ThemeError> {
        let (event_sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let mut cache = HashMap::new();
        let themes = Self::themes_for(&settings.foundation_overrides, &mut cache);
        if !themes.contains_key(&settings.variant) {
            return Err(ThemeError::UnknownVariant {
                variant: settings.variant,
            });
        }

        Ok(Self {
            internal_state: Arc::new(Mutex::new(ThemeServiceInternalState {
                settings,
                themes,
                resolved_cache: cache,
            })),
            event_sender,
        })
    }

    fn themes_for(
        overrides: &Option<FoundationOverrides>,
        cache: &mut HashMap<u64, BTreeMap<VariantName, ResolvedTheme>>,
    ) -> BTreeMap<VariantName, ResolvedTheme> {
        let key = hash_overrides(overrides);
        if let Some(cached) = cache.get(&key) {
            debug!("theme cache hit for override patch {:#x}", key);
            return cached.clone();
        }
        let themes = crate::create_custom_themes(overrides.as_ref());
        cache.insert(key, themes.clone());
        themes
    }

    fn lock(&self) -> MutexGuard<'_, ThemeServiceInternalState> {
        // Recover the state on poisoning; the state is rebuilt wholesale on
        // every settings change, so it cannot be left half-written.
        self.internal_state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The resolved theme for the currently selected variant.
    pub fn current_theme(&self) -> ResolvedTheme {
        let state = self.lock();
        state.themes[&state.settings.variant].clone()
    }

    /// The currently selected variant name.
    pub fn variant(&self) -> VariantName {
        self.lock().settings.variant.clone()
    }

    /// A copy of the active settings.
    pub fn settings(&self) -> ThemeSettings {
        self.lock().settings.clone()
    }

    /// The variants available to select, in name order.
    pub fn available_variants(&self) -> Vec<VariantName> {
        self.lock().themes.keys().cloned().collect()
    }

    /// Selects a variant by name, broadcasting the change.
    pub fn set_variant(&self, variant: VariantName) -> Result<(), ThemeError> {
        let new_theme = {
            let mut state = self.lock();
            if !state.themes.contains_key(&variant) {
                return Err(ThemeError::UnknownVariant { variant });
            }
            if state.settings.variant == variant {
                return Ok(());
            }
            state.settings.variant = variant;
            state.themes[&state.settings.variant].clone()
        };
        self.emit(new_theme);
        Ok(())
    }

    /// Switches to the next declared variant, wrapping around; with the two
    /// canonical variants this alternates light and dark. Returns the newly
    /// selected name.
    pub fn toggle_variant(&self) -> VariantName {
        let (next, new_theme) = {
            let mut state = self.lock();
            let names: Vec<VariantName> = state.themes.keys().cloned().collect();
            let position = names
                .iter()
                .position(|name| *name == state.settings.variant)
                .unwrap_or(0);
            let next = names[(position + 1) % names.len()].clone();
            state.settings.variant = next.clone();
            (next, state.themes[&state.settings.variant].clone())
        };
        self.emit(new_theme);
        next
    }

    /// Replaces the foundation override patch and rebuilds the variant set,
    /// broadcasting the change. A patch equal to the active one is a no-op.
    pub fn set_overrides(&self, overrides: Option<FoundationOverrides>) {
        let new_theme = {
            let mut state = self.lock();
            if state.settings.foundation_overrides == overrides {
                return;
            }
            let mut cache = std::mem::take(&mut state.resolved_cache);
            state.themes = Self::themes_for(&overrides, &mut cache);
            state.resolved_cache = cache;
            state.settings.foundation_overrides = overrides;
            state.themes[&state.settings.variant].clone()
        };
        self.emit(new_theme);
    }

    /// Subscribes to theme change events.
    pub fn subscribe(&self) -> broadcast::Receiver<ThemeChangedEvent> {
        self.event_sender.subscribe()
    }

    fn emit(&self, new_theme: ResolvedTheme) {
        // Send fails only when nobody is subscribed, which is fine.
        let _ = self.event_sender.send(ThemeChangedEvent::new(new_theme));
    }
}
