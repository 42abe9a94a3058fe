use serde::{Deserialize, Serialize};

use crate::types::ResolvedTheme;

/// Broadcast whenever the theme exposed by [`crate::service::ThemeService`]
/// changes, carrying the newly active resolved theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeChangedEvent {
    pub new_theme: ResolvedTheme,
}

impl ThemeChangedEvent {
    pub fn new(new_theme: ResolvedTheme) -> Self {
        Self { new_theme }
    }
}
