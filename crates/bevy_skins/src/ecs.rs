use bevy_ecs::prelude::*;

use crate::style_id::StyleId;

/// Marker for entities rendered by a skinnable renderer.
///
/// Style operations on entities without it fail with
/// [`crate::StyleError::IncompatibleRenderer`] unless the renderer hooks can
/// reinstall it.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SkinnableUi;

/// Declarative style id assignment.
///
/// Inserting or changing this component assigns the id through the style
/// engine on the next `PreUpdate`; removing it resets the entity to its type
/// default.
#[derive(Component, Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleIdProperty(pub StyleId);

impl StyleIdProperty {
    #[must_use]
    pub fn new(style_id: impl Into<StyleId>) -> Self {
        Self(style_id.into())
    }
}
