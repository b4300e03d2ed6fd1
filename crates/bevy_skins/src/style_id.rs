use std::{borrow::Cow, fmt};

use bevy_ecs::entity::Entity;

/// Style identity assigned to a UI entity.
///
/// An identifier carries an optional id string and an optional style parent.
/// The parent establishes a style-inheritance edge: the entity becomes a style
/// child of that parent and follows its skin. This edge is independent from the
/// `ChildOf` containment hierarchy.
///
/// An identifier without an id string ([`StyleId::auto`]) resolves to the
/// default id registered for the entity's control type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct StyleId {
    id: Option<Cow<'static, str>>,
    parent: Option<Entity>,
}

impl StyleId {
    /// Fallback id for entities without a registered control default.
    pub const FALLBACK: StyleId = StyleId::of_static("component");
    pub const PANEL: StyleId = StyleId::of_static("panel");
    pub const DATE_FIELD: StyleId = StyleId::of_static("datefield");
    pub const COLOR_CHOOSER: StyleId = StyleId::of_static("colorchooser");

    /// Identifier that resolves to the type default.
    #[must_use]
    pub const fn auto() -> Self {
        Self {
            id: None,
            parent: None,
        }
    }

    #[must_use]
    pub const fn of_static(id: &'static str) -> Self {
        Self {
            id: Some(Cow::Borrowed(id)),
            parent: None,
        }
    }

    #[must_use]
    pub fn new(id: impl Into<Cow<'static, str>>) -> Self {
        Self {
            id: Some(id.into()),
            parent: None,
        }
    }

    /// Identifier linked to a style parent.
    #[must_use]
    pub fn with_parent(id: impl Into<Cow<'static, str>>, parent: Entity) -> Self {
        Self {
            id: Some(id.into()),
            parent: Some(parent),
        }
    }

    /// Same id, linked to `parent`.
    #[must_use]
    pub fn under(mut self, parent: Entity) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Same id with the style parent removed.
    #[must_use]
    pub fn detached(mut self) -> Self {
        self.parent = None;
        self
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    #[must_use]
    pub fn parent(&self) -> Option<Entity> {
        self.parent
    }

    /// `true` when the identifier has no id string and resolves to a default.
    #[must_use]
    pub fn is_auto(&self) -> bool {
        self.id.as_deref().is_none_or(str::is_empty)
    }
}

impl fmt::Display for StyleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.id(), self.parent) {
            (Some(id), Some(parent)) => write!(f, "{id} (parent {parent:?})"),
            (Some(id), None) => f.write_str(id),
            (None, _) => f.write_str("<auto>"),
        }
    }
}

impl From<&'static str> for StyleId {
    fn from(id: &'static str) -> Self {
        Self::of_static(id)
    }
}

impl From<String> for StyleId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}
