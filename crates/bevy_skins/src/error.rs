use bevy_ecs::entity::Entity;

/// Errors surfaced by style and skin operations.
///
/// Every failure is local to the call that produced it. Nothing is retried and
/// nothing is rolled back: a skin that failed to install after the previous one
/// was removed leaves the entity unskinned until a skin is applied again.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StyleError {
    /// The entity behind a style record no longer exists.
    #[error("component {entity:?} has been destroyed")]
    ComponentDestroyed { entity: Entity },

    /// The entity is alive but is not driven by a skinnable renderer, even after
    /// one re-resolution attempt.
    #[error("component {entity:?} does not use a skinnable renderer")]
    IncompatibleRenderer { entity: Entity },

    /// Reserved for compatibility layers. The engine normalizes malformed ids
    /// to the type default instead of producing this.
    #[error("invalid style identifier `{id}`")]
    InvalidStyleIdentifier { id: String },

    /// A skin failed to install, uninstall or refresh on an entity.
    #[error("skin `{skin}` failed on {entity:?}: {reason}")]
    SkinInstall {
        skin: String,
        entity: Entity,
        reason: String,
    },

    /// A skin definition document could not be parsed.
    #[error("invalid skin definition: {0}")]
    SkinDefinition(String),

    /// No registered skin carries the requested id.
    #[error("no skin registered with id `{0}`")]
    UnknownSkin(String),
}

impl StyleError {
    pub fn destroyed(entity: Entity) -> Self {
        Self::ComponentDestroyed { entity }
    }

    pub fn skin_install(skin: impl Into<String>, entity: Entity, reason: impl Into<String>) -> Self {
        Self::SkinInstall {
            skin: skin.into(),
            entity,
            reason: reason.into(),
        }
    }

    /// Whether this error reports a destroyed component.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        matches!(self, Self::ComponentDestroyed { .. })
    }
}

/// Result alias used across the crate.
pub type StyleResult<T> = Result<T, StyleError>;
