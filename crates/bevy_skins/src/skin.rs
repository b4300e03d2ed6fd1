use std::{fmt, sync::Arc};

use bevy_ecs::{entity::Entity, world::World};

use crate::error::StyleResult;

/// Pluggable visual renderer for UI entities.
///
/// A skin installs whatever per-entity visual state it needs in [`Skin::apply`],
/// tears it down in [`Skin::remove`] and refreshes it in place in
/// [`Skin::update`], for example after the entity's style id changed.
///
/// Skins are compared by reference identity through [`SkinHandle`], never by value.
pub trait Skin: Send + Sync + 'static {
    /// Stable identifier used for registration and diagnostics.
    fn id(&self) -> &str;

    fn apply(&self, world: &mut World, entity: Entity) -> StyleResult<()>;

    fn remove(&self, world: &mut World, entity: Entity) -> StyleResult<()>;

    fn update(&self, world: &mut World, entity: Entity) -> StyleResult<()>;
}

/// Shared handle to a [`Skin`].
///
/// Two handles are equal only when they point at the same skin instance.
#[derive(Clone)]
pub struct SkinHandle(Arc<dyn Skin>);

impl SkinHandle {
    #[must_use]
    pub fn new<S: Skin>(skin: S) -> Self {
        Self(Arc::new(skin))
    }

    #[must_use]
    pub fn from_arc(skin: Arc<dyn Skin>) -> Self {
        Self(skin)
    }

    #[must_use]
    pub fn id(&self) -> &str {
        self.0.id()
    }

    pub fn apply(&self, world: &mut World, entity: Entity) -> StyleResult<()> {
        self.0.apply(world, entity)
    }

    pub fn remove(&self, world: &mut World, entity: Entity) -> StyleResult<()> {
        self.0.remove(world, entity)
    }

    pub fn update(&self, world: &mut World, entity: Entity) -> StyleResult<()> {
        self.0.update(world, entity)
    }
}

impl PartialEq for SkinHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for SkinHandle {}

impl fmt::Debug for SkinHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SkinHandle").field(&self.id()).finish()
    }
}

impl<S: Skin> From<S> for SkinHandle {
    fn from(skin: S) -> Self {
        Self::new(skin)
    }
}
