use std::{
    any::{TypeId, type_name},
    collections::HashMap,
    fmt,
    sync::Arc,
};

use bevy_ecs::prelude::*;
use tracing::{debug, info, warn};

use crate::{
    ecs::SkinnableUi,
    error::{StyleError, StyleResult},
    events::{ListenerId, StyleListener},
    record::{CustomPainter, StyleRecord, StyleRecordMut},
    skin::SkinHandle,
    style_id::StyleId,
};

/// Global skin and the registry of named skins.
#[derive(Resource, Default, Debug)]
pub struct StyleManager {
    global_skin: Option<SkinHandle>,
    skins: Vec<SkinHandle>,
}

impl StyleManager {
    #[must_use]
    pub fn global_skin(&self) -> Option<&SkinHandle> {
        self.global_skin.as_ref()
    }

    pub(crate) fn replace_global_skin(&mut self, skin: SkinHandle) -> Option<SkinHandle> {
        self.global_skin.replace(skin)
    }

    /// Register `skin` under its id. A later registration with the same id wins;
    /// the replaced skin is returned.
    pub fn register_skin(&mut self, skin: SkinHandle) -> Option<SkinHandle> {
        let replaced = self
            .skins
            .iter()
            .position(|registered| registered.id() == skin.id())
            .map(|index| self.skins.remove(index));
        self.skins.push(skin);
        replaced
    }

    #[must_use]
    pub fn skin(&self, id: &str) -> Option<&SkinHandle> {
        self.skins.iter().find(|skin| skin.id() == id)
    }

    pub fn skins(&self) -> impl Iterator<Item = &SkinHandle> {
        self.skins.iter()
    }
}

/// Renderer compatibility checks consulted before every style operation.
///
/// The default treats entities carrying [`SkinnableUi`] as compatible and
/// re-installs that marker on entities of a registered control type.
#[derive(Resource, Clone, Copy)]
pub struct RendererHooks {
    pub is_compatible: fn(&World, Entity) -> bool,
    pub reinstall: fn(&mut World, Entity),
}

impl Default for RendererHooks {
    fn default() -> Self {
        Self {
            is_compatible: uses_skinnable_ui,
            reinstall: reinstall_registered_control,
        }
    }
}

impl fmt::Debug for RendererHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererHooks").finish_non_exhaustive()
    }
}

fn uses_skinnable_ui(world: &World, entity: Entity) -> bool {
    world.get::<SkinnableUi>(entity).is_some()
}

fn reinstall_registered_control(world: &mut World, entity: Entity) {
    let registered = world
        .get_resource::<DefaultStyleIds>()
        .is_some_and(|defaults| defaults.resolve(world, entity).is_some());

    if registered && let Ok(mut entity_mut) = world.get_entity_mut(entity) {
        debug!(?entity, "reinstalling skinnable renderer");
        entity_mut.insert(SkinnableUi);
    }
}

struct DefaultStyleEntry {
    type_id: TypeId,
    type_name: &'static str,
    matches: fn(&World, Entity) -> bool,
    style_id: StyleId,
}

/// Default style id per control component type.
///
/// When an entity carries several registered control components, the most
/// recently registered type wins.
#[derive(Resource, Default)]
pub struct DefaultStyleIds {
    entries: Vec<DefaultStyleEntry>,
}

impl DefaultStyleIds {
    /// Register the default id for entities carrying `T`. Registering the same
    /// type again replaces its entry and gives it precedence.
    pub fn register<T: Component>(&mut self, style_id: StyleId) -> &mut Self {
        let type_id = TypeId::of::<T>();
        self.entries.retain(|entry| entry.type_id != type_id);
        self.entries.push(DefaultStyleEntry {
            type_id,
            type_name: type_name::<T>(),
            matches: has_component::<T>,
            style_id: style_id.detached(),
        });
        self
    }

    #[must_use]
    pub fn resolve(&self, world: &World, entity: Entity) -> Option<&StyleId> {
        self.entries
            .iter()
            .rev()
            .find(|entry| (entry.matches)(world, entity))
            .map(|entry| &entry.style_id)
    }

    #[must_use]
    pub fn is_registered<T: Component>(&self) -> bool {
        let type_id = TypeId::of::<T>();
        self.entries.iter().any(|entry| entry.type_id == type_id)
    }
}

impl fmt::Debug for DefaultStyleIds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.entries
                    .iter()
                    .map(|entry| (entry.type_name, entry.style_id.to_string())),
            )
            .finish()
    }
}

fn has_component<T: Component>(world: &World, entity: Entity) -> bool {
    world.get::<T>(entity).is_some()
}

/// Default style id for `entity`, falling back to [`StyleId::FALLBACK`].
#[must_use]
pub fn default_style_id(world: &World, entity: Entity) -> StyleId {
    world
        .get_resource::<DefaultStyleIds>()
        .and_then(|defaults| defaults.resolve(world, entity))
        .cloned()
        .unwrap_or(StyleId::FALLBACK)
}

/// Style operations addressed by entity.
pub trait StyleWorldExt {
    fn style_record(&mut self, entity: Entity) -> StyleRecordMut<'_>;

    fn style_id(&mut self, entity: Entity) -> StyleResult<StyleId>;

    fn set_style_id(&mut self, entity: Entity, id: impl Into<StyleId>) -> StyleResult<StyleId>;

    fn reset_style_id(&mut self, entity: Entity, recursive: bool) -> StyleResult<StyleId>;

    fn complete_style_id(&mut self, entity: Entity) -> StyleResult<String>;

    fn skin(&mut self, entity: Entity) -> StyleResult<Option<SkinHandle>>;

    fn apply_skin(
        &mut self,
        entity: Entity,
        skin: SkinHandle,
        children: bool,
    ) -> StyleResult<Option<SkinHandle>>;

    /// Apply `skin` as a custom skin: it is pinned and, with `recursive`, also
    /// applied across the containment subtree.
    fn set_skin(
        &mut self,
        entity: Entity,
        skin: SkinHandle,
        recursive: bool,
    ) -> StyleResult<Option<SkinHandle>>;

    fn update_skin(&mut self, entity: Entity, children: bool) -> StyleResult<()>;

    fn reset_skin(&mut self, entity: Entity) -> StyleResult<Option<SkinHandle>>;

    fn remove_skin(&mut self, entity: Entity) -> StyleResult<Option<SkinHandle>>;

    fn is_skin_pinned(&mut self, entity: Entity) -> StyleResult<bool>;

    fn pin_skin(&mut self, entity: Entity, pinned: bool) -> StyleResult<()>;

    fn add_style_listener(
        &mut self,
        entity: Entity,
        listener: Arc<dyn StyleListener>,
    ) -> StyleResult<ListenerId>;

    fn remove_style_listener(&mut self, entity: Entity, id: ListenerId) -> StyleResult<bool>;

    fn custom_painter(&mut self, entity: Entity, name: &str) -> StyleResult<Option<CustomPainter>>;

    fn custom_painters(&mut self, entity: Entity) -> StyleResult<HashMap<String, CustomPainter>>;

    fn set_custom_painter(
        &mut self,
        entity: Entity,
        name: impl Into<String>,
        painter: CustomPainter,
    ) -> StyleResult<Option<CustomPainter>>;

    fn reset_custom_painters(&mut self, entity: Entity) -> StyleResult<bool>;

    /// Global skin, if one was set.
    fn global_skin(&self) -> Option<SkinHandle>;

    /// Make `skin` the global skin and apply it to every styled entity whose
    /// skin is not pinned. Returns the previous global skin.
    fn set_global_skin(&mut self, skin: SkinHandle) -> Option<SkinHandle>;

    /// [`StyleWorldExt::set_global_skin`] with a skin looked up in the registry.
    fn set_global_skin_id(&mut self, id: &str) -> StyleResult<Option<SkinHandle>>;

    /// Unlink `entity` from its style parent, detach its style children and
    /// drop its record.
    fn forget_style_record(&mut self, entity: Entity) -> bool;
}

impl StyleWorldExt for World {
    fn style_record(&mut self, entity: Entity) -> StyleRecordMut<'_> {
        StyleRecordMut::new(self, entity)
    }

    fn style_id(&mut self, entity: Entity) -> StyleResult<StyleId> {
        self.style_record(entity).style_id()
    }

    fn set_style_id(&mut self, entity: Entity, id: impl Into<StyleId>) -> StyleResult<StyleId> {
        self.style_record(entity).set_style_id(id.into())
    }

    fn reset_style_id(&mut self, entity: Entity, recursive: bool) -> StyleResult<StyleId> {
        self.style_record(entity).reset_style_id(recursive)
    }

    fn complete_style_id(&mut self, entity: Entity) -> StyleResult<String> {
        self.style_record(entity).complete_style_id()
    }

    fn skin(&mut self, entity: Entity) -> StyleResult<Option<SkinHandle>> {
        self.style_record(entity).skin()
    }

    fn apply_skin(
        &mut self,
        entity: Entity,
        skin: SkinHandle,
        children: bool,
    ) -> StyleResult<Option<SkinHandle>> {
        self.style_record(entity).apply_skin(skin, children)
    }

    fn set_skin(
        &mut self,
        entity: Entity,
        skin: SkinHandle,
        recursive: bool,
    ) -> StyleResult<Option<SkinHandle>> {
        self.style_record(entity).apply_custom_skin(skin, recursive)
    }

    fn update_skin(&mut self, entity: Entity, children: bool) -> StyleResult<()> {
        self.style_record(entity).update_skin(children)
    }

    fn reset_skin(&mut self, entity: Entity) -> StyleResult<Option<SkinHandle>> {
        self.style_record(entity).reset_skin()
    }

    fn remove_skin(&mut self, entity: Entity) -> StyleResult<Option<SkinHandle>> {
        self.style_record(entity).remove_skin()
    }

    fn is_skin_pinned(&mut self, entity: Entity) -> StyleResult<bool> {
        self.style_record(entity).is_pinned()
    }

    fn pin_skin(&mut self, entity: Entity, pinned: bool) -> StyleResult<()> {
        self.style_record(entity).set_pinned(pinned)
    }

    fn add_style_listener(
        &mut self,
        entity: Entity,
        listener: Arc<dyn StyleListener>,
    ) -> StyleResult<ListenerId> {
        self.style_record(entity).add_listener(listener)
    }

    fn remove_style_listener(&mut self, entity: Entity, id: ListenerId) -> StyleResult<bool> {
        self.style_record(entity).remove_listener(id)
    }

    fn custom_painter(&mut self, entity: Entity, name: &str) -> StyleResult<Option<CustomPainter>> {
        self.style_record(entity).custom_painter(name)
    }

    fn custom_painters(&mut self, entity: Entity) -> StyleResult<HashMap<String, CustomPainter>> {
        self.style_record(entity).custom_painters()
    }

    fn set_custom_painter(
        &mut self,
        entity: Entity,
        name: impl Into<String>,
        painter: CustomPainter,
    ) -> StyleResult<Option<CustomPainter>> {
        self.style_record(entity).set_custom_painter(name, painter)
    }

    fn reset_custom_painters(&mut self, entity: Entity) -> StyleResult<bool> {
        self.style_record(entity).reset_custom_painters()
    }

    fn global_skin(&self) -> Option<SkinHandle> {
        self.get_resource::<StyleManager>()
            .and_then(|manager| manager.global_skin().cloned())
    }

    fn set_global_skin(&mut self, skin: SkinHandle) -> Option<SkinHandle> {
        info!(skin = skin.id(), "setting global skin");
        self.init_resource::<StyleManager>();
        let previous = self
            .resource_mut::<StyleManager>()
            .replace_global_skin(skin.clone());

        let mut targets = {
            let mut records = self.query::<(Entity, &StyleRecord)>();
            records
                .iter(self)
                .filter(|(_, record)| !record.is_pinned())
                .map(|(entity, _)| entity)
                .collect::<Vec<_>>()
        };
        targets.sort();

        for entity in targets {
            // Listeners may despawn or pin entities while the broadcast runs.
            let still_unpinned = self
                .get::<StyleRecord>(entity)
                .is_some_and(|record| !record.is_pinned());
            if !still_unpinned {
                continue;
            }

            if let Err(error) = self.style_record(entity).apply_skin(skin.clone(), false) {
                warn!(?entity, skin = skin.id(), %error, "global skin skipped entity");
            }
        }

        previous
    }

    fn set_global_skin_id(&mut self, id: &str) -> StyleResult<Option<SkinHandle>> {
        let skin = self
            .get_resource::<StyleManager>()
            .and_then(|manager| manager.skin(id).cloned())
            .ok_or_else(|| StyleError::UnknownSkin(id.to_owned()))?;
        Ok(self.set_global_skin(skin))
    }

    fn forget_style_record(&mut self, entity: Entity) -> bool {
        let Some(record) = self.get::<StyleRecord>(entity) else {
            return false;
        };
        let parent = record
            .explicit_style_id()
            .and_then(StyleId::parent);
        let children = record.style_children().to_vec();

        for child in children {
            let Some(child_id) = self
                .get::<StyleRecord>(child)
                .and_then(StyleRecord::explicit_style_id)
                .filter(|id| id.parent() == Some(entity))
                .cloned()
            else {
                continue;
            };
            if let Err(error) = self.style_record(child).set_style_id(child_id.detached()) {
                warn!(?entity, ?child, %error, "could not detach style child of forgotten record");
            }
        }

        if let Some(parent) = parent
            && let Some(mut parent_record) = self.get_mut::<StyleRecord>(parent)
        {
            parent_record.unlink_child(entity);
        }

        debug!(?entity, "forgetting style record");
        if let Ok(mut entity_mut) = self.get_entity_mut(entity) {
            entity_mut.remove::<StyleRecord>();
        }
        true
    }
}
