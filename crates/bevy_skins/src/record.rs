use std::{any::Any, collections::HashMap, fmt, sync::Arc};

use bevy_ecs::{hierarchy::Children, prelude::*};
use tracing::{debug, trace, warn};

use crate::{
    error::{StyleError, StyleResult},
    events::{ListenerId, StyleEvent, StyleListener, dispatch},
    manager::{RendererHooks, StyleManager, default_style_id},
    skin::SkinHandle,
    style_id::StyleId,
};

/// Opaque renderer override stored per entity under a name.
///
/// The engine never interprets painters; widgets downcast them back to their
/// concrete type.
#[derive(Clone)]
pub struct CustomPainter(Arc<dyn Any + Send + Sync>);

impl CustomPainter {
    #[must_use]
    pub fn new<T: Any + Send + Sync>(painter: T) -> Self {
        Self(Arc::new(painter))
    }

    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Whether both painters are the same instance.
    #[must_use]
    pub fn same_as(&self, other: &CustomPainter) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for CustomPainter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomPainter(<opaque>)")
    }
}

/// Which style children a skin change propagates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cascade {
    /// Only the entity itself.
    #[default]
    None,
    /// Style children whose skin is not pinned.
    Unpinned,
    /// Every style child, pinned or not.
    Forced,
}

impl From<bool> for Cascade {
    fn from(children: bool) -> Self {
        if children { Self::Unpinned } else { Self::None }
    }
}

/// Style state of one UI entity.
///
/// Created lazily on the first style-related access and stored on the entity
/// itself, so despawning the entity discards it.
#[derive(Component, Default)]
pub struct StyleRecord {
    skin: Option<SkinHandle>,
    pinned: bool,
    style_id: Option<StyleId>,
    painters: HashMap<String, CustomPainter>,
    /// Entities whose style id names this entity as parent.
    children: Vec<Entity>,
    listeners: Vec<(ListenerId, Arc<dyn StyleListener>)>,
    next_listener: u64,
    /// Style id is owned by a `StyleIdProperty` component.
    pub(crate) property_driven: bool,
}

impl StyleRecord {
    #[must_use]
    pub fn skin(&self) -> Option<&SkinHandle> {
        self.skin.as_ref()
    }

    #[must_use]
    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Explicitly assigned style id, `None` when the type default is in effect.
    #[must_use]
    pub fn explicit_style_id(&self) -> Option<&StyleId> {
        self.style_id.as_ref()
    }

    /// Raw style child index, which may still hold despawned entities until pruned.
    #[must_use]
    pub fn style_children(&self) -> &[Entity] {
        &self.children
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn link_child(&mut self, child: Entity) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    pub(crate) fn unlink_child(&mut self, child: Entity) {
        self.children.retain(|linked| *linked != child);
    }

    pub(crate) fn retain_children(&mut self, keep: impl Fn(Entity) -> bool) {
        self.children.retain(|child| keep(*child));
    }
}

impl fmt::Debug for StyleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleRecord")
            .field("skin", &self.skin)
            .field("pinned", &self.pinned)
            .field("style_id", &self.style_id)
            .field("painters", &self.painters.keys().collect::<Vec<_>>())
            .field("children", &self.children)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Mutable view over the style record of one entity.
///
/// Every operation first resolves the entity: it fails with
/// [`StyleError::ComponentDestroyed`] once the entity is despawned and with
/// [`StyleError::IncompatibleRenderer`] when the entity is not skinnable.
pub struct StyleRecordMut<'w> {
    world: &'w mut World,
    entity: Entity,
}

impl<'w> StyleRecordMut<'w> {
    pub fn new(world: &'w mut World, entity: Entity) -> Self {
        Self { world, entity }
    }

    #[must_use]
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Resolve the referenced entity, creating its record on first access.
    ///
    /// A live entity without a compatible renderer gets one re-resolution
    /// attempt through [`RendererHooks::reinstall`] before the call fails.
    pub fn component(&mut self) -> StyleResult<Entity> {
        let entity = self.entity;
        if self.world.get_entity(entity).is_err() {
            return Err(StyleError::destroyed(entity));
        }

        let hooks = self
            .world
            .get_resource::<RendererHooks>()
            .copied()
            .unwrap_or_default();
        if !(hooks.is_compatible)(self.world, entity) {
            debug!(?entity, "re-resolving renderer before styling");
            (hooks.reinstall)(self.world, entity);
            if self.world.get_entity(entity).is_err() {
                return Err(StyleError::destroyed(entity));
            }
            if !(hooks.is_compatible)(self.world, entity) {
                return Err(StyleError::IncompatibleRenderer { entity });
            }
        }

        if self.world.get::<StyleRecord>(entity).is_none() {
            trace!(?entity, "creating style record");
            self.world.entity_mut(entity).insert(StyleRecord::default());
        }

        Ok(entity)
    }

    fn read<R>(&self, read: impl FnOnce(&StyleRecord) -> R) -> StyleResult<R> {
        self.world
            .get::<StyleRecord>(self.entity)
            .map(read)
            .ok_or_else(|| StyleError::destroyed(self.entity))
    }

    fn write<R>(&mut self, write: impl FnOnce(&mut StyleRecord) -> R) -> StyleResult<R> {
        let mut record = self
            .world
            .get_mut::<StyleRecord>(self.entity)
            .ok_or_else(|| StyleError::destroyed(self.entity))?;
        Ok(write(&mut *record))
    }

    /// Snapshot of live style children.
    fn live_children(&self) -> StyleResult<Vec<Entity>> {
        let children = self.read(|record| record.children.clone())?;
        Ok(children
            .into_iter()
            .filter(|child| self.world.get_entity(*child).is_ok())
            .collect())
    }

    fn fire(&mut self, event: StyleEvent) {
        let listeners = self
            .world
            .get::<StyleRecord>(self.entity)
            .map(|record| {
                record
                    .listeners
                    .iter()
                    .map(|(_, listener)| listener.clone())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        dispatch(self.world, &listeners, event);
    }

    /// World backing this view, for skins and listeners that need more access.
    pub fn world(&mut self) -> &mut World {
        &mut *self.world
    }

    // --- style id -----------------------------------------------------------

    /// Style id in effect; the type default when none was assigned.
    pub fn style_id(&mut self) -> StyleResult<StyleId> {
        let entity = self.component()?;
        let explicit = self.read(|record| record.style_id.clone())?;
        Ok(explicit.unwrap_or_else(|| default_style_id(self.world, entity)))
    }

    /// Dot-joined ids from the outermost style parent down to this entity.
    pub fn complete_style_id(&mut self) -> StyleResult<String> {
        let mut segments = Vec::new();
        let mut visited = Vec::new();
        let mut current = Some(self.entity);

        while let Some(node) = current {
            if visited.contains(&node) {
                break;
            }
            visited.push(node);

            let style_id = StyleRecordMut::new(self.world, node).style_id()?;
            segments.push(style_id.id().unwrap_or_default().to_owned());
            current = style_id
                .parent()
                .filter(|parent| self.world.get_entity(*parent).is_ok());
        }

        segments.reverse();
        Ok(segments.join("."))
    }

    /// Assign a style id and return the previous one.
    ///
    /// Assigning the id already in effect is a no-op without notifications.
    /// Otherwise the entity moves between style parents' child indexes, adopts
    /// the new parent's skin when it differs from its own (or refreshes its
    /// current skin across its style subtree) and fires `style_changed`. The
    /// event fires even when that skin step fails; its error is returned
    /// afterwards with the new id left in place.
    pub fn set_style_id(&mut self, id: StyleId) -> StyleResult<StyleId> {
        let entity = self.component()?;

        let explicit = (!id.is_auto()).then_some(id);
        let resolved = explicit
            .clone()
            .unwrap_or_else(|| default_style_id(self.world, entity));

        let old = self.style_id()?;
        if resolved == old {
            trace!(?entity, style_id = %resolved, "style id unchanged");
            return Ok(old);
        }

        if let Some(parent) = resolved.parent() {
            StyleRecordMut::new(self.world, parent).component()?;
        }

        debug!(?entity, old = %old, new = %resolved, "style id changed");
        self.write(|record| record.style_id = explicit)?;

        if let Some(old_parent) = old.parent()
            && let Some(mut parent_record) = self.world.get_mut::<StyleRecord>(old_parent)
        {
            parent_record.unlink_child(entity);
        }

        let parent_skin = match resolved.parent() {
            Some(parent) => {
                let mut parent_record = StyleRecordMut::new(self.world, parent);
                parent_record.write(|record| record.link_child(entity))?;
                parent_record.read(|record| record.skin.clone())?
            }
            None => None,
        };

        // The id is committed at this point; listeners hear about it even when
        // the skin cannot follow.
        let current = self.read(|record| record.skin.clone())?;
        let reconciled = match parent_skin {
            Some(parent_skin) if current.as_ref() != Some(&parent_skin) => {
                self.apply_skin(parent_skin, false).map(drop)
            }
            _ => self.update_skin(true),
        };

        self.fire(StyleEvent::StyleChanged {
            entity,
            old: old.clone(),
            new: resolved,
        });
        reconciled.map(|()| old)
    }

    /// Reset the style id to the type default and return the previous one.
    ///
    /// With `recursive`, every style child is reset first (depth-first). The
    /// child index is snapshotted because resetting a child unlinks it. A child
    /// that cannot be reset is logged and skipped.
    pub fn reset_style_id(&mut self, recursive: bool) -> StyleResult<StyleId> {
        let mut visiting = Vec::new();
        self.reset_style_id_inner(recursive, &mut visiting)
    }

    fn reset_style_id_inner(
        &mut self,
        recursive: bool,
        visiting: &mut Vec<Entity>,
    ) -> StyleResult<StyleId> {
        let entity = self.component()?;

        if recursive {
            visiting.push(entity);
            for child in self.live_children()? {
                if visiting.contains(&child) {
                    continue;
                }
                if let Err(error) =
                    StyleRecordMut::new(self.world, child).reset_style_id_inner(true, visiting)
                {
                    warn!(parent = ?entity, ?child, %error, "style id reset skipped style child");
                }
            }
            visiting.pop();
        }

        self.set_style_id(StyleId::auto())
    }

    /// Live entities whose style id names this entity as parent.
    pub fn style_children(&mut self) -> StyleResult<Vec<Entity>> {
        self.component()?;
        self.live_children()
    }

    // --- skin ---------------------------------------------------------------

    pub fn skin(&mut self) -> StyleResult<Option<SkinHandle>> {
        self.component()?;
        self.read(|record| record.skin.clone())
    }

    pub fn is_pinned(&mut self) -> StyleResult<bool> {
        self.component()?;
        self.read(|record| record.pinned)
    }

    /// Pinned skins are left alone by global skin changes and unpinned cascades.
    pub fn set_pinned(&mut self, pinned: bool) -> StyleResult<()> {
        self.component()?;
        self.write(|record| record.pinned = pinned)
    }

    /// Apply `skin`, optionally to unpinned style children too, and return the
    /// previous skin.
    pub fn apply_skin(
        &mut self,
        skin: SkinHandle,
        children: bool,
    ) -> StyleResult<Option<SkinHandle>> {
        self.apply_skin_with(skin, Cascade::from(children))
    }

    /// Apply `skin` with an explicit cascade policy and return the previous skin.
    ///
    /// Re-applying the installed skin keeps it (and the pin) untouched and fires
    /// nothing. A different skin uninstalls the previous one, installs the new
    /// one and clears the pin; the cascade then runs, and finally
    /// `skin_changed` and `skin_updated` fire.
    pub fn apply_skin_with(
        &mut self,
        skin: SkinHandle,
        cascade: Cascade,
    ) -> StyleResult<Option<SkinHandle>> {
        let mut visiting = Vec::new();
        self.apply_skin_inner(skin, cascade, &mut visiting)
    }

    fn apply_skin_inner(
        &mut self,
        skin: SkinHandle,
        cascade: Cascade,
        visiting: &mut Vec<Entity>,
    ) -> StyleResult<Option<SkinHandle>> {
        let entity = self.component()?;
        let style_id = self.style_id()?;
        let current = self.read(|record| record.skin.clone())?;

        let changed = current.as_ref() != Some(&skin);
        let previous = if changed { self.remove_skin()? } else { current };

        if changed {
            debug!(
                ?entity,
                skin = skin.id(),
                previous = ?previous.as_ref().map(SkinHandle::id),
                "applying skin"
            );
            if let Err(error) = skin.apply(self.world, entity) {
                warn!(?entity, skin = skin.id(), %error, "skin installation failed, component left unskinned");
                return Err(error);
            }
            self.write(|record| {
                record.skin = Some(skin.clone());
                record.pinned = false;
            })?;
        }

        if cascade != Cascade::None {
            visiting.push(entity);
            for child in self.live_children()? {
                if visiting.contains(&child) {
                    trace!(parent = ?entity, ?child, "style cycle, skipping child");
                    continue;
                }

                let mut child_record = StyleRecordMut::new(self.world, child);
                let pinned = match child_record.is_pinned() {
                    Ok(pinned) => pinned,
                    Err(error) => {
                        warn!(parent = ?entity, ?child, %error, "skin cascade skipped style child");
                        continue;
                    }
                };
                if pinned && cascade == Cascade::Unpinned {
                    trace!(parent = ?entity, ?child, "pinned style child keeps its skin");
                    continue;
                }

                if let Err(error) = child_record.apply_skin_inner(skin.clone(), cascade, visiting) {
                    warn!(parent = ?entity, ?child, %error, "skin cascade skipped style child");
                }
            }
            visiting.pop();
        }

        if changed {
            self.fire(StyleEvent::SkinChanged {
                entity,
                old: previous.clone(),
                new: Some(skin),
            });
            self.fire(StyleEvent::SkinUpdated { entity, style_id });
        }

        Ok(previous)
    }

    /// Apply `skin` to this entity and its style children, then pin it.
    ///
    /// With `recursive`, the skin is also applied (and pinned) across the
    /// `Children` containment subtree. Contained entities that are not
    /// skinnable are walked through rather than styled.
    pub fn apply_custom_skin(
        &mut self,
        skin: SkinHandle,
        recursive: bool,
    ) -> StyleResult<Option<SkinHandle>> {
        let entity = self.component()?;
        let previous = self.apply_skin(skin.clone(), true)?;
        self.set_pinned(true)?;

        if recursive {
            apply_to_containment(self.world, entity, &skin);
        }

        Ok(previous)
    }

    /// Refresh the installed skin in place, without reinstalling it.
    ///
    /// Fires only `skin_updated`. An unskinned entity has nothing to refresh and
    /// fires nothing, though its style children are still refreshed.
    pub fn update_skin(&mut self, children: bool) -> StyleResult<()> {
        let mut visiting = Vec::new();
        self.update_skin_inner(children, &mut visiting)
    }

    fn update_skin_inner(&mut self, children: bool, visiting: &mut Vec<Entity>) -> StyleResult<()> {
        let entity = self.component()?;

        if let Some(skin) = self.read(|record| record.skin.clone())? {
            let style_id = self.style_id()?;
            trace!(?entity, skin = skin.id(), style_id = %style_id, "updating skin");
            skin.update(self.world, entity)?;
            self.fire(StyleEvent::SkinUpdated { entity, style_id });
        }

        if children {
            visiting.push(entity);
            for child in self.live_children()? {
                if visiting.contains(&child) {
                    continue;
                }
                if let Err(error) =
                    StyleRecordMut::new(self.world, child).update_skin_inner(true, visiting)
                {
                    warn!(parent = ?entity, ?child, %error, "skin update skipped style child");
                }
            }
            visiting.pop();
        }

        Ok(())
    }

    /// Return the entity to the global skin cycle.
    ///
    /// When the installed skin is the global skin, the pin is cleared and the
    /// global skin is re-applied across style children. Any other skin is kept.
    /// Returns the skin in effect afterwards.
    pub fn reset_skin(&mut self) -> StyleResult<Option<SkinHandle>> {
        self.component()?;
        let current = self.read(|record| record.skin.clone())?;
        let global = self
            .world
            .get_resource::<StyleManager>()
            .and_then(|manager| manager.global_skin().cloned());

        match global {
            Some(global) if current.as_ref() == Some(&global) => {
                self.set_pinned(false)?;
                self.apply_skin(global.clone(), true)?;
                Ok(Some(global))
            }
            _ => Ok(current),
        }
    }

    /// Uninstall the current skin without installing another one.
    ///
    /// Fires nothing. The entity is unskinned afterwards even if the skin's
    /// removal reported an error.
    pub fn remove_skin(&mut self) -> StyleResult<Option<SkinHandle>> {
        let entity = self.component()?;
        let previous = self.write(|record| record.skin.take())?;
        if let Some(skin) = &previous {
            debug!(?entity, skin = skin.id(), "removing skin");
            skin.remove(self.world, entity)?;
        }
        Ok(previous)
    }

    // --- listeners ----------------------------------------------------------

    pub fn add_listener(&mut self, listener: Arc<dyn StyleListener>) -> StyleResult<ListenerId> {
        self.component()?;
        self.write(|record| {
            let id = ListenerId(record.next_listener);
            record.next_listener += 1;
            record.listeners.push((id, listener));
            id
        })
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> StyleResult<bool> {
        self.component()?;
        self.write(|record| {
            let before = record.listeners.len();
            record.listeners.retain(|(listener_id, _)| *listener_id != id);
            record.listeners.len() != before
        })
    }

    // --- custom painters ----------------------------------------------------

    pub fn custom_painter(&mut self, name: &str) -> StyleResult<Option<CustomPainter>> {
        self.component()?;
        self.read(|record| record.painters.get(name).cloned())
    }

    pub fn custom_painters(&mut self) -> StyleResult<HashMap<String, CustomPainter>> {
        self.component()?;
        self.read(|record| record.painters.clone())
    }

    /// Store a painter under `name` and return the one it replaced.
    pub fn set_custom_painter(
        &mut self,
        name: impl Into<String>,
        painter: CustomPainter,
    ) -> StyleResult<Option<CustomPainter>> {
        self.component()?;
        let name = name.into();
        self.write(|record| record.painters.insert(name, painter))
    }

    /// Replace all painters and return the previous set.
    pub fn set_custom_painters(
        &mut self,
        painters: HashMap<String, CustomPainter>,
    ) -> StyleResult<HashMap<String, CustomPainter>> {
        self.component()?;
        self.write(|record| std::mem::replace(&mut record.painters, painters))
    }

    /// Drop all painters; `true` when any was stored.
    pub fn reset_custom_painters(&mut self) -> StyleResult<bool> {
        self.component()?;
        self.write(|record| {
            let had_painters = !record.painters.is_empty();
            record.painters.clear();
            had_painters
        })
    }
}

fn apply_to_containment(world: &mut World, entity: Entity, skin: &SkinHandle) {
    let contained = world
        .get::<Children>(entity)
        .map(|children| children.iter().collect::<Vec<_>>())
        .unwrap_or_default();

    for child in contained {
        if world.get_entity(child).is_err() {
            continue;
        }

        match StyleRecordMut::new(world, child).apply_custom_skin(skin.clone(), true) {
            Ok(_) => {}
            Err(StyleError::IncompatibleRenderer { .. }) => {
                trace!(?child, "walking through non-skinnable container");
                apply_to_containment(world, child, skin);
            }
            Err(error) => {
                warn!(parent = ?entity, ?child, %error, "custom skin skipped contained entity");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cascade_from_bool_maps_to_unpinned_children() {
        assert_eq!(Cascade::from(true), Cascade::Unpinned);
        assert_eq!(Cascade::from(false), Cascade::None);
    }

    #[test]
    fn record_child_index_behaves_as_a_set() {
        let mut world = World::new();
        let child = world.spawn_empty().id();
        let other = world.spawn_empty().id();

        let mut record = StyleRecord::default();
        record.link_child(child);
        record.link_child(child);
        record.link_child(other);
        assert_eq!(record.style_children(), &[child, other]);

        record.unlink_child(child);
        assert_eq!(record.style_children(), &[other]);
    }

    #[test]
    fn custom_painters_downcast_to_their_type() {
        #[derive(Debug, PartialEq)]
        struct Rounded(f32);

        let painter = CustomPainter::new(Rounded(4.0));
        assert_eq!(painter.downcast_ref::<Rounded>(), Some(&Rounded(4.0)));
        assert!(painter.downcast_ref::<String>().is_none());
        assert!(painter.same_as(&painter.clone()));
    }
}
