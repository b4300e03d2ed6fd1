use std::{fmt, sync::Arc};

use bevy_ecs::{entity::Entity, prelude::Resource, world::World};
use crossbeam_queue::SegQueue;

use crate::{skin::SkinHandle, style_id::StyleId};

/// Observer of style and skin changes on one entity.
///
/// Callbacks run synchronously, in registration order, from inside the mutating
/// call. They receive the world and may call back into the style API.
pub trait StyleListener: Send + Sync + 'static {
    fn skin_changed(
        &self,
        _world: &mut World,
        _entity: Entity,
        _old: Option<&SkinHandle>,
        _new: Option<&SkinHandle>,
    ) {
    }

    fn style_changed(&self, _world: &mut World, _entity: Entity, _old: &StyleId, _new: &StyleId) {
    }

    /// Visual refresh of the current skin.
    fn skin_updated(&self, _world: &mut World, _entity: Entity, _style_id: &StyleId) {}
}

/// Handle returned when subscribing a listener, used to unsubscribe it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

/// Owned form of a style notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleEvent {
    SkinChanged {
        entity: Entity,
        old: Option<SkinHandle>,
        new: Option<SkinHandle>,
    },
    StyleChanged {
        entity: Entity,
        old: StyleId,
        new: StyleId,
    },
    SkinUpdated {
        entity: Entity,
        style_id: StyleId,
    },
}

impl StyleEvent {
    #[must_use]
    pub fn entity(&self) -> Entity {
        match self {
            Self::SkinChanged { entity, .. }
            | Self::StyleChanged { entity, .. }
            | Self::SkinUpdated { entity, .. } => *entity,
        }
    }

    fn deliver(&self, listener: &dyn StyleListener, world: &mut World) {
        match self {
            Self::SkinChanged { entity, old, new } => {
                listener.skin_changed(world, *entity, old.as_ref(), new.as_ref());
            }
            Self::StyleChanged { entity, old, new } => {
                listener.style_changed(world, *entity, old, new);
            }
            Self::SkinUpdated { entity, style_id } => {
                listener.skin_updated(world, *entity, style_id);
            }
        }
    }
}

/// Adapts a closure receiving [`StyleEvent`]s into a [`StyleListener`].
pub struct FnStyleListener<F>(F);

impl<F> FnStyleListener<F>
where
    F: Fn(&mut World, &StyleEvent) + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(callback: F) -> Self {
        Self(callback)
    }
}

impl<F> fmt::Debug for FnStyleListener<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnStyleListener")
    }
}

impl<F> StyleListener for FnStyleListener<F>
where
    F: Fn(&mut World, &StyleEvent) + Send + Sync + 'static,
{
    fn skin_changed(
        &self,
        world: &mut World,
        entity: Entity,
        old: Option<&SkinHandle>,
        new: Option<&SkinHandle>,
    ) {
        let event = StyleEvent::SkinChanged {
            entity,
            old: old.cloned(),
            new: new.cloned(),
        };
        (self.0)(world, &event);
    }

    fn style_changed(&self, world: &mut World, entity: Entity, old: &StyleId, new: &StyleId) {
        let event = StyleEvent::StyleChanged {
            entity,
            old: old.clone(),
            new: new.clone(),
        };
        (self.0)(world, &event);
    }

    fn skin_updated(&self, world: &mut World, entity: Entity, style_id: &StyleId) {
        let event = StyleEvent::SkinUpdated {
            entity,
            style_id: style_id.clone(),
        };
        (self.0)(world, &event);
    }
}

/// Lock-free queue collecting every style notification for systems to drain.
///
/// Notifications are pushed here after the entity's own listeners ran, whenever
/// this resource exists in the world.
#[derive(Resource, Clone, Debug)]
pub struct StyleEventQueue {
    queue: Arc<SegQueue<StyleEvent>>,
}

impl Default for StyleEventQueue {
    fn default() -> Self {
        Self {
            queue: Arc::new(SegQueue::new()),
        }
    }
}

impl StyleEventQueue {
    pub fn push(&self, event: StyleEvent) {
        self.queue.push(event);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[must_use]
    pub fn drain_all(&self) -> Vec<StyleEvent> {
        let mut drained = Vec::new();
        while let Some(event) = self.queue.pop() {
            drained.push(event);
        }
        drained
    }

    /// Drain queue entries and keep only those concerning `entity`.
    ///
    /// Note: entries for other entities are discarded.
    #[must_use]
    pub fn drain_for(&self, entity: Entity) -> Vec<StyleEvent> {
        self.drain_all()
            .into_iter()
            .filter(|event| event.entity() == entity)
            .collect()
    }
}

/// Deliver `event` to a snapshot of listeners, then to the world queue.
pub(crate) fn dispatch(world: &mut World, listeners: &[Arc<dyn StyleListener>], event: StyleEvent) {
    for listener in listeners {
        event.deliver(listener.as_ref(), world);
    }

    if let Some(queue) = world.get_resource::<StyleEventQueue>() {
        queue.push(event);
    }
}
