use bevy_app::{App, Plugin, PostUpdate, PreUpdate};
use bevy_ecs::{prelude::*, schedule::IntoScheduleConfigs};
use tracing::warn;

use crate::{
    AppSkinningExt,
    controls::register_builtin_skinnable_controls,
    ecs::{SkinnableUi, StyleIdProperty},
    events::StyleEventQueue,
    manager::{DefaultStyleIds, RendererHooks, StyleManager, StyleWorldExt},
    record::StyleRecord,
    sheet_skin::SheetSkin,
};

/// Bevy plugin wiring the skinning engine into an app.
///
/// Registers the built-in controls and the `light`/`dark` skins, then makes
/// `initial_skin` the global skin.
#[derive(Debug, Clone)]
pub struct SkinningPlugin {
    /// Id of the registered skin installed as global skin at startup.
    pub initial_skin: Option<String>,
}

impl Default for SkinningPlugin {
    fn default() -> Self {
        Self {
            initial_skin: Some(SheetSkin::LIGHT.to_owned()),
        }
    }
}

impl Plugin for SkinningPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<StyleManager>()
            .init_resource::<DefaultStyleIds>()
            .init_resource::<RendererHooks>()
            .init_resource::<StyleEventQueue>()
            .add_systems(
                PreUpdate,
                (install_skins_on_new_controls, sync_style_id_properties).chain(),
            )
            .add_systems(PostUpdate, prune_style_links);

        register_builtin_skinnable_controls(app);
        app.register_skin(SheetSkin::light())
            .register_skin(SheetSkin::dark());

        if let Some(skin_id) = &self.initial_skin
            && let Err(error) = app.set_global_skin_id(skin_id)
        {
            warn!(%error, "initial skin unavailable, starting unskinned");
        }
    }
}

/// Install the global skin on skinnable entities spawned since the last run.
///
/// Entities that already carry a skin keep it. Every new entity gets a style
/// record so later global skin changes reach it.
pub fn install_skins_on_new_controls(world: &mut World) {
    let added = {
        let mut query = world.query_filtered::<Entity, Added<SkinnableUi>>();
        query.iter(world).collect::<Vec<_>>()
    };
    if added.is_empty() {
        return;
    }

    let global = world.global_skin();
    for entity in added {
        if world.get_entity(entity).is_err() {
            continue;
        }

        let mut record = world.style_record(entity);
        let outcome = record.skin().and_then(|current| match (&global, current) {
            (Some(skin), None) => record.apply_skin(skin.clone(), false).map(drop),
            _ => Ok(()),
        });

        if let Err(error) = outcome {
            warn!(?entity, %error, "default skin installation failed, component left unskinned");
        }
    }
}

/// Apply changed [`StyleIdProperty`] values and reset entities whose property
/// was removed.
pub fn sync_style_id_properties(world: &mut World) {
    let changed = {
        let mut query = world
            .query_filtered::<(Entity, &StyleIdProperty), Changed<StyleIdProperty>>();
        query
            .iter(world)
            .map(|(entity, property)| (entity, property.0.clone()))
            .collect::<Vec<_>>()
    };

    for (entity, style_id) in changed {
        let style_id = match style_id.parent() {
            Some(parent) if world.get_entity(parent).is_err() => style_id.detached(),
            _ => style_id,
        };

        match world.set_style_id(entity, style_id) {
            Ok(_) => {
                if let Some(mut record) = world.get_mut::<StyleRecord>(entity) {
                    record.property_driven = true;
                }
            }
            Err(error) => warn!(?entity, %error, "style id property not applied"),
        }
    }

    let released = {
        let mut query = world.query_filtered::<(Entity, &StyleRecord), Without<StyleIdProperty>>();
        query
            .iter(world)
            .filter(|(_, record)| record.property_driven)
            .map(|(entity, _)| entity)
            .collect::<Vec<_>>()
    };

    for entity in released {
        if let Some(mut record) = world.get_mut::<StyleRecord>(entity) {
            record.property_driven = false;
        }
        if let Err(error) = world.reset_style_id(entity, false) {
            warn!(?entity, %error, "style id reset after property removal failed");
        }
    }
}

/// Drop child-index entries pointing at despawned entities.
pub fn prune_style_links(world: &mut World) {
    let stale = {
        let mut query = world.query::<(Entity, &StyleRecord)>();
        let world_ref: &World = world;
        query
            .iter(world_ref)
            .filter_map(|(entity, record)| {
                let dead = record
                    .style_children()
                    .iter()
                    .copied()
                    .filter(|child| world_ref.get_entity(*child).is_err())
                    .collect::<Vec<_>>();
                (!dead.is_empty()).then_some((entity, dead))
            })
            .collect::<Vec<_>>()
    };

    for (entity, dead) in stale {
        if let Some(mut record) = world.get_mut::<StyleRecord>(entity) {
            record.retain_children(|child| !dead.contains(&child));
        }
    }
}
