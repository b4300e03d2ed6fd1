//! Skin and style management for ECS-hosted UI entities.
//!
//! `bevy_skins` lets you:
//! - assign hierarchical style ids to UI entities ([`StyleId`]),
//! - install pluggable [`Skin`]s globally, per subtree or per entity,
//! - observe skin and style changes through [`StyleListener`]s and the
//!   [`StyleEventQueue`].
//!
//! Style state lives in a [`StyleRecord`] component on the styled entity. All
//! references between entities are plain [`bevy_ecs::entity::Entity`] handles,
//! so styling never keeps a despawned entity alive.
//!
//! # Minimal setup
//!
//! ```no_run
//! use bevy_skins::{
//!     SkinningPlugin, StyleId, StyleIdProperty, UiPanel,
//!     bevy_app::{App, Startup},
//!     bevy_ecs::prelude::*,
//! };
//!
//! fn setup(mut commands: Commands) {
//!     let toolbar = commands.spawn(UiPanel).id();
//!     commands.spawn((UiPanel, StyleIdProperty(StyleId::with_parent("button", toolbar))));
//! }
//!
//! let mut app = App::new();
//! app.add_plugins(SkinningPlugin::default())
//!     .add_systems(Startup, setup);
//! app.update();
//! ```
#![forbid(unsafe_code)]

pub mod app_ext;
pub mod controls;
pub mod ecs;
pub mod error;
pub mod events;
pub mod logging;
pub mod manager;
pub mod plugin;
pub mod record;
pub mod sheet_skin;
pub mod skin;
pub mod style_id;

pub use bevy_app;
pub use bevy_ecs;

pub use app_ext::*;
pub use controls::*;
pub use ecs::*;
pub use error::*;
pub use events::*;
pub use logging::*;
pub use manager::*;
pub use plugin::*;
pub use record::*;
pub use sheet_skin::*;
pub use skin::*;
pub use style_id::*;

pub mod prelude {
    //! Convenience exports for styling `bevy_skins` apps.

    pub use bevy_ecs::hierarchy::{ChildOf, Children};

    pub use crate::{
        AppSkinningExt, AppliedSkinStyle, Cascade, CustomPainter, DefaultStyleIds,
        FnStyleListener, ListenerId, RendererHooks, SheetSkin, Skin, SkinHandle, SkinnableControl,
        SkinnableUi, SkinningPlugin, StyleError, StyleEvent, StyleEventQueue, StyleId,
        StyleIdProperty, StyleListener, StyleManager, StyleRecord, StyleRecordMut, StyleResult,
        StyleWorldExt, UiColorChooser, UiDateField, UiPanel, init_logging,
    };

    pub use crate::{bevy_app, bevy_ecs};
}

#[cfg(test)]
mod tests;
