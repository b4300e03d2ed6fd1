use bevy_app::App;
use bevy_ecs::prelude::*;

use crate::{AppSkinningExt, style_id::StyleId};

mod color_chooser;
mod date_field;
mod panel;

pub use color_chooser::*;
pub use date_field::*;
pub use panel::*;

/// Contract for UI controls styled through the skinning engine.
///
/// Controls carry their data only. Registering one records its default style
/// id, which entities carrying the control resolve to until an id is assigned.
pub trait SkinnableControl: Component + Sized {
    fn default_style_id() -> StyleId;
}

/// Register all built-in controls.
pub fn register_builtin_skinnable_controls(app: &mut App) {
    app.register_skinnable_control::<UiPanel>()
        .register_skinnable_control::<UiDateField>()
        .register_skinnable_control::<UiColorChooser>();
}
