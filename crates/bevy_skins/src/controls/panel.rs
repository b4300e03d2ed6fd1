use bevy_ecs::prelude::*;

use crate::{SkinnableUi, controls::SkinnableControl, style_id::StyleId};

/// Plain container surface.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[require(SkinnableUi)]
pub struct UiPanel;

impl SkinnableControl for UiPanel {
    fn default_style_id() -> StyleId {
        StyleId::PANEL
    }
}
