use bevy_ecs::prelude::*;

use crate::{SkinnableUi, controls::SkinnableControl, style_id::StyleId};

/// Color selection panel.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
#[require(SkinnableUi)]
pub struct UiColorChooser {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Whether the OK/Cancel/Reset row is shown.
    pub show_buttons_panel: bool,
    /// Restrict picks to the 216-color web-safe palette.
    pub web_only_colors: bool,
}

impl Default for UiColorChooser {
    fn default() -> Self {
        Self::new(255, 255, 255)
    }
}

impl UiColorChooser {
    #[must_use]
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self {
            r,
            g,
            b,
            show_buttons_panel: false,
            web_only_colors: false,
        }
    }

    /// Current color, snapped to the web-safe palette when restricted.
    #[must_use]
    pub fn color(&self) -> (u8, u8, u8) {
        if self.web_only_colors {
            (web_safe(self.r), web_safe(self.g), web_safe(self.b))
        } else {
            (self.r, self.g, self.b)
        }
    }
}

fn web_safe(channel: u8) -> u8 {
    // Nearest multiple of 0x33.
    let step = (u16::from(channel) + 0x19) / 0x33;
    (step * 0x33) as u8
}

impl SkinnableControl for UiColorChooser {
    fn default_style_id() -> StyleId {
        StyleId::COLOR_CHOOSER
    }
}
