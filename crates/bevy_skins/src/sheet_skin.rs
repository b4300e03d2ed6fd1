use std::collections::HashMap;

use bevy_ecs::{entity::Entity, prelude::*};
use ron::extensions::Extensions;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    error::{StyleError, StyleResult},
    manager::StyleWorldExt,
    skin::Skin,
    style_id::StyleId,
};

/// Color as written in skin documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkinColor {
    /// `#RRGGBB` or `#RRGGBBAA`.
    Hex(String),
    Rgba8(u8, u8, u8, u8),
}

impl SkinColor {
    pub fn to_rgba(&self) -> StyleResult<Rgba> {
        match self {
            Self::Rgba8(r, g, b, a) => Ok(Rgba::new(*r, *g, *b, *a)),
            Self::Hex(text) => parse_hex(text)
                .ok_or_else(|| StyleError::SkinDefinition(format!("invalid hex color `{text}`"))),
        }
    }
}

fn parse_hex(text: &str) -> Option<Rgba> {
    let digits = text.strip_prefix('#')?;
    if !matches!(digits.len(), 6 | 8) || !digits.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |index: usize| u8::from_str_radix(&digits[index..index + 2], 16).ok();

    let alpha = if digits.len() == 8 { channel(6)? } else { 0xff };
    Some(Rgba::new(channel(0)?, channel(2)?, channel(4)?, alpha))
}

/// Straight 8-bit RGBA color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[must_use]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 0xff)
    }
}

/// Layout values a skin rule may set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutStyle {
    pub padding: Option<f64>,
    pub gap: Option<f64>,
    pub corner_radius: Option<f64>,
    pub border_width: Option<f64>,
}

/// Colors a skin rule may set.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ColorStyle {
    pub bg: Option<Rgba>,
    pub text: Option<Rgba>,
    pub border: Option<Rgba>,
}

/// Values a skin assigns to one style id.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SkinRule {
    pub layout: LayoutStyle,
    pub colors: ColorStyle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResolvedLayoutStyle {
    pub padding: f64,
    pub gap: f64,
    pub corner_radius: f64,
    pub border_width: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResolvedColorStyle {
    pub bg: Option<Rgba>,
    pub text: Option<Rgba>,
    pub border: Option<Rgba>,
}

/// Visual values a [`SheetSkin`] installed on an entity.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct AppliedSkinStyle {
    pub skin: String,
    /// Complete style id the values were resolved for.
    pub style_id: String,
    pub layout: ResolvedLayoutStyle,
    pub colors: ResolvedColorStyle,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ColorStyleDocument {
    bg: Option<SkinColor>,
    text: Option<SkinColor>,
    border: Option<SkinColor>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct SkinRuleDocument {
    layout: LayoutStyle,
    colors: ColorStyleDocument,
}

#[derive(Debug, Clone, Deserialize)]
struct SkinDocument {
    id: String,
    #[serde(default)]
    rules: HashMap<String, SkinRuleDocument>,
}

fn resolve_color(color: Option<&SkinColor>) -> StyleResult<Option<Rgba>> {
    color.map(SkinColor::to_rgba).transpose()
}

impl TryFrom<SkinRuleDocument> for SkinRule {
    type Error = StyleError;

    fn try_from(document: SkinRuleDocument) -> StyleResult<Self> {
        Ok(Self {
            layout: document.layout,
            colors: ColorStyle {
                bg: resolve_color(document.colors.bg.as_ref())?,
                text: resolve_color(document.colors.text.as_ref())?,
                border: resolve_color(document.colors.border.as_ref())?,
            },
        })
    }
}

fn merge_layout(dst: &mut LayoutStyle, src: &LayoutStyle) {
    if src.padding.is_some() {
        dst.padding = src.padding;
    }
    if src.gap.is_some() {
        dst.gap = src.gap;
    }
    if src.corner_radius.is_some() {
        dst.corner_radius = src.corner_radius;
    }
    if src.border_width.is_some() {
        dst.border_width = src.border_width;
    }
}

fn merge_colors(dst: &mut ColorStyle, src: &ColorStyle) {
    if src.bg.is_some() {
        dst.bg = src.bg;
    }
    if src.text.is_some() {
        dst.text = src.text;
    }
    if src.border.is_some() {
        dst.border = src.border;
    }
}

/// Skin described by rules keyed by style id.
///
/// A rule key is either a plain id (`"button"`) or a dotted complete id
/// (`"toolbar.button"`). Resolution merges every rule whose key is a suffix of
/// the entity's complete style id, shortest first, so more specific keys
/// override individual fields.
///
/// ```
/// use bevy_skins::SheetSkin;
///
/// let skin = SheetSkin::from_ron(
///     r##"(
///         id: "ocean",
///         rules: {
///             "panel": (
///                 layout: (padding: 6.0),
///                 colors: (bg: Hex("#102030")),
///             ),
///         },
///     )"##,
/// )
/// .unwrap();
/// assert_eq!(skin.skin_id(), "ocean");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SheetSkin {
    id: String,
    rules: HashMap<String, SkinRule>,
}

impl SheetSkin {
    pub const LIGHT: &'static str = "light";
    pub const DARK: &'static str = "dark";

    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rules: HashMap::new(),
        }
    }

    /// Parse a RON skin document. Optional fields may omit `Some(..)`.
    pub fn from_ron(text: &str) -> StyleResult<Self> {
        let document: SkinDocument = ron::Options::default()
            .with_default_extension(Extensions::IMPLICIT_SOME)
            .from_str(text)
            .map_err(|error| StyleError::SkinDefinition(error.to_string()))?;

        let rules = document
            .rules
            .into_iter()
            .map(|(key, rule)| Ok((key, SkinRule::try_from(rule)?)))
            .collect::<StyleResult<HashMap<_, _>>>()?;

        Ok(Self {
            id: document.id,
            rules,
        })
    }

    #[must_use]
    pub fn with_rule(mut self, style_id: impl Into<String>, rule: SkinRule) -> Self {
        self.rules.insert(style_id.into(), rule);
        self
    }

    pub fn set_rule(&mut self, style_id: impl Into<String>, rule: SkinRule) {
        self.rules.insert(style_id.into(), rule);
    }

    #[must_use]
    pub fn rule(&self, style_id: &str) -> Option<&SkinRule> {
        self.rules.get(style_id)
    }

    #[must_use]
    pub fn skin_id(&self) -> &str {
        &self.id
    }

    /// Merge the rules matching `complete_id`, from the plain id up to the
    /// full dotted path.
    #[must_use]
    pub fn resolve(&self, complete_id: &str) -> (ResolvedLayoutStyle, ResolvedColorStyle) {
        let mut layout = LayoutStyle::default();
        let mut colors = ColorStyle::default();

        let segments = complete_id.split('.').collect::<Vec<_>>();
        for start in (0..segments.len()).rev() {
            let key = segments[start..].join(".");
            if let Some(rule) = self.rules.get(&key) {
                merge_layout(&mut layout, &rule.layout);
                merge_colors(&mut colors, &rule.colors);
            }
        }

        (
            ResolvedLayoutStyle {
                padding: layout.padding.unwrap_or(0.0),
                gap: layout.gap.unwrap_or(0.0),
                corner_radius: layout.corner_radius.unwrap_or(0.0),
                border_width: layout.border_width.unwrap_or(0.0),
            },
            ResolvedColorStyle {
                bg: colors.bg,
                text: colors.text,
                border: colors.border,
            },
        )
    }

    fn install(&self, world: &mut World, entity: Entity) -> StyleResult<()> {
        let complete_id = world.complete_style_id(entity)?;
        let (layout, colors) = self.resolve(&complete_id);
        trace!(?entity, skin = %self.id, style_id = %complete_id, "installing sheet style");

        let style = AppliedSkinStyle {
            skin: self.id.clone(),
            style_id: complete_id,
            layout,
            colors,
        };
        world
            .get_entity_mut(entity)
            .map_err(|_| StyleError::destroyed(entity))?
            .insert(style);
        Ok(())
    }

    /// Built-in light skin.
    #[must_use]
    pub fn light() -> Self {
        Self::builtin(
            Self::LIGHT,
            Palette {
                surface: Rgba::opaque(0xf4, 0xf5, 0xf7),
                field: Rgba::opaque(0xff, 0xff, 0xff),
                text: Rgba::opaque(0x1f, 0x23, 0x28),
                border: Rgba::opaque(0xc4, 0xc9, 0xd0),
            },
        )
    }

    /// Built-in dark skin.
    #[must_use]
    pub fn dark() -> Self {
        Self::builtin(
            Self::DARK,
            Palette {
                surface: Rgba::opaque(0x2b, 0x2d, 0x30),
                field: Rgba::opaque(0x1e, 0x1f, 0x22),
                text: Rgba::opaque(0xdf, 0xe1, 0xe5),
                border: Rgba::opaque(0x4e, 0x51, 0x57),
            },
        )
    }

    fn builtin(id: &str, palette: Palette) -> Self {
        let field = SkinRule {
            layout: LayoutStyle {
                padding: Some(4.0),
                corner_radius: Some(3.0),
                border_width: Some(1.0),
                ..LayoutStyle::default()
            },
            colors: ColorStyle {
                bg: Some(palette.field),
                text: Some(palette.text),
                border: Some(palette.border),
            },
        };

        Self::new(id)
            .with_rule(
                StyleId::FALLBACK.id().unwrap_or_default(),
                SkinRule {
                    colors: ColorStyle {
                        text: Some(palette.text),
                        ..ColorStyle::default()
                    },
                    ..SkinRule::default()
                },
            )
            .with_rule(
                StyleId::PANEL.id().unwrap_or_default(),
                SkinRule {
                    layout: LayoutStyle {
                        padding: Some(8.0),
                        gap: Some(6.0),
                        ..LayoutStyle::default()
                    },
                    colors: ColorStyle {
                        bg: Some(palette.surface),
                        text: Some(palette.text),
                        border: None,
                    },
                },
            )
            .with_rule(StyleId::DATE_FIELD.id().unwrap_or_default(), field)
            .with_rule(
                StyleId::COLOR_CHOOSER.id().unwrap_or_default(),
                SkinRule {
                    layout: LayoutStyle {
                        gap: Some(8.0),
                        ..field.layout
                    },
                    colors: ColorStyle {
                        bg: Some(palette.surface),
                        ..field.colors
                    },
                },
            )
    }
}

struct Palette {
    surface: Rgba,
    field: Rgba,
    text: Rgba,
    border: Rgba,
}

impl Skin for SheetSkin {
    fn id(&self) -> &str {
        &self.id
    }

    fn apply(&self, world: &mut World, entity: Entity) -> StyleResult<()> {
        self.install(world, entity)
    }

    fn remove(&self, world: &mut World, entity: Entity) -> StyleResult<()> {
        world
            .get_entity_mut(entity)
            .map_err(|_| StyleError::destroyed(entity))?
            .remove::<AppliedSkinStyle>();
        Ok(())
    }

    fn update(&self, world: &mut World, entity: Entity) -> StyleResult<()> {
        self.install(world, entity)
    }
}
