use bevy_app::App;

use crate::{
    controls::SkinnableControl,
    error::StyleResult,
    manager::{DefaultStyleIds, StyleManager, StyleWorldExt},
    sheet_skin::SheetSkin,
    skin::SkinHandle,
};

/// Fluent extension methods for configuring skins on a Bevy [`App`].
///
/// # Example
///
/// ```no_run
/// use bevy_skins::{AppSkinningExt, SkinningPlugin, bevy_app::App};
///
/// let mut app = App::new();
/// app.add_plugins(SkinningPlugin::default());
/// app.register_skin_ron(r##"(id: "ocean", rules: { "panel": (colors: (bg: Hex("#102030"))) })"##)
///     .expect("ocean skin should parse")
///     .set_global_skin_id("ocean")
///     .expect("ocean skin was just registered");
/// ```
pub trait AppSkinningExt {
    /// Register a control type and its default style id.
    ///
    /// Last registration wins when an entity carries several control types.
    fn register_skinnable_control<T: SkinnableControl>(&mut self) -> &mut Self;

    /// Add a skin to the registry, replacing any skin with the same id.
    fn register_skin(&mut self, skin: impl Into<SkinHandle>) -> &mut Self;

    /// Parse a RON skin document and register it.
    fn register_skin_ron(&mut self, text: &str) -> StyleResult<&mut Self>;

    /// Make a registered skin the global skin.
    fn set_global_skin_id(&mut self, id: &str) -> StyleResult<&mut Self>;
}

impl AppSkinningExt for App {
    fn register_skinnable_control<T: SkinnableControl>(&mut self) -> &mut Self {
        self.init_resource::<DefaultStyleIds>();
        self.world_mut()
            .resource_mut::<DefaultStyleIds>()
            .register::<T>(T::default_style_id());
        self
    }

    fn register_skin(&mut self, skin: impl Into<SkinHandle>) -> &mut Self {
        let skin = skin.into();
        self.init_resource::<StyleManager>();
        if let Some(replaced) = self
            .world_mut()
            .resource_mut::<StyleManager>()
            .register_skin(skin)
        {
            tracing::debug!(skin = replaced.id(), "replaced registered skin");
        }
        self
    }

    fn register_skin_ron(&mut self, text: &str) -> StyleResult<&mut Self> {
        let skin = SheetSkin::from_ron(text)?;
        Ok(self.register_skin(skin))
    }

    fn set_global_skin_id(&mut self, id: &str) -> StyleResult<&mut Self> {
        self.world_mut().set_global_skin_id(id)?;
        Ok(self)
    }
}
