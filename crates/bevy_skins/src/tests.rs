use std::sync::{Arc, Mutex};

use crate::{
    AppSkinningExt, AppliedSkinStyle, Cascade, CustomPainter, DefaultStyleIds, FnStyleListener,
    RendererHooks, SheetSkin, Skin, SkinHandle, SkinnableUi, SkinningPlugin, StyleError,
    StyleEvent, StyleEventQueue, StyleId, StyleIdProperty, StyleListener, StyleManager,
    StyleRecord, StyleResult, StyleWorldExt, UiDateField, UiPanel,
};
use bevy_app::App;
use bevy_ecs::{hierarchy::ChildOf, prelude::*};

type SkinLog = Arc<Mutex<Vec<String>>>;

struct RecordingSkin {
    id: &'static str,
    log: SkinLog,
    fail_apply: bool,
}

impl RecordingSkin {
    fn record(&self, step: &str) {
        self.log
            .lock()
            .expect("skin log lock")
            .push(format!("{}:{step}", self.id));
    }
}

impl Skin for RecordingSkin {
    fn id(&self) -> &str {
        self.id
    }

    fn apply(&self, _world: &mut World, entity: Entity) -> StyleResult<()> {
        if self.fail_apply {
            return Err(StyleError::skin_install(self.id, entity, "renderer rejected skin"));
        }
        self.record("apply");
        Ok(())
    }

    fn remove(&self, _world: &mut World, _entity: Entity) -> StyleResult<()> {
        self.record("remove");
        Ok(())
    }

    fn update(&self, _world: &mut World, _entity: Entity) -> StyleResult<()> {
        self.record("update");
        Ok(())
    }
}

fn recording(id: &'static str, log: &SkinLog) -> SkinHandle {
    SkinHandle::new(RecordingSkin {
        id,
        log: log.clone(),
        fail_apply: false,
    })
}

fn failing(id: &'static str, log: &SkinLog) -> SkinHandle {
    SkinHandle::new(RecordingSkin {
        id,
        log: log.clone(),
        fail_apply: true,
    })
}

fn styled_world() -> World {
    let mut world = World::new();
    world.init_resource::<StyleManager>();
    world.init_resource::<StyleEventQueue>();

    let mut defaults = DefaultStyleIds::default();
    defaults
        .register::<UiPanel>(StyleId::PANEL)
        .register::<UiDateField>(StyleId::DATE_FIELD);
    world.insert_resource(defaults);
    world
}

fn drain(world: &World) -> Vec<StyleEvent> {
    world.resource::<StyleEventQueue>().drain_all()
}

fn log_entries(log: &SkinLog) -> Vec<String> {
    log.lock().expect("skin log lock").clone()
}

#[test]
fn default_style_id_is_reported_and_reassigning_it_is_silent() {
    let mut world = styled_world();
    let panel = world.spawn(UiPanel).id();
    let field = world.spawn(UiDateField::default()).id();
    let plain = world.spawn(SkinnableUi).id();

    assert_eq!(world.style_id(panel).expect("panel id"), StyleId::PANEL);
    assert_eq!(world.style_id(field).expect("field id"), StyleId::DATE_FIELD);
    assert_eq!(world.style_id(plain).expect("plain id"), StyleId::FALLBACK);

    let previous = world
        .set_style_id(panel, StyleId::PANEL)
        .expect("assigning the default id");
    assert_eq!(previous, StyleId::PANEL);
    world
        .set_style_id(panel, StyleId::auto())
        .expect("assigning an auto id");

    assert!(drain(&world).is_empty());
}

#[test]
fn assigned_style_id_round_trips_with_one_notification() {
    let mut world = styled_world();
    let panel = world.spawn(UiPanel).id();

    let previous = world
        .set_style_id(panel, "toolbar")
        .expect("assigning toolbar id");
    assert_eq!(previous, StyleId::PANEL);
    assert_eq!(world.style_id(panel).expect("panel id"), StyleId::new("toolbar"));

    let events = drain(&world);
    assert_eq!(
        events,
        vec![StyleEvent::StyleChanged {
            entity: panel,
            old: StyleId::PANEL,
            new: StyleId::new("toolbar"),
        }]
    );

    world
        .set_style_id(panel, "toolbar")
        .expect("assigning the same id again");
    assert!(drain(&world).is_empty());
}

#[test]
fn style_children_follow_the_parent_reference() {
    let mut world = styled_world();
    let first = world.spawn(UiPanel).id();
    let second = world.spawn(UiPanel).id();
    let child = world.spawn(UiPanel).id();

    world
        .set_style_id(child, StyleId::with_parent("button", first))
        .expect("link under first parent");
    assert_eq!(
        world.style_record(first).style_children().expect("first children"),
        vec![child]
    );
    assert_eq!(world.complete_style_id(child).expect("complete id"), "panel.button");

    world
        .set_style_id(child, StyleId::with_parent("button", second))
        .expect("move under second parent");
    assert!(world
        .style_record(first)
        .style_children()
        .expect("first children")
        .is_empty());
    assert_eq!(
        world.style_record(second).style_children().expect("second children"),
        vec![child]
    );

    world
        .set_style_id(child, "button")
        .expect("detach from parents");
    assert!(world
        .style_record(second)
        .style_children()
        .expect("second children")
        .is_empty());
}

#[test]
fn linking_to_a_despawned_parent_fails_without_side_effects() {
    let mut world = styled_world();
    let parent = world.spawn(UiPanel).id();
    let child = world.spawn(UiPanel).id();
    world.despawn(parent);

    let error = world
        .set_style_id(child, StyleId::with_parent("button", parent))
        .expect_err("parent is gone");
    assert_eq!(error, StyleError::ComponentDestroyed { entity: parent });
    assert_eq!(world.style_id(child).expect("child id"), StyleId::PANEL);
    assert!(drain(&world).is_empty());
}

#[test]
fn applying_a_skin_fires_changed_then_updated_and_reapplying_is_silent() {
    let log = SkinLog::default();
    let mut world = styled_world();
    let panel = world.spawn(UiPanel).id();
    let skin = recording("light", &log);

    let previous = world
        .apply_skin(panel, skin.clone(), false)
        .expect("first apply");
    assert!(previous.is_none());

    let events = drain(&world);
    assert_eq!(events.len(), 2);
    assert!(matches!(
        &events[0],
        StyleEvent::SkinChanged { entity, old: None, new: Some(new) } if *entity == panel && *new == skin
    ));
    assert!(matches!(
        &events[1],
        StyleEvent::SkinUpdated { entity, style_id } if *entity == panel && *style_id == StyleId::PANEL
    ));

    let previous = world
        .apply_skin(panel, skin.clone(), true)
        .expect("same skin again");
    assert_eq!(previous, Some(skin));
    assert!(drain(&world).is_empty());
    assert_eq!(log_entries(&log), vec!["light:apply"]);
}

#[test]
fn cascade_skips_pinned_children_unless_forced() {
    let log = SkinLog::default();
    let mut world = styled_world();
    let parent = world.spawn(UiPanel).id();
    let loose = world.spawn(UiPanel).id();
    let pinned = world.spawn(UiPanel).id();
    for child in [loose, pinned] {
        world
            .set_style_id(child, StyleId::with_parent("item", parent))
            .expect("link child");
    }

    let custom = recording("custom", &log);
    let shared = recording("shared", &log);
    let forced = recording("forced", &log);

    world
        .set_skin(pinned, custom.clone(), false)
        .expect("custom skin");
    assert!(world.is_skin_pinned(pinned).expect("pin state"));

    world
        .apply_skin(parent, shared.clone(), true)
        .expect("cascading apply");
    assert_eq!(world.skin(loose).expect("loose skin"), Some(shared.clone()));
    assert_eq!(world.skin(pinned).expect("pinned skin"), Some(custom));

    world
        .style_record(parent)
        .apply_skin_with(forced.clone(), Cascade::Forced)
        .expect("forced apply");
    assert_eq!(world.skin(pinned).expect("pinned skin"), Some(forced.clone()));
    assert_eq!(world.skin(loose).expect("loose skin"), Some(forced));
    assert!(!world.is_skin_pinned(pinned).expect("pin state"));
}

#[test]
fn custom_skin_survives_global_skin_changes_until_reset() {
    let log = SkinLog::default();
    let mut world = styled_world();
    let custom_panel = world.spawn(UiPanel).id();
    let plain_panel = world.spawn(UiPanel).id();
    world.skin(plain_panel).expect("create record");

    let custom = recording("custom", &log);
    let global = recording("global", &log);

    world
        .set_skin(custom_panel, custom.clone(), false)
        .expect("custom skin");
    let previous = world.set_global_skin(global.clone());
    assert!(previous.is_none());

    assert_eq!(world.skin(plain_panel).expect("plain skin"), Some(global.clone()));
    assert_eq!(world.skin(custom_panel).expect("custom skin"), Some(custom.clone()));

    // A non-global skin is kept on reset.
    assert_eq!(
        world.reset_skin(custom_panel).expect("reset custom"),
        Some(custom)
    );
    assert!(world.is_skin_pinned(custom_panel).expect("pin state"));

    world
        .apply_skin(custom_panel, global.clone(), false)
        .expect("apply global");
    world.pin_skin(custom_panel, true).expect("pin");
    assert_eq!(
        world.reset_skin(custom_panel).expect("reset global"),
        Some(global)
    );
    assert!(!world.is_skin_pinned(custom_panel).expect("pin state"));
}

#[test]
fn recursive_custom_skin_walks_through_non_skinnable_containers() {
    let log = SkinLog::default();
    let mut world = styled_world();
    let root = world.spawn(UiPanel).id();
    let direct = world.spawn((UiPanel, ChildOf(root))).id();
    let spacer = world.spawn(ChildOf(root)).id();
    let nested = world.spawn((UiPanel, ChildOf(spacer))).id();

    let custom = recording("custom", &log);
    world
        .set_skin(root, custom.clone(), true)
        .expect("recursive custom skin");

    for entity in [root, direct, nested] {
        assert_eq!(world.skin(entity).expect("skin"), Some(custom.clone()));
        assert!(world.is_skin_pinned(entity).expect("pin state"));
    }
    assert!(world.get::<StyleRecord>(spacer).is_none());
}

#[test]
fn recursive_reset_tolerates_listeners_restructuring_children() {
    let mut world = styled_world();
    let parent = world.spawn(UiPanel).id();
    let children = (0..5)
        .map(|index| {
            let child = world.spawn(UiPanel).id();
            world
                .set_style_id(child, StyleId::with_parent(format!("item{index}"), parent))
                .expect("link child");
            child
        })
        .collect::<Vec<_>>();

    let moved = children[3];
    world
        .add_style_listener(
            children[0],
            Arc::new(FnStyleListener::new(move |world: &mut World, event: &StyleEvent| {
                if matches!(event, StyleEvent::StyleChanged { .. }) {
                    world
                        .set_style_id(moved, "detached")
                        .expect("listener reassigns a sibling");
                }
            })),
        )
        .expect("subscribe");
    drain(&world);

    world.reset_style_id(parent, true).expect("recursive reset");

    for child in &children {
        assert_eq!(world.style_id(*child).expect("child id"), StyleId::PANEL);
    }
    assert!(world
        .style_record(parent)
        .style_children()
        .expect("parent children")
        .is_empty());

    let changes = drain(&world)
        .into_iter()
        .filter(|event| matches!(event, StyleEvent::StyleChanged { .. }))
        .count();
    // One reset per child plus the listener's reassignment.
    assert_eq!(changes, children.len() + 1);
}

#[test]
fn linked_child_adopts_parent_skin() {
    let log = SkinLog::default();
    let mut world = styled_world();
    let parent = world.spawn(UiPanel).id();
    let child = world.spawn(UiPanel).id();
    let parent_skin = recording("parent", &log);
    let child_skin = recording("child", &log);

    world
        .apply_skin(parent, parent_skin.clone(), false)
        .expect("parent skin");
    world
        .apply_skin(child, child_skin.clone(), false)
        .expect("child skin");
    drain(&world);

    world
        .set_style_id(child, StyleId::with_parent("button", parent))
        .expect("link child");
    assert_eq!(world.skin(child).expect("child skin"), Some(parent_skin.clone()));

    let events = world.resource::<StyleEventQueue>().drain_for(child);
    assert_eq!(events.len(), 3);
    assert!(matches!(
        &events[0],
        StyleEvent::SkinChanged { old: Some(old), new: Some(new), .. }
            if *old == child_skin && *new == parent_skin
    ));
    assert!(matches!(&events[1], StyleEvent::SkinUpdated { .. }));
    assert!(matches!(&events[2], StyleEvent::StyleChanged { .. }));
}

#[test]
fn relinking_with_the_same_skin_only_refreshes() {
    let log = SkinLog::default();
    let mut world = styled_world();
    let parent = world.spawn(UiPanel).id();
    let child = world.spawn(UiPanel).id();
    let skin = recording("shared", &log);
    world.set_global_skin(skin.clone());
    world.apply_skin(parent, skin.clone(), false).expect("parent");
    world.apply_skin(child, skin, false).expect("child");
    drain(&world);

    world
        .set_style_id(child, StyleId::with_parent("button", parent))
        .expect("link child");

    let events = drain(&world);
    assert_eq!(events.len(), 2);
    assert!(matches!(
        &events[0],
        StyleEvent::SkinUpdated { entity, style_id }
            if *entity == child && *style_id == StyleId::with_parent("button", parent)
    ));
    assert!(matches!(&events[1], StyleEvent::StyleChanged { .. }));
}

#[test]
fn update_skin_refreshes_the_style_subtree_in_pre_order() {
    let log = SkinLog::default();
    let mut world = styled_world();
    let parent = world.spawn(UiPanel).id();
    let child = world.spawn(UiPanel).id();
    world
        .set_style_id(child, StyleId::with_parent("button", parent))
        .expect("link child");
    world
        .apply_skin(parent, recording("shared", &log), true)
        .expect("cascading apply");
    drain(&world);
    log.lock().expect("skin log lock").clear();

    world.update_skin(parent, true).expect("update");

    let updated = drain(&world)
        .into_iter()
        .map(|event| match event {
            StyleEvent::SkinUpdated { entity, .. } => entity,
            other => panic!("unexpected notification {other:?}"),
        })
        .collect::<Vec<_>>();
    assert_eq!(updated, vec![parent, child]);
    assert_eq!(log_entries(&log), vec!["shared:update", "shared:update"]);
}

#[test]
fn remove_skin_is_silent() {
    let log = SkinLog::default();
    let mut world = styled_world();
    let panel = world.spawn(UiPanel).id();
    let skin = recording("light", &log);
    world.apply_skin(panel, skin.clone(), false).expect("apply");
    drain(&world);

    assert_eq!(world.remove_skin(panel).expect("remove"), Some(skin));
    assert_eq!(world.skin(panel).expect("skin"), None);
    assert_eq!(world.remove_skin(panel).expect("remove again"), None);
    assert!(drain(&world).is_empty());
    assert_eq!(log_entries(&log), vec!["light:apply", "light:remove"]);
}

#[test]
fn failed_installation_leaves_the_entity_unskinned() {
    let log = SkinLog::default();
    let mut world = styled_world();
    let panel = world.spawn(UiPanel).id();
    let working = recording("working", &log);
    world.apply_skin(panel, working.clone(), false).expect("apply");
    drain(&world);

    let error = world
        .apply_skin(panel, failing("broken", &log), false)
        .expect_err("broken skin");
    assert!(matches!(error, StyleError::SkinInstall { ref skin, .. } if skin == "broken"));
    assert_eq!(world.skin(panel).expect("skin"), None);
    assert!(drain(&world).is_empty());
    assert_eq!(log_entries(&log), vec!["working:apply", "working:remove"]);

    world.apply_skin(panel, working.clone(), false).expect("re-apply");
    assert_eq!(world.skin(panel).expect("skin"), Some(working));
}

#[test]
fn cascade_continues_past_a_failing_child() {
    struct PickySkin(Entity);

    impl Skin for PickySkin {
        fn id(&self) -> &str {
            "picky"
        }

        fn apply(&self, _world: &mut World, entity: Entity) -> StyleResult<()> {
            if entity == self.0 {
                Err(StyleError::skin_install("picky", entity, "unsupported"))
            } else {
                Ok(())
            }
        }

        fn remove(&self, _world: &mut World, _entity: Entity) -> StyleResult<()> {
            Ok(())
        }

        fn update(&self, _world: &mut World, _entity: Entity) -> StyleResult<()> {
            Ok(())
        }
    }

    let mut world = styled_world();
    let parent = world.spawn(UiPanel).id();
    let rejected = world.spawn(UiPanel).id();
    let accepted = world.spawn(UiPanel).id();
    for child in [rejected, accepted] {
        world
            .set_style_id(child, StyleId::with_parent("item", parent))
            .expect("link child");
    }

    let picky = SkinHandle::new(PickySkin(rejected));
    world
        .apply_skin(parent, picky.clone(), true)
        .expect("parent accepts");

    assert_eq!(world.skin(rejected).expect("rejected skin"), None);
    assert_eq!(world.skin(accepted).expect("accepted skin"), Some(picky));
}

#[test]
fn style_cycles_terminate() {
    let log = SkinLog::default();
    let mut world = styled_world();
    let alpha = world.spawn(UiPanel).id();
    let beta = world.spawn(UiPanel).id();

    world
        .set_style_id(alpha, StyleId::with_parent("alpha", beta))
        .expect("alpha under beta");
    world
        .set_style_id(beta, StyleId::with_parent("beta", alpha))
        .expect("beta under alpha");

    let skin = recording("shared", &log);
    world.apply_skin(alpha, skin.clone(), true).expect("apply");
    assert_eq!(world.skin(beta).expect("beta skin"), Some(skin));
    assert_eq!(world.complete_style_id(alpha).expect("complete id"), "beta.alpha");
    world.reset_style_id(alpha, true).expect("recursive reset");
    world.update_skin(beta, true).expect("update");
}

#[test]
fn destroyed_entities_always_report_component_destroyed() {
    let log = SkinLog::default();
    let mut world = styled_world();
    let panel = world.spawn(UiPanel).id();
    world
        .apply_skin(panel, recording("light", &log), false)
        .expect("apply");
    world.despawn(panel);

    let destroyed = StyleError::ComponentDestroyed { entity: panel };
    for _ in 0..2 {
        assert_eq!(world.style_id(panel), Err(destroyed.clone()));
        assert_eq!(world.skin(panel), Err(destroyed.clone()));
        assert_eq!(
            world.set_style_id(panel, "toolbar"),
            Err(destroyed.clone())
        );
        assert_eq!(
            world.apply_skin(panel, recording("dark", &log), true),
            Err(destroyed.clone())
        );
        assert_eq!(world.update_skin(panel, true), Err(destroyed.clone()));
        assert_eq!(world.reset_skin(panel), Err(destroyed.clone()));
        assert_eq!(world.remove_skin(panel), Err(destroyed.clone()));
        assert!(world.custom_painters(panel).is_err_and(|error| error.is_destroyed()));
    }
}

#[test]
fn incompatible_renderers_get_one_reinstall_attempt() {
    let mut world = styled_world();
    let plain = world.spawn_empty().id();
    let panel = world.spawn(UiPanel).id();
    world.entity_mut(panel).remove::<SkinnableUi>();

    assert_eq!(
        world.style_id(plain),
        Err(StyleError::IncompatibleRenderer { entity: plain })
    );
    assert!(world.get::<StyleRecord>(plain).is_none());

    assert_eq!(world.style_id(panel).expect("reinstalled"), StyleId::PANEL);
    assert!(world.get::<SkinnableUi>(panel).is_some());

    world.insert_resource(RendererHooks {
        is_compatible: |_, _| false,
        reinstall: |_, _| {},
    });
    assert_eq!(
        world.skin(panel),
        Err(StyleError::IncompatibleRenderer { entity: panel })
    );
}

#[test]
fn listeners_can_unsubscribe() {
    #[derive(Default)]
    struct Counter(Mutex<usize>);

    impl StyleListener for Counter {
        fn style_changed(&self, _world: &mut World, _entity: Entity, _old: &StyleId, _new: &StyleId) {
            *self.0.lock().expect("counter lock") += 1;
        }
    }

    let mut world = styled_world();
    let panel = world.spawn(UiPanel).id();
    let counter = Arc::new(Counter::default());

    let id = world
        .add_style_listener(panel, counter.clone())
        .expect("subscribe");
    world.set_style_id(panel, "first").expect("first id");
    assert!(world.remove_style_listener(panel, id).expect("unsubscribe"));
    assert!(!world.remove_style_listener(panel, id).expect("unsubscribe again"));
    world.set_style_id(panel, "second").expect("second id");

    assert_eq!(*counter.0.lock().expect("counter lock"), 1);
}

#[test]
fn custom_painters_are_stored_per_name() {
    let mut world = styled_world();
    let chooser = world.spawn(UiPanel).id();

    assert!(world.custom_painters(chooser).expect("painters").is_empty());
    let replaced = world
        .set_custom_painter(chooser, "background", CustomPainter::new(0x3366ff_u32))
        .expect("store painter");
    assert!(replaced.is_none());

    let painter = world
        .custom_painter(chooser, "background")
        .expect("painter lookup")
        .expect("stored painter");
    assert_eq!(painter.downcast_ref::<u32>(), Some(&0x3366ff));

    assert!(world.reset_custom_painters(chooser).expect("reset"));
    assert!(!world.reset_custom_painters(chooser).expect("reset again"));
}

#[test]
fn forgetting_a_record_unlinks_it_from_its_parent() {
    let mut world = styled_world();
    let parent = world.spawn(UiPanel).id();
    let child = world.spawn(UiPanel).id();
    world
        .set_style_id(child, StyleId::with_parent("button", parent))
        .expect("link child");

    assert!(world.forget_style_record(child));
    assert!(!world.forget_style_record(child));
    assert!(world
        .style_record(parent)
        .style_children()
        .expect("parent children")
        .is_empty());
    assert_eq!(world.style_id(child).expect("fresh record"), StyleId::PANEL);
}

#[test]
fn forgetting_a_parent_record_detaches_its_style_children() {
    let log = SkinLog::default();
    let mut world = styled_world();
    let parent = world.spawn(UiPanel).id();
    let child = world.spawn(UiPanel).id();
    world
        .set_style_id(child, StyleId::with_parent("button", parent))
        .expect("link child");
    drain(&world);

    assert!(world.forget_style_record(parent));

    assert_eq!(world.style_id(child).expect("child id"), StyleId::new("button"));
    assert!(matches!(
        drain(&world).as_slice(),
        [StyleEvent::StyleChanged { entity, .. }] if *entity == child
    ));

    let skin = recording("fresh", &log);
    world.apply_skin(parent, skin, true).expect("apply to parent");
    assert!(world
        .style_record(parent)
        .style_children()
        .expect("parent children")
        .is_empty());
    assert_eq!(world.skin(child).expect("child skin"), None);

    world
        .set_style_id(child, StyleId::with_parent("button", parent))
        .expect("relink child");
    assert_eq!(
        world.style_record(parent).style_children().expect("parent children"),
        vec![child]
    );
}

#[test]
fn recursive_reset_skips_children_that_cannot_be_styled() {
    let mut world = styled_world();
    let parent = world.spawn(UiPanel).id();
    let stuck = world.spawn(SkinnableUi).id();
    let item = world.spawn(UiPanel).id();
    world.set_style_id(parent, "toolbar").expect("parent id");
    for child in [stuck, item] {
        world
            .set_style_id(child, StyleId::with_parent("item", parent))
            .expect("link child");
    }
    world.entity_mut(stuck).remove::<SkinnableUi>();

    world.reset_style_id(parent, true).expect("recursive reset");

    assert_eq!(world.style_id(item).expect("item id"), StyleId::PANEL);
    assert_eq!(world.style_id(parent).expect("parent id"), StyleId::PANEL);
    assert_eq!(
        world
            .get::<StyleRecord>(stuck)
            .and_then(StyleRecord::explicit_style_id)
            .and_then(StyleId::parent),
        Some(parent)
    );
}

#[test]
fn style_change_is_reported_when_the_skin_cannot_refresh() {
    struct StaleSkin;

    impl Skin for StaleSkin {
        fn id(&self) -> &str {
            "stale"
        }

        fn apply(&self, _world: &mut World, _entity: Entity) -> StyleResult<()> {
            Ok(())
        }

        fn remove(&self, _world: &mut World, _entity: Entity) -> StyleResult<()> {
            Ok(())
        }

        fn update(&self, _world: &mut World, entity: Entity) -> StyleResult<()> {
            Err(StyleError::skin_install("stale", entity, "cannot refresh"))
        }
    }

    let mut world = styled_world();
    let panel = world.spawn(UiPanel).id();
    world
        .apply_skin(panel, SkinHandle::new(StaleSkin), false)
        .expect("apply");
    drain(&world);

    assert!(world.set_style_id(panel, "toolbar").is_err());

    assert_eq!(world.style_id(panel).expect("panel id"), StyleId::new("toolbar"));
    assert_eq!(
        drain(&world),
        vec![StyleEvent::StyleChanged {
            entity: panel,
            old: StyleId::PANEL,
            new: StyleId::new("toolbar"),
        }]
    );
}

#[test]
fn plugin_installs_global_skin_on_new_controls() {
    let mut app = App::new();
    app.add_plugins(SkinningPlugin::default());

    let panel = app.world_mut().spawn(UiPanel).id();
    app.update();

    let world = app.world_mut();
    let skin = world.skin(panel).expect("panel skin").expect("global skin");
    assert_eq!(skin.id(), SheetSkin::LIGHT);
    assert!(!world.is_skin_pinned(panel).expect("pin state"));

    let applied = world
        .get::<AppliedSkinStyle>(panel)
        .expect("sheet style installed");
    assert_eq!(applied.skin, SheetSkin::LIGHT);
    assert_eq!(applied.style_id, "panel");
    assert!(applied.colors.bg.is_some());
}

#[test]
fn style_id_property_drives_assignment_and_reset() {
    let mut app = App::new();
    app.add_plugins(SkinningPlugin::default());

    let toolbar = app.world_mut().spawn(UiPanel).id();
    let button = app
        .world_mut()
        .spawn((UiPanel, StyleIdProperty(StyleId::with_parent("button", toolbar))))
        .id();
    app.update();

    {
        let world = app.world_mut();
        assert_eq!(world.complete_style_id(button).expect("complete id"), "panel.button");
        let applied = world.get::<AppliedSkinStyle>(button).expect("sheet style");
        assert_eq!(applied.style_id, "panel.button");
    }

    app.world_mut().entity_mut(button).remove::<StyleIdProperty>();
    app.update();

    let world = app.world_mut();
    assert_eq!(world.style_id(button).expect("reset id"), StyleId::PANEL);
    assert!(world
        .style_record(toolbar)
        .style_children()
        .expect("toolbar children")
        .is_empty());
}

#[test]
fn style_id_property_drops_dead_parents() {
    let mut app = App::new();
    app.add_plugins(SkinningPlugin::default());

    let gone = app.world_mut().spawn(UiPanel).id();
    app.world_mut().despawn(gone);
    let panel = app
        .world_mut()
        .spawn((UiPanel, StyleIdProperty(StyleId::with_parent("button", gone))))
        .id();
    app.update();

    assert_eq!(
        app.world_mut().style_id(panel).expect("normalized id"),
        StyleId::new("button")
    );
}

#[test]
fn global_skin_switch_reaches_unpinned_entities_only() {
    let mut app = App::new();
    app.add_plugins(SkinningPlugin::default());

    let follower = app.world_mut().spawn(UiPanel).id();
    let pinned = app.world_mut().spawn(UiPanel).id();
    app.update();

    let world = app.world_mut();
    let light = world.skin(pinned).expect("skin").expect("light skin");
    world.set_skin(pinned, light, false).expect("pin light");

    world.set_global_skin_id(SheetSkin::DARK).expect("dark skin registered");
    assert_eq!(
        world.skin(follower).expect("skin").map(|skin| skin.id().to_owned()),
        Some(SheetSkin::DARK.to_owned())
    );
    assert_eq!(
        world.skin(pinned).expect("skin").map(|skin| skin.id().to_owned()),
        Some(SheetSkin::LIGHT.to_owned())
    );

    assert_eq!(
        world.set_global_skin_id("missing"),
        Err(StyleError::UnknownSkin("missing".to_owned()))
    );
}

#[test]
fn ron_skins_can_become_the_global_skin() {
    let mut app = App::new();
    app.add_plugins(SkinningPlugin { initial_skin: None })
        .register_skin_ron(
            r##"(
                id: "ocean",
                rules: {
                    "panel": (layout: (padding: 12.0), colors: (bg: Hex("#0b3d5c"))),
                },
            )"##,
        )
        .expect("ocean skin should parse");

    let panel = app.world_mut().spawn(UiPanel).id();
    app.update();
    assert!(app.world_mut().skin(panel).expect("skin").is_none());

    app.set_global_skin_id("ocean").expect("ocean registered");
    let applied = app
        .world()
        .get::<AppliedSkinStyle>(panel)
        .expect("ocean style installed");
    assert_eq!(applied.layout.padding, 12.0);
    assert_eq!(applied.skin, "ocean");
}

#[test]
fn despawned_style_children_are_pruned() {
    let mut app = App::new();
    app.add_plugins(SkinningPlugin::default());

    let parent = app.world_mut().spawn(UiPanel).id();
    let child = app.world_mut().spawn(UiPanel).id();
    app.world_mut()
        .set_style_id(child, StyleId::with_parent("button", parent))
        .expect("link child");

    app.world_mut().despawn(child);
    app.update();

    let record = app
        .world()
        .get::<StyleRecord>(parent)
        .expect("parent record");
    assert!(record.style_children().is_empty());
}
