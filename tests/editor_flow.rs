//! End-to-end editing session against the in-memory scene and a recording
//! store. Store replies are fed back through the event sender the same way
//! a host's subscription callbacks would.

use level_editor::camera::Camera;
use level_editor::chunk::{ChunkCoord, ChunkState};
use level_editor::config::EditorConfig;
use level_editor::engine::EditorCore;
use level_editor::events::EditorEvent;
use level_editor::geom::Vector;
use level_editor::input::{Button, Key, Modifiers, Tool};
use level_editor::object::ObjectRecord;
use level_editor::render::MemoryScene;
use level_editor::settings::{KeyValueStorage, MemoryStorage, SETTINGS_KEY, SettingKey};
use level_editor::store::{RecordingStore, RequestId, StoreCall, SubscriptionId};

type Core = EditorCore<MemoryScene, RecordingStore, MemoryStorage>;

fn init_tracing() {
    if tracing_subscriber::fmt().with_test_writer().try_init().is_err() {
        // already installed by another test in this binary
    }
}

fn start(storage: MemoryStorage) -> Core {
    init_tracing();
    let camera = Camera::new(Vector::new(300.0, 300.0), 0);
    let mut core = Core::new(MemoryScene::new(), RecordingStore::new(), storage, EditorConfig::default(), camera);
    core.set_viewport(400.0, 400.0);
    core.tick(0.0);
    core
}

fn click(core: &mut Core, world: Vector) {
    let screen = core.camera().world_to_screen(world, core.viewport());
    core.on_pointer_down(screen, Button::Primary, Modifiers::default());
    core.on_pointer_up(screen, Button::Primary, Modifiers::default());
}

fn subscription_of(core: &Core, coord: ChunkCoord) -> SubscriptionId {
    core.streamer().chunk(coord).and_then(|c| c.subscription).unwrap()
}

#[test]
fn place_select_delete_and_evict() {
    let origin = ChunkCoord::new(0, 0);
    let mut core = start(MemoryStorage::new());
    assert_eq!(core.store().subscribed_chunks(), vec![origin]);
    let sub = subscription_of(&core, origin);

    // Empty snapshot marks the chunk loaded.
    core.event_sender().send(EditorEvent::ChunkSnapshot { subscription: sub, objects: Vec::new() });
    core.tick(16.0);
    assert!(core.streamer().chunk(origin).unwrap().is_loaded());

    // Build: the preview snaps to the cell centre and a click writes it.
    core.begin_preview(ObjectRecord::new(8, Vector::ZERO));
    click(&mut core, Vector::new(322.0, 347.0));
    let (request, name, record) = match core.store().last_call() {
        Some(StoreCall::Put { request, chunk, name, record }) => {
            assert_eq!(*chunk, origin);
            (*request, name.clone(), record.clone())
        }
        other => panic!("expected a put, got {other:?}"),
    };
    assert_eq!(record.position(), Vector::new(315.0, 345.0));

    // The store echoes the write and settles it.
    let sender = core.event_sender();
    sender.send(EditorEvent::ObjectUpserted { subscription: sub, name: name.clone(), record });
    sender.send(EditorEvent::MutationSettled { request, result: Ok(()) });
    core.tick(32.0);
    assert!(core.streamer().object(origin, &name).is_some());
    assert_eq!(core.selection().pending_count(), 0);
    assert!(core.drain_notices().is_empty());

    // Edit: click selects, Delete asks the store to remove it.
    core.set_tool(Tool::Edit);
    assert!(core.selection().preview().is_none());
    click(&mut core, Vector::new(315.0, 345.0));
    assert!(core.selection().is_selected(origin, &name));
    assert!(core.on_key_down(&Key::new("Delete"), Modifiers::default()));
    assert!(matches!(
        core.store().last_call(),
        Some(StoreCall::Delete { chunk, name: deleted, .. }) if *chunk == origin && *deleted == name
    ));
    assert!(core.selection().selected().is_none());

    core.event_sender().send(EditorEvent::ObjectRemoved { subscription: sub, name: name.clone() });
    core.tick(48.0);
    assert!(core.streamer().object(origin, &name).is_none());

    // Pan far away: the chunk leaves view and is evicted once idle.
    core.set_camera(Camera::new(Vector::new(3_000.0, 300.0), 0));
    core.tick(100.0);
    assert!(!core.streamer().visible_set().contains(&origin));
    core.tick(20_000.0);
    assert_eq!(core.streamer().chunk(origin).unwrap().state, ChunkState::Unloaded);
    assert!(core.store().calls().iter().any(|call| matches!(call, StoreCall::Unsubscribe { subscription } if *subscription == sub)));
}

#[test]
fn rejected_write_reaches_the_host() {
    let mut core = start(MemoryStorage::new());
    core.begin_preview(ObjectRecord::new(1, Vector::ZERO));
    click(&mut core, Vector::new(400.0, 400.0));
    let request = match core.store().last_call() {
        Some(StoreCall::Put { request, .. }) => *request,
        other => panic!("expected a put, got {other:?}"),
    };
    core.event_sender().send(EditorEvent::MutationSettled {
        request,
        result: Err(level_editor::store::StoreError::PermissionDenied("read-only level".into())),
    });
    core.tick(16.0);
    let notices = core.drain_notices();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].message.starts_with("Failed to place object!"), "{}", notices[0].message);

    // Unknown settlements are ignored.
    core.event_sender().send(EditorEvent::MutationSettled { request: RequestId(9_999), result: Ok(()) });
    core.tick(32.0);
    assert!(core.drain_notices().is_empty());
}

#[test]
fn settings_survive_a_reload() {
    let mut core = start(MemoryStorage::new());
    core.toggle_setting(SettingKey::HideGround);
    core.set_setting(SettingKey::ShowTooltips, false);
    let saved = core.storage().get_item(SETTINGS_KEY).unwrap();

    let mut storage = MemoryStorage::new();
    storage.set_item(SETTINGS_KEY, &saved).unwrap();
    let reloaded = start(storage);
    assert!(reloaded.settings().get(SettingKey::HideGround));
    assert!(!reloaded.settings().get(SettingKey::ShowTooltips));
    assert!(!reloaded.tooltip().is_enabled());
    assert!(!reloaded.scene().node(reloaded.composer().ground()).unwrap().visible);
}

#[test]
fn wheel_zoom_keeps_the_point_under_the_cursor() {
    let mut core = start(MemoryStorage::new());
    let anchor = Vector::new(120.0, 80.0);
    let before = core.camera().screen_to_world(anchor, core.viewport());
    assert!(core.on_wheel(anchor, level_editor::input::WheelDelta { dx: 0.0, dy: -100.0 }, Modifiers::default()));
    let after = core.camera().screen_to_world(anchor, core.viewport());
    assert!((before - after).length() < 1e-6);
    assert_eq!(core.camera().zoom_level, 1);
}
