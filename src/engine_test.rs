#![allow(clippy::float_cmp)]

use super::*;
use crate::consts::SELECT_TINT;
use crate::notify::NoticeLevel;
use crate::render::MemoryScene;
use crate::settings::{MemoryStorage, SETTINGS_KEY};
use crate::store::{RecordingStore, RequestId, StoreCall, StoreError, SubscriptionId};

type Core = EditorCore<MemoryScene, RecordingStore, MemoryStorage>;

// =============================================================
// Helpers
// =============================================================

const VIEWPORT: Vector = Vector::new(400.0, 400.0);

fn c(i: i32, j: i32) -> ChunkCoord {
    ChunkCoord::new(i, j)
}

fn no_modifiers() -> Modifiers {
    Modifiers::default()
}

fn alt_modifier() -> Modifiers {
    Modifiers { alt: true, ..Default::default() }
}

/// Camera at (300, 300), zoom 0, 400x400 viewport: world x,y in
/// [100, 500] is on screen and only chunk (0,0) is visible.
fn core_with(storage: MemoryStorage) -> Core {
    let camera = Camera::new(Vector::new(300.0, 300.0), 0);
    let mut core = Core::new(MemoryScene::new(), RecordingStore::new(), storage, EditorConfig::default(), camera);
    core.set_viewport(VIEWPORT.x, VIEWPORT.y);
    core.tick(0.0);
    core
}

fn core() -> Core {
    core_with(MemoryStorage::new())
}

fn subscription(core: &Core, coord: ChunkCoord) -> SubscriptionId {
    core.streamer().chunk(coord).unwrap().subscription.unwrap()
}

/// Core with objects "a" at (315, 315) and "b" at (375, 315) in chunk (0,0).
fn populated() -> Core {
    let mut core = core();
    let sub = subscription(&core, c(0, 0));
    core.event_sender().send(EditorEvent::ChunkSnapshot {
        subscription: sub,
        objects: vec![
            ("a".into(), ObjectRecord::new(1, Vector::new(315.0, 315.0))),
            ("b".into(), ObjectRecord::new(1, Vector::new(375.0, 315.0))),
        ],
    });
    core.tick(1.0);
    core.store_mut().clear();
    core
}

fn screen_of(core: &Core, world: Vector) -> Vector {
    core.camera().world_to_screen(world, core.viewport())
}

fn click(core: &mut Core, screen: Vector) {
    core.on_pointer_down(screen, Button::Primary, no_modifiers());
    core.on_pointer_up(screen, Button::Primary, no_modifiers());
}

fn main_tint(core: &Core, name: &str) -> u32 {
    let node = core.streamer().object(c(0, 0), name).unwrap();
    let main = core.scene().child_by_name(node.root(), "main").unwrap();
    core.scene().node(main).unwrap().appearance.tint
}

fn last_request(core: &Core) -> RequestId {
    match core.store().last_call() {
        Some(
            StoreCall::Put { request, .. }
            | StoreCall::Delete { request, .. }
            | StoreCall::FetchPlacedBy { request, .. }
            | StoreCall::FetchDisplayColor { request, .. },
        ) => *request,
        other => panic!("unexpected call {other:?}"),
    }
}

// =============================================================
// Tick pipeline
// =============================================================

#[test]
fn first_tick_subscribes_visible_chunks() {
    let core = core();
    assert_eq!(core.store().subscribed_chunks(), vec![c(0, 0)]);
    assert!(core.streamer().chunk(c(0, 0)).unwrap().visible);
    assert_eq!(core.streamer().active_count(), 1);
}

#[test]
fn no_viewport_change_no_resubscribe() {
    let mut core = core();
    core.tick(16.0);
    core.tick(32.0);
    assert_eq!(core.store().subscribed_chunks().len(), 1);
}

#[test]
fn camera_is_clamped_each_tick() {
    let mut core = core();
    core.set_camera(Camera::new(Vector::new(-100.0, 5_000.0), 0));
    core.tick(16.0);
    assert_eq!(core.camera().pos, Vector::new(0.0, 2_400.0));
}

#[test]
fn grid_drawn_on_first_tick() {
    let core = core();
    let grid = core.scene().node(core.composer().grid()).unwrap();
    assert_eq!(grid.shapes.len(), 3001 + 81);
}

#[test]
fn snapshot_event_materializes_objects() {
    let core = populated();
    let chunk = core.streamer().chunk(c(0, 0)).unwrap();
    assert!(chunk.is_loaded());
    assert_eq!(chunk.object_count(), 2);
}

#[test]
fn panning_away_then_idle_unloads() {
    let mut core = populated();
    let old = subscription(&core, c(0, 0));
    core.set_camera(Camera::new(Vector::new(3_000.0, 300.0), 0));
    core.tick(1_000.0);
    assert!(!core.streamer().chunk(c(0, 0)).unwrap().visible);
    core.tick(5_000.0);
    assert!(core.streamer().chunk(c(0, 0)).unwrap().is_loaded());
    // The sweep at 10_002 sees only nine idle seconds.
    core.tick(10_002.0);
    assert!(core.streamer().chunk(c(0, 0)).unwrap().is_loaded());
    core.tick(15_002.0);
    assert_eq!(core.streamer().chunk(c(0, 0)).unwrap().state, ChunkState::Unloaded);

    // Late data for the old subscription is dropped.
    core.event_sender().send(EditorEvent::ObjectUpserted {
        subscription: old,
        name: "late".into(),
        record: ObjectRecord::new(1, Vector::new(45.0, 45.0)),
    });
    core.tick(15_003.0);
    assert_eq!(core.streamer().chunk(c(0, 0)).unwrap().object_count(), 0);
}

#[test]
fn chunk_left_after_long_park_survives_idle_window() {
    let mut core = populated();
    core.tick(30_000.0);
    core.tick(55_000.0);
    core.set_camera(Camera::new(Vector::new(3_000.0, 300.0), 0));
    core.tick(60_000.0);
    assert!(!core.streamer().chunk(c(0, 0)).unwrap().visible);
    assert!(core.streamer().chunk(c(0, 0)).unwrap().is_loaded());
    core.tick(65_000.0);
    core.tick(70_000.0);
    assert!(core.streamer().chunk(c(0, 0)).unwrap().is_loaded());
    core.tick(75_000.0);
    assert_eq!(core.streamer().chunk(c(0, 0)).unwrap().state, ChunkState::Unloaded);
}

#[test]
fn zero_viewport_streams_only_the_chunk_under_the_camera() {
    let camera = Camera::new(Vector::new(900.0, 300.0), 0);
    let mut core = Core::new(MemoryScene::new(), RecordingStore::new(), MemoryStorage::new(), EditorConfig::default(), camera);
    core.tick(0.0);
    assert_eq!(core.streamer().visible_set().len(), 1);
    assert!(core.streamer().visible_set().contains(&c(1, 0)));
    assert_eq!(core.store().subscribed_chunks(), vec![c(1, 0)]);
}

// =============================================================
// Selection via pointer
// =============================================================

#[test]
fn edit_click_selects_and_empty_click_deselects() {
    let mut core = populated();
    core.set_tool(Tool::Edit);
    let a = screen_of(&core, Vector::new(315.0, 315.0));
    click(&mut core, a);
    assert!(core.selection().is_selected(c(0, 0), "a"));
    assert_eq!(main_tint(&core, "a"), SELECT_TINT);

    let empty = screen_of(&core, Vector::new(450.0, 450.0));
    click(&mut core, empty);
    assert!(core.selection().selected().is_none());
    assert_eq!(main_tint(&core, "a"), 0xff_ffff);
}

#[test]
fn delete_key_deletes_selected_once() {
    let mut core = populated();
    assert!(core.select(c(0, 0), "a"));
    assert!(core.on_key_down(&Key::new("Delete"), no_modifiers()));
    assert!(matches!(core.store().last_call(), Some(StoreCall::Delete { name, .. }) if name == "a"));
    let calls = core.store().calls().len();
    assert!(!core.on_key_down(&Key::new("Delete"), no_modifiers()));
    assert_eq!(core.store().calls().len(), calls);
}

#[test]
fn delete_tool_deletes_clicked_object() {
    let mut core = populated();
    core.set_tool(Tool::Delete);
    let b = screen_of(&core, Vector::new(375.0, 315.0));
    click(&mut core, b);
    assert!(matches!(core.store().last_call(), Some(StoreCall::Delete { chunk, name, .. }) if *chunk == c(0, 0) && name == "b"));
    assert!(core.selection().selected().is_none());
}

#[test]
fn remote_removal_clears_selection() {
    let mut core = populated();
    core.select(c(0, 0), "a");
    let sub = subscription(&core, c(0, 0));
    core.event_sender().send(EditorEvent::ObjectRemoved { subscription: sub, name: "a".into() });
    core.tick(16.0);
    assert!(core.selection().selected().is_none());
    assert!(core.streamer().object(c(0, 0), "a").is_none());
}

#[test]
fn remote_update_keeps_selection_styling() {
    let mut core = populated();
    core.select(c(0, 0), "a");
    let sub = subscription(&core, c(0, 0));
    let mut record = ObjectRecord::new(1, Vector::new(345.0, 315.0));
    record.rotation = 90.0;
    core.event_sender().send(EditorEvent::ObjectUpserted { subscription: sub, name: "a".into(), record });
    core.tick(16.0);
    assert_eq!(main_tint(&core, "a"), SELECT_TINT);
    assert_eq!(core.streamer().object(c(0, 0), "a").unwrap().record().x, 345.0);
}

#[test]
fn sweep_of_selected_chunk_clears_selection() {
    let mut core = populated();
    core.select(c(0, 0), "a");
    core.set_camera(Camera::new(Vector::new(3_000.0, 300.0), 0));
    core.tick(1_000.0);
    core.tick(5_000.0);
    core.tick(10_002.0);
    assert!(core.selection().selected().is_some());
    core.tick(15_002.0);
    assert!(core.selection().selected().is_none());
}

#[test]
fn show_object_info_posts_notice_on_select() {
    let mut core = populated();
    core.select(c(0, 0), "a");
    assert!(core.drain_notices().is_empty());
    core.deselect();
    core.set_setting(SettingKey::ShowObjectInfo, true);
    core.select(c(0, 0), "a");
    let notices = core.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Info);
    assert!(notices[0].message.starts_with("Object a: id 1, x 315, y 315"));
}

// =============================================================
// Dragging
// =============================================================

#[test]
fn drag_on_empty_space_pans() {
    let mut core = core();
    core.on_pointer_down(Vector::new(200.0, 200.0), Button::Primary, no_modifiers());
    core.on_pointer_move(Vector::new(202.0, 200.0), no_modifiers());
    assert!(matches!(core.input(), InputState::Pressed { .. }));
    core.on_pointer_move(Vector::new(250.0, 200.0), no_modifiers());
    assert_eq!(core.camera().pos, Vector::new(250.0, 300.0));
    core.on_pointer_move(Vector::new(260.0, 190.0), no_modifiers());
    assert_eq!(core.camera().pos, Vector::new(240.0, 290.0));
    core.on_pointer_up(Vector::new(260.0, 190.0), Button::Primary, no_modifiers());
    assert!(core.input().is_idle());
    assert_eq!(core.store().mutation_count(), 0);
}

#[test]
fn middle_button_pans_immediately() {
    let mut core = populated();
    core.on_pointer_down(Vector::new(200.0, 200.0), Button::Middle, no_modifiers());
    core.on_pointer_move(Vector::new(201.0, 200.0), no_modifiers());
    assert_eq!(core.camera().pos, Vector::new(299.0, 300.0));
}

#[test]
fn edit_drag_moves_selected_object() {
    let mut core = populated();
    core.set_tool(Tool::Edit);
    core.select(c(0, 0), "a");
    let start = screen_of(&core, Vector::new(315.0, 315.0));
    let end = screen_of(&core, Vector::new(403.0, 318.0));
    core.on_pointer_down(start, Button::Primary, no_modifiers());
    core.on_pointer_move(end, no_modifiers());
    assert!(matches!(core.input(), InputState::DraggingObject { .. }));
    let root = core.streamer().object(c(0, 0), "a").unwrap().root();
    assert_eq!(core.scene().node(root).unwrap().transform.position, Vector::new(405.0, 315.0));

    core.on_pointer_up(end, Button::Primary, no_modifiers());
    match core.store().last_call() {
        Some(StoreCall::Put { chunk, name, record, .. }) => {
            assert_eq!(*chunk, c(0, 0));
            assert_eq!(name, "a");
            assert_eq!(record.position(), Vector::new(405.0, 315.0));
        }
        other => panic!("unexpected call {other:?}"),
    }
    // The node waits for the store echo.
    assert_eq!(core.scene().node(root).unwrap().transform.position, Vector::new(315.0, 315.0));
    assert_eq!(core.camera().pos, Vector::new(300.0, 300.0));
}

#[test]
fn drag_on_unselected_object_pans() {
    let mut core = populated();
    core.set_tool(Tool::Edit);
    let start = screen_of(&core, Vector::new(315.0, 315.0));
    core.on_pointer_down(start, Button::Primary, no_modifiers());
    core.on_pointer_move(start + Vector::new(20.0, 0.0), no_modifiers());
    assert!(matches!(core.input(), InputState::Panning { .. }));
}

#[test]
fn arrow_key_nudges_selected_by_one_cell() {
    let mut core = populated();
    core.select(c(0, 0), "a");
    assert!(core.on_key_down(&Key::new("ArrowUp"), no_modifiers()));
    match core.store().last_call() {
        Some(StoreCall::Put { record, .. }) => assert_eq!(record.position(), Vector::new(315.0, 345.0)),
        other => panic!("unexpected call {other:?}"),
    }
}

// =============================================================
// Preview and placement
// =============================================================

#[test]
fn build_tool_preview_follows_pointer_snapped() {
    let mut core = core();
    core.begin_preview(ObjectRecord::new(8, Vector::ZERO));
    let screen = screen_of(&core, Vector::new(322.0, 347.0));
    core.on_pointer_move(screen, no_modifiers());
    assert_eq!(core.selection().preview().unwrap().record().position(), Vector::new(315.0, 345.0));
    core.on_pointer_move(screen, alt_modifier());
    let free = core.selection().preview().unwrap().record().position();
    assert!((free.x - 322.0).abs() < 1e-9 && (free.y - 347.0).abs() < 1e-9);
}

#[test]
fn build_click_commits_preview_into_owning_chunk() {
    let mut core = core();
    core.begin_preview(ObjectRecord::new(8, Vector::ZERO));
    core.store_mut().clear();
    let screen = screen_of(&core, Vector::new(322.0, 347.0));
    click(&mut core, screen);
    match core.store().last_call() {
        Some(StoreCall::Put { chunk, record, .. }) => {
            assert_eq!(*chunk, c(0, 0));
            assert_eq!(record.id, 8);
            assert_eq!(record.position(), Vector::new(315.0, 345.0));
        }
        other => panic!("unexpected call {other:?}"),
    }
    assert!(core.selection().preview().is_some());
}

#[test]
fn build_click_without_preview_writes_nothing() {
    let mut core = core();
    core.store_mut().clear();
    click(&mut core, Vector::new(200.0, 200.0));
    assert!(core.store().calls().is_empty());
}

#[test]
fn preview_box_drawn_on_tick() {
    let mut core = core();
    core.begin_preview(ObjectRecord::new(1, Vector::new(315.0, 315.0)));
    core.tick(16.0);
    let node = core.selection().preview().unwrap().node();
    assert!(core.scene().child_by_name(node.root(), crate::node::PREVIEW_BOX).is_some());
}

#[test]
fn escape_cancels_preview() {
    let mut core = core();
    core.begin_preview(ObjectRecord::new(1, Vector::ZERO));
    assert!(core.on_key_down(&Key::new("Escape"), no_modifiers()));
    assert!(core.selection().preview().is_none());
    assert!(!core.on_key_down(&Key::new("Escape"), no_modifiers()));
}

#[test]
fn enter_commits_in_build_tool() {
    let mut core = core();
    core.begin_preview(ObjectRecord::new(1, Vector::new(45.0, 45.0)));
    assert!(core.on_key_down(&Key::new("Enter"), no_modifiers()));
    assert_eq!(core.store().mutation_count(), 1);
}

#[test]
fn leaving_build_tool_cancels_preview() {
    let mut core = core();
    core.begin_preview(ObjectRecord::new(1, Vector::ZERO));
    core.set_tool(Tool::Edit);
    assert!(core.selection().preview().is_none());
    assert_eq!(core.tool(), Tool::Edit);
}

#[test]
fn failed_place_raises_notice() {
    let mut core = core();
    core.begin_preview(ObjectRecord::new(1, Vector::new(45.0, 45.0)));
    core.commit_preview();
    let request = last_request(&core);
    core.event_sender().send(EditorEvent::MutationSettled {
        request,
        result: Err(StoreError::PermissionDenied("banned".into())),
    });
    core.tick(16.0);
    let notices = core.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].message, "Failed to place object! (permission denied: banned)");
    assert!(core.selection().preview().is_some());
}

// =============================================================
// Zoom
// =============================================================

#[test]
fn wheel_zoom_keeps_anchor_fixed() {
    let mut core = core();
    let anchor = Vector::new(50.0, 80.0);
    let before = core.camera().screen_to_world(anchor, VIEWPORT);
    assert!(core.on_wheel(anchor, WheelDelta { dx: 0.0, dy: -100.0 }, no_modifiers()));
    assert_eq!(core.camera().zoom_level, 1);
    let after = core.camera().screen_to_world(anchor, VIEWPORT);
    assert!((before - after).length() < 1e-9);
}

#[test]
fn wheel_zoom_stops_at_limit() {
    let mut core = core();
    core.set_camera(Camera::new(Vector::new(300.0, 300.0), crate::consts::MAX_ZOOM));
    assert!(!core.on_wheel(Vector::ZERO, WheelDelta { dx: 0.0, dy: -1.0 }, no_modifiers()));
}

#[test]
fn zooming_out_streams_more_chunks() {
    let mut core = core();
    for _ in 0..16 {
        core.on_wheel(Vector::new(200.0, 200.0), WheelDelta { dx: 0.0, dy: 1.0 }, no_modifiers());
    }
    core.tick(16.0);
    assert!(core.streamer().visible_set().len() > 1);
    assert!(core.store().subscribed_chunks().len() > 1);
}

// =============================================================
// Tooltip
// =============================================================

#[test]
fn hover_resolves_after_debounce() {
    let mut core = populated();
    let a = screen_of(&core, Vector::new(315.0, 315.0));
    core.on_pointer_move(a, no_modifiers());
    assert_eq!(core.hovered().map(|h| h.name.as_str()), Some("a"));
    core.tick(100.0);
    assert_eq!(core.store().lookup_count(), 0);
    core.tick(300.0);
    assert!(matches!(core.store().last_call(), Some(StoreCall::FetchPlacedBy { name, .. }) if name == "a"));

    let request = last_request(&core);
    core.event_sender().send(EditorEvent::PlacedByResolved { request, result: Ok(Some("alice".into())) });
    core.tick(316.0);
    let request = last_request(&core);
    core.event_sender().send(EditorEvent::DisplayColorResolved { request, result: Ok(Some("ff 00 00".into())) });
    core.tick(332.0);
    assert!(core.tooltip().is_shown());
}

#[test]
fn hover_then_leave_never_looks_up() {
    let mut core = populated();
    let a = screen_of(&core, Vector::new(315.0, 315.0));
    core.on_pointer_move(a, no_modifiers());
    core.tick(100.0);
    let empty = screen_of(&core, Vector::new(450.0, 450.0));
    core.on_pointer_move(empty, no_modifiers());
    core.tick(1_000.0);
    assert_eq!(core.store().lookup_count(), 0);
    assert!(core.hovered().is_none());
}

#[test]
fn tooltips_setting_off_disables_lookups() {
    let mut core = populated();
    core.set_setting(SettingKey::ShowTooltips, false);
    let a = screen_of(&core, Vector::new(315.0, 315.0));
    core.on_touch_start(a);
    core.on_pointer_move(a, no_modifiers());
    core.tick(1_000.0);
    assert_eq!(core.store().lookup_count(), 0);
}

#[test]
fn lookup_failure_surfaces_notice() {
    let mut core = populated();
    let a = screen_of(&core, Vector::new(315.0, 315.0));
    core.on_touch_start(a);
    let request = last_request(&core);
    core.event_sender().send(EditorEvent::PlacedByResolved { request, result: Err(StoreError::Timeout) });
    core.tick(16.0);
    assert_eq!(core.drain_notices()[0].message, "Failed to get username! (request timed out)");
}

// =============================================================
// Settings
// =============================================================

#[test]
fn saved_settings_apply_on_startup() {
    let mut storage = MemoryStorage::new();
    storage.set_item(SETTINGS_KEY, r#"{"hideGround":true}"#).unwrap();
    let core = core_with(storage);
    assert!(!core.scene().node(core.composer().ground()).unwrap().visible);
}

#[test]
fn toggling_ground_saves_and_applies() {
    let mut core = core();
    core.toggle_setting(SettingKey::HideGround);
    assert!(!core.scene().node(core.composer().ground()).unwrap().visible);
    let saved = core.storage().get_item(SETTINGS_KEY).unwrap();
    assert!(saved.contains(r#""hideGround":true"#));
    core.toggle_setting(SettingKey::HideGround);
    assert!(core.scene().node(core.composer().ground()).unwrap().visible);
}

#[test]
fn disabling_outline_removes_select_box() {
    let mut core = populated();
    core.select(c(0, 0), "a");
    let root = core.streamer().object(c(0, 0), "a").unwrap().root();
    assert!(core.scene().child_by_name(root, crate::node::SELECT_BOX).is_some());
    core.set_setting(SettingKey::DisableObjectOutline, true);
    assert!(core.scene().child_by_name(root, crate::node::SELECT_BOX).is_none());
}

#[test]
fn saved_camera_round_trips() {
    let mut core = core();
    core.set_camera(Camera::new(Vector::new(1_234.0, 56.0), -3));
    let saved = core.saved_camera();
    assert_eq!(saved, SavedCamera { x: 1_234.0, y: 56.0, zoom: -3 });
    assert_eq!(Camera::from(saved), core.camera());
}
