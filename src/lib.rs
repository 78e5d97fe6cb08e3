//! Scene and interaction core for the collaborative level editor.
//!
//! The crate owns everything between the host's frame loop and the two
//! external collaborators: the scene-graph renderer ([`render::SceneGraph`])
//! and the realtime object store ([`store::RemoteStore`]). The host feeds
//! input events and one [`engine::EditorCore::tick`] per frame; store
//! callbacks re-enter through the [`events`] queue. Nothing here blocks or
//! spawns threads.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level [`engine::EditorCore`] wiring every component |
//! | [`streaming`] | Chunk visibility, load/unload and idle eviction |
//! | [`camera`] | Camera position, exponential zoom, screen/world transforms |
//! | [`scene`] | Editor node layout: grid, ground strip, preview layer |
//! | [`selection`] | Preview and selection state machine |
//! | [`tooltip`] | Debounced attribution tooltip and its lookup cache |
//! | [`node`] | Per-object visual node built on scene-graph handles |
//! | [`hit`] | Topmost-object hit testing |
//! | [`chunk`] | Chunk coordinates, grid mapping, chunk lifecycle state |
//! | [`object`] | Persisted object record and colour descriptors |
//! | [`settings`] | Persisted editor toggles |
//! | [`input`] | Tools, keys, pointer gesture state |
//! | [`events`] | Single-threaded event queue for store callbacks |
//! | [`notify`] | Transient user-facing notices |
//! | [`render`] | Scene-graph trait and the in-memory scene |
//! | [`store`] | Remote store trait, ids and errors |
//! | [`config`] | Runtime configuration |
//! | [`geom`] | Vector, rectangle, clamp/wrap helpers |
//! | [`consts`] | Shared numeric constants |

pub mod camera;
pub mod chunk;
pub mod config;
pub mod consts;
pub mod engine;
pub mod events;
pub mod geom;
pub mod hit;
pub mod input;
pub mod node;
pub mod notify;
pub mod object;
pub mod render;
pub mod scene;
pub mod selection;
pub mod settings;
pub mod store;
pub mod streaming;
pub mod tooltip;
