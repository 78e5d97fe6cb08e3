#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::chunk::{Chunk, ChunkCoord};
use crate::geom::Vector;
use crate::node::ObjectNode;
use crate::object::ObjectName;
use crate::render::SceneGraph;

/// Result of a hit test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub chunk: ChunkCoord,
    pub name: ObjectName,
}

/// Topmost object under `world_pt` among visible, loaded chunks.
///
/// "Topmost" is the highest draw order `(z_order, insertion)`. Objects for
/// which `shown` returns false are skipped.
#[must_use]
pub fn hit_test<'a, G: SceneGraph>(
    scene: &G,
    chunks: impl IntoIterator<Item = &'a Chunk>,
    world_pt: Vector,
    shown: impl Fn(&ObjectNode) -> bool,
) -> Option<Hit> {
    chunks
        .into_iter()
        .filter(|chunk| chunk.visible && chunk.is_loaded())
        .flat_map(|chunk| chunk.objects().map(move |node| (chunk.coord, node)))
        .filter(|(_, node)| shown(*node) && node.contains(scene, world_pt))
        .max_by_key(|(_, node)| node.draw_order())
        .map(|(chunk, node)| Hit { chunk, name: node.name().to_owned() })
}
