//! Scene-graph seam between the editor core and the renderer.
//!
//! The core never subclasses renderer types. It holds [`NodeId`] handles and
//! drives them through the [`SceneGraph`] trait: add/remove children, look
//! children up by name, toggle visibility, set transforms, sprite appearance,
//! draw order, vector shapes and text. The browser host implements the trait
//! over its 2D renderer.
//!
//! [`MemoryScene`] is a retained, in-memory implementation. It backs headless
//! hosts and every test in this crate.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::collections::HashMap;

use crate::consts::DEFAULT_OBJECT_TEXTURE_PX;
use crate::geom::{Rect, Vector};

/// Opaque handle to a scene node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// What a node draws.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Groups children; draws nothing itself.
    Container,
    /// Textured quad centered on the node origin.
    Sprite { texture: String },
    /// Texture repeated across a `width` × `height` strip anchored at its bottom-left.
    TilingSprite { texture: String, width: f64, height: f64 },
    /// Vector shapes set with [`SceneGraph::set_shapes`].
    Graphics,
    /// A text run set with [`SceneGraph::set_text`].
    Text,
}

/// Creation parameters for a node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    pub name: String,
    pub kind: NodeKind,
}

impl NodeSpec {
    #[must_use]
    pub fn container(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: NodeKind::Container }
    }

    #[must_use]
    pub fn sprite(name: impl Into<String>, texture: impl Into<String>) -> Self {
        Self { name: name.into(), kind: NodeKind::Sprite { texture: texture.into() } }
    }

    #[must_use]
    pub fn tiling_sprite(name: impl Into<String>, texture: impl Into<String>, width: f64, height: f64) -> Self {
        Self { name: name.into(), kind: NodeKind::TilingSprite { texture: texture.into(), width, height } }
    }

    #[must_use]
    pub fn graphics(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: NodeKind::Graphics }
    }

    #[must_use]
    pub fn text(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: NodeKind::Text }
    }
}

/// Affine transform relative to the parent node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector,
    /// Per-axis scale; a negative component mirrors.
    pub scale: Vector,
    /// Rotation in radians, counter-clockwise in parent space.
    pub rotation: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self { position: Vector::ZERO, scale: Vector::new(1.0, 1.0), rotation: 0.0 }
    }
}

impl Transform {
    #[must_use]
    pub fn at(position: Vector) -> Self {
        Self { position, ..Self::default() }
    }

    #[must_use]
    pub fn scaled(position: Vector, scale: f64) -> Self {
        Self { position, scale: Vector::new(scale, scale), rotation: 0.0 }
    }
}

/// Sprite tint, alpha and blend mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Appearance {
    pub tint: u32,
    pub alpha: f64,
    /// Additive blending instead of normal alpha blending.
    pub additive: bool,
}

impl Default for Appearance {
    fn default() -> Self {
        Self { tint: 0xff_ffff, alpha: 1.0, additive: false }
    }
}

/// Sort key among siblings: `(z, insertion)` ascending, so equal z-orders
/// keep a stable insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct DrawOrder {
    pub z: i32,
    pub insertion: u64,
}

/// Stroke parameters shared by line-like shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub width: f64,
    pub color: u32,
    pub alpha: f64,
}

/// A vector primitive drawn by a [`NodeKind::Graphics`] node.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Line { from: Vector, to: Vector, stroke: Stroke },
    RectOutline { rect: Rect, stroke: Stroke },
    FilledRoundRect { rect: Rect, radius: f64, color: u32, alpha: f64 },
}

/// Content of a [`NodeKind::Text`] node.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub font_size: f64,
    pub color: u32,
    pub alpha: f64,
}

/// Capabilities the editor core needs from a renderer.
pub trait SceneGraph {
    /// The stage root; every editor node descends from it.
    fn root(&self) -> NodeId;

    /// Create a node as the last child of `parent`.
    fn add_child(&mut self, parent: NodeId, spec: NodeSpec) -> NodeId;

    /// Destroy `node` and its whole subtree. Unknown handles are ignored.
    fn remove(&mut self, node: NodeId);

    /// First direct child of `parent` named `name`.
    fn child_by_name(&self, parent: NodeId, name: &str) -> Option<NodeId>;

    fn set_visible(&mut self, node: NodeId, visible: bool);

    fn set_transform(&mut self, node: NodeId, transform: Transform);

    /// Change a sprite's texture (used when an object's type id changes).
    fn set_texture(&mut self, node: NodeId, texture: &str);

    fn set_appearance(&mut self, node: NodeId, appearance: Appearance);

    fn set_draw_order(&mut self, node: NodeId, order: DrawOrder);

    /// Replace the shapes drawn by a graphics node.
    fn set_shapes(&mut self, node: NodeId, shapes: Vec<Shape>);

    fn set_text(&mut self, node: NodeId, text: TextRun);

    /// Natural size of a sprite's texture in pixels, if known.
    fn sprite_size(&self, node: NodeId) -> Option<Vector>;

    /// Rendered size of a text run in the node's local units.
    fn measure_text(&self, text: &TextRun) -> Vector;
}

// =============================================================
// In-memory scene
// =============================================================

/// One retained node of a [`MemoryScene`].
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub visible: bool,
    pub transform: Transform,
    pub appearance: Appearance,
    pub order: DrawOrder,
    pub shapes: Vec<Shape>,
    pub text: Option<TextRun>,
}

impl SceneNode {
    fn new(name: String, kind: NodeKind, parent: Option<NodeId>) -> Self {
        Self {
            name,
            kind,
            parent,
            children: Vec::new(),
            visible: true,
            transform: Transform::default(),
            appearance: Appearance::default(),
            order: DrawOrder::default(),
            shapes: Vec::new(),
            text: None,
        }
    }

    /// Texture of a sprite or tiling sprite.
    #[must_use]
    pub fn texture(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Sprite { texture } | NodeKind::TilingSprite { texture, .. } => Some(texture),
            _ => None,
        }
    }
}

/// Retained scene graph held entirely in memory.
#[derive(Debug, Clone)]
pub struct MemoryScene {
    nodes: HashMap<NodeId, SceneNode>,
    root: NodeId,
    next_id: u64,
    texture_sizes: HashMap<String, Vector>,
    default_texture_size: Vector,
    /// Average glyph advance as a fraction of the font size.
    glyph_width_ratio: f64,
}

impl Default for MemoryScene {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryScene {
    #[must_use]
    pub fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(root, SceneNode::new("stage".to_owned(), NodeKind::Container, None));
        Self {
            nodes,
            root,
            next_id: 1,
            texture_sizes: HashMap::new(),
            default_texture_size: Vector::new(DEFAULT_OBJECT_TEXTURE_PX, DEFAULT_OBJECT_TEXTURE_PX),
            glyph_width_ratio: 0.6,
        }
    }

    /// Register the pixel size of a texture. Unregistered sprite textures
    /// report the default object texture size.
    pub fn set_texture_size(&mut self, texture: impl Into<String>, size: Vector) {
        self.texture_sizes.insert(texture.into(), size);
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    /// Number of live nodes, including the stage root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the stage root cannot be removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Direct children of `parent` in draw order.
    #[must_use]
    pub fn sorted_children(&self, parent: NodeId) -> Vec<NodeId> {
        let Some(node) = self.nodes.get(&parent) else {
            return Vec::new();
        };
        let mut children = node.children.clone();
        // Stable: equal keys keep attachment order.
        children.sort_by_key(|id| self.nodes.get(id).map(|n| n.order).unwrap_or_default());
        children
    }

    /// Whether `id` and every ancestor are visible.
    #[must_use]
    pub fn is_effectively_visible(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let Some(node) = self.nodes.get(&node_id) else {
                return false;
            };
            if !node.visible {
                return false;
            }
            current = node.parent;
        }
        true
    }

    /// Find a node anywhere below `ancestor` by a `/`-separated name path.
    #[must_use]
    pub fn find_path(&self, ancestor: NodeId, path: &str) -> Option<NodeId> {
        path.split('/')
            .try_fold(ancestor, |parent, name| self.child_by_name(parent, name))
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&id)
    }

    fn collect_subtree(&self, id: NodeId, out: &mut Vec<NodeId>) {
        out.push(id);
        if let Some(node) = self.nodes.get(&id) {
            for child in &node.children {
                self.collect_subtree(*child, out);
            }
        }
    }
}

impl SceneGraph for MemoryScene {
    fn root(&self) -> NodeId {
        self.root
    }

    fn add_child(&mut self, parent: NodeId, spec: NodeSpec) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        let parent = if self.nodes.contains_key(&parent) { parent } else { self.root };
        self.nodes.insert(id, SceneNode::new(spec.name, spec.kind, Some(parent)));
        if let Some(p) = self.node_mut(parent) {
            p.children.push(id);
        }
        id
    }

    fn remove(&mut self, node: NodeId) {
        if node == self.root || !self.nodes.contains_key(&node) {
            return;
        }
        let mut doomed = Vec::new();
        self.collect_subtree(node, &mut doomed);
        let parent = self.nodes.get(&node).and_then(|n| n.parent);
        if let Some(p) = parent.and_then(|p| self.node_mut(p)) {
            p.children.retain(|c| *c != node);
        }
        for id in doomed {
            self.nodes.remove(&id);
        }
    }

    fn child_by_name(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.nodes.get(&parent)?.children.iter().copied().find(|id| {
            self.nodes
                .get(id)
                .is_some_and(|n| n.name == name)
        })
    }

    fn set_visible(&mut self, node: NodeId, visible: bool) {
        if let Some(n) = self.node_mut(node) {
            n.visible = visible;
        }
    }

    fn set_transform(&mut self, node: NodeId, transform: Transform) {
        if let Some(n) = self.node_mut(node) {
            n.transform = transform;
        }
    }

    fn set_texture(&mut self, node: NodeId, texture: &str) {
        if let Some(n) = self.node_mut(node) {
            match &mut n.kind {
                NodeKind::Sprite { texture: t } | NodeKind::TilingSprite { texture: t, .. } => {
                    texture.clone_into(t);
                }
                _ => {}
            }
        }
    }

    fn set_appearance(&mut self, node: NodeId, appearance: Appearance) {
        if let Some(n) = self.node_mut(node) {
            n.appearance = appearance;
        }
    }

    fn set_draw_order(&mut self, node: NodeId, order: DrawOrder) {
        if let Some(n) = self.node_mut(node) {
            n.order = order;
        }
    }

    fn set_shapes(&mut self, node: NodeId, shapes: Vec<Shape>) {
        if let Some(n) = self.node_mut(node) {
            n.shapes = shapes;
        }
    }

    fn set_text(&mut self, node: NodeId, text: TextRun) {
        if let Some(n) = self.node_mut(node) {
            n.text = Some(text);
        }
    }

    fn sprite_size(&self, node: NodeId) -> Option<Vector> {
        let n = self.nodes.get(&node)?;
        match &n.kind {
            NodeKind::Sprite { texture } => Some(
                self.texture_sizes
                    .get(texture)
                    .copied()
                    .unwrap_or(self.default_texture_size),
            ),
            NodeKind::TilingSprite { width, height, .. } => Some(Vector::new(*width, *height)),
            _ => None,
        }
    }

    fn measure_text(&self, text: &TextRun) -> Vector {
        #[allow(clippy::cast_precision_loss)]
        let chars = text.text.chars().count() as f64;
        Vector::new(chars * text.font_size * self.glyph_width_ratio, text.font_size * 1.2)
    }
}
