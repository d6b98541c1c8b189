//! Static node hierarchy and global transform computation
//!
//! A [`NodeHierarchy`] is a flat, index-addressed list of [`Node`]s plus the
//! indices of the root nodes. It never changes after construction, so one
//! hierarchy can back any number of [`crate::Pose`] instances.

use glam::{Mat4, Quat, Vec3};
use log::{debug, warn};

use crate::compose::{compose_global, compose_local};
use crate::error::{Result, SceneError};

/// One entry of the scene hierarchy (mesh holder, joint or plain transform)
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-support", serde(default))]
pub struct Node {
    /// Optional display name
    pub name: Option<String>,
    /// Index of the mesh drawn at this node
    pub mesh: Option<usize>,
    /// Index of the skin deforming that mesh
    pub skin: Option<usize>,
    /// Child node indices, visited in this order
    pub children: Vec<usize>,
    /// Explicit local matrix; overrides translation/rotation/scale when set
    pub matrix: Option<Mat4>,
    /// Local translation
    pub translation: Option<Vec3>,
    /// Local rotation
    pub rotation: Option<Quat>,
    /// Local scale
    pub scale: Option<Vec3>,
}

impl Node {
    /// Whether the local transform comes from translation/rotation/scale
    pub fn has_trs(&self) -> bool {
        self.translation.is_some() || self.rotation.is_some() || self.scale.is_some()
    }
}

/// Local pose of one node
///
/// For animated nodes the translation/rotation/scale fields hold the values
/// that produced `matrix`. Nodes with an explicit matrix leave them unset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodePose {
    /// Resolved local matrix
    pub matrix: Mat4,
    /// Local translation; `Some` after any sample
    pub translation: Option<Vec3>,
    /// Local rotation; `Some` after any sample
    pub rotation: Option<Quat>,
    /// Local scale; `Some` after any sample
    pub scale: Option<Vec3>,
}

impl NodePose {
    /// Whether any of translation/rotation/scale is populated
    pub fn is_animated(&self) -> bool {
        self.translation.is_some() || self.rotation.is_some() || self.scale.is_some()
    }

    /// Rebuild `matrix` from translation/rotation/scale
    ///
    /// Leaves the matrix untouched when none of them is set.
    pub fn update_matrix(&mut self) -> &mut Self {
        if self.is_animated() {
            self.matrix = compose_local(
                self.translation.unwrap_or(Vec3::ZERO),
                self.rotation.unwrap_or(Quat::IDENTITY),
                self.scale.unwrap_or(Vec3::ONE),
            );
        }
        self
    }

    /// Reset to the node's rest pose
    ///
    /// Translation/rotation/scale become exactly the node's static fields, so
    /// values written by a previous sample do not survive.
    pub fn reset_from(&mut self, node: &Node) -> &mut Self {
        if let Some(matrix) = node.matrix {
            // Not animated, copy the matrix
            *self = Self {
                matrix,
                ..Self::default()
            };
            return self;
        }

        self.translation = node.translation;
        self.rotation = node.rotation;
        self.scale = node.scale;
        if node.has_trs() {
            self.update_matrix();
        } else {
            self.matrix = Mat4::IDENTITY;
        }
        self
    }
}

impl Default for NodePose {
    fn default() -> Self {
        Self {
            matrix: Mat4::IDENTITY,
            translation: None,
            rotation: None,
            scale: None,
        }
    }
}

/// Resolve the local transform of a node from its static data
///
/// An explicit matrix is used verbatim. Otherwise translation, rotation and
/// scale compose to `T * R * S`, with absent fields left out. A node with
/// none of them resolves to identity.
pub fn resolve_local_transform(node: &Node) -> Mat4 {
    if let Some(matrix) = node.matrix {
        return matrix;
    }
    if !node.has_trs() {
        return Mat4::IDENTITY;
    }
    compose_local(
        node.translation.unwrap_or(Vec3::ZERO),
        node.rotation.unwrap_or(Quat::IDENTITY),
        node.scale.unwrap_or(Vec3::ONE),
    )
}

fn walk_nodes<F>(nodes: &[Node], ids: &[usize], parent: Option<usize>, visit: &mut F)
where
    F: FnMut(&Node, usize, Option<usize>),
{
    for &id in ids {
        // Absent indices are skipped; validate() reports them
        let Some(node) = nodes.get(id) else {
            continue;
        };
        visit(node, id, parent);
        if !node.children.is_empty() {
            walk_nodes(nodes, &node.children, Some(id), visit);
        }
    }
}

/// Scene node hierarchy with cached rest-pose global transforms
#[derive(Debug, Clone)]
pub struct NodeHierarchy {
    nodes: Vec<Node>,
    roots: Vec<usize>,
    global_transforms: Vec<Mat4>,
    global_inverse_transforms: Vec<Mat4>,
}

impl NodeHierarchy {
    /// Create a hierarchy and compute its rest-pose caches
    pub fn new(nodes: Vec<Node>, roots: Vec<usize>) -> Self {
        let count = nodes.len();
        let mut hierarchy = Self {
            nodes,
            roots,
            global_transforms: vec![Mat4::IDENTITY; count],
            global_inverse_transforms: vec![Mat4::IDENTITY; count],
        };
        hierarchy.update();

        debug!(
            "Created node hierarchy with {} nodes and {} roots",
            count,
            hierarchy.roots.len()
        );
        hierarchy
    }

    /// All nodes in index order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Root node indices in traversal order
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Get a node by index
    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the hierarchy has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Rest-pose global transform of every node
    ///
    /// Computed at construction and held until [`Self::update`].
    pub fn global_transforms(&self) -> &[Mat4] {
        &self.global_transforms
    }

    /// Inverse of every entry of [`Self::global_transforms`]
    pub fn global_inverse_transforms(&self) -> &[Mat4] {
        &self.global_inverse_transforms
    }

    /// Recompute the rest-pose global transforms and their inverses
    ///
    /// A singular transform (zero scale) inverts to whatever glam produces;
    /// that is an authoring problem, not something handled here.
    pub fn update(&mut self) {
        let mut transforms = std::mem::take(&mut self.global_transforms);
        self.calculate_global_transforms(&mut transforms);

        self.global_inverse_transforms
            .resize(transforms.len(), Mat4::IDENTITY);
        for (inverse, transform) in self
            .global_inverse_transforms
            .iter_mut()
            .zip(transforms.iter())
        {
            *inverse = transform.inverse();
        }
        self.global_transforms = transforms;
    }

    /// Depth-first pre-order traversal
    ///
    /// Roots are visited in order, each followed by its children in order.
    /// The visitor receives the node, its index and its parent index (`None`
    /// for roots). A parent is always visited before any of its descendants.
    pub fn walk<F>(&self, mut visit: F)
    where
        F: FnMut(&Node, usize, Option<usize>),
    {
        walk_nodes(&self.nodes, &self.roots, None, &mut visit);
    }

    /// Write the rest pose of every node into `out`
    ///
    /// `out` is resized to the node count and every entry is overwritten.
    pub fn calculate_local_pose(&self, out: &mut Vec<NodePose>) {
        out.resize(self.nodes.len(), NodePose::default());
        for (pose, node) in out.iter_mut().zip(self.nodes.iter()) {
            pose.reset_from(node);
        }
    }

    /// Write the rest-pose global transform of every node into `out`
    ///
    /// `out` is resized to the node count. Nodes unreachable from a root are
    /// left untouched.
    pub fn calculate_global_transforms(&self, out: &mut Vec<Mat4>) {
        out.resize(self.nodes.len(), Mat4::IDENTITY);
        self.walk(|node, id, parent| {
            let local = resolve_local_transform(node);
            let global = match parent {
                Some(parent) => compose_global(&out[parent], &local),
                None => local,
            };
            out[id] = global;
        });
    }

    /// Write global transforms derived from a caller-supplied local pose
    ///
    /// Each local matrix is first rebuilt from its translation/rotation/scale
    /// so edits to those fields take effect. Indices missing from `locals`
    /// or `out` are skipped.
    pub fn update_global_transforms(&self, locals: &mut [NodePose], out: &mut [Mat4]) {
        self.walk(|_, id, parent| {
            let Some(local) = locals.get_mut(id) else {
                return;
            };
            let local = local.update_matrix().matrix;
            let global = match parent.and_then(|p| out.get(p)) {
                Some(parent) => compose_global(parent, &local),
                None => local,
            };
            if let Some(slot) = out.get_mut(id) {
                *slot = global;
            }
        });
    }

    /// Check index integrity and the forest shape
    ///
    /// Fails when a root or child index is out of range, or when a node can be
    /// reached twice (a cycle or a node with two parents). Meant to run once
    /// at import time; traversal itself does not check.
    pub fn validate(&self) -> Result<()> {
        let count = self.nodes.len();
        let mut visited = vec![false; count];
        let mut stack: Vec<(usize, String)> = Vec::new();

        for (i, &root) in self.roots.iter().enumerate().rev() {
            stack.push((root, format!("root {}", i)));
        }

        while let Some((index, context)) = stack.pop() {
            let Some(node) = self.nodes.get(index) else {
                warn!("Hierarchy validation failed: {} is out of range", context);
                return Err(SceneError::NodeOutOfRange {
                    context,
                    index,
                    count,
                });
            };
            if visited[index] {
                warn!("Hierarchy validation failed: node {} revisited", index);
                return Err(SceneError::NodeRevisited { index });
            }
            visited[index] = true;

            for &child in node.children.iter().rev() {
                stack.push((child, format!("children of node {}", index)));
            }
        }

        Ok(())
    }
}
