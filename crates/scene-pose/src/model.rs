//! Model container
//!
//! A [`Model`] owns the static data an importer produced and hands out
//! independent [`Pose`] instances that share it.

use std::sync::{Arc, OnceLock};

use log::{debug, warn};

use crate::animation::{AnimationClip, AnimationPlayer};
use crate::error::{Result, SceneError};
use crate::hierarchy::{Node, NodeHierarchy};
use crate::pose::Pose;
use crate::skin::Skin;

/// Import-side description of a model
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-support", serde(default))]
pub struct ModelData {
    pub name: Option<String>,
    pub nodes: Vec<Node>,
    /// Root node indices; node 0 when empty
    pub roots: Vec<usize>,
    pub skins: Vec<Skin>,
    pub animations: Vec<AnimationClip>,
    /// Number of meshes, used to synthesize nodes when `nodes` is empty
    pub mesh_count: usize,
}

/// Static scene data shared by all poses of one model
#[derive(Debug, Clone)]
pub struct Model {
    name: Option<String>,
    hierarchy: Arc<NodeHierarchy>,
    skins: Arc<[Skin]>,
    animations: Vec<AnimationClip>,
    player: OnceLock<Result<Option<AnimationPlayer>>>,
}

impl Model {
    /// Build a model from import data
    ///
    /// A model without nodes gets one root node per mesh. A model with nodes
    /// but no roots uses node 0 as its only root.
    pub fn new(data: ModelData) -> Self {
        let ModelData {
            name,
            mut nodes,
            mut roots,
            skins,
            animations,
            mesh_count,
        } = data;

        if nodes.is_empty() {
            nodes = (0..mesh_count)
                .map(|mesh| Node {
                    mesh: Some(mesh),
                    ..Default::default()
                })
                .collect();
            roots = (0..mesh_count).collect();
        }
        if roots.is_empty() && !nodes.is_empty() {
            roots.push(0);
        }

        debug!(
            "Model {:?}: {} nodes, {} skins, {} animations",
            name,
            nodes.len(),
            skins.len(),
            animations.len()
        );

        Self {
            name,
            hierarchy: Arc::new(NodeHierarchy::new(nodes, roots)),
            skins: Arc::from(skins),
            animations,
            player: OnceLock::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn hierarchy(&self) -> &Arc<NodeHierarchy> {
        &self.hierarchy
    }

    pub fn skins(&self) -> &[Skin] {
        &self.skins
    }

    pub fn animations(&self) -> &[AnimationClip] {
        &self.animations
    }

    /// Create a new pose in the rest position
    pub fn create_pose(&self) -> Pose {
        Pose::new(Arc::clone(&self.hierarchy), Arc::clone(&self.skins))
    }

    /// Get a player over the model's clips
    ///
    /// Clips are validated once, on the first call. Every call returns a new
    /// player sharing those samplers, with no clip loaded. Returns None for a
    /// model without animations.
    pub fn animation_player(&self) -> Result<Option<AnimationPlayer>> {
        self.player
            .get_or_init(|| {
                if self.animations.is_empty() {
                    return Ok(None);
                }
                AnimationPlayer::new(&self.animations).map(Some)
            })
            .clone()
    }

    /// Check hierarchy shape plus skin and joint references
    pub fn validate(&self) -> Result<()> {
        self.hierarchy.validate()?;

        let node_count = self.hierarchy.len();
        for (index, node) in self.hierarchy.nodes().iter().enumerate() {
            if let Some(skin) = node.skin {
                if skin >= self.skins.len() {
                    warn!("Model validation failed: node {} uses skin {}", index, skin);
                    return Err(SceneError::SkinOutOfRange {
                        node: index,
                        skin,
                        count: self.skins.len(),
                    });
                }
            }
        }
        for (index, skin) in self.skins.iter().enumerate() {
            skin.validate(index, node_count).inspect_err(|err| {
                warn!("Model validation failed: {}", err);
            })?;
        }
        Ok(())
    }
}

impl From<ModelData> for Model {
    fn from(data: ModelData) -> Self {
        Self::new(data)
    }
}
