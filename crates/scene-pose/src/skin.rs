//! Skin definitions
//!
//! A skin names the joint nodes that deform a mesh and the inverse bind
//! matrices that move a bind-space vertex into each joint's space.

use glam::Mat4;

use crate::error::{Result, SceneError};

/// A set of joints plus bind and inverse bind matrices
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-support", serde(default))]
pub struct Skin {
    /// Optional display name
    pub name: Option<String>,
    /// Joint node indices, in joint-matrix order
    pub joints: Vec<usize>,
    /// Bind-pose global transform per joint (informational)
    pub bind_matrices: Vec<Mat4>,
    /// Inverse bind matrix per joint; `None` means no offset correction
    pub inverse_bind_matrices: Vec<Option<Mat4>>,
}

impl Skin {
    /// Create a skin from joints and their inverse bind matrices
    pub fn new(joints: Vec<usize>, inverse_bind_matrices: Vec<Option<Mat4>>) -> Self {
        Self {
            name: None,
            joints,
            bind_matrices: Vec::new(),
            inverse_bind_matrices,
        }
    }

    /// Number of joints
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Inverse bind matrix of a joint, if one exists
    pub fn inverse_bind_matrix(&self, joint: usize) -> Option<&Mat4> {
        self.inverse_bind_matrices.get(joint).and_then(Option::as_ref)
    }

    /// Check joint indices against a node count
    pub fn validate(&self, index: usize, node_count: usize) -> Result<()> {
        if self.inverse_bind_matrices.len() > self.joints.len() {
            return Err(SceneError::InverseBindMismatch {
                skin: index,
                joints: self.joints.len(),
                inverse_binds: self.inverse_bind_matrices.len(),
            });
        }
        for (j, &joint) in self.joints.iter().enumerate() {
            if joint >= node_count {
                return Err(SceneError::NodeOutOfRange {
                    context: format!("joint {} of skin {}", j, index),
                    index: joint,
                    count: node_count,
                });
            }
        }
        Ok(())
    }
}
