use thiserror::Error;

use crate::animation::TargetProperty;

/// Error types for scene and animation data validation
///
/// None of these are produced on the per-frame path. Sampling and pose
/// updates clamp or default instead of failing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// Two channel sets address the same target node
    #[error("Invalid animation '{clip}': multiple channel sets for target {target}")]
    DuplicateTarget { clip: String, target: usize },

    /// A channel set animates none of translation, rotation or scale
    #[error("Invalid animation '{clip}': channel set for target {target} has no channels")]
    EmptyChannelSet { clip: String, target: usize },

    /// A present channel has no keyframes
    #[error("Invalid animation '{clip}': {property} channel of target {target} has no samples")]
    EmptyChannel {
        clip: String,
        target: usize,
        property: TargetProperty,
    },

    /// Keyframe times go backwards
    #[error(
        "Invalid animation '{clip}': {property} channel of target {target} is not sorted at keyframe {keyframe}"
    )]
    UnsortedKeyframes {
        clip: String,
        target: usize,
        property: TargetProperty,
        keyframe: usize,
    },

    /// A cubic channel has a keyframe without in/out tangents
    #[error(
        "Invalid animation '{clip}': cubic {property} channel of target {target} lacks tangents at keyframe {keyframe}"
    )]
    MissingTangents {
        clip: String,
        target: usize,
        property: TargetProperty,
        keyframe: usize,
    },

    /// A root, child or joint index points past the node list
    #[error("Node reference error: {context} references node {index}, but only {count} nodes exist")]
    NodeOutOfRange {
        context: String,
        index: usize,
        count: usize,
    },

    /// A node is reachable more than once (cycle or shared parent)
    #[error("Node hierarchy error: node {index} is reachable more than once")]
    NodeRevisited { index: usize },

    /// A node references a skin that does not exist
    #[error("Skin reference error: node {node} references skin {skin}, but only {count} skins exist")]
    SkinOutOfRange {
        node: usize,
        skin: usize,
        count: usize,
    },

    /// A skin lists more inverse bind matrices than joints
    #[error("Skin {skin} has {inverse_binds} inverse bind matrices for {joints} joints")]
    InverseBindMismatch {
        skin: usize,
        joints: usize,
        inverse_binds: usize,
    },
}

/// Result type using SceneError
pub type Result<T> = std::result::Result<T, SceneError>;
