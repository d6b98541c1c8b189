//! Scene node hierarchy, skeletal animation and skinning matrices
//!
//! Given a static node hierarchy, skins and animation clips, this crate
//! produces per frame the global transform of every node and the joint
//! matrices a GPU skinning shader consumes.
//!
//! The pipeline is `local -> global -> skin`:
//!
//! - [`NodeHierarchy`] holds the immutable node forest and its rest pose.
//! - [`animation`] samples clips into local node poses.
//! - [`Pose`] holds the per-instance state and turns local poses into global
//!   transforms and joint matrices.
//! - [`Model`] ties the static data together and creates poses.
//!
//! # Example
//!
//! ```rust,no_run
//! use scene_pose::animation::PlaybackMode;
//! use scene_pose::{Model, ModelData};
//!
//! # fn main() -> scene_pose::Result<()> {
//! let model = Model::new(ModelData::default());
//! model.validate()?;
//!
//! let mut pose = model.create_pose();
//! if let Some(mut player) = model.animation_player()? {
//!     player.load_clip(0_usize, PlaybackMode::Loop);
//!     pose.update_from_animation(1.5, &player);
//! }
//! let joints = pose.update_skin(0, 0);
//! # let _ = joints;
//! # Ok(())
//! # }
//! ```

pub mod animation;
pub mod compose;
pub mod error;
pub mod hierarchy;
pub mod model;
pub mod pose;
pub mod skin;

pub use error::{Result, SceneError};
pub use hierarchy::{Node, NodeHierarchy, NodePose};
pub use model::{Model, ModelData};
pub use pose::Pose;
pub use skin::Skin;

// Re-export glam so callers build matrices with the same version
pub use glam;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
