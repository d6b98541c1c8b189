//! Skeletal animation
//!
//! This module turns time-indexed clip data into local node poses:
//! - Clip data model with independent translation/rotation/scale channels
//! - Keyframe interpolation (step, linear, cubic Hermite)
//! - Per-clip sampler with load-time validation
//! - A player that selects clips and maps the clock (clamp or loop)
//!
//! # Example
//!
//! ```rust,ignore
//! use scene_pose::animation::{AnimationPlayer, PlaybackMode};
//!
//! let mut player = AnimationPlayer::new(&clips)?;
//! player.load_clip("walk", PlaybackMode::Loop);
//!
//! // Once per frame
//! pose.update_from_animation(time, &player);
//! ```

mod interpolation;
mod player;
mod sampler;
mod types;

pub use interpolation::{find_keyframe_index, sample_channel};
pub use player::{AnimationPlayer, ClipSelector, PlaybackMode};
pub use sampler::{ChannelSampler, ClipSampler, PoseSampler};
pub use types::{
    AnimationClip, Channel, ChannelSet, Interpolate, Interpolation, Keyframe, Tangents,
    TargetProperty,
};
