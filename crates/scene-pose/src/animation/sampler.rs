//! Clip evaluation
//!
//! A [`ClipSampler`] owns a validated copy of an [`AnimationClip`] and turns
//! `(time, target)` into local pose values.

use std::collections::HashMap;

use glam::{Quat, Vec3};
use log::debug;

use super::interpolation::sample_channel;
use super::types::{AnimationClip, Channel, ChannelSet, Interpolate, Interpolation, TargetProperty};
use crate::error::{Result, SceneError};
use crate::hierarchy::NodePose;

/// Anything that can write a full set of animated local poses
pub trait PoseSampler {
    /// Sample every animated target into its slot of `out`
    ///
    /// Targets without a slot in `out` are skipped. Returns whether any slot
    /// was written.
    fn sample_all(&self, time: f32, out: &mut [NodePose]) -> bool;
}

fn validate_channel<T>(
    clip: &str,
    target: usize,
    property: TargetProperty,
    channel: &Channel<T>,
) -> Result<()> {
    if channel.keyframes.is_empty() {
        return Err(SceneError::EmptyChannel {
            clip: clip.to_string(),
            target,
            property,
        });
    }

    for (i, pair) in channel.keyframes.windows(2).enumerate() {
        if pair[1].time < pair[0].time {
            return Err(SceneError::UnsortedKeyframes {
                clip: clip.to_string(),
                target,
                property,
                keyframe: i + 1,
            });
        }
    }

    if channel.interpolation == Interpolation::Cubic {
        if let Some(keyframe) = channel.keyframes.iter().position(|k| k.tangents.is_none()) {
            return Err(SceneError::MissingTangents {
                clip: clip.to_string(),
                target,
                property,
                keyframe,
            });
        }
    }

    Ok(())
}

fn sample_or<T: Interpolate>(channel: Option<&Channel<T>>, time: f32, default: T) -> T {
    channel
        .and_then(|channel| sample_channel(channel, time))
        .unwrap_or(default)
}

/// Samples the channels of one target node
#[derive(Debug, Clone)]
pub struct ChannelSampler {
    channels: ChannelSet,
    start_time: f32,
    end_time: f32,
}

impl ChannelSampler {
    fn new(clip: &str, channels: ChannelSet) -> Result<Self> {
        let target = channels.target;
        if channels.is_empty() {
            return Err(SceneError::EmptyChannelSet {
                clip: clip.to_string(),
                target,
            });
        }

        if let Some(channel) = &channels.translation {
            validate_channel(clip, target, TargetProperty::Translation, channel)?;
        }
        if let Some(channel) = &channels.rotation {
            validate_channel(clip, target, TargetProperty::Rotation, channel)?;
        }
        if let Some(channel) = &channels.scale {
            validate_channel(clip, target, TargetProperty::Scale, channel)?;
        }

        let starts = [
            channels.translation.as_ref().and_then(Channel::start_time),
            channels.rotation.as_ref().and_then(Channel::start_time),
            channels.scale.as_ref().and_then(Channel::start_time),
        ];
        let ends = [
            channels.translation.as_ref().and_then(Channel::end_time),
            channels.rotation.as_ref().and_then(Channel::end_time),
            channels.scale.as_ref().and_then(Channel::end_time),
        ];
        let start_time = starts.into_iter().flatten().fold(f32::INFINITY, f32::min);
        let end_time = ends.into_iter().flatten().fold(f32::NEG_INFINITY, f32::max);

        Ok(Self {
            channels,
            start_time,
            end_time,
        })
    }

    /// Target node index
    pub fn target(&self) -> usize {
        self.channels.target
    }

    /// Earliest keyframe time across all channels
    pub fn start_time(&self) -> f32 {
        self.start_time
    }

    /// Latest keyframe time across all channels
    pub fn end_time(&self) -> f32 {
        self.end_time
    }

    /// Evaluate every channel on its own timeline
    ///
    /// Properties without a channel get their defaults: zero translation,
    /// identity rotation, unit scale.
    pub fn sample<'a>(&self, time: f32, out: &'a mut NodePose) -> &'a mut NodePose {
        out.translation = Some(sample_or(
            self.channels.translation.as_ref(),
            time,
            Vec3::ZERO,
        ));
        out.rotation = Some(sample_or(
            self.channels.rotation.as_ref(),
            time,
            Quat::IDENTITY,
        ));
        out.scale = Some(sample_or(self.channels.scale.as_ref(), time, Vec3::ONE));
        out.update_matrix()
    }
}

/// Evaluates one animation clip at arbitrary times
#[derive(Debug, Clone)]
pub struct ClipSampler {
    name: String,
    nominal_duration: f32,
    channels: Vec<ChannelSampler>,
    by_target: HashMap<usize, usize>,
    targets: Vec<usize>,
    start_time: f32,
    end_time: f32,
}

impl ClipSampler {
    /// Validate a clip and prepare it for sampling
    ///
    /// A clip without channels is valid: it animates nothing and its time
    /// range is `[0, 0]`.
    pub fn new(clip: &AnimationClip) -> Result<Self> {
        let mut channels = Vec::with_capacity(clip.channels.len());
        let mut by_target = HashMap::with_capacity(clip.channels.len());
        for set in &clip.channels {
            if by_target.insert(set.target, channels.len()).is_some() {
                return Err(SceneError::DuplicateTarget {
                    clip: clip.name.clone(),
                    target: set.target,
                });
            }
            channels.push(ChannelSampler::new(&clip.name, set.clone())?);
        }

        let targets = channels.iter().map(ChannelSampler::target).collect();
        let (start_time, end_time) = if channels.is_empty() {
            (0.0, 0.0)
        } else {
            (
                channels
                    .iter()
                    .map(ChannelSampler::start_time)
                    .fold(f32::INFINITY, f32::min),
                channels
                    .iter()
                    .map(ChannelSampler::end_time)
                    .fold(f32::NEG_INFINITY, f32::max),
            )
        };

        debug!(
            "Prepared clip '{}' with {} targets over [{}, {}]",
            clip.name,
            channels.len(),
            start_time,
            end_time
        );

        Ok(Self {
            name: clip.name.clone(),
            nominal_duration: clip.duration,
            channels,
            by_target,
            targets,
            start_time,
            end_time,
        })
    }

    /// Clip name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Duration reported by the source asset
    pub fn nominal_duration(&self) -> f32 {
        self.nominal_duration
    }

    /// Animated target node indices, in clip order
    pub fn targets(&self) -> &[usize] {
        &self.targets
    }

    /// Earliest keyframe time of the clip
    pub fn start_time(&self) -> f32 {
        self.start_time
    }

    /// Latest keyframe time of the clip
    pub fn end_time(&self) -> f32 {
        self.end_time
    }

    /// Length of the keyframed range
    pub fn duration(&self) -> f32 {
        self.end_time - self.start_time
    }

    /// Get the channel sampler for a target node
    pub fn channel(&self, target: usize) -> Option<&ChannelSampler> {
        self.by_target
            .get(&target)
            .and_then(|&index| self.channels.get(index))
    }

    /// Sample one target into `out`
    ///
    /// A target the clip does not animate leaves `out` untouched.
    pub fn sample<'a>(&self, time: f32, target: usize, out: &'a mut NodePose) -> &'a mut NodePose {
        match self.channel(target) {
            Some(channel) => channel.sample(time, out),
            None => out,
        }
    }
}

impl PoseSampler for ClipSampler {
    fn sample_all(&self, time: f32, out: &mut [NodePose]) -> bool {
        let mut changed = false;
        for channel in &self.channels {
            if let Some(pose) = out.get_mut(channel.target()) {
                channel.sample(time, pose);
                changed = true;
            }
        }
        changed
    }
}
