//! Clip selection and playback time mapping

use std::sync::Arc;

use log::{debug, warn};

use super::sampler::{ClipSampler, PoseSampler};
use super::types::AnimationClip;
use crate::error::Result;
use crate::hierarchy::NodePose;

/// How a clock outside the clip range maps back into it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-support", serde(rename_all = "lowercase"))]
pub enum PlaybackMode {
    /// Hold the last frame once the clip ends
    #[default]
    Clamp,
    /// Wrap back to the start
    Loop,
}

impl PlaybackMode {
    /// Map a clock onto a clip ending at `end_time`
    pub fn map_time(self, time: f32, end_time: f32) -> f32 {
        match self {
            Self::Clamp => time.min(end_time),
            Self::Loop if end_time > 0.0 => time.rem_euclid(end_time),
            Self::Loop => 0.0,
        }
    }
}

/// Selects a clip by name or by index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipSelector<'a> {
    Index(usize),
    Name(&'a str),
}

impl From<usize> for ClipSelector<'_> {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl<'a> From<&'a str> for ClipSelector<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

/// Holds the samplers of a model's clips and plays one of them
///
/// Clones share the validated samplers and keep their own current clip and
/// playback mode.
#[derive(Debug, Clone)]
pub struct AnimationPlayer {
    clips: Arc<[ClipSampler]>,
    current: Option<usize>,
    mode: PlaybackMode,
}

impl AnimationPlayer {
    /// Build and validate a sampler for every clip
    pub fn new(clips: &[AnimationClip]) -> Result<Self> {
        let clips = clips
            .iter()
            .map(ClipSampler::new)
            .collect::<Result<Vec<_>>>()?;
        debug!("Animation player with {} clips", clips.len());

        Ok(Self {
            clips: Arc::from(clips),
            current: None,
            mode: PlaybackMode::default(),
        })
    }

    /// Make a clip current
    ///
    /// Clears the current clip and returns None if nothing matches.
    pub fn load_clip<'a>(
        &mut self,
        selector: impl Into<ClipSelector<'a>>,
        mode: PlaybackMode,
    ) -> Option<&ClipSampler> {
        let selector = selector.into();
        self.current = match selector {
            ClipSelector::Index(index) => (index < self.clips.len()).then_some(index),
            ClipSelector::Name(name) => self.clips.iter().position(|clip| clip.name() == name),
        };
        self.mode = mode;

        if self.current.is_none() {
            warn!("Animation clip {:?} not found", selector);
        }
        self.clip()
    }

    /// Stop playing any clip
    pub fn clear(&mut self) {
        self.current = None;
    }

    /// The current clip
    pub fn clip(&self) -> Option<&ClipSampler> {
        self.current.and_then(|index| self.clips.get(index))
    }

    pub fn clips(&self) -> &[ClipSampler] {
        &self.clips
    }

    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    pub fn playback_mode(&self) -> PlaybackMode {
        self.mode
    }
}

impl PoseSampler for AnimationPlayer {
    fn sample_all(&self, time: f32, out: &mut [NodePose]) -> bool {
        let Some(clip) = self.clip() else {
            return false;
        };
        clip.sample_all(self.mode.map_time(time, clip.end_time()), out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::types::{Channel, ChannelSet, Interpolation, Keyframe};
    use glam::Vec3;
    use rstest::rstest;

    fn slide(name: &str, distance: f32) -> AnimationClip {
        AnimationClip::new(
            name,
            vec![ChannelSet::new(0).with_translation(Channel::new(
                Interpolation::Linear,
                vec![
                    Keyframe::new(0.0, Vec3::ZERO),
                    Keyframe::new(2.0, Vec3::new(distance, 0.0, 0.0)),
                ],
            ))],
        )
    }

    fn player() -> AnimationPlayer {
        AnimationPlayer::new(&[slide("walk", 2.0), slide("run", 4.0)]).unwrap()
    }

    #[rstest]
    #[case(PlaybackMode::Clamp, 1.0, 2.0, 1.0)]
    #[case(PlaybackMode::Clamp, 5.0, 2.0, 2.0)]
    #[case(PlaybackMode::Loop, 5.0, 2.0, 1.0)]
    #[case(PlaybackMode::Loop, -0.5, 2.0, 1.5)]
    #[case(PlaybackMode::Loop, 3.0, 0.0, 0.0)]
    fn test_map_time(
        #[case] mode: PlaybackMode,
        #[case] time: f32,
        #[case] end: f32,
        #[case] expected: f32,
    ) {
        assert!((mode.map_time(time, end) - expected).abs() < 0.001);
    }

    #[test]
    fn test_load_clip_by_name_and_index() {
        let mut player = player();
        assert_eq!(player.clip_count(), 2);
        assert!(player.clip().is_none());

        let clip = player.load_clip("run", PlaybackMode::Loop).unwrap();
        assert_eq!(clip.name(), "run");
        assert_eq!(player.playback_mode(), PlaybackMode::Loop);

        let clip = player.load_clip(0_usize, PlaybackMode::Clamp).unwrap();
        assert_eq!(clip.name(), "walk");
    }

    #[test]
    fn test_load_missing_clip_clears_current() {
        let mut player = player();
        player.load_clip("walk", PlaybackMode::Clamp);

        assert!(player.load_clip("swim", PlaybackMode::Clamp).is_none());
        assert!(player.clip().is_none());
        assert!(player.load_clip(9_usize, PlaybackMode::Clamp).is_none());
    }

    #[test]
    fn test_sample_all_without_clip() {
        let player = player();
        let mut poses = vec![NodePose::default()];
        assert!(!player.sample_all(1.0, &mut poses));
        assert_eq!(poses[0], NodePose::default());
    }

    #[test]
    fn test_sample_all_loops() {
        let mut player = player();
        player.load_clip("run", PlaybackMode::Loop);

        let mut poses = vec![NodePose::default()];
        assert!(player.sample_all(3.0, &mut poses));
        let x = poses[0].translation.unwrap().x;
        assert!((x - 2.0).abs() < 0.001);

        player.clear();
        assert!(!player.sample_all(3.0, &mut poses));
    }

    #[test]
    fn test_new_rejects_invalid_clip() {
        let bad = AnimationClip::new("bad", vec![ChannelSet::new(1)]);
        let result = AnimationPlayer::new(&[slide("walk", 1.0), bad]);
        assert!(result.is_err());
    }

    #[test]
    fn test_clip_without_channels_is_playable() {
        let mut player =
            AnimationPlayer::new(&[slide("walk", 1.0), AnimationClip::new("idle", vec![])])
                .unwrap();

        let idle = player.load_clip("idle", PlaybackMode::Loop).unwrap();
        assert_eq!(idle.end_time(), 0.0);
        let mut poses = vec![NodePose::default()];
        assert!(!player.sample_all(2.5, &mut poses));
        assert_eq!(poses[0], NodePose::default());

        // The other clips of the set stay usable
        player.load_clip("walk", PlaybackMode::Clamp).unwrap();
        assert!(player.sample_all(2.5, &mut poses));
    }

    #[test]
    fn test_clones_share_samplers() {
        let mut a = player();
        let b = a.clone();
        a.load_clip("run", PlaybackMode::Loop);

        assert!(std::ptr::eq(a.clips().as_ptr(), b.clips().as_ptr()));
        assert!(b.clip().is_none());
        assert_eq!(b.playback_mode(), PlaybackMode::Clamp);
    }
}
