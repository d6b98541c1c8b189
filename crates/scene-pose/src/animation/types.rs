//! Animation clip data model
//!
//! Pure data produced by an importer. A clip holds one [`ChannelSet`] per
//! animated node; each set holds up to three independent [`Channel`]s with
//! their own interpolation mode and their own keyframe times.

use std::fmt;

use glam::{Quat, Vec3, Vec4};

/// How values between two keyframes are computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-support", serde(rename_all = "lowercase"))]
pub enum Interpolation {
    /// Hold the earlier keyframe's value
    Step,
    /// Straight blend between the two keyframes (normalized for rotations)
    #[default]
    Linear,
    /// Cubic Hermite spline using per-keyframe tangents
    Cubic,
}

/// The node property a channel animates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-support", serde(rename_all = "lowercase"))]
pub enum TargetProperty {
    Translation,
    Rotation,
    Scale,
}

impl fmt::Display for TargetProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Translation => write!(f, "translation"),
            Self::Rotation => write!(f, "rotation"),
            Self::Scale => write!(f, "scale"),
        }
    }
}

/// In and out tangents of a cubic keyframe
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct Tangents<T> {
    pub in_tangent: T,
    pub out_tangent: T,
}

/// A time-stamped value
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct Keyframe<T> {
    /// Time in seconds
    pub time: f32,
    pub value: T,
    /// Required by [`Interpolation::Cubic`], ignored otherwise
    pub tangents: Option<Tangents<T>>,
}

impl<T> Keyframe<T> {
    /// Create a keyframe without tangents
    pub const fn new(time: f32, value: T) -> Self {
        Self {
            time,
            value,
            tangents: None,
        }
    }

    /// Create a keyframe for cubic interpolation
    pub const fn cubic(time: f32, in_tangent: T, value: T, out_tangent: T) -> Self {
        Self {
            time,
            value,
            tangents: Some(Tangents {
                in_tangent,
                out_tangent,
            }),
        }
    }
}

/// Keyframes for one property of one node
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct Channel<T> {
    #[cfg_attr(feature = "serde-support", serde(default))]
    pub interpolation: Interpolation,
    /// Keyframes in ascending time order
    pub keyframes: Vec<Keyframe<T>>,
}

impl<T> Channel<T> {
    pub fn new(interpolation: Interpolation, keyframes: Vec<Keyframe<T>>) -> Self {
        Self {
            interpolation,
            keyframes,
        }
    }

    /// Time of the first keyframe
    pub fn start_time(&self) -> Option<f32> {
        self.keyframes.first().map(|k| k.time)
    }

    /// Time of the last keyframe
    pub fn end_time(&self) -> Option<f32> {
        self.keyframes.last().map(|k| k.time)
    }
}

/// All channels animating one target node
///
/// A missing channel means the clip does not animate that property.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-support", serde(default))]
pub struct ChannelSet {
    /// Target node index
    pub target: usize,
    pub translation: Option<Channel<Vec3>>,
    pub rotation: Option<Channel<Quat>>,
    pub scale: Option<Channel<Vec3>>,
}

impl ChannelSet {
    /// Create an empty channel set for a target node
    pub fn new(target: usize) -> Self {
        Self {
            target,
            ..Default::default()
        }
    }

    /// Animate the translation with this channel
    pub fn with_translation(mut self, channel: Channel<Vec3>) -> Self {
        self.translation = Some(channel);
        self
    }

    /// Animate the rotation with this channel
    pub fn with_rotation(mut self, channel: Channel<Quat>) -> Self {
        self.rotation = Some(channel);
        self
    }

    /// Animate the scale with this channel
    pub fn with_scale(mut self, channel: Channel<Vec3>) -> Self {
        self.scale = Some(channel);
        self
    }

    /// Whether no property is animated
    pub fn is_empty(&self) -> bool {
        self.translation.is_none() && self.rotation.is_none() && self.scale.is_none()
    }
}

/// A named animation
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-support", serde(default))]
pub struct AnimationClip {
    pub name: String,
    /// Duration reported by the source asset, in seconds
    ///
    /// Informational only; sampling derives its time range from the keyframes.
    pub duration: f32,
    pub channels: Vec<ChannelSet>,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, channels: Vec<ChannelSet>) -> Self {
        Self {
            name: name.into(),
            duration: 0.0,
            channels,
        }
    }
}

/// Values that can be sampled from a channel
pub trait Interpolate: Copy {
    /// Tangent used when a cubic keyframe carries none
    const ZERO_TANGENT: Self;

    /// Blend between self and other
    fn lerp(&self, other: &Self, t: f32) -> Self;

    /// Multiply every component by a factor
    fn scaled(&self, factor: f32) -> Self;

    /// Two-point cubic Hermite spline
    ///
    /// `m0` and `m1` are already scaled by the segment duration.
    fn hermite(p0: &Self, m0: &Self, p1: &Self, m1: &Self, t: f32) -> Self;

    /// Post-process a sampled value
    fn finish(self) -> Self {
        self
    }
}

/// Cubic Hermite basis weights `(h00, h10, h01, h11)`
#[inline]
pub(crate) fn hermite_basis(t: f32) -> (f32, f32, f32, f32) {
    let t2 = t * t;
    let t3 = t2 * t;
    (
        2.0 * t3 - 3.0 * t2 + 1.0,
        t3 - 2.0 * t2 + t,
        -2.0 * t3 + 3.0 * t2,
        t3 - t2,
    )
}

impl Interpolate for Vec3 {
    const ZERO_TANGENT: Self = Self::ZERO;

    fn lerp(&self, other: &Self, t: f32) -> Self {
        Self::lerp(*self, *other, t)
    }

    fn scaled(&self, factor: f32) -> Self {
        *self * factor
    }

    fn hermite(p0: &Self, m0: &Self, p1: &Self, m1: &Self, t: f32) -> Self {
        let (h00, h10, h01, h11) = hermite_basis(t);
        *p0 * h00 + *m0 * h10 + *p1 * h01 + *m1 * h11
    }
}

impl Interpolate for Quat {
    const ZERO_TANGENT: Self = Self::from_xyzw(0.0, 0.0, 0.0, 0.0);

    fn lerp(&self, other: &Self, t: f32) -> Self {
        // Normalized lerp along the shorter arc
        Self::lerp(*self, *other, t)
    }

    fn scaled(&self, factor: f32) -> Self {
        Self::from_vec4(Vec4::from(*self) * factor)
    }

    fn hermite(p0: &Self, m0: &Self, p1: &Self, m1: &Self, t: f32) -> Self {
        let (h00, h10, h01, h11) = hermite_basis(t);
        let v = Vec4::from(*p0) * h00
            + Vec4::from(*m0) * h10
            + Vec4::from(*p1) * h01
            + Vec4::from(*m1) * h11;
        Self::from_vec4(v).finish()
    }

    fn finish(self) -> Self {
        Vec4::from(self)
            .try_normalize()
            .map_or(Self::IDENTITY, Self::from_vec4)
    }
}
