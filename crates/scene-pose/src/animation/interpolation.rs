//! Keyframe interpolation for animation channels

use super::types::{Channel, Interpolate, Interpolation, Keyframe};

/// Find the index of the keyframe at or before the given time
///
/// Returns None if there are no keyframes. A time before the first keyframe
/// yields `Some(0)`. For interpolation this is the earlier keyframe of the
/// bracketing pair `[index]` / `[index + 1]`.
pub fn find_keyframe_index<T>(keyframes: &[Keyframe<T>], time: f32) -> Option<usize> {
    if keyframes.is_empty() {
        return None;
    }

    // Number of keyframes with time <= query, minus one
    let after = keyframes.partition_point(|k| k.time <= time);
    Some(after.saturating_sub(1))
}

/// Sample a channel at the given time
///
/// Times before the first keyframe clamp to its value, times at or after the
/// last keyframe clamp to the last value. Returns None for an empty channel.
pub fn sample_channel<T: Interpolate>(channel: &Channel<T>, time: f32) -> Option<T> {
    let keyframes = channel.keyframes.as_slice();
    let first = keyframes.first()?;
    let last = keyframes.last()?;

    if time <= first.time {
        return Some(first.value.finish());
    }
    if time >= last.time {
        return Some(last.value.finish());
    }

    let index = find_keyframe_index(keyframes, time)?;
    let k0 = &keyframes[index];
    let Some(k1) = keyframes.get(index + 1) else {
        return Some(k0.value.finish());
    };

    let duration = k1.time - k0.time;
    let t = if duration > 0.0 {
        (time - k0.time) / duration
    } else {
        0.0
    };

    let value = match channel.interpolation {
        Interpolation::Step => k0.value,
        Interpolation::Linear => k0.value.lerp(&k1.value, t),
        Interpolation::Cubic => {
            let out_tangent = k0.tangents.map_or(T::ZERO_TANGENT, |k| k.out_tangent);
            let in_tangent = k1.tangents.map_or(T::ZERO_TANGENT, |k| k.in_tangent);
            T::hermite(
                &k0.value,
                &out_tangent.scaled(duration),
                &k1.value,
                &in_tangent.scaled(duration),
                t,
            )
        }
    };

    Some(value.finish())
}
