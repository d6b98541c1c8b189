//! Per-instance pose state
//!
//! A [`Pose`] holds everything that changes from frame to frame for one
//! instance of a model: the local pose of every node, the resulting global
//! transforms and one joint matrix buffer per skin. The static hierarchy and
//! skins are shared through [`Arc`], so many poses can drive independent
//! instances of the same model.
//!
//! All buffers are allocated in [`Pose::new`]. The per-frame operations
//! ([`Pose::update`], [`Pose::update_from_animation`], [`Pose::update_skin`])
//! write into them in place.

use std::sync::Arc;

use glam::Mat4;
use log::{debug, trace};

use crate::animation::PoseSampler;
use crate::compose::compose_skin;
use crate::hierarchy::{NodeHierarchy, NodePose};
use crate::skin::Skin;

/// Mutable pose of one model instance
#[derive(Debug, Clone)]
pub struct Pose {
    hierarchy: Arc<NodeHierarchy>,
    skins: Arc<[Skin]>,
    local_pose: Vec<NodePose>,
    transforms: Vec<Mat4>,
    skin_buffers: Vec<Option<Vec<Mat4>>>,
}

impl Pose {
    /// Allocate all buffers and reset to the rest pose
    ///
    /// A joint matrix buffer is created for every skin that some node
    /// references. Skins no node uses get no buffer.
    pub fn new(hierarchy: Arc<NodeHierarchy>, skins: Arc<[Skin]>) -> Self {
        let mut skin_buffers: Vec<Option<Vec<Mat4>>> = vec![None; skins.len()];
        for skin_id in hierarchy.nodes().iter().filter_map(|node| node.skin) {
            let (Some(slot), Some(skin)) = (skin_buffers.get_mut(skin_id), skins.get(skin_id))
            else {
                continue;
            };
            if slot.is_none() {
                *slot = Some(vec![Mat4::IDENTITY; skin.joint_count()]);
            }
        }

        let node_count = hierarchy.len();
        let mut pose = Self {
            hierarchy,
            skins,
            local_pose: vec![NodePose::default(); node_count],
            transforms: vec![Mat4::IDENTITY; node_count],
            skin_buffers,
        };
        pose.reset();

        debug!(
            "Created pose with {} nodes and {} skin buffers",
            node_count,
            pose.skin_buffers.iter().flatten().count()
        );
        pose
    }

    /// Shared static hierarchy
    pub fn hierarchy(&self) -> &Arc<NodeHierarchy> {
        &self.hierarchy
    }

    /// Shared skins
    pub fn skins(&self) -> &[Skin] {
        &self.skins
    }

    /// Current local pose, one entry per node
    pub fn local_pose(&self) -> &[NodePose] {
        &self.local_pose
    }

    /// Mutable local pose for external edits
    ///
    /// Call [`Self::update`] afterwards to refresh the global transforms.
    pub fn local_pose_mut(&mut self) -> &mut [NodePose] {
        &mut self.local_pose
    }

    /// Current global transform of every node
    pub fn transforms(&self) -> &[Mat4] {
        &self.transforms
    }

    /// Joint matrices of a skin as last written by [`Self::update_skin`]
    pub fn skin_buffer(&self, skin: usize) -> Option<&[Mat4]> {
        self.skin_buffers
            .get(skin)
            .and_then(Option::as_deref)
    }

    /// Return to the rest pose
    pub fn reset(&mut self) {
        self.hierarchy.calculate_local_pose(&mut self.local_pose);
        self.update();
    }

    /// Recompute global transforms from the current local pose
    pub fn update(&mut self) {
        self.hierarchy
            .update_global_transforms(&mut self.local_pose, &mut self.transforms);
    }

    /// Sample animation into the local pose, then refresh global transforms
    ///
    /// Global transforms are left untouched when the sampler writes nothing.
    /// Returns whether anything changed.
    pub fn update_from_animation<S>(&mut self, time: f32, sampler: &S) -> bool
    where
        S: PoseSampler + ?Sized,
    {
        if !sampler.sample_all(time, &mut self.local_pose) {
            trace!("No animated nodes at time {}", time);
            return false;
        }
        self.update();
        true
    }

    /// Compute the joint matrices of a skin for the mesh at `node`
    ///
    /// Joints with an inverse bind matrix get
    /// `mesh_global_inverse * joint_global * inverse_bind`, where the mesh
    /// inverse is the rest-pose inverse cached by the hierarchy. Joints
    /// without one get a copy of their global transform. Joints pointing at
    /// missing nodes keep their previous value.
    ///
    /// Returns None when the skin does not exist or no node references it.
    pub fn update_skin(&mut self, skin: usize, node: usize) -> Option<&[Mat4]> {
        let definition = self.skins.get(skin)?;
        let buffer = self.skin_buffers.get_mut(skin)?.as_mut()?;
        let mesh_inverse = self
            .hierarchy
            .global_inverse_transforms()
            .get(node)
            .copied()
            .unwrap_or(Mat4::IDENTITY);

        for (j, (slot, &joint)) in buffer.iter_mut().zip(&definition.joints).enumerate() {
            let Some(joint_global) = self.transforms.get(joint) else {
                continue;
            };
            *slot = match definition.inverse_bind_matrix(j) {
                Some(inverse_bind) => compose_skin(&mesh_inverse, joint_global, inverse_bind),
                None => *joint_global,
            };
        }

        Some(buffer.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationClip, Channel, ChannelSet, ClipSampler, Interpolation, Keyframe};
    use crate::hierarchy::Node;
    use glam::{Quat, Vec3};

    /// root(0) -> joint(1) -> joint(2), plus a skinned mesh node(3) under root
    fn rig() -> (Arc<NodeHierarchy>, Arc<[Skin]>) {
        let nodes = vec![
            Node {
                children: vec![1, 3],
                translation: Some(Vec3::new(0.0, 0.0, 5.0)),
                ..Default::default()
            },
            Node {
                children: vec![2],
                translation: Some(Vec3::new(0.0, 1.0, 0.0)),
                ..Default::default()
            },
            Node {
                translation: Some(Vec3::new(0.0, 1.0, 0.0)),
                rotation: Some(Quat::from_rotation_z(0.5)),
                ..Default::default()
            },
            Node {
                mesh: Some(0),
                skin: Some(0),
                translation: Some(Vec3::new(2.0, 0.0, 0.0)),
                ..Default::default()
            },
        ];
        let hierarchy = NodeHierarchy::new(nodes, vec![0]);

        let globals = hierarchy.global_transforms();
        let skin = Skin::new(
            vec![1, 2],
            vec![Some(globals[1].inverse()), Some(globals[2].inverse())],
        );
        (Arc::new(hierarchy), Arc::from(vec![skin, Skin::new(vec![0], vec![])]))
    }

    #[test]
    fn test_new_matches_rest_pose() {
        let (hierarchy, skins) = rig();
        let pose = Pose::new(hierarchy.clone(), skins);

        assert_eq!(pose.transforms(), hierarchy.global_transforms());
        assert_eq!(pose.local_pose().len(), 4);
        assert_eq!(pose.skin_buffer(0).map(<[Mat4]>::len), Some(2));
        // Skin 1 is not referenced by any node
        assert!(pose.skin_buffer(1).is_none());
    }

    #[test]
    fn test_skin_is_identity_in_bind_pose() {
        let (hierarchy, skins) = rig();
        let mut pose = Pose::new(hierarchy.clone(), skins);

        let mesh_global = hierarchy.global_transforms()[3];
        let joints = pose.update_skin(0, 3).unwrap();
        for joint in joints {
            // Bind pose leaves only the mesh node's own inverse
            assert!((mesh_global * *joint).abs_diff_eq(Mat4::IDENTITY, 0.001));
        }
    }

    #[test]
    fn test_skin_without_inverse_bind_copies_global() {
        let nodes = vec![
            Node {
                children: vec![1],
                translation: Some(Vec3::X),
                ..Default::default()
            },
            Node {
                skin: Some(0),
                ..Default::default()
            },
        ];
        let hierarchy = Arc::new(NodeHierarchy::new(nodes, vec![0]));
        let skins: Arc<[Skin]> = Arc::from(vec![Skin::new(vec![0, 9], vec![None])]);
        let mut pose = Pose::new(hierarchy, skins);

        let joints = pose.update_skin(0, 1).unwrap();
        assert_eq!(joints[0], Mat4::from_translation(Vec3::X));
        // Missing joint node keeps its previous value
        assert_eq!(joints[1], Mat4::IDENTITY);
    }

    #[test]
    fn test_update_skin_unknown() {
        let (hierarchy, skins) = rig();
        let mut pose = Pose::new(hierarchy, skins);
        assert!(pose.update_skin(5, 3).is_none());
        assert!(pose.update_skin(1, 3).is_none());
    }

    #[test]
    fn test_update_after_local_edit() {
        let (hierarchy, skins) = rig();
        let mut pose = Pose::new(hierarchy, skins);

        pose.local_pose_mut()[1].translation = Some(Vec3::new(0.0, 3.0, 0.0));
        pose.update();

        let position = pose.transforms()[2].w_axis.truncate();
        assert!(position.abs_diff_eq(Vec3::new(0.0, 4.0, 5.0), 0.001));

        pose.reset();
        let position = pose.transforms()[2].w_axis.truncate();
        assert!(position.abs_diff_eq(Vec3::new(0.0, 2.0, 5.0), 0.001));
    }

    #[test]
    fn test_update_from_animation() {
        let (hierarchy, skins) = rig();
        let mut pose = Pose::new(hierarchy, skins);

        let clip = ClipSampler::new(&AnimationClip::new(
            "lift",
            vec![ChannelSet::new(1).with_translation(Channel::new(
                Interpolation::Linear,
                vec![
                    Keyframe::new(0.0, Vec3::ZERO),
                    Keyframe::new(1.0, Vec3::new(0.0, 2.0, 0.0)),
                ],
            ))],
        ))
        .unwrap();

        assert!(pose.update_from_animation(0.5, &clip));
        let position = pose.transforms()[1].w_axis.truncate();
        assert!(position.abs_diff_eq(Vec3::new(0.0, 1.0, 5.0), 0.001));
        assert_eq!(pose.local_pose()[1].scale, Some(Vec3::ONE));
    }

    #[test]
    fn test_update_from_clip_without_channels_is_noop() {
        let (hierarchy, skins) = rig();
        let mut pose = Pose::new(hierarchy, skins);
        pose.local_pose_mut()[2].scale = Some(Vec3::splat(3.0));

        let clip = ClipSampler::new(&AnimationClip::new("idle", vec![])).unwrap();

        let before = pose.transforms().to_vec();
        assert!(!pose.update_from_animation(0.5, &clip));
        assert_eq!(pose.transforms(), before.as_slice());
        // The pending local edit was not folded into the globals
        assert_eq!(pose.local_pose()[2].scale, Some(Vec3::splat(3.0)));
    }

    #[test]
    fn test_per_frame_path_reuses_buffers() {
        let (hierarchy, skins) = rig();
        let mut pose = Pose::new(hierarchy, skins);
        let clip = ClipSampler::new(&AnimationClip::new(
            "spin",
            vec![ChannelSet::new(2).with_rotation(Channel::new(
                Interpolation::Linear,
                vec![
                    Keyframe::new(0.0, Quat::IDENTITY),
                    Keyframe::new(1.0, Quat::from_rotation_z(1.0)),
                ],
            ))],
        ))
        .unwrap();

        let transforms = pose.transforms().as_ptr();
        let locals = pose.local_pose().as_ptr();
        let joints = pose.update_skin(0, 3).map(<[Mat4]>::as_ptr);

        for step in 0..4 {
            pose.reset();
            pose.update_from_animation(step as f32 * 0.3, &clip);
            pose.update();
            let written = pose.update_skin(0, 3).map(<[Mat4]>::as_ptr);

            assert_eq!(written, joints);
            assert_eq!(pose.skin_buffer(0).map(<[Mat4]>::as_ptr), joints);
            assert_eq!(pose.transforms().as_ptr(), transforms);
            assert_eq!(pose.local_pose().as_ptr(), locals);
        }
    }

    #[test]
    fn test_update_from_animation_without_targets_is_noop() {
        let (hierarchy, skins) = rig();
        let mut pose = Pose::new(hierarchy, skins);
        pose.local_pose_mut()[1].translation = Some(Vec3::splat(7.0));

        // Targets outside the hierarchy write nothing
        let clip = ClipSampler::new(&AnimationClip::new(
            "elsewhere",
            vec![ChannelSet::new(40).with_scale(Channel::new(
                Interpolation::Step,
                vec![Keyframe::new(0.0, Vec3::splat(2.0))],
            ))],
        ))
        .unwrap();

        let before = pose.transforms().to_vec();
        assert!(!pose.update_from_animation(0.0, &clip));
        assert_eq!(pose.transforms(), before.as_slice());
    }
}
