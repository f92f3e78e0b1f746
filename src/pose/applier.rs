use crate::errors::Result;
use crate::humanoid::Rig;
use crate::pose::model::Pose;
use crate::scene::{BoundingBox, Camera, FramingConfig};

/// Writes poses onto rigs.
pub struct PoseApplier;

impl PoseApplier {
    /// Applies `pose` to `rig`:
    ///
    /// 1. resets the humanoid to its rest pose, so bones absent from `pose`
    ///    end up at bind pose;
    /// 2. writes each bone of `pose` (bones the rig lacks are skipped);
    /// 3. propagates the hierarchy;
    /// 4. sets the rig root rotation from the pose's scene rotation (zero
    ///    when absent) and propagates again.
    ///
    /// Fails with [`HumanoidMissing`](crate::errors::PoseLabError::HumanoidMissing)
    /// before touching the rig when it has no humanoid layer.
    pub fn apply(pose: &Pose, rig: &mut Rig) -> Result<()> {
        rig.write_pose(pose, true)?;
        rig.update();

        rig.set_root_rotation(pose.scene_rotation_or_default().to_quat());
        rig.update();

        log::debug!("Applied {} bones to rig '{}'", pose.len(), rig.name);
        Ok(())
    }

    /// Points `camera` at the rig's current world bounds. Returns the
    /// camera distance.
    pub fn frame(rig: &Rig, camera: &mut Camera, config: FramingConfig) -> f32 {
        let bounds = rig.world_bounds().unwrap_or_else(|| {
            let origin = rig
                .scene
                .get_node(rig.root())
                .map(|n| n.transform.world_position())
                .unwrap_or_default();
            BoundingBox {
                min: origin,
                max: origin,
            }
        });
        camera.frame_bounds(&bounds, config)
    }
}
