//! Fire direction for the next beam.

use glam::Vec3;

use beamline_core::math::safe_normalize;
use beamline_core::services::PieceKinematics;

use crate::BeamLaserState;
use crate::base::{OwnerState, WeaponBase};
use crate::config::BeamLaserDef;

/// Fraction of the aim error and spray that survives the owner's experience.
pub fn experience_factor(def: &BeamLaserDef, owner: &OwnerState) -> f32 {
    1.0 - owner.lim_experience * def.owner_exp_acc_weight
}

/// Direction of a regular (target-seeking) shot.
///
/// The first shot of a salvo aims at the target and caches the result;
/// later shots reuse it, except beamburst weapons which re-aim every shot.
pub fn regular_fire_dir(
    def: &BeamLaserDef,
    state: &mut BeamLaserState,
    base: &WeaponBase,
    owner: &OwnerState,
) -> Vec3 {
    let target_pos = base
        .target
        .pos()
        .unwrap_or(base.muzzle_pos + owner.front);

    let mut dir = if def.only_forward && owner.strafing_air {
        owner.front
    } else if base.is_first_salvo_shot() {
        let dir = safe_normalize(target_pos - base.muzzle_pos);
        state.old_dir = dir;
        dir
    } else if def.beamburst {
        safe_normalize(target_pos - base.muzzle_pos)
    } else {
        state.old_dir
    };

    dir = safe_normalize(dir + base.salvo_error * experience_factor(def, owner));

    // A long barrel can put the muzzle past the target; flip so the beam
    // still heads through it.
    if (target_pos - base.muzzle_pos).dot(target_pos - owner.aim_pos) < 0.0 {
        dir = -dir;
    }

    dir
}

/// Direction of a sweep shot, read from the weapon piece's current orientation.
///
/// Also moves the weapon position to the piece. Consecutive sweep points do
/// not trace a continuous arc between the old and new target; this is a known
/// limitation of following the piece and is kept as is.
pub fn sweep_fire_dir(
    base: &mut WeaponBase,
    owner: &OwnerState,
    pieces: &dyn PieceKinematics,
) -> Vec3 {
    let Some(piece) = pieces.weapon_piece(owner.id, base.weapon_num) else {
        return owner.front;
    };
    let mat = pieces.piece_matrix(owner.id, piece);

    let rel_pos = mat.w_axis.truncate();
    let piece_dir =
        owner.front * mat.z_axis.z + owner.up * mat.y_axis.z + owner.right * mat.x_axis.z;

    base.weapon_pos = owner.pos + owner.front * -rel_pos.z + owner.up * rel_pos.y
        + owner.right * -rel_pos.x;

    safe_normalize(piece_dir)
}

/// Fire direction for the upcoming beam.
pub fn fire_dir(
    def: &BeamLaserDef,
    state: &mut BeamLaserState,
    base: &mut WeaponBase,
    owner: &OwnerState,
    sweep: bool,
    pieces: &dyn PieceKinematics,
) -> Vec3 {
    if sweep {
        sweep_fire_dir(base, owner, pieces)
    } else {
        regular_fire_dir(def, state, base, owner)
    }
}
