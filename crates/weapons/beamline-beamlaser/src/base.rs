//! State owned by the generic weapon base and the carrying unit.
//!
//! Target acquisition, reload, and salvo scheduling live outside this crate;
//! the beam laser only reads these fields and writes back the handful it owns
//! (positions, wanted direction, salvo sizing, lead prediction).

use glam::Vec3;
use serde::{Deserialize, Serialize};

use beamline_core::entity::{TeamId, UnitId};
use beamline_core::time::Frame;

/// What the weapon base is currently aiming at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum AimTarget {
    #[default]
    None,
    Unit {
        id: UnitId,
        pos: Vec3,
        radius: f32,
    },
    Ground(Vec3),
}

impl AimTarget {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn pos(&self) -> Option<Vec3> {
        match self {
            Self::None => None,
            Self::Unit { pos, .. } | Self::Ground(pos) => Some(*pos),
        }
    }

    /// Hit-sphere radius when aiming at a unit.
    pub fn unit_radius(&self) -> Option<f32> {
        match self {
            Self::Unit { radius, .. } => Some(*radius),
            _ => None,
        }
    }
}

/// Snapshot of the unit carrying the weapon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OwnerState {
    pub id: UnitId,
    pub team: TeamId,
    pub pos: Vec3,
    pub front: Vec3,
    pub up: Vec3,
    pub right: Vec3,
    /// Point the unit aims from; used to detect an overshooting muzzle.
    pub aim_pos: Vec3,
    pub radius: f32,
    pub immobile: bool,
    /// A player is steering the unit directly.
    pub direct_control: bool,
    /// The unit flies with strafing air movement, which cannot align to a target.
    pub strafing_air: bool,
    /// Experience mapped into 0..1.
    pub lim_experience: f32,
}

impl Default for OwnerState {
    fn default() -> Self {
        Self {
            id: 1,
            team: 0,
            pos: Vec3::ZERO,
            front: Vec3::Z,
            up: Vec3::Y,
            right: Vec3::NEG_X,
            aim_pos: Vec3::ZERO,
            radius: 10.0,
            immobile: false,
            direct_control: false,
            strafing_air: false,
            lim_experience: 0.0,
        }
    }
}

impl OwnerState {
    /// Transform a unit-relative offset (x right, y up, z front) into world space.
    pub fn to_world(&self, rel: Vec3) -> Vec3 {
        self.pos + self.front * rel.z + self.up * rel.y + self.right * rel.x
    }
}

/// Per-instance fields of the generic weapon base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponBase {
    /// Weapon slot on the owner.
    pub weapon_num: usize,
    pub rel_weapon_pos: Vec3,
    pub rel_muzzle_pos: Vec3,
    pub weapon_pos: Vec3,
    pub muzzle_pos: Vec3,
    pub target: AimTarget,
    pub wanted_dir: Vec3,
    pub salvo_size: u32,
    /// Shots left in the current salvo; decremented before each shot fires.
    pub salvo_left: u32,
    pub salvo_delay: u32,
    /// Frames of target lead.
    pub predict: u32,
    /// Aim error sampled at salvo start.
    pub salvo_error: Vec3,
    pub muzzle_flare_size: f32,
    pub frame: Frame,
}

impl Default for WeaponBase {
    fn default() -> Self {
        Self {
            weapon_num: 0,
            rel_weapon_pos: Vec3::ZERO,
            rel_muzzle_pos: Vec3::ZERO,
            weapon_pos: Vec3::ZERO,
            muzzle_pos: Vec3::ZERO,
            target: AimTarget::None,
            wanted_dir: Vec3::Z,
            salvo_size: 1,
            salvo_left: 0,
            salvo_delay: 0,
            predict: 0,
            salvo_error: Vec3::ZERO,
            muzzle_flare_size: 1.0,
            frame: 0,
        }
    }
}

impl WeaponBase {
    /// The shot about to fire is the first of its salvo.
    pub fn is_first_salvo_shot(&self) -> bool {
        self.salvo_left + 1 == self.salvo_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_world_uses_owner_basis() {
        let owner = OwnerState {
            pos: Vec3::new(100.0, 0.0, 100.0),
            front: Vec3::X,
            up: Vec3::Y,
            right: Vec3::NEG_Z,
            ..Default::default()
        };
        let p = owner.to_world(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(p, Vec3::new(103.0, 2.0, 99.0));
    }

    #[test]
    fn first_salvo_shot_detection() {
        let mut base = WeaponBase {
            salvo_size: 3,
            salvo_left: 2,
            ..Default::default()
        };
        assert!(base.is_first_salvo_shot());
        base.salvo_left = 1;
        assert!(!base.is_first_salvo_shot());
    }

    #[test]
    fn target_accessors() {
        assert!(AimTarget::None.pos().is_none());
        let t = AimTarget::Unit {
            id: 3,
            pos: Vec3::ONE,
            radius: 5.0,
        };
        assert_eq!(t.pos(), Some(Vec3::ONE));
        assert_eq!(t.unit_radius(), Some(5.0));
        assert_eq!(AimTarget::Ground(Vec3::ZERO).unit_radius(), None);
    }
}
