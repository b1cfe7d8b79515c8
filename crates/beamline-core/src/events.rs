use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::damage::DamageArray;
use crate::entity::{BeamColor, HitTarget, UnitId, WeaponDefId};
use crate::time::Frame;

/// One straight piece of a fired beam, handed off to the projectile/rendering side.
///
/// Ownership moves to the emitter; the weapon never touches a segment again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamSegment {
    pub weapon: WeaponDefId,
    pub owner: UnitId,
    pub start: Vec3,
    pub end: Vec3,
    /// Lifetime in frames, at least 1.
    pub ttl: u32,
    pub start_alpha: f32,
    pub end_alpha: f32,
    pub color: BeamColor,
}

impl BeamSegment {
    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }
}

/// Everything the explosion resolver needs to apply a beam's terminal hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplosionParams {
    pub pos: Vec3,
    /// Direction the beam was travelling when it hit.
    pub dir: Vec3,
    pub damages: DamageArray,
    pub weapon: WeaponDefId,
    pub owner: UnitId,
    /// Terminal hit; a unit carries the piece it was struck on.
    pub hit: HitTarget,
    pub frame: Frame,
    pub crater_area_of_effect: f32,
    pub damage_area_of_effect: f32,
    pub edge_effectiveness: f32,
    pub explosion_speed: f32,
    pub gfx_mod: f32,
    pub impact_only: bool,
    pub ignore_owner: bool,
    pub damage_ground: bool,
    /// Originating projectile, if any. Beams are hitscan and carry none.
    pub projectile_id: Option<u32>,
}
