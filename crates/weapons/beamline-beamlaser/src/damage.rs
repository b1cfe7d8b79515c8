//! Falloff-adjusted damage for a beam's terminal hit.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use beamline_core::damage::{DamageArray, dynamic_damages};
use beamline_core::entity::{HitTarget, UnitId};
use beamline_core::events::ExplosionParams;
use beamline_core::time::Frame;

use crate::config::BeamLaserDef;

/// Falloff multiplier for a hit `length` units down the beam.
///
/// Linear over twice the effective range, floored at `min_intensity`.
pub fn hit_intensity(length: f32, effective_range: f32, min_intensity: f32) -> f32 {
    let span = (effective_range * 2.0).max(f32::EPSILON);
    min_intensity.max(1.0 - length / span)
}

/// Range used for falloff: the nominal range, extended by the struck unit's
/// hit sphere when the weapon aims at target borders.
pub fn effective_range(def: &BeamLaserDef, hit: &HitTarget) -> f32 {
    match hit {
        HitTarget::Unit(unit) if def.target_border > 0.0 => {
            def.range + unit.radius * def.target_border
        },
        _ => def.range,
    }
}

/// Damage computed for one shot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageOutcome {
    /// Damage table before falloff and salvo division.
    pub base_damages: DamageArray,
    /// Travelled length over twice the effective range, in 0..=1.
    pub distance_fraction: f32,
    /// Share of a full hit one shot of the salvo carries, in (0, 1].
    pub salvo_fraction: f32,
    /// Falloff multiplier, never below the configured floor.
    pub final_multiplier: f32,
    /// `base_damages * final_multiplier * salvo_fraction`.
    pub damages: DamageArray,
}

/// Where and how a beam ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impact {
    pub muzzle: Vec3,
    pub pos: Vec3,
    pub dir: Vec3,
    pub length: f32,
    pub max_length: f32,
    pub hit: HitTarget,
}

/// Damage for `impact`, or `None` if the beam used up its whole length.
pub fn resolve_damage(
    def: &BeamLaserDef,
    impact: &Impact,
    salvo_damage_mult: f32,
) -> Option<DamageOutcome> {
    debug_assert!(impact.length >= 0.0, "Beam length must never go negative");
    if impact.length >= impact.max_length {
        return None;
    }

    let base_damages = match def.dynamic_curve() {
        Some(curve) => dynamic_damages(&def.damages, impact.muzzle, impact.pos, &curve),
        None => def.damages.clone(),
    };

    let range = effective_range(def, &impact.hit);
    let final_multiplier = hit_intensity(impact.length, range, def.min_intensity);
    let distance_fraction = (impact.length / (range * 2.0).max(f32::EPSILON)).clamp(0.0, 1.0);
    let damages = &base_damages * (final_multiplier * salvo_damage_mult);

    Some(DamageOutcome {
        base_damages,
        distance_fraction,
        salvo_fraction: salvo_damage_mult,
        final_multiplier,
        damages,
    })
}

/// Explosion event carrying a resolved hit to the explosion resolver.
pub fn explosion_params(
    def: &BeamLaserDef,
    impact: &Impact,
    damages: DamageArray,
    owner: UnitId,
    frame: Frame,
) -> ExplosionParams {
    ExplosionParams {
        pos: impact.pos,
        dir: impact.dir,
        damages,
        weapon: def.id,
        owner,
        hit: impact.hit,
        frame,
        crater_area_of_effect: def.crater_area_of_effect,
        damage_area_of_effect: def.damage_area_of_effect,
        edge_effectiveness: def.edge_effectiveness,
        explosion_speed: def.explosion_speed,
        gfx_mod: 1.0,
        impact_only: def.impact_only,
        ignore_owner: def.ignores_owner(),
        damage_ground: true,
        projectile_id: None,
    }
}
