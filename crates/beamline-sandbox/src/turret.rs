//! Minimal weapon base: reload, salvo scheduling, and target tracking for a
//! beam laser mounted on a range unit.

use std::sync::Arc;

use glam::Vec3;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use beamline_beamlaser::base::{AimTarget, OwnerState, WeaponBase};
use beamline_beamlaser::config::BeamLaserDef;
use beamline_beamlaser::{BeamLaser, ShotReport};
use beamline_core::entity::UnitId;
use beamline_core::math::random_vector;
use beamline_core::services::TeamResourcePool;
use beamline_core::time::{Frame, seconds_to_frames};

use crate::bodies::{Bodies, RangeUnit};
use crate::range::Range;

/// What a turret is ordered to shoot at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetOrder {
    #[default]
    None,
    Unit(UnitId),
    Ground(Vec3),
}

/// Placement of one weapon on a range unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TurretDef {
    pub unit: UnitId,
    pub weapon_num: usize,
    /// Offsets from the unit origin: x right, y up, z front.
    pub rel_weapon_pos: Vec3,
    pub rel_muzzle_pos: Vec3,
    pub target: TargetOrder,
    /// Owner experience mapped into 0..1.
    pub lim_experience: f32,
    pub direct_control: bool,
    pub strafing_air: bool,
}

impl Default for TurretDef {
    fn default() -> Self {
        Self {
            unit: 0,
            weapon_num: 0,
            rel_weapon_pos: Vec3::new(0.0, 8.0, 0.0),
            rel_muzzle_pos: Vec3::new(0.0, 8.0, 6.0),
            target: TargetOrder::None,
            lim_experience: 0.0,
            direct_control: false,
            strafing_air: false,
        }
    }
}

/// A beam laser and the weapon base state that drives it.
#[derive(Debug, Clone)]
pub struct Turret {
    def: TurretDef,
    laser: BeamLaser,
    base: WeaponBase,
    reload_left: u32,
    delay_left: u32,
}

impl Turret {
    pub fn new(weapon: Arc<BeamLaserDef>, def: TurretDef) -> Self {
        let mut laser = BeamLaser::new(weapon);
        let mut base = WeaponBase {
            weapon_num: def.weapon_num,
            rel_weapon_pos: def.rel_weapon_pos,
            rel_muzzle_pos: def.rel_muzzle_pos,
            ..Default::default()
        };
        laser.init(&mut base);
        Self {
            def,
            laser,
            base,
            reload_left: 0,
            delay_left: 0,
        }
    }

    pub fn unit(&self) -> UnitId {
        self.def.unit
    }

    pub fn laser(&self) -> &BeamLaser {
        &self.laser
    }

    pub fn base(&self) -> &WeaponBase {
        &self.base
    }

    pub fn set_target(&mut self, target: TargetOrder) {
        self.def.target = target;
    }

    fn owner_state(&self, unit: &RangeUnit) -> OwnerState {
        let (front, up, right) = unit.basis();
        OwnerState {
            id: unit.id,
            team: unit.team,
            pos: unit.pos,
            front,
            up,
            right,
            aim_pos: unit.pos,
            radius: unit.radius,
            immobile: unit.immobile,
            direct_control: self.def.direct_control,
            strafing_air: self.def.strafing_air,
            lim_experience: self.def.lim_experience,
        }
    }

    fn resolve_target(&self, bodies: &Bodies) -> AimTarget {
        match self.def.target {
            TargetOrder::None => AimTarget::None,
            TargetOrder::Ground(pos) => AimTarget::Ground(pos),
            TargetOrder::Unit(id) => bodies
                .unit(id)
                .filter(|u| u.is_alive())
                .map_or(AimTarget::None, |u| AimTarget::Unit {
                    id: u.id,
                    pos: u.pos,
                    radius: u.radius,
                }),
        }
    }

    /// Run one frame of the weapon base. Returns the shots fired this frame.
    pub fn tick(&mut self, frame: Frame, range: &mut Range, rng: &mut StdRng) -> Vec<ShotReport> {
        let mut shots = Vec::new();
        let Some(owner) = range
            .bodies
            .unit(self.def.unit)
            .filter(|u| u.is_alive())
            .map(|u| self.owner_state(u))
        else {
            return shots;
        };

        self.base.frame = frame;
        self.base.target = self.resolve_target(&range.bodies);
        self.laser.update_aim(&mut self.base, &owner);
        range
            .bodies
            .aim_piece(owner.id, self.base.wanted_dir, self.base.rel_weapon_pos);

        if let Some(shot) =
            self.laser
                .update_sweep(&mut self.base, &owner, &mut range.fire_context(rng))
        {
            shots.push(shot);
        }

        self.reload_left = self.reload_left.saturating_sub(1);
        if self.base.salvo_left == 0 && self.reload_left == 0 && !self.base.target.is_none() {
            self.start_salvo(&owner, range, rng);
        }

        if self.base.salvo_left > 0 {
            if self.delay_left > 0 {
                self.delay_left -= 1;
            } else {
                self.base.salvo_left -= 1;
                self.delay_left = self.base.salvo_delay;
                if let Some(shot) =
                    self.laser
                        .fire(&mut self.base, &owner, &mut range.fire_context(rng))
                {
                    shots.push(shot);
                }
            }
        }

        shots
    }

    fn start_salvo(&mut self, owner: &OwnerState, range: &mut Range, rng: &mut StdRng) {
        let def = self.laser.def();
        if !range.treasury.has_energy(owner.team, def.energy_cost)
            || !range.treasury.has_metal(owner.team, def.metal_cost)
        {
            tracing::debug!(unit = owner.id, team = owner.team, "Salvo starved of resources");
            return;
        }
        range
            .treasury
            .consume(owner.team, def.energy_cost, def.metal_cost);

        self.base.salvo_left = self.base.salvo_size;
        self.base.salvo_error = random_vector(rng) * def.accuracy;
        self.reload_left = seconds_to_frames(def.reload_time).max(1) as u32;
        self.delay_left = 0;
        tracing::trace!(
            unit = owner.id,
            salvo = self.base.salvo_size,
            reload = self.reload_left,
            "Salvo started"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::RangeDef;
    use crate::teams::TeamResources;
    use beamline_core::damage::DamageArray;
    use rand::SeedableRng;

    fn range(energy: f32) -> Range {
        Range::new(RangeDef {
            units: vec![
                RangeUnit {
                    id: 1,
                    pos: Vec3::new(0.0, 10.0, 0.0),
                    immobile: true,
                    ..Default::default()
                },
                RangeUnit {
                    id: 2,
                    team: 1,
                    pos: Vec3::new(0.0, 18.0, 200.0),
                    health: 10_000.0,
                    ..Default::default()
                },
            ],
            resources: vec![TeamResources {
                team: 0,
                energy,
                ..Default::default()
            }],
            ..Default::default()
        })
    }

    fn turret(f: impl FnOnce(&mut BeamLaserDef)) -> Turret {
        let mut weapon = BeamLaserDef {
            beamtime: 0.1,
            reload_time: 1.0,
            damages: DamageArray::new(&[300.0]),
            ..Default::default()
        };
        f(&mut weapon);
        Turret::new(
            Arc::new(weapon),
            TurretDef {
                unit: 1,
                target: TargetOrder::Unit(2),
                ..Default::default()
            },
        )
    }

    #[test]
    fn continuous_beam_fires_one_shot_per_frame() {
        let mut range = range(0.0);
        let mut rng = StdRng::seed_from_u64(1);
        let mut turret = turret(|_| {});
        assert_eq!(turret.base().salvo_size, 3);

        let fired: Vec<_> = (0..3)
            .flat_map(|frame| turret.tick(frame, &mut range, &mut rng))
            .collect();
        assert_eq!(fired.len(), 3);
        assert!(fired.iter().all(|s| s.hit.unit().map(|u| u.id) == Some(2)));
        assert_eq!(range.explosions.len(), 3);

        // Reloading.
        assert!(turret.tick(3, &mut range, &mut rng).is_empty());
    }

    #[test]
    fn salvo_waits_for_resources() {
        let mut range = range(5.0);
        let mut rng = StdRng::seed_from_u64(1);
        let mut turret = turret(|d| d.energy_cost = 10.0);
        assert!(turret.tick(0, &mut range, &mut rng).is_empty());
        assert_eq!(range.treasury.get(0).map(|r| r.energy), Some(5.0));
    }

    #[test]
    fn beamburst_spaces_shots_by_salvo_delay() {
        let mut range = range(0.0);
        let mut rng = StdRng::seed_from_u64(1);
        let mut turret = turret(|d| {
            d.beamburst = true;
            d.salvo_size = 2;
            d.salvo_delay = 2;
        });
        let fired_on: Vec<Frame> = (0..6)
            .filter(|&frame| !turret.tick(frame, &mut range, &mut rng).is_empty())
            .collect();
        assert_eq!(fired_on, vec![0, 3]);
    }

    #[test]
    fn dead_target_stops_fire() {
        let mut range = range(0.0);
        let mut rng = StdRng::seed_from_u64(1);
        let mut turret = turret(|_| {});
        if let Some(u) = range.bodies.unit_mut(2) {
            u.health = 0.0;
        }
        assert!(turret.tick(0, &mut range, &mut rng).is_empty());
        assert!(turret.base().target.is_none());
    }

    #[test]
    fn salvo_error_scales_with_accuracy() {
        let mut range = range(0.0);
        let mut rng = StdRng::seed_from_u64(9);
        let mut turret = turret(|d| d.accuracy = 0.05);
        turret.tick(0, &mut range, &mut rng);
        assert!(turret.base().salvo_error.length() <= 0.05 + 1e-6);
    }
}
