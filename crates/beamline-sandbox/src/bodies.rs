use std::collections::HashMap;

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use beamline_core::entity::{FeatureId, HitTarget, PieceId, TeamId, UnitHit, UnitId};
use beamline_core::math::ray_sphere_intersection;
use beamline_core::services::{CollisionFlags, PieceKinematics, RayTraceService, TraceHit};

/// Model piece every range unit mounts its weapons on.
pub const WEAPON_PIECE: PieceId = 1;

/// A unit standing on the range.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeUnit {
    pub id: UnitId,
    pub team: TeamId,
    pub pos: Vec3,
    pub radius: f32,
    pub health: f32,
    /// Index into a weapon's damage table.
    pub armor_class: usize,
    pub front: Vec3,
    pub immobile: bool,
}

impl Default for RangeUnit {
    fn default() -> Self {
        Self {
            id: 0,
            team: 0,
            pos: Vec3::ZERO,
            radius: 10.0,
            health: 1000.0,
            armor_class: 0,
            front: Vec3::Z,
            immobile: false,
        }
    }
}

impl RangeUnit {
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Orthonormal (front, up, right) basis for a unit standing upright.
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let mut front = self.front;
        front.y = 0.0;
        let front = front.try_normalize().unwrap_or(Vec3::Z);
        let up = Vec3::Y;
        (front, up, front.cross(up))
    }
}

/// A static obstacle such as a rock or wreck.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeFeature {
    pub id: FeatureId,
    pub pos: Vec3,
    pub radius: f32,
}

/// Everything a beam can physically strike: units, features and the ground.
#[derive(Debug, Clone, Default)]
pub struct Bodies {
    pub ground_height: f32,
    pub units: Vec<RangeUnit>,
    pub features: Vec<RangeFeature>,
    pieces: HashMap<UnitId, Mat4>,
}

impl Bodies {
    pub fn new(ground_height: f32, units: Vec<RangeUnit>, features: Vec<RangeFeature>) -> Self {
        Self {
            ground_height,
            units,
            features,
            pieces: HashMap::new(),
        }
    }

    pub fn unit(&self, id: UnitId) -> Option<&RangeUnit> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut RangeUnit> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    /// Turn a unit's weapon piece so it points along `world_dir`, mounted at
    /// the unit-relative offset `rel_pos` (x right, y up, z front).
    pub fn aim_piece(&mut self, unit: UnitId, world_dir: Vec3, rel_pos: Vec3) {
        let Some(owner) = self.unit(unit) else {
            return;
        };
        let (front, up, right) = owner.basis();
        let local = Vec3::new(world_dir.dot(right), world_dir.dot(up), world_dir.dot(front));
        let Some(local) = local.try_normalize() else {
            return;
        };
        // Sweep aim reads the piece's third row, so rotate the local aim onto +Z.
        let rotation = glam::Quat::from_rotation_arc(local, Vec3::Z);
        let translation = Vec3::new(-rel_pos.x, rel_pos.y, -rel_pos.z);
        self.pieces
            .insert(unit, Mat4::from_rotation_translation(rotation, translation));
    }

    fn trace_units(
        &self,
        origin: Vec3,
        dir: Vec3,
        max_dist: f32,
        flags: CollisionFlags,
        exclude: UnitId,
    ) -> Option<TraceHit> {
        let shooter_team = self.unit(exclude).map(|u| u.team);
        self.units
            .iter()
            .filter(|u| u.id != exclude && u.is_alive())
            .filter(|u| {
                let friendly = shooter_team == Some(u.team);
                let ignored = if friendly {
                    CollisionFlags::NO_FRIENDLIES
                } else {
                    CollisionFlags::NO_ENEMIES
                };
                !flags.contains(ignored)
            })
            .filter_map(|u| {
                ray_sphere_intersection(origin, dir, u.pos, u.radius)
                    .filter(|&t| t <= max_dist)
                    .map(|t| (t, u))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(t, u)| TraceHit {
                distance: t,
                target: HitTarget::Unit(UnitHit {
                    id: u.id,
                    team: u.team,
                    radius: u.radius,
                    piece: Some(0),
                }),
            })
    }

    fn trace_features(&self, origin: Vec3, dir: Vec3, max_dist: f32) -> Option<TraceHit> {
        self.features
            .iter()
            .filter_map(|f| {
                ray_sphere_intersection(origin, dir, f.pos, f.radius)
                    .filter(|&t| t <= max_dist)
                    .map(|t| (t, f.id))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(t, id)| TraceHit {
                distance: t,
                target: HitTarget::Feature(id),
            })
    }

    fn trace_ground(&self, origin: Vec3, dir: Vec3, max_dist: f32) -> Option<TraceHit> {
        if dir.y >= 0.0 {
            return None;
        }
        let t = (self.ground_height - origin.y) / dir.y;
        (t >= 0.0 && t <= max_dist).then_some(TraceHit {
            distance: t,
            target: HitTarget::Terrain,
        })
    }
}

impl RayTraceService for Bodies {
    fn trace(
        &self,
        origin: Vec3,
        dir: Vec3,
        max_dist: f32,
        flags: CollisionFlags,
        exclude: UnitId,
    ) -> TraceHit {
        let units = self.trace_units(origin, dir, max_dist, flags, exclude);
        let features = (!flags.contains(CollisionFlags::NO_FEATURES))
            .then(|| self.trace_features(origin, dir, max_dist))
            .flatten();
        let ground = (!flags.contains(CollisionFlags::NO_GROUND))
            .then(|| self.trace_ground(origin, dir, max_dist))
            .flatten();

        [units, features, ground]
            .into_iter()
            .flatten()
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
            .unwrap_or(TraceHit::miss(max_dist))
    }
}

impl PieceKinematics for Bodies {
    fn weapon_piece(&self, unit: UnitId, _weapon_num: usize) -> Option<PieceId> {
        self.unit(unit).map(|_| WEAPON_PIECE)
    }

    fn piece_matrix(&self, unit: UnitId, _piece: PieceId) -> Mat4 {
        self.pieces.get(&unit).copied().unwrap_or(Mat4::IDENTITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(id: UnitId, team: TeamId, pos: Vec3) -> RangeUnit {
        RangeUnit {
            id,
            team,
            pos,
            ..Default::default()
        }
    }

    fn bodies() -> Bodies {
        Bodies::new(
            0.0,
            vec![
                unit(1, 0, Vec3::new(0.0, 10.0, 0.0)),
                unit(2, 1, Vec3::new(0.0, 10.0, 100.0)),
                unit(3, 0, Vec3::new(0.0, 10.0, 60.0)),
            ],
            vec![RangeFeature {
                id: 7,
                pos: Vec3::new(0.0, 10.0, 200.0),
                radius: 5.0,
            }],
        )
    }

    #[test]
    fn nearest_unit_wins_and_shooter_is_skipped() {
        let hit = bodies().trace(
            Vec3::new(0.0, 10.0, 0.0),
            Vec3::Z,
            500.0,
            CollisionFlags::NONE,
            1,
        );
        assert_eq!(hit.target.unit().map(|u| u.id), Some(3));
        assert!((hit.distance - 50.0).abs() < 1e-3);
    }

    #[test]
    fn friendly_units_skipped_on_request() {
        let hit = bodies().trace(
            Vec3::new(0.0, 10.0, 0.0),
            Vec3::Z,
            500.0,
            CollisionFlags::NO_FRIENDLIES,
            1,
        );
        assert_eq!(hit.target.unit().map(|u| u.id), Some(2));
    }

    #[test]
    fn features_and_ground_are_struck() {
        let mut range = bodies();
        range.units.retain(|u| u.id == 1);
        let hit = range.trace(Vec3::new(0.0, 10.0, 0.0), Vec3::Z, 500.0, CollisionFlags::NONE, 1);
        assert_eq!(hit.target, HitTarget::Feature(7));

        let down = Vec3::new(0.0, -1.0, 1.0).normalize();
        let hit = range.trace(Vec3::new(0.0, 10.0, 0.0), down, 500.0, CollisionFlags::NONE, 1);
        assert_eq!(hit.target, HitTarget::Terrain);
        assert!((hit.distance - 10.0 * 2f32.sqrt()).abs() < 1e-3);
    }

    #[test]
    fn dead_units_do_not_block() {
        let mut range = bodies();
        if let Some(u) = range.unit_mut(3) {
            u.health = 0.0;
        }
        let hit = range.trace(Vec3::new(0.0, 10.0, 0.0), Vec3::Z, 500.0, CollisionFlags::NONE, 1);
        assert_eq!(hit.target.unit().map(|u| u.id), Some(2));
    }

    #[test]
    fn out_of_range_is_a_miss() {
        let hit = bodies().trace(Vec3::new(0.0, 10.0, 0.0), Vec3::Z, 20.0, CollisionFlags::NONE, 1);
        assert!(hit.target.is_none());
        assert_eq!(hit.distance, 20.0);
    }

    #[test]
    fn aimed_piece_reports_aim_through_third_row() {
        let mut range = bodies();
        let dir = Vec3::new(1.0, 0.0, 1.0).normalize();
        range.aim_piece(1, dir, Vec3::new(0.0, 5.0, 0.0));
        let piece = range.weapon_piece(1, 0).unwrap();
        let m = range.piece_matrix(1, piece);

        let owner = range.unit(1).unwrap();
        let (front, up, right) = owner.basis();
        let swept = front * m.z_axis.z + up * m.y_axis.z + right * m.x_axis.z;
        assert!((swept - dir).length() < 1e-4);
        assert!((m.w_axis.truncate() - Vec3::new(0.0, 5.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn unknown_unit_has_no_weapon_piece() {
        assert!(bodies().weapon_piece(99, 0).is_none());
    }
}
