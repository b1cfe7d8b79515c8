//! Collaborators a weapon talks to while resolving a shot.
//!
//! The simulation owns all of these; a weapon only borrows them for the
//! duration of one call, which keeps weapons testable against mocks.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::entity::{HitTarget, PieceId, ShieldId, TeamId, UnitId, WeaponDefId};
use crate::events::{BeamSegment, ExplosionParams};

/// Which entity classes a trace ignores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollisionFlags(pub u32);

impl CollisionFlags {
    pub const NONE: Self = Self(0);
    pub const NO_ENEMIES: Self = Self(1 << 0);
    pub const NO_FRIENDLIES: Self = Self(1 << 1);
    pub const NO_FEATURES: Self = Self(1 << 2);
    pub const NO_NEUTRALS: Self = Self(1 << 3);
    pub const NO_GROUND: Self = Self(1 << 4);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// Result of a single ray trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceHit {
    /// Distance to the first blocking entity, or the full query distance on a miss.
    pub distance: f32,
    pub target: HitTarget,
}

impl TraceHit {
    pub fn miss(max_dist: f32) -> Self {
        Self {
            distance: max_dist,
            target: HitTarget::None,
        }
    }
}

/// Ray-intersection primitive, treated as a black box.
pub trait RayTraceService {
    fn trace(
        &self,
        origin: Vec3,
        dir: Vec3,
        max_dist: f32,
        flags: CollisionFlags,
        exclude: UnitId,
    ) -> TraceHit;
}

/// Identity of the shot a shield is asked about.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotInfo {
    pub weapon: WeaponDefId,
    pub owner: UnitId,
    pub team: TeamId,
    /// Default-armor damage of one full hit, before falloff.
    pub damage: f32,
}

/// A shield placed itself in the beam's path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShieldIntercept {
    pub shield: ShieldId,
    /// Distance from the segment start to the shield surface.
    pub distance: f32,
    /// Direction the beam continues in if the shield lets it through.
    pub new_dir: Vec3,
}

/// Interceptable-shield subsystem.
pub trait ShieldInterceptRegistry {
    /// Closest shield intercepting the segment `start + dir * [0, length]`, if any.
    fn query(
        &self,
        shot: &ShotInfo,
        start: Vec3,
        dir: Vec3,
        length: f32,
    ) -> Option<ShieldIntercept>;

    /// Notify `shield` that it took the beam. Returns `true` if the beam continues.
    fn on_intercepted(&mut self, shield: ShieldId, shot: &ShotInfo, damage_mult: f32) -> bool;
}

/// Sink for finished beam segments.
pub trait BeamSegmentEmitter {
    fn emit(&mut self, segment: BeamSegment);
}

/// The only place damage is applied to the world.
pub trait ExplosionResolver {
    fn apply(&mut self, params: ExplosionParams);
}

/// Team energy and metal.
pub trait TeamResourcePool {
    fn has_energy(&self, team: TeamId, amount: f32) -> bool;
    fn has_metal(&self, team: TeamId, amount: f32) -> bool;
    fn consume(&mut self, team: TeamId, energy: f32, metal: f32);
}

/// Alliance relation between teams.
pub trait TeamRelations {
    fn allied(&self, a: TeamId, b: TeamId) -> bool;
}

/// Animated model pieces of a unit.
pub trait PieceKinematics {
    /// Piece the unit's script reports for weapon slot `weapon_num`.
    fn weapon_piece(&self, unit: UnitId, weapon_num: usize) -> Option<PieceId>;

    /// Piece transform relative to the unit (column-major, unit space).
    fn piece_matrix(&self, unit: UnitId, piece: PieceId) -> Mat4;
}
