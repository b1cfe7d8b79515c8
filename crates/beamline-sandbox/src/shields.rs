use glam::Vec3;
use serde::{Deserialize, Serialize};

use beamline_core::entity::{ShieldId, TeamId};
use beamline_core::math::{ray_sphere_intersection, safe_normalize};
use beamline_core::services::{ShieldIntercept, ShieldInterceptRegistry, ShotInfo};

/// Starts closer than this to a shield surface count as already inside.
const SURFACE_EPSILON: f32 = 1e-3;

/// How a shield treats a beam it intercepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShieldKind {
    /// Reflects the beam about the surface normal and lets it continue.
    #[default]
    Repulsor,
    /// Stops the beam at the surface.
    Absorber,
}

/// A spherical shield bubble.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShieldSphere {
    pub id: ShieldId,
    pub team: TeamId,
    pub center: Vec3,
    pub radius: f32,
    pub kind: ShieldKind,
    /// Remaining power; the shield goes down at zero.
    pub power: f32,
    /// Power drained per point of intercepted damage.
    pub drain_per_damage: f32,
}

impl Default for ShieldSphere {
    fn default() -> Self {
        Self {
            id: 0,
            team: 0,
            center: Vec3::ZERO,
            radius: 50.0,
            kind: ShieldKind::Repulsor,
            power: 1000.0,
            drain_per_damage: 1.0,
        }
    }
}

impl ShieldSphere {
    pub fn is_up(&self) -> bool {
        self.power > 0.0
    }

    /// Distance along `dir` at which a beam from `start` enters the bubble.
    fn entry_distance(&self, start: Vec3, dir: Vec3) -> Option<f32> {
        if start.distance(self.center) <= self.radius + SURFACE_EPSILON {
            return None;
        }
        ray_sphere_intersection(start, dir, self.center, self.radius)
    }
}

/// Every shield on the range.
#[derive(Debug, Clone, Default)]
pub struct ShieldField {
    pub shields: Vec<ShieldSphere>,
    intercepts: u32,
}

impl ShieldField {
    pub fn new(shields: Vec<ShieldSphere>) -> Self {
        Self {
            shields,
            intercepts: 0,
        }
    }

    pub fn get(&self, id: ShieldId) -> Option<&ShieldSphere> {
        self.shields.iter().find(|s| s.id == id)
    }

    /// Intercepts handled since the range was built.
    pub fn intercepts(&self) -> u32 {
        self.intercepts
    }
}

impl ShieldInterceptRegistry for ShieldField {
    fn query(
        &self,
        shot: &ShotInfo,
        start: Vec3,
        dir: Vec3,
        length: f32,
    ) -> Option<ShieldIntercept> {
        self.shields
            .iter()
            .filter(|s| s.is_up() && s.team != shot.team)
            .filter_map(|s| {
                s.entry_distance(start, dir)
                    .filter(|&t| t < length)
                    .map(|t| (t, s))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(distance, shield)| {
                let new_dir = match shield.kind {
                    ShieldKind::Repulsor => {
                        let normal = safe_normalize(start + dir * distance - shield.center);
                        dir - normal * (2.0 * dir.dot(normal))
                    },
                    ShieldKind::Absorber => dir,
                };
                ShieldIntercept {
                    shield: shield.id,
                    distance,
                    new_dir,
                }
            })
    }

    fn on_intercepted(&mut self, shield: ShieldId, shot: &ShotInfo, damage_mult: f32) -> bool {
        let Some(sphere) = self.shields.iter_mut().find(|s| s.id == shield) else {
            return false;
        };
        self.intercepts += 1;
        sphere.power = (sphere.power - shot.damage * damage_mult * sphere.drain_per_damage).max(0.0);
        if !sphere.is_up() {
            tracing::info!(shield, team = sphere.team, "Shield down");
        }
        sphere.kind == ShieldKind::Repulsor
    }
}
