//! Area damage from beam impacts.

use serde::{Deserialize, Serialize};

use beamline_core::entity::{HitTarget, UnitId};
use beamline_core::events::ExplosionParams;
use beamline_core::services::ExplosionResolver;

use crate::bodies::Bodies;

/// Explosions wait here until the range resolves them after the shot.
#[derive(Debug, Clone, Default)]
pub struct ExplosionQueue {
    pending: Vec<ExplosionParams>,
}

impl ExplosionQueue {
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn drain(&mut self) -> Vec<ExplosionParams> {
        std::mem::take(&mut self.pending)
    }
}

impl ExplosionResolver for ExplosionQueue {
    fn apply(&mut self, params: ExplosionParams) {
        self.pending.push(params);
    }
}

/// Damage one unit took from one explosion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitDamage {
    pub unit: UnitId,
    pub amount: f32,
    pub killed: bool,
}

/// Share of full damage dealt `distance` away from the blast center.
pub fn edge_falloff(area_of_effect: f32, distance: f32, edge_effectiveness: f32) -> f32 {
    if distance >= area_of_effect {
        return 0.0;
    }
    let edge = edge_effectiveness.clamp(0.0, 0.99);
    (area_of_effect - distance) / (area_of_effect - distance * edge)
}

/// Apply `params` to the units in `bodies`.
pub fn resolve_explosion(bodies: &mut Bodies, params: &ExplosionParams) -> Vec<UnitDamage> {
    let direct = params.hit.unit().map(|u| u.id);
    let mut dealt = Vec::new();

    for unit in bodies.units.iter_mut().filter(|u| u.is_alive()) {
        if params.ignore_owner && unit.id == params.owner {
            continue;
        }
        let share = if direct == Some(unit.id) {
            1.0
        } else if params.impact_only {
            0.0
        } else {
            let distance = (params.pos.distance(unit.pos) - unit.radius).max(0.0);
            edge_falloff(params.damage_area_of_effect, distance, params.edge_effectiveness)
        };
        if share <= 0.0 {
            continue;
        }

        let amount = params.damages.get(unit.armor_class) * share;
        unit.health -= amount;
        let killed = !unit.is_alive();
        if killed {
            tracing::info!(unit = unit.id, attacker = params.owner, "Unit destroyed");
        }
        dealt.push(UnitDamage {
            unit: unit.id,
            amount,
            killed,
        });
    }

    if matches!(params.hit, HitTarget::Terrain) {
        tracing::trace!(
            x = params.pos.x,
            z = params.pos.z,
            crater = params.crater_area_of_effect,
            "Beam scorched terrain"
        );
    }
    dealt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bodies::RangeUnit;
    use beamline_core::damage::DamageArray;
    use beamline_core::entity::UnitHit;
    use glam::Vec3;

    fn params(hit: HitTarget) -> ExplosionParams {
        ExplosionParams {
            pos: Vec3::new(0.0, 10.0, 100.0),
            dir: Vec3::Z,
            damages: DamageArray::new(&[100.0, 40.0]),
            weapon: 1,
            owner: 1,
            hit,
            frame: 0,
            crater_area_of_effect: 8.0,
            damage_area_of_effect: 40.0,
            edge_effectiveness: 0.0,
            explosion_speed: 8.0,
            gfx_mod: 1.0,
            impact_only: false,
            ignore_owner: false,
            damage_ground: true,
            projectile_id: None,
        }
    }

    fn bodies() -> Bodies {
        let unit = |id, z: f32, armor_class| RangeUnit {
            id,
            team: 1,
            pos: Vec3::new(0.0, 10.0, z),
            radius: 10.0,
            armor_class,
            health: 500.0,
            ..Default::default()
        };
        Bodies::new(
            0.0,
            vec![unit(1, 0.0, 0), unit(2, 100.0, 1), unit(3, 130.0, 0)],
            Vec::new(),
        )
    }

    fn direct_hit(id: UnitId) -> HitTarget {
        HitTarget::Unit(UnitHit {
            id,
            team: 1,
            radius: 10.0,
            piece: Some(0),
        })
    }

    #[test]
    fn falloff_shapes() {
        assert_eq!(edge_falloff(40.0, 0.0, 0.0), 1.0);
        assert!((edge_falloff(40.0, 20.0, 0.0) - 0.5).abs() < 1e-6);
        assert!(edge_falloff(40.0, 20.0, 0.5) > 0.5);
        assert_eq!(edge_falloff(40.0, 40.0, 0.5), 0.0);
    }

    #[test]
    fn direct_hit_uses_armor_class_and_splash_falls_off() {
        let mut bodies = bodies();
        let dealt = resolve_explosion(&mut bodies, &params(direct_hit(2)));
        assert_eq!(dealt.len(), 2);
        assert_eq!(dealt[0].unit, 2);
        assert_eq!(dealt[0].amount, 40.0);
        // Unit 3 sits 20 units past its hit sphere edge.
        assert_eq!(dealt[1].unit, 3);
        assert!((dealt[1].amount - 50.0).abs() < 1e-3);
        assert_eq!(bodies.unit(1).unwrap().health, 500.0);
    }

    #[test]
    fn impact_only_spares_bystanders() {
        let mut bodies = bodies();
        let mut p = params(direct_hit(2));
        p.impact_only = true;
        let dealt = resolve_explosion(&mut bodies, &p);
        assert_eq!(dealt.len(), 1);
        assert_eq!(bodies.unit(3).unwrap().health, 500.0);
    }

    #[test]
    fn ignore_owner_skips_the_firer() {
        let mut bodies = bodies();
        let mut p = params(HitTarget::Terrain);
        p.pos = Vec3::new(0.0, 10.0, 0.0);
        p.ignore_owner = true;
        assert!(resolve_explosion(&mut bodies, &p).is_empty());

        p.ignore_owner = false;
        let dealt = resolve_explosion(&mut bodies, &p);
        assert_eq!(dealt[0].unit, 1);
    }

    #[test]
    fn lethal_hit_reports_kill() {
        let mut bodies = bodies();
        let mut p = params(direct_hit(3));
        p.damages = DamageArray::new(&[600.0]);
        p.impact_only = true;
        let dealt = resolve_explosion(&mut bodies, &p);
        assert!(dealt[0].killed);
        assert!(!bodies.unit(3).unwrap().is_alive());
    }

    #[test]
    fn queue_collects_until_drained() {
        let mut queue = ExplosionQueue::default();
        queue.apply(params(HitTarget::None));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.drain().len(), 1);
        assert!(queue.is_empty());
    }
}
