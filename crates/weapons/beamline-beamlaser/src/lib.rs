pub mod aim;
pub mod base;
pub mod config;
pub mod damage;
pub mod emit;
pub mod trace;

use std::sync::Arc;

use glam::Vec3;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use beamline_core::entity::{BeamColor, HitTarget};
use beamline_core::math::{random_vector, safe_normalize};
use beamline_core::services::{
    BeamSegmentEmitter, ExplosionResolver, PieceKinematics, RayTraceService,
    ShieldInterceptRegistry, ShotInfo, TeamRelations, TeamResourcePool,
};
use beamline_core::time::GAME_SPEED;

use base::{OwnerState, WeaponBase};
use config::BeamLaserDef;
use damage::{DamageOutcome, Impact, explosion_params, resolve_damage};
use emit::SegmentEmission;
use trace::{BeamTermination, TraceEnv, TraceRequest, trace_beam};

/// Range multiplier for mobile owners, so they can keep firing while chasing.
pub const MOBILE_RANGE_MOD: f32 = 1.3;
/// Range multiplier while a player steers the owner directly.
pub const DIRECT_CONTROL_RANGE_MOD: f32 = 0.95;
/// Cylinder targeting below this is treated as disabled.
const CYLINDER_TARGETING_THRESHOLD: f32 = 0.01;

/// Per-weapon state that persists across ticks and save games.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamLaserState {
    pub color: BeamColor,
    /// Direction cached at the start of the current salvo.
    pub old_dir: Vec3,
    pub last_sweep_fire_pos: Vec3,
    pub last_sweep_fire_dir: Vec3,
    /// Share of a full hit each shot of a continuous beam deals.
    pub salvo_damage_mult: f32,
    pub sweep_firing: bool,
}

impl Default for BeamLaserState {
    fn default() -> Self {
        Self {
            color: BeamColor::default(),
            old_dir: Vec3::Z,
            last_sweep_fire_pos: Vec3::ZERO,
            last_sweep_fire_dir: Vec3::ZERO,
            salvo_damage_mult: 1.0,
            sweep_firing: false,
        }
    }
}

/// Simulation services a shot borrows for one call.
pub struct FireContext<'a> {
    pub tracer: &'a dyn RayTraceService,
    pub shields: &'a mut dyn ShieldInterceptRegistry,
    pub emitter: &'a mut dyn BeamSegmentEmitter,
    pub explosions: &'a mut dyn ExplosionResolver,
    pub teams: &'a dyn TeamRelations,
    pub resources: &'a mut dyn TeamResourcePool,
    pub pieces: &'a dyn PieceKinematics,
    pub rng: &'a mut StdRng,
}

/// Summary of one fired shot.
#[derive(Debug, Clone, PartialEq)]
pub struct ShotReport {
    pub sweep: bool,
    pub termination: BeamTermination,
    pub segments: usize,
    pub impact: Vec3,
    pub dir: Vec3,
    pub length: f32,
    pub max_length: f32,
    pub hit: HitTarget,
    /// Present only when the shot triggered an explosion.
    pub damage: Option<DamageOutcome>,
}

/// A continuous-beam laser mounted on one unit.
#[derive(Debug, Clone)]
pub struct BeamLaser {
    def: Arc<BeamLaserDef>,
    state: BeamLaserState,
}

impl BeamLaser {
    pub fn new(def: Arc<BeamLaserDef>) -> Self {
        let state = BeamLaserState {
            color: def.color,
            ..Default::default()
        };
        Self { def, state }
    }

    /// Recreate a weapon from saved state.
    pub fn with_state(def: Arc<BeamLaserDef>, state: BeamLaserState) -> Self {
        Self { def, state }
    }

    pub fn def(&self) -> &BeamLaserDef {
        &self.def
    }

    pub fn state(&self) -> &BeamLaserState {
        &self.state
    }

    /// Size the salvo. A continuous beam becomes one shot per frame of
    /// `beamtime`, each dealing an equal share of the configured damage.
    pub fn init(&mut self, base: &mut WeaponBase) {
        if self.def.beamburst {
            base.salvo_size = self.def.salvo_size.max(1);
            base.salvo_delay = self.def.salvo_delay;
            self.state.salvo_damage_mult = 1.0;
        } else {
            base.salvo_delay = 0;
            base.salvo_size = ((self.def.beamtime * GAME_SPEED as f32) as u32).max(1);
            self.state.salvo_damage_mult = 1.0 / base.salvo_size as f32;
        }
        base.muzzle_flare_size = 0.0;
    }

    /// Refresh weapon and muzzle positions, wanted direction, and lead for
    /// the current target. Runs before the weapon base decides to fire.
    pub fn update_aim(&mut self, base: &mut WeaponBase, owner: &OwnerState) {
        let Some(target_pos) = base.target.pos() else {
            return;
        };

        base.weapon_pos = owner.to_world(base.rel_weapon_pos);
        base.muzzle_pos = owner.to_world(base.rel_muzzle_pos);

        if !self.def.only_forward {
            base.wanted_dir = safe_normalize(target_pos - base.weapon_pos);
        }

        // Beamburst re-aims during the burst, so it needs no lead.
        base.predict = if self.def.beamburst {
            0
        } else {
            base.salvo_size / 2
        };
    }

    /// Sweep the beam along the weapon piece between target acquisitions.
    ///
    /// Fires at most one sweep shot, paid for from the owner's team resources.
    pub fn update_sweep(
        &mut self,
        base: &mut WeaponBase,
        owner: &OwnerState,
        ctx: &mut FireContext<'_>,
    ) -> Option<ShotReport> {
        if base.target.is_none() || !self.def.sweep_fire {
            return None;
        }

        let sweep_dir = aim::fire_dir(
            &self.def,
            &mut self.state,
            base,
            owner,
            true,
            ctx.pieces,
        );
        let traced = ctx.tracer.trace(
            base.muzzle_pos,
            sweep_dir,
            self.def.range,
            self.def.collision_flags,
            owner.id,
        );
        let sweep_pos = base.muzzle_pos + sweep_dir * traced.distance;

        if sweep_pos == self.state.last_sweep_fire_pos {
            self.state.sweep_firing = false;
            return None;
        }

        if !ctx.resources.has_metal(owner.team, self.def.metal_cost)
            || !ctx.resources.has_energy(owner.team, self.def.energy_cost)
        {
            tracing::debug!(
                owner = owner.id,
                team = owner.team,
                "Sweep fire starved of resources"
            );
            return None;
        }

        let shots = base.salvo_size.max(1) as f32;
        ctx.resources.consume(
            owner.team,
            self.def.energy_cost / shots,
            self.def.metal_cost / shots,
        );

        self.state.last_sweep_fire_pos = sweep_pos;
        self.state.last_sweep_fire_dir = sweep_dir;
        self.state.sweep_firing = true;

        Some(self.fire_internal(true, base, owner, ctx))
    }

    /// Regular fire, called by the weapon base for each shot of a salvo.
    ///
    /// Returns `None` while sweep firing, which excludes regular shots.
    pub fn fire(
        &mut self,
        base: &mut WeaponBase,
        owner: &OwnerState,
        ctx: &mut FireContext<'_>,
    ) -> Option<ShotReport> {
        if self.state.sweep_firing {
            return None;
        }
        Some(self.fire_internal(false, base, owner, ctx))
    }

    /// Longest distance this shot may travel.
    pub fn max_length(&self, base: &WeaponBase, owner: &OwnerState, dir: Vec3) -> f32 {
        let range_mod = if owner.direct_control {
            DIRECT_CONTROL_RANGE_MOD
        } else if owner.immobile {
            1.0
        } else {
            MOBILE_RANGE_MOD
        };
        let mut max_length = self.def.range * range_mod;

        if self.def.cylinder_targeting > CYLINDER_TARGETING_THRESHOLD {
            let vertical = owner.radius * self.def.cylinder_targeting * dir.y;
            max_length = (max_length * max_length + vertical * vertical).sqrt();
        }

        if self.def.target_border != 0.0
            && let Some(radius) = base.target.unit_radius()
        {
            max_length += radius * self.def.target_border;
        }

        max_length
    }

    fn fire_internal(
        &mut self,
        sweep: bool,
        base: &mut WeaponBase,
        owner: &OwnerState,
        ctx: &mut FireContext<'_>,
    ) -> ShotReport {
        let mut dir = aim::fire_dir(
            &self.def,
            &mut self.state,
            base,
            owner,
            sweep,
            ctx.pieces,
        );
        if !sweep {
            let spray = self.def.spray_angle * aim::experience_factor(&self.def, owner);
            dir += random_vector(&mut *ctx.rng) * spray;
        }
        let dir = safe_normalize(dir);
        let max_length = self.max_length(base, owner, dir);

        let shot = ShotInfo {
            weapon: self.def.id,
            owner: owner.id,
            team: owner.team,
            damage: self.def.damages.default_damage(),
        };
        let request = TraceRequest {
            origin: base.muzzle_pos,
            dir,
            max_length,
            sweep,
            water_weapon: self.def.water_weapon,
            flags: self.def.collision_flags,
            owner: owner.id,
            owner_team: owner.team,
            shot,
            salvo_damage_mult: self.state.salvo_damage_mult,
        };

        let traced = {
            let mut emission =
                SegmentEmission::new(&mut *ctx.emitter, &self.def, self.state.color, owner.id);
            let mut env = TraceEnv {
                tracer: ctx.tracer,
                shields: &mut *ctx.shields,
                teams: ctx.teams,
            };
            trace_beam(&request, &mut env, &mut emission)
        };

        let mut report = ShotReport {
            sweep,
            termination: traced.termination,
            segments: traced.segments,
            impact: traced.end,
            dir: traced.dir,
            length: traced.length,
            max_length,
            hit: traced.hit,
            damage: None,
        };

        if !traced.termination.may_damage() {
            return report;
        }

        let impact = Impact {
            muzzle: base.muzzle_pos,
            pos: traced.end,
            dir: traced.dir,
            length: traced.length,
            max_length,
            hit: traced.hit,
        };
        let Some(outcome) = resolve_damage(&self.def, &impact, self.state.salvo_damage_mult)
        else {
            return report;
        };

        tracing::debug!(
            owner = owner.id,
            weapon = self.def.id,
            length = traced.length,
            intensity = outcome.final_multiplier,
            damage = outcome.damages.default_damage(),
            "Beam impact"
        );
        ctx.explosions.apply(explosion_params(
            &self.def,
            &impact,
            outcome.damages.clone(),
            owner.id,
            base.frame,
        ));
        report.damage = Some(outcome);
        report
    }
}
