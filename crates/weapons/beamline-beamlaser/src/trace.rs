//! Trace/intercept loop: follows one beam through shields until it stops.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use beamline_core::entity::{HitTarget, ShieldId, TeamId, UnitId};
use beamline_core::math::safe_normalize;
use beamline_core::services::{
    CollisionFlags, RayTraceService, ShieldInterceptRegistry, ShotInfo, TeamRelations,
};

use crate::emit::SegmentEmission;

/// Hard cap on ray traces per shot.
pub const MAX_TRACE_ITERATIONS: usize = 5;
/// Height of the water surface.
pub const WATER_LEVEL: f32 = 0.0;

/// Why a beam stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeamTermination {
    /// The last segment met no shield.
    NoIntercept,
    /// A shield took the beam and did not let it through.
    ShieldAbsorbed(ShieldId),
    /// Shields kept redirecting the beam until the trace budget ran out.
    IterationCap,
    /// A sweep shot traced into an ally; the shot is dropped without damage.
    FriendlyFireAbort,
    /// The beam spent its whole length without hitting anything in range.
    RangeExhausted,
}

impl BeamTermination {
    /// Whether the shot may still trigger an impact.
    pub fn may_damage(self) -> bool {
        !matches!(self, Self::FriendlyFireAbort | Self::RangeExhausted)
    }
}

/// Everything fixed for the duration of one shot's trace.
#[derive(Debug, Clone, Copy)]
pub struct TraceRequest {
    pub origin: Vec3,
    pub dir: Vec3,
    pub max_length: f32,
    pub sweep: bool,
    pub water_weapon: bool,
    pub flags: CollisionFlags,
    pub owner: UnitId,
    pub owner_team: TeamId,
    pub shot: ShotInfo,
    /// Passed to shields so they drain the per-shot share of a salvo.
    pub salvo_damage_mult: f32,
}

/// Collaborators the loop queries.
pub struct TraceEnv<'a> {
    pub tracer: &'a dyn RayTraceService,
    pub shields: &'a mut dyn ShieldInterceptRegistry,
    pub teams: &'a dyn TeamRelations,
}

/// Outcome of a traced beam.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamTrace {
    /// Final beam position (impact point unless aborted).
    pub end: Vec3,
    /// Direction the beam was travelling at `end`.
    pub dir: Vec3,
    /// Total length of the emitted segments.
    pub length: f32,
    pub hit: HitTarget,
    pub termination: BeamTermination,
    /// Ray traces performed.
    pub iterations: usize,
    pub segments: usize,
}

/// Loop state between iterations.
#[derive(Debug, Clone, Copy, PartialEq)]
enum TraceState {
    /// About to trace from the current position.
    Tracing,
    /// A shield bent the beam and let it through; trace again.
    Intercepted(ShieldId),
    Terminated(BeamTermination),
    Aborted,
}

/// Shorten `length` so the beam stops at the water surface.
pub fn clip_to_water(pos: Vec3, dir: Vec3, length: f32) -> f32 {
    if dir.y < 0.0 && pos.y + dir.y * length <= WATER_LEVEL {
        ((pos.y - WATER_LEVEL) / -dir.y).clamp(0.0, length)
    } else {
        length
    }
}

/// Trace a beam through at most [`MAX_TRACE_ITERATIONS`] segments, emitting each one.
pub fn trace_beam(
    req: &TraceRequest,
    env: &mut TraceEnv<'_>,
    emission: &mut SegmentEmission<'_>,
) -> BeamTrace {
    let mut cur_pos = req.origin;
    let mut cur_dir = safe_normalize(req.dir);
    let mut cur_length = 0.0f32;
    let mut hit = HitTarget::None;
    let mut iterations = 0usize;
    let mut state = TraceState::Tracing;

    loop {
        match state {
            TraceState::Tracing | TraceState::Intercepted(_) => {
                if iterations == MAX_TRACE_ITERATIONS {
                    tracing::debug!(
                        owner = req.owner,
                        length = cur_length,
                        "Beam stopped at trace iteration cap"
                    );
                    state = TraceState::Terminated(BeamTermination::IterationCap);
                    continue;
                }
            },
            TraceState::Terminated(_) | TraceState::Aborted => break,
        }
        iterations += 1;

        let remaining = (req.max_length - cur_length).max(0.0);
        let traced = env
            .tracer
            .trace(cur_pos, cur_dir, remaining, req.flags, req.owner);
        let mut beam_length = traced.distance.clamp(0.0, remaining);

        if req.sweep
            && let HitTarget::Unit(unit) = traced.target
            && env.teams.allied(unit.team, req.owner_team)
        {
            tracing::debug!(
                owner = req.owner,
                ally = unit.id,
                "Sweep beam traced into an ally, dropping shot"
            );
            state = TraceState::Aborted;
            continue;
        }

        if !req.water_weapon {
            beam_length = clip_to_water(cur_pos, cur_dir, beam_length);
        }

        let mut next_dir = cur_dir;
        let mut next_state = TraceState::Terminated(BeamTermination::NoIntercept);
        if let Some(intercept) = env.shields.query(&req.shot, cur_pos, cur_dir, beam_length)
            && intercept.distance < beam_length
        {
            debug_assert!(intercept.distance.is_finite(), "Shield intercept distance must be finite");
            beam_length = intercept.distance.max(0.0);
            next_dir = safe_normalize(intercept.new_dir);

            let continues =
                env.shields
                    .on_intercepted(intercept.shield, &req.shot, req.salvo_damage_mult);
            tracing::trace!(
                shield = intercept.shield,
                distance = intercept.distance,
                continues,
                "Beam intercepted by shield"
            );
            next_state = if continues {
                TraceState::Intercepted(intercept.shield)
            } else {
                TraceState::Terminated(BeamTermination::ShieldAbsorbed(intercept.shield))
            };
        }

        let hit_pos = cur_pos + cur_dir * beam_length;
        emission.emit(cur_pos, hit_pos, cur_length, beam_length);

        // The last traced entity stays the hit even when the segment is cut short.
        hit = traced.target;
        cur_pos = hit_pos;
        cur_dir = next_dir;
        cur_length += beam_length;
        debug_assert!(cur_length >= 0.0, "Beam length must never go negative");
        state = next_state;
    }

    let termination = match state {
        TraceState::Aborted => BeamTermination::FriendlyFireAbort,
        TraceState::Terminated(BeamTermination::NoIntercept)
            if cur_length >= req.max_length =>
        {
            tracing::trace!(owner = req.owner, "Beam dissipated at full range");
            BeamTermination::RangeExhausted
        },
        TraceState::Terminated(t) => t,
        TraceState::Tracing | TraceState::Intercepted(_) => BeamTermination::IterationCap,
    };

    BeamTrace {
        end: cur_pos,
        dir: cur_dir,
        length: cur_length,
        hit,
        termination,
        iterations,
        segments: emission.emitted(),
    }
}
