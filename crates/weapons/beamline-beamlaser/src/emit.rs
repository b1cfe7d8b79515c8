//! Beam segment emission and alpha falloff along the beam.

use glam::Vec3;

use beamline_core::entity::{BeamColor, UnitId, WeaponDefId};
use beamline_core::events::BeamSegment;
use beamline_core::services::BeamSegmentEmitter;

use crate::config::BeamLaserDef;

/// Segment alpha fades to zero at this multiple of the nominal range.
pub const ALPHA_FALLOFF_RANGE_MULT: f32 = 1.3;

/// Alpha of a beam point `travelled` units from the muzzle.
pub fn beam_alpha(base_alpha: f32, travelled: f32, range: f32) -> f32 {
    let fade_range = (range * ALPHA_FALLOFF_RANGE_MULT).max(f32::EPSILON);
    ((1.0 - travelled / fade_range) * base_alpha).max(0.0)
}

/// Turns traced spans into beam segments for one shot.
pub struct SegmentEmission<'a> {
    emitter: &'a mut dyn BeamSegmentEmitter,
    weapon: WeaponDefId,
    owner: UnitId,
    range: f32,
    base_alpha: f32,
    ttl: u32,
    color: BeamColor,
    emitted: usize,
}

impl<'a> SegmentEmission<'a> {
    pub fn new(
        emitter: &'a mut dyn BeamSegmentEmitter,
        def: &BeamLaserDef,
        color: BeamColor,
        owner: UnitId,
    ) -> Self {
        Self {
            emitter,
            weapon: def.id,
            owner,
            range: def.range,
            base_alpha: def.intensity * 255.0,
            ttl: def.beam_ttl.max(1),
            color,
            emitted: 0,
        }
    }

    /// Emit the span `start..end`, which begins `travelled` units down the beam.
    pub fn emit(&mut self, start: Vec3, end: Vec3, travelled: f32, length: f32) {
        let segment = BeamSegment {
            weapon: self.weapon,
            owner: self.owner,
            start,
            end,
            ttl: self.ttl,
            start_alpha: beam_alpha(self.base_alpha, travelled, self.range),
            end_alpha: beam_alpha(self.base_alpha, travelled + length, self.range),
            color: self.color,
        };
        tracing::trace!(
            travelled,
            length,
            start_alpha = segment.start_alpha,
            end_alpha = segment.end_alpha,
            "Beam segment emitted"
        );
        self.emitter.emit(segment);
        self.emitted += 1;
    }

    /// Segments emitted so far for this shot.
    pub fn emitted(&self) -> usize {
        self.emitted
    }
}
