use serde::{Deserialize, Serialize};

use crate::events::BeamSegment;
use crate::services::BeamSegmentEmitter;

/// A segment still on screen, with the frames it has left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveSegment {
    pub segment: BeamSegment,
    pub frames_left: u32,
}

/// Keeps emitted beam segments alive for their time-to-live.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BeamTrailBuffer {
    live: Vec<LiveSegment>,
    emitted_total: u64,
}

impl BeamTrailBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Age every segment by one frame and drop the expired ones.
    pub fn tick(&mut self) {
        for live in &mut self.live {
            live.frames_left = live.frames_left.saturating_sub(1);
        }
        let before = self.live.len();
        self.live.retain(|l| l.frames_left > 0);
        let expired = before - self.live.len();
        if expired > 0 {
            tracing::trace!(expired, live = self.live.len(), "Beam segments expired");
        }
    }

    pub fn live(&self) -> &[LiveSegment] {
        &self.live
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Segments emitted since creation, including expired ones.
    pub fn emitted_total(&self) -> u64 {
        self.emitted_total
    }
}

impl BeamSegmentEmitter for BeamTrailBuffer {
    fn emit(&mut self, segment: BeamSegment) {
        self.emitted_total += 1;
        let frames_left = segment.ttl.max(1);
        self.live.push(LiveSegment {
            segment,
            frames_left,
        });
    }
}
