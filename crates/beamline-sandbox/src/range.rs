use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use beamline_beamlaser::FireContext;
use beamline_core::entity::TeamId;
use beamline_core::trail::BeamTrailBuffer;

use crate::bodies::{Bodies, RangeFeature, RangeUnit};
use crate::explosions::{ExplosionQueue, UnitDamage, resolve_explosion};
use crate::shields::{ShieldField, ShieldSphere};
use crate::teams::{Alliances, TeamResources, Treasury};

/// Serialized layout of a firing range.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeDef {
    pub name: String,
    pub ground_height: f32,
    pub units: Vec<RangeUnit>,
    pub features: Vec<RangeFeature>,
    pub shields: Vec<ShieldSphere>,
    pub alliances: Vec<(TeamId, TeamId)>,
    pub resources: Vec<TeamResources>,
}

/// Load a range from a JSON file, returning `None` if the file is missing or invalid.
pub fn load_range_from_file(path: &str) -> Option<RangeDef> {
    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<RangeDef>(&content) {
            Ok(range) => Some(range),
            Err(e) => {
                tracing::warn!("Failed to parse {path}: {e}");
                None
            },
        },
        Err(_) => None,
    }
}

/// A live range: the simulation side every weapon shot talks to.
#[derive(Debug, Clone)]
pub struct Range {
    pub name: String,
    pub bodies: Bodies,
    pub shields: ShieldField,
    pub alliances: Alliances,
    pub treasury: Treasury,
    pub explosions: ExplosionQueue,
    pub trail: BeamTrailBuffer,
}

impl Range {
    pub fn new(def: RangeDef) -> Self {
        Self {
            name: def.name,
            bodies: Bodies::new(def.ground_height, def.units, def.features),
            shields: ShieldField::new(def.shields),
            alliances: Alliances::new(def.alliances),
            treasury: Treasury::new(def.resources),
            explosions: ExplosionQueue::default(),
            trail: BeamTrailBuffer::new(),
        }
    }

    /// Borrow the range as the collaborators of one shot.
    pub fn fire_context<'a>(&'a mut self, rng: &'a mut StdRng) -> FireContext<'a> {
        FireContext {
            tracer: &self.bodies,
            shields: &mut self.shields,
            emitter: &mut self.trail,
            explosions: &mut self.explosions,
            teams: &self.alliances,
            resources: &mut self.treasury,
            pieces: &self.bodies,
            rng,
        }
    }

    /// Apply every explosion queued by the shots fired so far.
    pub fn resolve_explosions(&mut self) -> Vec<UnitDamage> {
        self.explosions
            .drain()
            .iter()
            .flat_map(|params| resolve_explosion(&mut self.bodies, params))
            .collect()
    }

    /// Advance one frame: age beam trails and pay income.
    pub fn tick(&mut self) {
        self.trail.tick();
        self.treasury.tick();
    }
}
