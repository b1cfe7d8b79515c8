use serde::{Deserialize, Serialize};

/// Unique identifier for a unit in the simulation.
pub type UnitId = u32;
/// Unique identifier for a map feature (wreck, rock, tree).
pub type FeatureId = u32;
/// Team (player slot) identifier.
pub type TeamId = u8;
/// Unique identifier for a shield emitter.
pub type ShieldId = u32;
/// Index of a model piece on a unit.
pub type PieceId = u16;
/// Weapon definition identifier.
pub type WeaponDefId = u32;

/// Beam color, persisted with the weapon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeamColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Default for BeamColor {
    fn default() -> Self {
        Self {
            r: 1.0,
            g: 0.0,
            b: 0.0,
        }
    }
}

/// A unit struck by a trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitHit {
    pub id: UnitId,
    pub team: TeamId,
    pub radius: f32,
    /// Model piece the trace struck, when the collision query resolves pieces.
    pub piece: Option<PieceId>,
}

/// What a traced beam ultimately stopped on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum HitTarget {
    Unit(UnitHit),
    Feature(FeatureId),
    Terrain,
    #[default]
    None,
}

impl HitTarget {
    pub fn unit(&self) -> Option<&UnitHit> {
        match self {
            Self::Unit(hit) => Some(hit),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}
