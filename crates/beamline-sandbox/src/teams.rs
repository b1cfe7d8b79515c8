use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use beamline_core::entity::TeamId;
use beamline_core::services::{TeamRelations, TeamResourcePool};

/// Symmetric alliance pairs. Every team is allied with itself.
#[derive(Debug, Clone, Default)]
pub struct Alliances {
    pairs: Vec<(TeamId, TeamId)>,
}

impl Alliances {
    pub fn new(pairs: Vec<(TeamId, TeamId)>) -> Self {
        Self { pairs }
    }
}

impl TeamRelations for Alliances {
    fn allied(&self, a: TeamId, b: TeamId) -> bool {
        a == b
            || self
                .pairs
                .iter()
                .any(|&(x, y)| (x, y) == (a, b) || (x, y) == (b, a))
    }
}

/// Stockpile and per-tick income of one team.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamResources {
    pub team: TeamId,
    pub energy: f32,
    pub metal: f32,
    pub energy_income: f32,
    pub metal_income: f32,
}

/// Resource stockpiles for every team on the range.
#[derive(Debug, Clone, Default)]
pub struct Treasury {
    teams: HashMap<TeamId, TeamResources>,
}

impl Treasury {
    pub fn new(teams: impl IntoIterator<Item = TeamResources>) -> Self {
        Self {
            teams: teams.into_iter().map(|t| (t.team, t)).collect(),
        }
    }

    pub fn get(&self, team: TeamId) -> Option<&TeamResources> {
        self.teams.get(&team)
    }

    /// Credit one tick of income to every team.
    pub fn tick(&mut self) {
        for res in self.teams.values_mut() {
            res.energy += res.energy_income;
            res.metal += res.metal_income;
        }
    }
}

impl TeamResourcePool for Treasury {
    fn has_energy(&self, team: TeamId, amount: f32) -> bool {
        amount <= 0.0 || self.teams.get(&team).is_some_and(|r| r.energy >= amount)
    }

    fn has_metal(&self, team: TeamId, amount: f32) -> bool {
        amount <= 0.0 || self.teams.get(&team).is_some_and(|r| r.metal >= amount)
    }

    fn consume(&mut self, team: TeamId, energy: f32, metal: f32) {
        if let Some(res) = self.teams.get_mut(&team) {
            res.energy = (res.energy - energy).max(0.0);
            res.metal = (res.metal - metal).max(0.0);
        }
    }
}
