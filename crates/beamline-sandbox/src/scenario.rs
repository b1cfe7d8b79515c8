use std::collections::BTreeMap;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use beamline_beamlaser::ShotReport;
use beamline_beamlaser::config::BeamLaserDef;
use beamline_beamlaser::trace::BeamTermination;
use beamline_core::entity::UnitId;
use beamline_core::time::Frame;

use crate::range::{Range, RangeDef, load_range_from_file};
use crate::turret::{Turret, TurretDef};

/// A scenario file: a range, a weapon, and where to mount it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioDef {
    pub name: String,
    pub seed: u64,
    /// Frames to run when the caller does not say otherwise.
    pub ticks: u32,
    /// JSON range layout; replaces the inline `range` table when set.
    pub range_file: Option<String>,
    pub range: RangeDef,
    /// Inline weapon definition. When absent the weapon config file is used.
    pub weapon: Option<BeamLaserDef>,
    pub turrets: Vec<TurretDef>,
}

impl Default for ScenarioDef {
    fn default() -> Self {
        Self {
            name: "scenario".to_string(),
            seed: 0,
            ticks: 300,
            range_file: None,
            range: RangeDef::default(),
            weapon: None,
            turrets: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub enum ScenarioError {
    Io { path: String, source: std::io::Error },
    Parse(String),
    MissingRange(String),
    UnknownUnit(UnitId),
    NoTurrets,
}

impl std::fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot read {path}: {source}"),
            Self::Parse(m) => write!(f, "invalid scenario: {m}"),
            Self::MissingRange(path) => write!(f, "range file {path} is missing or invalid"),
            Self::UnknownUnit(id) => write!(f, "turret mounted on unknown unit {id}"),
            Self::NoTurrets => write!(f, "scenario has no turrets"),
        }
    }
}

impl std::error::Error for ScenarioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for ScenarioError {
    fn from(e: toml::de::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

/// Totals gathered over a scenario run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub ticks: u32,
    pub shots: u32,
    pub sweep_shots: u32,
    pub segments: u64,
    pub explosions: u32,
    pub damage_dealt: f32,
    pub kills: Vec<UnitId>,
    pub terminations: BTreeMap<String, u32>,
    pub shield_intercepts: u32,
    pub live_segments: usize,
}

fn termination_label(termination: BeamTermination) -> &'static str {
    match termination {
        BeamTermination::NoIntercept => "no_intercept",
        BeamTermination::ShieldAbsorbed(_) => "shield_absorbed",
        BeamTermination::IterationCap => "iteration_cap",
        BeamTermination::FriendlyFireAbort => "friendly_fire_abort",
        BeamTermination::RangeExhausted => "range_exhausted",
    }
}

/// A loaded scenario ready to run.
pub struct Scenario {
    pub name: String,
    pub range: Range,
    pub turrets: Vec<Turret>,
    default_ticks: u32,
    rng: StdRng,
    frame: Frame,
    summary: RunSummary,
}

impl Scenario {
    pub fn load(path: &str) -> Result<Self, ScenarioError> {
        let content = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ScenarioError> {
        let def: ScenarioDef = toml::from_str(content)?;
        Self::from_def(def)
    }

    pub fn from_def(def: ScenarioDef) -> Result<Self, ScenarioError> {
        let range_def = match &def.range_file {
            Some(path) => {
                load_range_from_file(path).ok_or_else(|| ScenarioError::MissingRange(path.clone()))?
            },
            None => def.range,
        };
        if def.turrets.is_empty() {
            return Err(ScenarioError::NoTurrets);
        }
        if let Some(t) = def
            .turrets
            .iter()
            .find(|t| !range_def.units.iter().any(|u| u.id == t.unit))
        {
            return Err(ScenarioError::UnknownUnit(t.unit));
        }

        let weapon = Arc::new(def.weapon.unwrap_or_else(BeamLaserDef::load));
        let turrets = def
            .turrets
            .into_iter()
            .map(|t| Turret::new(Arc::clone(&weapon), t))
            .collect();

        tracing::info!(
            scenario = %def.name,
            weapon = %weapon.name,
            seed = def.seed,
            "Scenario loaded"
        );

        Ok(Self {
            name: def.name,
            range: Range::new(range_def),
            turrets,
            default_ticks: def.ticks,
            rng: StdRng::seed_from_u64(def.seed),
            frame: 0,
            summary: RunSummary::default(),
        })
    }

    pub fn default_ticks(&self) -> u32 {
        self.default_ticks
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Advance the range by one frame.
    pub fn step(&mut self) {
        let mut shots: Vec<ShotReport> = Vec::new();
        for turret in &mut self.turrets {
            shots.extend(turret.tick(self.frame, &mut self.range, &mut self.rng));
        }
        for shot in &shots {
            self.record_shot(shot);
        }

        for dealt in self.range.resolve_explosions() {
            self.summary.damage_dealt += dealt.amount;
            if dealt.killed {
                self.summary.kills.push(dealt.unit);
            }
        }

        self.range.tick();
        self.frame += 1;
        self.summary.ticks += 1;
    }

    fn record_shot(&mut self, shot: &ShotReport) {
        self.summary.shots += 1;
        if shot.sweep {
            self.summary.sweep_shots += 1;
        }
        if shot.damage.is_some() {
            self.summary.explosions += 1;
        }
        *self
            .summary
            .terminations
            .entry(termination_label(shot.termination).to_string())
            .or_default() += 1;
    }

    /// Run `ticks` frames and return the totals so far.
    pub fn run(&mut self, ticks: u32) -> RunSummary {
        for _ in 0..ticks {
            self.step();
        }
        self.summary.segments = self.range.trail.emitted_total();
        self.summary.shield_intercepts = self.range.shields.intercepts();
        self.summary.live_segments = self.range.trail.len();
        tracing::info!(
            scenario = %self.name,
            ticks = self.summary.ticks,
            shots = self.summary.shots,
            damage = self.summary.damage_dealt,
            kills = self.summary.kills.len(),
            "Scenario run finished"
        );
        self.summary.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
name = "minimal"
seed = 3

[weapon]
range = 400.0
beamtime = 0.1
damages = [90.0]

[[range.units]]
id = 1
pos = [0.0, 10.0, 0.0]
immobile = true

[[range.units]]
id = 2
team = 1
pos = [0.0, 18.0, 150.0]

[[turrets]]
unit = 1
target = { unit = 2 }
"#;

    #[test]
    fn parses_minimal_scenario() {
        let scenario = Scenario::from_toml_str(MINIMAL).unwrap();
        assert_eq!(scenario.name, "minimal");
        assert_eq!(scenario.default_ticks(), 300);
        assert_eq!(scenario.turrets.len(), 1);
        assert_eq!(scenario.turrets[0].laser().def().range, 400.0);
    }

    #[test]
    fn run_accumulates_damage() {
        let mut scenario = Scenario::from_toml_str(MINIMAL).unwrap();
        let summary = scenario.run(3);
        assert_eq!(summary.ticks, 3);
        assert_eq!(summary.shots, 3);
        assert_eq!(summary.explosions, 3);
        assert!(summary.damage_dealt > 0.0);
        assert_eq!(summary.terminations.get("no_intercept"), Some(&3));
        assert_eq!(summary.segments, 3);
    }

    #[test]
    fn unknown_turret_unit_is_rejected() {
        let text = MINIMAL.replace("unit = 1\ntarget", "unit = 9\ntarget");
        assert!(matches!(
            Scenario::from_toml_str(&text),
            Err(ScenarioError::UnknownUnit(9))
        ));
    }

    #[test]
    fn scenario_without_turrets_is_rejected() {
        let err = Scenario::from_toml_str("name = \"empty\"").err().unwrap();
        assert!(matches!(err, ScenarioError::NoTurrets));
        assert_eq!(err.to_string(), "scenario has no turrets");
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = Scenario::from_toml_str("seed = \"many\"").err().unwrap();
        assert!(matches!(err, ScenarioError::Parse(_)));
    }

    #[test]
    fn missing_files_are_reported() {
        let err = Scenario::load("/nonexistent/scenario.toml").err().unwrap();
        assert!(matches!(err, ScenarioError::Io { .. }));
        assert!(std::error::Error::source(&err).is_some());

        let text = format!("range_file = \"/nonexistent/range.json\"\n{MINIMAL}");
        assert!(matches!(
            Scenario::from_toml_str(&text),
            Err(ScenarioError::MissingRange(_))
        ));
    }
}
