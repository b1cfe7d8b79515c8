use serde::{Deserialize, Serialize};

use beamline_core::damage::{DamageArray, DynamicDamageCurve};
use beamline_core::entity::{BeamColor, WeaponDefId};
use beamline_core::services::CollisionFlags;

/// Data-driven definition of a beam laser weapon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamLaserDef {
    pub id: WeaponDefId,
    pub name: String,
    /// Nominal range in world units.
    pub range: f32,
    /// Damage of one full hit, per armor class.
    pub damages: DamageArray,
    /// Duration of a continuous beam in seconds (ignored by beamburst weapons).
    pub beamtime: f32,
    /// Fire discrete sub-beams that re-aim every shot instead of one held beam.
    pub beamburst: bool,
    /// Shots per salvo for beamburst weapons.
    pub salvo_size: u32,
    /// Frames between salvo shots for beamburst weapons.
    pub salvo_delay: u32,
    /// Seconds between salvos.
    pub reload_time: f32,
    /// Frames a beam segment stays visible (at least 1 is used).
    pub beam_ttl: u32,
    /// Visual intensity; scales segment alpha.
    pub intensity: f32,
    pub color: BeamColor,
    /// Beam passes into water instead of stopping at the surface.
    pub water_weapon: bool,
    /// Beam follows the weapon piece between target acquisitions.
    pub sweep_fire: bool,
    /// Weapon cannot turn; fires along the owner's facing.
    pub only_forward: bool,
    /// Per-salvo aim error radius.
    pub accuracy: f32,
    /// Per-shot spray radius.
    pub spray_angle: f32,
    /// How much owner experience reduces aim error and spray (0..1).
    pub owner_exp_acc_weight: f32,
    /// Targets are searched in a cylinder of this many owner radii.
    pub cylinder_targeting: f32,
    /// Aim at the edge of the target's hit sphere (fraction of its radius).
    pub target_border: f32,
    /// Lowest falloff multiplier a hit can receive.
    pub min_intensity: f32,
    /// Exponent of the distance-keyed damage curve; 0 disables it.
    pub dyn_damage_exp: f32,
    pub dyn_damage_min: f32,
    /// Distance of the damage curve; 0 uses `range`.
    pub dyn_damage_range: f32,
    pub dyn_damage_inverted: bool,
    pub crater_area_of_effect: f32,
    pub damage_area_of_effect: f32,
    pub edge_effectiveness: f32,
    pub explosion_speed: f32,
    pub impact_only: bool,
    pub no_explode: bool,
    pub no_self_damage: bool,
    /// Energy drained per salvo.
    pub energy_cost: f32,
    /// Metal drained per salvo.
    pub metal_cost: f32,
    pub collision_flags: CollisionFlags,
}

impl Default for BeamLaserDef {
    fn default() -> Self {
        Self {
            id: 0,
            name: "beamlaser".to_string(),
            range: 500.0,
            damages: DamageArray::uniform(100.0, 1),
            beamtime: 1.0,
            beamburst: false,
            salvo_size: 1,
            salvo_delay: 0,
            reload_time: 2.0,
            beam_ttl: 0,
            intensity: 0.9,
            color: BeamColor::default(),
            water_weapon: false,
            sweep_fire: false,
            only_forward: false,
            accuracy: 0.0,
            spray_angle: 0.0,
            owner_exp_acc_weight: 0.0,
            cylinder_targeting: 0.0,
            target_border: 0.0,
            min_intensity: 0.0,
            dyn_damage_exp: 0.0,
            dyn_damage_min: 0.0,
            dyn_damage_range: 0.0,
            dyn_damage_inverted: false,
            crater_area_of_effect: 8.0,
            damage_area_of_effect: 8.0,
            edge_effectiveness: 0.0,
            explosion_speed: 8.0,
            impact_only: false,
            no_explode: false,
            no_self_damage: false,
            energy_cost: 0.0,
            metal_cost: 0.0,
            collision_flags: CollisionFlags::NONE,
        }
    }
}

impl BeamLaserDef {
    /// Load a definition from a TOML file. Falls back to defaults if the file is
    /// missing or unparseable.
    pub fn load() -> Self {
        let path = std::env::var("BEAMLINE_BEAMLASER_CONFIG")
            .unwrap_or_else(|_| "config/beamlaser.toml".to_string());
        match std::fs::read_to_string(&path) {
            Ok(content) => match Self::from_toml_str(&content) {
                Ok(def) => def,
                Err(e) => {
                    tracing::warn!("Failed to parse {path}: {e}, using defaults");
                    Self::default()
                },
            },
            Err(_) => Self::default(),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Distance-keyed damage curve, if the definition enables one.
    pub fn dynamic_curve(&self) -> Option<DynamicDamageCurve> {
        (self.dyn_damage_exp > 0.0).then(|| DynamicDamageCurve {
            range: if self.dyn_damage_range > 0.0 {
                self.dyn_damage_range
            } else {
                self.range
            },
            exponent: self.dyn_damage_exp,
            min_damage: self.dyn_damage_min,
            inverted: self.dyn_damage_inverted,
        })
    }

    /// Explosions from this weapon never hurt the firing unit.
    pub fn ignores_owner(&self) -> bool {
        self.no_explode || self.no_self_damage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_partial_toml_keeps_defaults() {
        let def = BeamLaserDef::from_toml_str(
            r#"
name = "heavy_beam"
range = 800.0
damages = [250.0, 80.0]
water_weapon = true
"#,
        )
        .unwrap();
        assert_eq!(def.name, "heavy_beam");
        assert_eq!(def.range, 800.0);
        assert_eq!(def.damages.get(1), 80.0);
        assert!(def.water_weapon);
        assert_eq!(def.intensity, 0.9);
        assert_eq!(def.beamtime, 1.0);
    }

    #[test]
    fn parse_rejects_wrong_types() {
        assert!(BeamLaserDef::from_toml_str("range = \"far\"").is_err());
    }

    #[test]
    fn dynamic_curve_disabled_by_default() {
        assert!(BeamLaserDef::default().dynamic_curve().is_none());
    }

    #[test]
    fn dynamic_curve_falls_back_to_weapon_range() {
        let def = BeamLaserDef {
            dyn_damage_exp: 1.5,
            ..Default::default()
        };
        let curve = def.dynamic_curve().unwrap();
        assert_eq!(curve.range, def.range);

        let def = BeamLaserDef {
            dyn_damage_exp: 1.5,
            dyn_damage_range: 120.0,
            ..Default::default()
        };
        assert_eq!(def.dynamic_curve().unwrap().range, 120.0);
    }

    #[test]
    fn ignores_owner_when_no_explode_or_no_self_damage() {
        assert!(!BeamLaserDef::default().ignores_owner());
        let def = BeamLaserDef {
            no_self_damage: true,
            ..Default::default()
        };
        assert!(def.ignores_owner());
    }

    #[test]
    fn shipped_config_parses() {
        let def = BeamLaserDef::from_toml_str(include_str!("../../../../config/beamlaser.toml"))
            .unwrap();
        assert_eq!(def.name, "heavy_beam");
        assert_eq!(def.damages.len(), 3);
        assert!((def.color.g - 0.8).abs() < 1e-6);
        assert_ne!(def.color, BeamColor::default());
    }

    #[test]
    fn load_falls_back_to_defaults_without_file() {
        // SAFETY: test-only env mutation; no other test reads this variable.
        unsafe {
            std::env::set_var("BEAMLINE_BEAMLASER_CONFIG", "/nonexistent/beamlaser.toml");
        }
        assert_eq!(BeamLaserDef::load(), BeamLaserDef::default());
    }
}
