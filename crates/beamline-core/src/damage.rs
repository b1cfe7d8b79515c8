use std::ops::Mul;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::math::distance_2d;

/// Lower bound applied to every dynamically scaled damage entry.
const MIN_DYNAMIC_DAMAGE: f32 = 0.0001;

/// Per-armor-class damage values. Index 0 is the default armor class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DamageArray(pub SmallVec<[f32; 4]>);

impl DamageArray {
    pub fn new(values: &[f32]) -> Self {
        Self(SmallVec::from_slice(values))
    }

    /// Same damage against every one of `classes` armor classes.
    pub fn uniform(value: f32, classes: usize) -> Self {
        Self(SmallVec::from_elem(value, classes.max(1)))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Damage against `armor_class`, falling back to the default class.
    pub fn get(&self, armor_class: usize) -> f32 {
        self.0
            .get(armor_class)
            .or_else(|| self.0.first())
            .copied()
            .unwrap_or(0.0)
    }

    /// Damage against the default armor class.
    pub fn default_damage(&self) -> f32 {
        self.get(0)
    }

    pub fn scaled(&self, factor: f32) -> Self {
        Self(self.0.iter().map(|d| d * factor).collect())
    }
}

impl Default for DamageArray {
    fn default() -> Self {
        Self::uniform(1.0, 1)
    }
}

impl Mul<f32> for &DamageArray {
    type Output = DamageArray;

    fn mul(self, rhs: f32) -> DamageArray {
        self.scaled(rhs)
    }
}

/// Inputs of the distance-keyed damage curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicDamageCurve {
    /// Distance at which the curve bottoms out.
    pub range: f32,
    pub exponent: f32,
    /// Floor for the default armor class; other classes are floored proportionally.
    pub min_damage: f32,
    /// Damage grows with distance instead of shrinking.
    pub inverted: bool,
}

/// Rescale `damages` by the horizontal distance a shot travelled from `start` to `end`.
pub fn dynamic_damages(
    damages: &DamageArray,
    start: Vec3,
    end: Vec3,
    curve: &DynamicDamageCurve,
) -> DamageArray {
    let range = curve.range.max(f32::EPSILON);
    let travelled = distance_2d(start, end).min(range);
    let damage_mod = 1.0 - (travelled / range).powf(curve.exponent);
    let base = damages.default_damage();
    let min_mod = if base != 0.0 {
        curve.min_damage / base
    } else {
        0.0
    };

    let values = damages
        .0
        .iter()
        .map(|&d| {
            let mut scaled = if curve.inverted {
                d - damage_mod * d
            } else {
                damage_mod * d
            };
            if curve.min_damage > 0.0 {
                scaled = scaled.max(d * min_mod);
            }
            scaled.max(MIN_DYNAMIC_DAMAGE)
        })
        .collect();

    DamageArray(values)
}
