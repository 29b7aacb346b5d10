//! User profile model and the goals derived from it.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Biological sex used by the Harris–Benedict equations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    // Profiles written by the first mobile release used French values.
    #[serde(alias = "homme")]
    Male,
    #[serde(alias = "femme")]
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Sedentary,
    Moderate,
    Active,
}

impl ActivityLevel {
    /// TDEE multiplier applied to the basal metabolic rate.
    pub fn energy_factor(self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
        }
    }

    /// Multiplier applied to the 30 ml/kg water baseline.
    pub fn water_factor(self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.0,
            ActivityLevel::Moderate => 1.2,
            ActivityLevel::Active => 1.3,
        }
    }
}

/// User profile, stored locally as JSON and remotely in Firestore.
///
/// `daily_calorie_goal` and `water_goal_ml` are derived; callers never set
/// them directly, `ProfileStore::save_profile` recomputes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub email: String,
    pub age: u32,
    pub gender: Gender,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub target_weight_kg: f64,
    pub activity_level: ActivityLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_calorie_goal: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_goal_ml: Option<u32>,
}

impl Default for UserProfile {
    /// Profile shown before the user has saved anything.
    fn default() -> Self {
        Self {
            email: "utilisateur@example.com".to_string(),
            age: 30,
            gender: Gender::Male,
            height_cm: 175.0,
            weight_kg: 75.0,
            target_weight_kg: 70.0,
            activity_level: ActivityLevel::Moderate,
            daily_calorie_goal: Some(2000),
            water_goal_ml: Some(2000),
        }
    }
}

impl UserProfile {
    /// Basal metabolic rate (revised Harris–Benedict), kcal/day.
    pub fn bmr(&self) -> f64 {
        let age = f64::from(self.age);
        match self.gender {
            Gender::Male => {
                88.362 + 13.397 * self.weight_kg + 4.799 * self.height_cm - 5.677 * age
            }
            Gender::Female => {
                447.593 + 9.247 * self.weight_kg + 3.098 * self.height_cm - 4.330 * age
            }
        }
    }

    /// Total daily energy expenditure, kcal/day.
    pub fn tdee(&self) -> f64 {
        self.bmr() * self.activity_level.energy_factor()
    }

    /// Daily calorie target: a 500 kcal deficit when the user wants to lose weight.
    pub fn calculate_daily_calories(&self) -> u32 {
        let tdee = self.tdee();
        let goal = if self.target_weight_kg < self.weight_kg {
            tdee - 500.0
        } else {
            tdee
        };
        to_goal(goal)
    }

    /// Daily water target in millilitres.
    pub fn calculate_water_goal(&self) -> u32 {
        to_goal(self.weight_kg * 30.0 * self.activity_level.water_factor())
    }

    /// Copy of the profile with both derived goals recomputed.
    pub fn with_derived_goals(mut self) -> Self {
        self.daily_calorie_goal = Some(self.calculate_daily_calories());
        self.water_goal_ml = Some(self.calculate_water_goal());
        self
    }
}

fn to_goal(value: f64) -> u32 {
    // Negative only for nonsensical inputs; clamp rather than wrap.
    value.round().max(0.0) as u32
}
