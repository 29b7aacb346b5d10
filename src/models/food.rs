// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Food nutrition data and the built-in table of common foods.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Nutrition facts for one food, all quantities per 100 g.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FoodItem {
    pub name: String,
    /// kcal per 100 g
    pub calories: f64,
    /// grams per 100 g
    pub proteins: f64,
    pub carbs: f64,
    pub fats: f64,
}

/// Response shape requested from the inference provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FoodSearchResponse {
    pub foods: Vec<FoodItem>,
}

/// (name, kcal, proteins, carbs, fats)
const COMMON_FOODS: &[(&str, f64, f64, f64, f64)] = &[
    ("Pomme", 52.0, 0.3, 14.0, 0.2),
    ("Banane", 89.0, 1.1, 23.0, 0.3),
    ("Poulet (blanc)", 165.0, 31.0, 0.0, 3.6),
    ("Riz blanc cuit", 130.0, 2.7, 28.0, 0.3),
    ("Oeuf", 155.0, 13.0, 1.1, 11.0),
    ("Pain complet", 247.0, 9.4, 41.0, 3.3),
    ("Yaourt nature", 59.0, 3.5, 4.7, 3.3),
    ("Saumon", 208.0, 22.0, 0.0, 13.0),
    ("Avocat", 160.0, 2.0, 8.5, 14.7),
    ("Lentilles cuites", 116.0, 9.0, 20.0, 0.4),
    ("Pâtes cuites", 158.0, 5.8, 31.0, 0.9),
    ("Thon en conserve", 132.0, 26.0, 0.0, 2.6),
    ("Fromage blanc 0%", 43.0, 8.0, 3.5, 0.2),
    ("Amandes", 576.0, 21.0, 22.0, 49.0),
    ("Quinoa cuit", 120.0, 4.4, 21.3, 1.9),
    ("Brocoli cuit", 35.0, 2.4, 7.2, 0.4),
    ("Patate douce cuite", 90.0, 2.0, 21.0, 0.2),
    ("Tomate", 18.0, 0.9, 3.9, 0.2),
    ("Fromage mozzarella", 280.0, 28.0, 2.2, 17.0),
    ("Huile d'olive", 884.0, 0.0, 0.0, 100.0),
];

/// All built-in foods.
pub fn common_foods() -> Vec<FoodItem> {
    COMMON_FOODS
        .iter()
        .map(|&(name, calories, proteins, carbs, fats)| FoodItem {
            name: name.to_string(),
            calories,
            proteins,
            carbs,
            fats,
        })
        .collect()
}

/// Case-insensitive substring search over the built-in foods.
///
/// An empty (or whitespace-only) query matches everything.
pub fn search_local_foods(query: &str) -> Vec<FoodItem> {
    let needle = query.trim().to_lowercase();
    common_foods()
        .into_iter()
        .filter(|food| food.name.to_lowercase().contains(&needle))
        .collect()
}
