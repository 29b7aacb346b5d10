// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod credential;
pub mod food;
pub mod profile;

pub use credential::{Credential, PoolState};
pub use food::{FoodItem, FoodSearchResponse};
pub use profile::{ActivityLevel, Gender, UserProfile};
