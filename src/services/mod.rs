// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod key_pool;
pub mod nutrition;
pub mod profile;

pub use key_pool::{KeyPool, PoolError, ProviderError};
pub use nutrition::{NutritionClient, NutritionService};
pub use profile::{ProfileStore, Replication, SaveOutcome};
