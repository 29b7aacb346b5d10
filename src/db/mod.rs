//! Storage layer: device-local key-value store and remote Firestore.

pub mod firestore;
pub mod local;

pub use firestore::FirestoreDb;
pub use local::{LocalStore, StoreError};

/// Collection names as constants.
pub mod collections {
    /// User profiles (keyed by user id)
    pub const USERS: &str = "users";
}
