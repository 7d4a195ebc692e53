//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const BINS: &str = "bins";
    pub const HISTORY: &str = "history";
    /// Singleton service documents (weekly reset marker)
    pub const APP_STATE: &str = "app_state";
}
