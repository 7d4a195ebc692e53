// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Bins (live sensor snapshots, collection accounting)
//! - History (append-only daily collection totals)
//! - App state (weekly reset marker)

use crate::db::collections;
use crate::error::AppError;
use crate::models::stats::{apply_collection, weight_lifted};
use crate::models::{Bin, CollectionReceipt, HistoricalEntry, ResetState};
use futures_util::{stream, StreamExt};

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Document ID of the weekly reset marker in `app_state`.
const WEEKLY_RESET_DOC: &str = "weekly_reset";

/// Bin names like "Tong FIK" contain spaces; document IDs must not.
fn bin_doc_id(bin_id: &str) -> String {
    urlencoding::encode(bin_id).into_owned()
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated
        // connection to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Bin Operations ──────────────────────────────────────────

    /// List all bins, ordered by identifier for deterministic output.
    pub async fn list_bins(&self) -> Result<Vec<Bin>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::BINS)
            .order_by([("id", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a single bin by its identifier.
    pub async fn get_bin(&self, bin_id: &str) -> Result<Option<Bin>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::BINS)
            .obj()
            .one(&bin_doc_id(bin_id))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Atomically credit a collection: read the bin, compute the lifted
    /// weight against the submitted post-collection reading, and commit the
    /// new cumulative total. Only `collected_weight` changes meaning; the
    /// rest of the snapshot is rewritten as read.
    ///
    /// If another collection commits concurrently, Firestore retries the
    /// transaction with fresh data so no credit is lost or double-counted.
    pub async fn empty_bin_atomic(
        &self,
        bin_id: &str,
        final_weight: f64,
    ) -> Result<CollectionReceipt, AppError> {
        let doc_id = bin_doc_id(bin_id);

        let mut transaction = self
            .get_client()?
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        // Read the current snapshot; registers the doc for conflict detection.
        let bin: Option<Bin> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::BINS)
            .obj()
            .one(&doc_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to read bin in transaction: {}", e)))?;

        let Some(mut bin) = bin else {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound(format!("Bin {} not found", bin_id)));
        };

        let lifted = match weight_lifted(bin.weight, final_weight) {
            Ok(lifted) => lifted,
            Err(_) => {
                // Business guard, not a crash: nothing to credit, commit nothing.
                let _ = transaction.rollback().await;
                return Err(AppError::NoWasteCollected);
            }
        };

        bin.collected_weight = apply_collection(bin.collected_weight, lifted);

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::BINS)
            .document_id(&doc_id)
            .object(&bin)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add bin to transaction: {}", e)))?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            bin_id,
            weight_lifted = lifted,
            collected_weight = bin.collected_weight,
            "Collection credited"
        );

        Ok(CollectionReceipt {
            bin_id: bin.id,
            weight_lifted: lifted,
            collected_weight: bin.collected_weight,
        })
    }

    /// Atomically flip a bin's lid state. Returns the new state.
    pub async fn toggle_lid_atomic(&self, bin_id: &str) -> Result<bool, AppError> {
        let doc_id = bin_doc_id(bin_id);

        let mut transaction = self
            .get_client()?
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let bin: Option<Bin> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::BINS)
            .obj()
            .one(&doc_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to read bin in transaction: {}", e)))?;

        let Some(mut bin) = bin else {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound(format!("Bin {} not found", bin_id)));
        };

        bin.closed = !bin.closed;

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::BINS)
            .document_id(&doc_id)
            .object(&bin)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add bin to transaction: {}", e)))?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(bin_id, closed = bin.closed, "Lid state toggled");

        Ok(bin.closed)
    }

    /// Zero the cumulative collected weight of every bin.
    ///
    /// Uses concurrent writes with a limit to avoid overloading Firestore.
    /// Returns the number of bins reset.
    pub async fn reset_all_collected(&self) -> Result<usize, AppError> {
        let bins = self.list_bins().await?;
        let client = self.get_client()?;
        let count = bins.len();

        stream::iter(bins)
            .map(|mut bin| async move {
                bin.collected_weight = 0.0;
                let doc_id = bin_doc_id(&bin.id);

                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::BINS)
                    .document_id(&doc_id)
                    .object(&bin)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                Ok::<_, AppError>(())
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        Ok(count)
    }

    // ─── App State Operations ────────────────────────────────────

    /// Get the weekly reset marker, if a reset has ever been applied.
    pub async fn get_reset_state(&self) -> Result<Option<ResetState>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::APP_STATE)
            .obj()
            .one(WEEKLY_RESET_DOC)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store the weekly reset marker.
    pub async fn set_reset_state(&self, state: &ResetState) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::APP_STATE)
            .document_id(WEEKLY_RESET_DOC)
            .object(state)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── History Operations ──────────────────────────────────────

    /// Append a daily history entry. Entries are append-only.
    pub async fn append_history(&self, entry: &HistoricalEntry) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::HISTORY)
            .document_id(&entry.id)
            .object(entry)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get the history entry for a specific calendar date, if any.
    pub async fn get_history_for_date(
        &self,
        date: &str,
    ) -> Result<Option<HistoricalEntry>, AppError> {
        let date = date.to_string();
        let entries: Vec<HistoricalEntry> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::HISTORY)
            .filter(move |q| q.for_all([q.field("date").eq(date.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(entries.into_iter().next())
    }

    /// List history entries, newest first, for the statistics charts.
    ///
    /// `before_date` is an exclusive upper bound used for cursor pagination.
    pub async fn list_history(
        &self,
        before_date: Option<&str>,
        limit: u32,
    ) -> Result<Vec<HistoricalEntry>, AppError> {
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::HISTORY);

        let query = if let Some(date) = before_date {
            let date = date.to_string();
            query.filter(move |q| q.for_all([q.field("date").less_than(date.clone())]))
        } else {
            query
        };

        query
            .order_by([("date", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
