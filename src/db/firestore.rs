// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile storage)
//! - Courses (catalog)
//! - Chatrooms and Messages (conversation store)
//! - Entitlements (purchase ledger)
//! - Progress (lecture notes and marks)
//!
//! Counter and ledger mutations are read-modify-write cycles on a single
//! document, so they run inside Firestore transactions: the pure mutation
//! from the model layer is applied to the freshly-read document and Firestore
//! retries on conflicting concurrent writes.

use crate::db::collections;
use crate::error::AppError;
use crate::models::entitlement::PurchaseOutcome;
use crate::models::progress::ProgressError;
use crate::models::{Chatroom, Course, Entitlement, Message, Progress, User};
use chrono::{DateTime, Utc};

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
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
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

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Look up a user by email (unique).
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = email.to_string();
        let mut users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.for_all([q.field("email").eq(email.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.pop())
    }

    /// Create or update a user.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List every user (chat contact list).
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Course Operations ───────────────────────────────────────

    /// Get a course by ID.
    pub async fn get_course(&self, course_id: &str) -> Result<Option<Course>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::COURSES)
            .obj()
            .one(course_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a course.
    pub async fn upsert_course(&self, course: &Course) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::COURSES)
            .document_id(&course.id)
            .object(course)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a course from the catalog.
    pub async fn delete_course(&self, course_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::COURSES)
            .document_id(course_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List the full catalog.
    pub async fn list_courses(&self) -> Result<Vec<Course>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::COURSES)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Chatroom Operations ─────────────────────────────────────

    /// Get a chatroom by ID.
    pub async fn get_chatroom(&self, chatroom_id: &str) -> Result<Option<Chatroom>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::CHATROOMS)
            .obj()
            .one(chatroom_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the chatroom for a participant pair, creating it on first
    /// contact.
    ///
    /// The document ID is the canonical pair key, so both argument orders
    /// resolve to the same identity and a concurrent double create converges
    /// on one document.
    pub async fn find_or_create_chatroom(&self, a: &str, b: &str) -> Result<Chatroom, AppError> {
        let id = crate::models::chatroom::pair_key(a, b);

        if let Some(existing) = self.get_chatroom(&id).await? {
            return Ok(existing);
        }

        let chatroom = Chatroom::new(a, b, crate::time_utils::format_utc_rfc3339(Utc::now()));
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::CHATROOMS)
            .document_id(&chatroom.id)
            .object(&chatroom)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(chatroom_id = %chatroom.id, "Chatroom created");
        Ok(chatroom)
    }

    /// All chatrooms containing the given participant.
    pub async fn chatrooms_for_user(&self, user_id: &str) -> Result<Vec<Chatroom>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::CHATROOMS)
            .filter(move |q| q.for_all([q.field("participants").array_contains(user_id.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Apply a counter mutation to one chatroom inside a transaction.
    ///
    /// Returns `Ok(false)` without writing when the chatroom is absent or the
    /// mutation matched no counter entry (silent no-op semantics).
    async fn mutate_unread<F>(&self, chatroom_id: &str, mutate: F) -> Result<bool, AppError>
    where
        F: Fn(&mut Chatroom) -> bool,
    {
        let mut transaction = self
            .get_client()?
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let chatroom: Option<Chatroom> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::CHATROOMS)
            .obj()
            .one(chatroom_id)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read chatroom in transaction: {}", e))
            })?;

        let Some(mut chatroom) = chatroom else {
            let _ = transaction.rollback().await;
            return Ok(false);
        };

        if !mutate(&mut chatroom) {
            let _ = transaction.rollback().await;
            return Ok(false);
        }

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::CHATROOMS)
            .document_id(chatroom_id)
            .object(&chatroom)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add chatroom to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(true)
    }

    /// Atomically increment one participant's unread counter.
    pub async fn increment_unread(
        &self,
        chatroom_id: &str,
        user_id: &str,
    ) -> Result<bool, AppError> {
        self.mutate_unread(chatroom_id, |room| room.increment_unread(user_id))
            .await
    }

    /// Atomically reset one participant's unread counter to zero.
    pub async fn reset_unread(&self, chatroom_id: &str, user_id: &str) -> Result<bool, AppError> {
        self.mutate_unread(chatroom_id, |room| room.reset_unread(user_id))
            .await
    }

    // ─── Message Operations ──────────────────────────────────────

    /// Append a message (the durability point of a send).
    pub async fn append_message(&self, message: &Message) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::MESSAGES)
            .document_id(&message.id)
            .object(message)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Full ordered history of one chatroom.
    pub async fn messages_for_chatroom(
        &self,
        chatroom_id: &str,
    ) -> Result<Vec<Message>, AppError> {
        let chatroom_id = chatroom_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::MESSAGES)
            .filter(move |q| q.for_all([q.field("chatroom_id").eq(chatroom_id.clone())]))
            .order_by([(
                "created_at",
                firestore::FirestoreQueryDirection::Ascending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Entitlement Operations ──────────────────────────────────

    /// Get a user's entitlement ledger document.
    pub async fn get_entitlement(&self, user_id: &str) -> Result<Option<Entitlement>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::ENTITLEMENTS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// True iff the user holds an active window for the course at `now`.
    pub async fn has_active_access(
        &self,
        user_id: &str,
        course_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        Ok(self
            .get_entitlement(user_id)
            .await?
            .map(|e| e.has_active_access(course_id, now))
            .unwrap_or(false))
    }

    /// Atomically record a purchase in the user's ledger document.
    ///
    /// The whole check-and-append runs in a transaction keyed by user id, so
    /// concurrent verify calls for the same user cannot lose updates or
    /// append a second active window.
    pub async fn record_purchase_atomic(
        &self,
        user_id: &str,
        course_id: &str,
        reference: &str,
        purchase_date: DateTime<Utc>,
        duration_months: u32,
    ) -> Result<PurchaseOutcome, AppError> {
        let mut transaction = self
            .get_client()?
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let mut ledger: Entitlement = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::ENTITLEMENTS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read ledger in transaction: {}", e))
            })?
            .unwrap_or_else(|| Entitlement::new(user_id));

        let outcome = ledger.record_purchase(course_id, reference, purchase_date, duration_months);

        if outcome != PurchaseOutcome::Recorded {
            // Nothing to write; conflict / replay decided from fresh data
            let _ = transaction.rollback().await;
            return Ok(outcome);
        }

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::ENTITLEMENTS)
            .document_id(user_id)
            .object(&ledger)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add ledger to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(user_id, course_id, reference, "Purchase recorded");
        Ok(outcome)
    }

    /// Every ledger document (admin dashboard rollups).
    pub async fn list_entitlements(&self) -> Result<Vec<Entitlement>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::ENTITLEMENTS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Progress Operations ─────────────────────────────────────

    /// Get a user's progress document.
    pub async fn get_progress(&self, user_id: &str) -> Result<Option<Progress>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PROGRESS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Apply a progress mutation inside a transaction.
    ///
    /// The document is created on demand: progress degrades gracefully when
    /// the post-purchase seed was lost.
    async fn mutate_progress<T, F>(&self, user_id: &str, mutate: F) -> Result<T, AppError>
    where
        F: Fn(&mut Progress) -> Result<T, AppError>,
    {
        let mut transaction = self
            .get_client()?
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let mut progress: Progress = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PROGRESS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read progress in transaction: {}", e))
            })?
            .unwrap_or_else(|| Progress::new(user_id));

        let value = match mutate(&mut progress) {
            Ok(value) => value,
            Err(err) => {
                let _ = transaction.rollback().await;
                return Err(err);
            }
        };

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::PROGRESS)
            .document_id(user_id)
            .object(&progress)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add progress to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(value)
    }

    /// Seed a course entry after purchase verification (idempotent).
    pub async fn seed_course_progress(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<(), AppError> {
        self.mutate_progress(user_id, |progress| {
            progress.ensure_course(course_id);
            Ok(())
        })
        .await
    }

    /// Add a note with set semantics. Returns true when the note was added.
    pub async fn add_note(
        &self,
        user_id: &str,
        course_id: &str,
        lecture_id: &str,
        note: &str,
    ) -> Result<bool, AppError> {
        self.mutate_progress(user_id, |progress| {
            Ok(progress.add_note(course_id, lecture_id, note))
        })
        .await
    }

    /// Idempotently set a lecture's checkbox.
    pub async fn set_lecture_mark(
        &self,
        user_id: &str,
        course_id: &str,
        lecture_id: &str,
        marked: bool,
    ) -> Result<(), AppError> {
        self.mutate_progress(user_id, |progress| {
            progress.set_mark(course_id, lecture_id, marked);
            Ok(())
        })
        .await
    }

    /// Delete a note by index; NotFound when the index or lecture is absent.
    pub async fn delete_note(
        &self,
        user_id: &str,
        course_id: &str,
        lecture_id: &str,
        index: usize,
    ) -> Result<(), AppError> {
        self.mutate_progress(user_id, |progress| {
            progress
                .delete_note(course_id, lecture_id, index)
                .map_err(|e| match e {
                    ProgressError::NoteNotFound => {
                        AppError::NotFound("no note found on this note index".to_string())
                    }
                })
        })
        .await
    }
}
