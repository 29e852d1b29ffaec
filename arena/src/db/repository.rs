//! Repository trait definitions for testability and dependency injection.
//!
//! Events are stored as whole aggregates. Every update is a compare-and-swap
//! on the event's `revision`, so two writers that loaded the same revision
//! cannot both succeed.

use async_trait::async_trait;
use sqlx::{PgPool, Row, types::Json};
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::errors::{StoreError, StoreResult};
use super::timeouts::{LONG_OPERATION_TIMEOUT, with_default_timeout, with_timeout};
use crate::event::{Event, EventId};

/// Trait for event storage operations
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Store a new event
    async fn create(&self, event: &Event) -> StoreResult<()>;

    /// Find event by ID
    async fn get(&self, id: EventId) -> StoreResult<Option<Event>>;

    /// All events, newest first
    async fn list(&self) -> StoreResult<Vec<Event>>;

    /// Persist `event` if the stored revision still equals `event.revision`.
    ///
    /// Returns the new revision. A mismatch fails with
    /// [`StoreError::Conflict`] and leaves the stored event untouched.
    async fn update(&self, event: &Event) -> StoreResult<i64>;

    /// Remove an event, returning whether it existed
    async fn delete(&self, id: EventId) -> StoreResult<bool>;

    /// Check that the store is reachable
    async fn health_check(&self) -> StoreResult<()>;
}

/// PostgreSQL implementation of `EventRepository`
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn create(&self, event: &Event) -> StoreResult<()> {
        let result = with_default_timeout(
            sqlx::query(
                "INSERT INTO events (id, name, status, starts_at, data, revision, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)
                 ON CONFLICT (id) DO NOTHING",
            )
            .bind(event.id)
            .bind(&event.name)
            .bind(event.status.to_string())
            .bind(event.starts_at)
            .bind(Json(event))
            .bind(event.revision)
            .bind(event.created_at)
            .execute(&self.pool),
        )
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AlreadyExists(event.id));
        }
        Ok(())
    }

    async fn get(&self, id: EventId) -> StoreResult<Option<Event>> {
        let row = with_default_timeout(
            sqlx::query("SELECT data, revision FROM events WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await?;

        row.map(|r| -> StoreResult<Event> {
            let Json(mut event): Json<Event> = r.try_get("data")?;
            event.revision = r.try_get("revision")?;
            Ok(event)
        })
        .transpose()
    }

    async fn list(&self) -> StoreResult<Vec<Event>> {
        let rows = with_timeout(
            LONG_OPERATION_TIMEOUT,
            sqlx::query("SELECT data, revision FROM events ORDER BY created_at DESC")
                .fetch_all(&self.pool),
        )
        .await?;

        rows.into_iter()
            .map(|r| -> StoreResult<Event> {
                let Json(mut event): Json<Event> = r.try_get("data")?;
                event.revision = r.try_get("revision")?;
                Ok(event)
            })
            .collect()
    }

    async fn update(&self, event: &Event) -> StoreResult<i64> {
        let next = event.revision + 1;
        let mut stored = event.clone();
        stored.revision = next;

        let result = with_default_timeout(
            sqlx::query(
                "UPDATE events
                 SET name = $1, status = $2, starts_at = $3, data = $4,
                     revision = $5, updated_at = NOW()
                 WHERE id = $6 AND revision = $7",
            )
            .bind(&stored.name)
            .bind(stored.status.to_string())
            .bind(stored.starts_at)
            .bind(Json(&stored))
            .bind(next)
            .bind(event.id)
            .bind(event.revision)
            .execute(&self.pool),
        )
        .await?;

        if result.rows_affected() == 0 {
            let exists = with_default_timeout(
                sqlx::query("SELECT 1 FROM events WHERE id = $1")
                    .bind(event.id)
                    .fetch_optional(&self.pool),
            )
            .await?;

            return Err(match exists {
                Some(_) => StoreError::Conflict {
                    id: event.id,
                    expected: event.revision,
                },
                None => StoreError::NotFound(event.id),
            });
        }

        Ok(next)
    }

    async fn delete(&self, id: EventId) -> StoreResult<bool> {
        let result = with_default_timeout(
            sqlx::query("DELETE FROM events WHERE id = $1")
                .bind(id)
                .execute(&self.pool),
        )
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> StoreResult<()> {
        with_default_timeout(sqlx::query("SELECT 1").execute(&self.pool)).await?;
        Ok(())
    }
}

/// Event store kept in process memory
#[derive(Default)]
pub struct InMemoryEventRepository {
    events: RwLock<HashMap<EventId, Event>>,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn create(&self, event: &Event) -> StoreResult<()> {
        let mut events = self.events.write().await;
        if events.contains_key(&event.id) {
            return Err(StoreError::AlreadyExists(event.id));
        }
        events.insert(event.id, event.clone());
        Ok(())
    }

    async fn get(&self, id: EventId) -> StoreResult<Option<Event>> {
        Ok(self.events.read().await.get(&id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Event>> {
        let mut events: Vec<Event> = self.events.read().await.values().cloned().collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(events)
    }

    async fn update(&self, event: &Event) -> StoreResult<i64> {
        let mut events = self.events.write().await;
        let stored = events
            .get_mut(&event.id)
            .ok_or(StoreError::NotFound(event.id))?;

        if stored.revision != event.revision {
            return Err(StoreError::Conflict {
                id: event.id,
                expected: event.revision,
            });
        }

        *stored = event.clone();
        stored.revision += 1;
        Ok(stored.revision)
    }

    async fn delete(&self, id: EventId) -> StoreResult<bool> {
        Ok(self.events.write().await.remove(&id).is_some())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}
