//! PostgreSQL store

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use super::{StoreError, StoreResult, SwapStore, UserStore};
use crate::models::{
    DirectoryFilter, NewSwap, NewUser, ProfileUpdate, Swap, SwapDirection, SwapStatus, User,
};

const USER_COLUMNS: &str = "id, full_name, email, password_hash, profile_pic, location, bio, \
     skills_offered, skills_wanted, availability, is_public, created_at, updated_at";

const SWAP_COLUMNS: &str = "id, requester_id, recipient_id, requester_skill, recipient_skill, \
     status, message, scheduled_date, created_at, updated_at";

/// Postgres error code for unique constraint violations
const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL-backed store
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect and initialise the schema
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(url)
            .await?;

        let store = Self { pool };
        store.initialize_schema().await?;
        Ok(store)
    }

    async fn initialize_schema(&self) -> StoreResult<()> {
        let statements = [
            r#"
            DO $$ BEGIN
                CREATE TYPE availability AS ENUM ('weekdays', 'weekends', 'anytime', 'not available');
            EXCEPTION WHEN duplicate_object THEN NULL;
            END $$;
            "#,
            r#"
            DO $$ BEGIN
                CREATE TYPE swap_status AS ENUM ('pending', 'accepted', 'rejected', 'completed');
            EXCEPTION WHEN duplicate_object THEN NULL;
            END $$;
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id UUID PRIMARY KEY,
                full_name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                profile_pic TEXT,
                location TEXT,
                bio TEXT NOT NULL DEFAULT '',
                skills_offered TEXT[] NOT NULL DEFAULT '{}',
                skills_wanted TEXT[] NOT NULL DEFAULT '{}',
                availability availability NOT NULL DEFAULT 'not available',
                is_public BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS swaps (
                id UUID PRIMARY KEY,
                requester_id UUID NOT NULL REFERENCES users(id),
                recipient_id UUID NOT NULL REFERENCES users(id),
                requester_skill TEXT NOT NULL,
                recipient_skill TEXT NOT NULL,
                status swap_status NOT NULL DEFAULT 'pending',
                message VARCHAR(500),
                scheduled_date TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                CHECK (requester_id <> recipient_id)
            );
            "#,
            r#"CREATE INDEX IF NOT EXISTS swaps_requester_status ON swaps(requester_id, status);"#,
            r#"CREATE INDEX IF NOT EXISTS swaps_recipient_status ON swaps(recipient_id, status);"#,
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS swaps_one_pending_per_pair
                ON swaps(requester_id, recipient_id) WHERE status = 'pending';
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS feedback (
                id UUID PRIMARY KEY,
                swap_id UUID NOT NULL REFERENCES swaps(id) ON DELETE CASCADE,
                reviewer_id UUID NOT NULL REFERENCES users(id),
                reviewee_id UUID NOT NULL REFERENCES users(id),
                rating SMALLINT NOT NULL CHECK (rating BETWEEN 1 AND 5),
                comment VARCHAR(500),
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                UNIQUE (swap_id, reviewer_id)
            );
            "#,
        ];

        for statement in statements {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        tracing::info!("Database schema ready");
        Ok(())
    }

    async fn current_status(&self, id: Uuid) -> StoreResult<Option<SwapStatus>> {
        let status = sqlx::query_scalar::<_, SwapStatus>("SELECT status FROM swaps WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(status)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION))
}

/// Build an ILIKE pattern that matches `needle` literally anywhere.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let query = format!(
            "INSERT INTO users (id, full_name, email, password_hash) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(Uuid::new_v4())
            .bind(&user.full_name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Conflict(format!("email {} already registered", user.email))
                } else {
                    e.into()
                }
            })
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)");
        let users = sqlx::query_as::<_, User>(&query)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn list_public_users(&self, filter: &DirectoryFilter) -> StoreResult<Vec<User>> {
        let query = format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE is_public
              AND ($1::UUID IS NULL OR id <> $1)
              AND ($2::TEXT IS NULL OR full_name ILIKE $2)
              AND ($3::TEXT IS NULL OR EXISTS (
                    SELECT 1 FROM unnest(skills_offered) AS skill WHERE skill ILIKE $3))
              AND ($4::TEXT IS NULL OR location ILIKE $4)
            ORDER BY created_at DESC
            "#
        );
        let users = sqlx::query_as::<_, User>(&query)
            .bind(filter.exclude)
            .bind(filter.search.as_deref().map(like_pattern))
            .bind(filter.skill.as_deref().map(like_pattern))
            .bind(filter.location.as_deref().map(like_pattern))
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> StoreResult<Option<User>> {
        let query = format!(
            r#"
            UPDATE users SET
                bio = COALESCE($2, bio),
                location = CASE WHEN $3 THEN $4 ELSE location END,
                profile_pic = CASE WHEN $5 THEN $6 ELSE profile_pic END,
                skills_offered = COALESCE($7, skills_offered),
                skills_wanted = COALESCE($8, skills_wanted),
                availability = COALESCE($9, availability),
                is_public = COALESCE($10, is_public),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(update.bio)
            .bind(update.location.is_some())
            .bind(update.location.flatten())
            .bind(update.profile_pic.is_some())
            .bind(update.profile_pic.flatten())
            .bind(update.skills_offered)
            .bind(update.skills_wanted)
            .bind(update.availability)
            .bind(update.is_public)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}

#[async_trait]
impl SwapStore for PostgresStore {
    async fn insert_swap(&self, swap: NewSwap) -> StoreResult<Swap> {
        let query = format!(
            "INSERT INTO swaps (id, requester_id, recipient_id, requester_skill, recipient_skill, message) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {SWAP_COLUMNS}"
        );
        sqlx::query_as::<_, Swap>(&query)
            .bind(Uuid::new_v4())
            .bind(swap.requester_id)
            .bind(swap.recipient_id)
            .bind(&swap.requester_skill)
            .bind(&swap.recipient_skill)
            .bind(&swap.message)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Conflict(format!(
                        "pending swap from {} to {} already exists",
                        swap.requester_id, swap.recipient_id
                    ))
                } else {
                    e.into()
                }
            })
    }

    async fn find_swap(&self, id: Uuid) -> StoreResult<Option<Swap>> {
        let query = format!("SELECT {SWAP_COLUMNS} FROM swaps WHERE id = $1");
        let swap = sqlx::query_as::<_, Swap>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(swap)
    }

    async fn list_swaps(&self, user_id: Uuid, direction: SwapDirection) -> StoreResult<Vec<Swap>> {
        let condition = match direction {
            SwapDirection::Sent => "requester_id = $1",
            SwapDirection::Received => "recipient_id = $1",
            SwapDirection::All => "(requester_id = $1 OR recipient_id = $1)",
        };
        let query =
            format!("SELECT {SWAP_COLUMNS} FROM swaps WHERE {condition} ORDER BY created_at DESC");
        let swaps = sqlx::query_as::<_, Swap>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(swaps)
    }

    async fn transition_status(
        &self,
        id: Uuid,
        expected_from: SwapStatus,
        to: SwapStatus,
    ) -> StoreResult<Swap> {
        let query = format!(
            "UPDATE swaps SET status = $1, updated_at = NOW() \
             WHERE id = $2 AND status = $3 RETURNING {SWAP_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Swap>(&query)
            .bind(to)
            .bind(id)
            .bind(expected_from)
            .fetch_optional(&self.pool)
            .await?;

        match updated {
            Some(swap) => Ok(swap),
            None => match self.current_status(id).await? {
                Some(found) => Err(StoreError::StatusMismatch {
                    expected: expected_from,
                    found,
                }),
                None => Err(StoreError::NotFound(format!("swap {id} not found"))),
            },
        }
    }

    async fn delete_pending_swap(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM swaps WHERE id = $1 AND status = $2")
            .bind(id)
            .bind(SwapStatus::Pending)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return match self.current_status(id).await? {
                Some(found) => Err(StoreError::StatusMismatch {
                    expected: SwapStatus::Pending,
                    found,
                }),
                None => Err(StoreError::NotFound(format!("swap {id} not found"))),
            };
        }

        Ok(())
    }
}
