//! User repository for database operations

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use fitness_tracker_shared::{IdentityUpdate, NewUser, User};
use sqlx::PgPool;
use uuid::Uuid;

/// User record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub fitness_goal: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRecord> for User {
    fn from(r: UserRecord) -> Self {
        User {
            id: r.id,
            email: r.email,
            name: r.name,
            phone: r.phone,
            address: r.address,
            birthday: r.birthday,
            fitness_goal: r.fitness_goal,
            image_url: r.image_url,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

pub(crate) const USER_COLUMNS: &str =
    "id, email, name, phone, address, birthday, fitness_goal, image_url, created_at, updated_at";

/// User repository for database operations
pub struct UserRepository;

impl UserRepository {
    /// Create a new user
    pub async fn create(pool: &PgPool, input: NewUser) -> Result<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            INSERT INTO users (email, name, birthday)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&input.email)
        .bind(&input.name)
        .bind(input.birthday)
        .fetch_one(pool)
        .await?;

        Ok(record.into())
    }

    /// Find user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(record.map(User::from))
    }

    /// Partially update identity fields
    pub async fn update_identity(
        pool: &PgPool,
        id: Uuid,
        updates: IdentityUpdate,
    ) -> Result<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                address = COALESCE($4, address),
                birthday = COALESCE($5, birthday),
                fitness_goal = COALESCE($6, fitness_goal),
                image_url = COALESCE($7, image_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(updates.name)
        .bind(updates.phone)
        .bind(updates.address)
        .bind(updates.birthday)
        .bind(updates.fitness_goal)
        .bind(updates.image_url)
        .fetch_optional(pool)
        .await?;

        Ok(record.map(User::from))
    }
}
