//! Meal entry repository for database operations

use super::{decimal_to_f64, to_decimal};
use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use fitness_tracker_shared::{DailyValue, Macros, MealEntry, NewMealEntry};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

/// Meal entry record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MealRecord {
    pub id: i64,
    pub user_id: Uuid,
    pub eaten_on: NaiveDate,
    pub food_name: String,
    pub calories: Decimal,
    pub protein_g: Option<Decimal>,
    pub carbs_g: Option<Decimal>,
    pub fat_g: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl From<MealRecord> for MealEntry {
    fn from(r: MealRecord) -> Self {
        let macros = match (r.protein_g, r.carbs_g, r.fat_g) {
            (None, None, None) => None,
            (p, c, f) => Some(Macros {
                protein_g: p.map(decimal_to_f64).unwrap_or_default(),
                carbs_g: c.map(decimal_to_f64).unwrap_or_default(),
                fat_g: f.map(decimal_to_f64).unwrap_or_default(),
            }),
        };

        MealEntry {
            id: r.id,
            user_id: r.user_id,
            eaten_on: r.eaten_on,
            food_name: r.food_name,
            calories: decimal_to_f64(r.calories),
            macros,
            recorded_at: r.created_at,
        }
    }
}

/// Per-day aggregate row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DailyTotalRecord {
    pub day: NaiveDate,
    pub total: Decimal,
}

/// Meal repository for database operations
pub struct MealRepository;

impl MealRepository {
    /// Append a meal entry
    pub async fn create(pool: &PgPool, input: NewMealEntry) -> Result<MealEntry> {
        let macros = input.macros;
        let record = sqlx::query_as::<_, MealRecord>(
            r#"
            INSERT INTO meal_entries (user_id, eaten_on, food_name, calories, protein_g, carbs_g, fat_g)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, eaten_on, food_name, calories, protein_g, carbs_g, fat_g, created_at
            "#,
        )
        .bind(input.user_id)
        .bind(input.eaten_on)
        .bind(&input.food_name)
        .bind(to_decimal(input.calories)?)
        .bind(macros.map(|m| to_decimal(m.protein_g)).transpose()?)
        .bind(macros.map(|m| to_decimal(m.carbs_g)).transpose()?)
        .bind(macros.map(|m| to_decimal(m.fat_g)).transpose()?)
        .fetch_one(pool)
        .await?;

        Ok(record.into())
    }

    /// Get meals eaten on a given date
    pub async fn get_by_date(pool: &PgPool, user_id: Uuid, date: NaiveDate) -> Result<Vec<MealEntry>> {
        let records = sqlx::query_as::<_, MealRecord>(
            r#"
            SELECT id, user_id, eaten_on, food_name, calories, protein_g, carbs_g, fat_g, created_at
            FROM meal_entries
            WHERE user_id = $1 AND eaten_on = $2
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_all(pool)
        .await?;

        Ok(records.into_iter().map(Into::into).collect())
    }

    /// Calories per day for the most recent days with meals
    pub async fn daily_totals(pool: &PgPool, user_id: Uuid, limit: i64) -> Result<Vec<DailyValue>> {
        let records = sqlx::query_as::<_, DailyTotalRecord>(
            r#"
            SELECT eaten_on AS day, SUM(calories) AS total
            FROM meal_entries
            WHERE user_id = $1
            GROUP BY eaten_on
            ORDER BY eaten_on DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(records
            .into_iter()
            .map(|r| DailyValue {
                date: r.day,
                value: decimal_to_f64(r.total),
            })
            .collect())
    }
}
