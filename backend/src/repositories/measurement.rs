//! Current measurement and weight history repository
//!
//! `commit` is the only writer of `current_measurements` and
//! `weight_history`. It locks the user's row in `users` for the length of
//! the transaction, so two writers for the same user queue behind each
//! other, including the very first insert when no measurement row exists
//! yet to lock.

use super::user::{UserRecord, USER_COLUMNS};
use super::{decimal_to_f64, to_decimal, to_decimal_dp, CommittedMeasurement, MeasurementPlanner};
use crate::error::LedgerError;
use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, Utc};
use fitness_tracker_shared::{CurrentMeasurement, Gender, User, WeightHistoryEntry};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

/// Current measurement record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MeasurementRecord {
    pub user_id: Uuid,
    pub latest_weight_kg: Decimal,
    pub starting_weight_kg: Decimal,
    pub weight_change_kg: Decimal,
    pub height_cm: Option<Decimal>,
    pub gender: String,
    pub activity_factor: Decimal,
    pub daily_calorie_target: Option<i32>,
    pub last_updated: NaiveDate,
}

impl TryFrom<MeasurementRecord> for CurrentMeasurement {
    type Error = anyhow::Error;

    fn try_from(r: MeasurementRecord) -> Result<Self> {
        let gender = r.gender.parse::<Gender>().map_err(|e| anyhow!(e))?;
        Ok(CurrentMeasurement {
            user_id: r.user_id,
            latest_weight_kg: decimal_to_f64(r.latest_weight_kg),
            starting_weight_kg: decimal_to_f64(r.starting_weight_kg),
            weight_change_kg: decimal_to_f64(r.weight_change_kg),
            height_cm: r.height_cm.map(decimal_to_f64),
            gender,
            activity_factor: decimal_to_f64(r.activity_factor),
            daily_calorie_target: r.daily_calorie_target,
            last_updated: r.last_updated,
        })
    }
}

/// Weight history record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WeightHistoryRecord {
    pub id: i64,
    pub user_id: Uuid,
    pub measured_on: NaiveDate,
    pub weight_kg: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<WeightHistoryRecord> for WeightHistoryEntry {
    fn from(r: WeightHistoryRecord) -> Self {
        WeightHistoryEntry {
            id: r.id,
            user_id: r.user_id,
            measured_on: r.measured_on,
            weight_kg: decimal_to_f64(r.weight_kg),
            recorded_at: r.created_at,
        }
    }
}

const MEASUREMENT_COLUMNS: &str = "user_id, latest_weight_kg, starting_weight_kg, weight_change_kg, \
     height_cm, gender, activity_factor, daily_calorie_target, last_updated";

/// Measurement repository for database operations
pub struct MeasurementRepository;

impl MeasurementRepository {
    /// Get the current measurement for a user
    pub async fn get_current(pool: &PgPool, user_id: Uuid) -> Result<Option<CurrentMeasurement>> {
        let record = sqlx::query_as::<_, MeasurementRecord>(&format!(
            "SELECT {MEASUREMENT_COLUMNS} FROM current_measurements WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        record.map(CurrentMeasurement::try_from).transpose()
    }

    /// Get the most recent weight entries, newest first
    pub async fn recent_history(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<WeightHistoryEntry>> {
        let records = sqlx::query_as::<_, WeightHistoryRecord>(
            r#"
            SELECT id, user_id, measured_on, weight_kg, created_at
            FROM weight_history
            WHERE user_id = $1
            ORDER BY measured_on DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(records.into_iter().map(Into::into).collect())
    }

    /// Lock, plan, upsert and append in one transaction
    ///
    /// Any error returns before `commit`, and dropping the transaction
    /// rolls it back.
    pub async fn commit(
        pool: &PgPool,
        user_id: Uuid,
        planner: &MeasurementPlanner,
    ) -> Result<CommittedMeasurement, LedgerError> {
        let mut tx = pool.begin().await?;

        let user: User = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR UPDATE"
        ))
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(LedgerError::UserNotFound(user_id))?
        .into();

        let existing = sqlx::query_as::<_, MeasurementRecord>(&format!(
            "SELECT {MEASUREMENT_COLUMNS} FROM current_measurements WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .map(CurrentMeasurement::try_from)
        .transpose()?;

        let plan = planner(&user, existing.as_ref())?;

        // starting_weight_kg is only written by the INSERT arm
        let record = sqlx::query_as::<_, MeasurementRecord>(&format!(
            r#"
            INSERT INTO current_measurements (
                user_id, latest_weight_kg, starting_weight_kg, weight_change_kg,
                height_cm, gender, activity_factor, daily_calorie_target, last_updated
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (user_id) DO UPDATE SET
                latest_weight_kg = EXCLUDED.latest_weight_kg,
                weight_change_kg = EXCLUDED.weight_change_kg,
                height_cm = EXCLUDED.height_cm,
                gender = EXCLUDED.gender,
                activity_factor = EXCLUDED.activity_factor,
                daily_calorie_target = EXCLUDED.daily_calorie_target,
                last_updated = EXCLUDED.last_updated
            RETURNING {MEASUREMENT_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(to_decimal(plan.latest_weight_kg)?)
        .bind(to_decimal(plan.starting_weight_kg)?)
        .bind(to_decimal(plan.weight_change_kg)?)
        .bind(plan.height_cm.map(to_decimal).transpose()?)
        .bind(plan.gender.as_str())
        .bind(to_decimal_dp(plan.activity_factor, 3)?)
        .bind(plan.daily_calorie_target)
        .bind(plan.last_updated)
        .fetch_one(&mut *tx)
        .await?;

        let entry = match plan.history {
            Some(new_entry) => {
                let record = sqlx::query_as::<_, WeightHistoryRecord>(
                    r#"
                    INSERT INTO weight_history (user_id, measured_on, weight_kg)
                    VALUES ($1, $2, $3)
                    RETURNING id, user_id, measured_on, weight_kg, created_at
                    "#,
                )
                .bind(user_id)
                .bind(new_entry.measured_on)
                .bind(to_decimal(new_entry.weight_kg)?)
                .fetch_one(&mut *tx)
                .await?;
                Some(WeightHistoryEntry::from(record))
            }
            None => None,
        };

        let measurement = CurrentMeasurement::try_from(record)?;
        tx.commit().await?;

        Ok(CommittedMeasurement { measurement, entry })
    }
}
