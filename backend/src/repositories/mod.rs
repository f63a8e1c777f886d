//! Database repositories
//!
//! The ledger talks to storage through the three port traits below.
//! `PgStore` implements them over PostgreSQL using the unit-struct
//! repositories in the submodules; `MemoryStore` implements them in
//! process for tests and local development.

pub mod meals;
pub mod measurement;
pub mod memory;
pub mod user;

use crate::error::LedgerError;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use fitness_tracker_shared::{
    CurrentMeasurement, DailyValue, Gender, IdentityUpdate, MealEntry, NewMealEntry, NewUser,
    NewWeightEntry, User, WeightHistoryEntry,
};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

pub use meals::MealRepository;
pub use measurement::MeasurementRepository;
pub use memory::MemoryStore;
pub use user::UserRepository;

// ============================================================================
// Planning contract
// ============================================================================

/// The next state of a user's current measurement, decided by the ledger
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedMeasurement {
    pub latest_weight_kg: f64,
    pub starting_weight_kg: f64,
    pub weight_change_kg: f64,
    pub height_cm: Option<f64>,
    pub gender: Gender,
    pub activity_factor: f64,
    pub daily_calorie_target: Option<i32>,
    pub last_updated: NaiveDate,
    /// History row to append in the same transaction
    pub history: Option<NewWeightEntry>,
}

/// What a committed measurement write left behind
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedMeasurement {
    pub measurement: CurrentMeasurement,
    pub entry: Option<WeightHistoryEntry>,
}

/// Decides the next measurement from the locked user and the current row.
///
/// Called exactly once per commit, while the store holds the per-user lock.
/// Returning an error aborts the commit without writing anything.
pub type MeasurementPlanner = dyn Fn(&User, Option<&CurrentMeasurement>) -> Result<PlannedMeasurement, LedgerError>
    + Send
    + Sync;

// ============================================================================
// Ports
// ============================================================================

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;

    /// Apply the non-`None` fields; returns `None` for an unknown user
    async fn update_identity(&self, id: Uuid, update: IdentityUpdate) -> Result<Option<User>>;
}

#[async_trait]
pub trait MeasurementStore: Send + Sync {
    async fn current_measurement(&self, user_id: Uuid) -> Result<Option<CurrentMeasurement>>;

    /// Atomically read-plan-write the user's current measurement.
    ///
    /// Writers for the same user are serialized. The upsert and the optional
    /// history append either both persist or neither does.
    async fn commit_measurement(
        &self,
        user_id: Uuid,
        planner: &MeasurementPlanner,
    ) -> Result<CommittedMeasurement, LedgerError>;

    /// Most recent entries first
    async fn weight_history(&self, user_id: Uuid, limit: i64) -> Result<Vec<WeightHistoryEntry>>;
}

#[async_trait]
pub trait MealStore: Send + Sync {
    async fn insert_meal(&self, meal: NewMealEntry) -> Result<MealEntry>;

    /// Meals eaten on `date`, in insertion order
    async fn meals_on(&self, user_id: Uuid, date: NaiveDate) -> Result<Vec<MealEntry>>;

    /// Per-day calorie sums, newest day first
    async fn calorie_history(&self, user_id: Uuid, limit: i64) -> Result<Vec<DailyValue>>;
}

#[async_trait]
pub trait LedgerStore: UserStore + MeasurementStore + MealStore {
    async fn health_check(&self) -> Result<()>;
}

// ============================================================================
// PostgreSQL adapter
// ============================================================================

/// Production store backed by a connection pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        UserRepository::create(&self.pool, user).await
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        UserRepository::find_by_id(&self.pool, id).await
    }

    async fn update_identity(&self, id: Uuid, update: IdentityUpdate) -> Result<Option<User>> {
        UserRepository::update_identity(&self.pool, id, update).await
    }
}

#[async_trait]
impl MeasurementStore for PgStore {
    async fn current_measurement(&self, user_id: Uuid) -> Result<Option<CurrentMeasurement>> {
        MeasurementRepository::get_current(&self.pool, user_id).await
    }

    async fn commit_measurement(
        &self,
        user_id: Uuid,
        planner: &MeasurementPlanner,
    ) -> Result<CommittedMeasurement, LedgerError> {
        MeasurementRepository::commit(&self.pool, user_id, planner).await
    }

    async fn weight_history(&self, user_id: Uuid, limit: i64) -> Result<Vec<WeightHistoryEntry>> {
        MeasurementRepository::recent_history(&self.pool, user_id, limit).await
    }
}

#[async_trait]
impl MealStore for PgStore {
    async fn insert_meal(&self, meal: NewMealEntry) -> Result<MealEntry> {
        MealRepository::create(&self.pool, meal).await
    }

    async fn meals_on(&self, user_id: Uuid, date: NaiveDate) -> Result<Vec<MealEntry>> {
        MealRepository::get_by_date(&self.pool, user_id, date).await
    }

    async fn calorie_history(&self, user_id: Uuid, limit: i64) -> Result<Vec<DailyValue>> {
        MealRepository::daily_totals(&self.pool, user_id, limit).await
    }
}

#[async_trait]
impl LedgerStore for PgStore {
    async fn health_check(&self) -> Result<()> {
        crate::db::health_check(&self.pool).await
    }
}

// ============================================================================
// NUMERIC helpers
// ============================================================================

/// Bind helper: kg/cm/kcal values are stored with two decimals
pub(crate) fn to_decimal(value: f64) -> Result<Decimal> {
    Decimal::from_f64(value)
        .map(|d| d.round_dp(2))
        .ok_or_else(|| anyhow!("{} cannot be stored as NUMERIC", value))
}

pub(crate) fn to_decimal_dp(value: f64, dp: u32) -> Result<Decimal> {
    Decimal::from_f64(value)
        .map(|d| d.round_dp(dp))
        .ok_or_else(|| anyhow!("{} cannot be stored as NUMERIC", value))
}

pub(crate) fn decimal_to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}
