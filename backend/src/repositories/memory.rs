//! In-process store
//!
//! Implements every port over plain collections behind one async mutex.
//! Holding that mutex across a whole commit gives the same per-user
//! serialization the PostgreSQL row lock does. Used by the test suites and
//! by local runs without a database.

use super::{
    CommittedMeasurement, LedgerStore, MealStore, MeasurementPlanner, MeasurementStore, UserStore,
};
use crate::error::LedgerError;
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use fitness_tracker_shared::{
    round_2dp, CurrentMeasurement, DailyValue, IdentityUpdate, MealEntry, NewMealEntry, NewUser,
    User, WeightHistoryEntry,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    measurements: HashMap<Uuid, CurrentMeasurement>,
    weight_history: Vec<WeightHistoryEntry>,
    meals: Vec<MealEntry>,
    next_weight_id: i64,
    next_meal_id: i64,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_next_commit: AtomicBool,
    unhealthy: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `commit_measurement` fail after planning, before
    /// anything is written
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Make `health_check` report failure
    pub fn set_unhealthy(&self, unhealthy: bool) {
        self.unhealthy.store(unhealthy, Ordering::SeqCst);
    }

    /// Number of history rows stored for a user
    pub async fn history_len(&self, user_id: Uuid) -> usize {
        let tables = self.tables.lock().await;
        tables
            .weight_history
            .iter()
            .filter(|e| e.user_id == user_id)
            .count()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, input: NewUser) -> Result<User> {
        let mut tables = self.tables.lock().await;
        if tables.users.values().any(|u| u.email == input.email) {
            bail!("duplicate email: {}", input.email);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: input.email,
            name: input.name,
            phone: None,
            address: None,
            birthday: input.birthday,
            fitness_goal: None,
            image_url: None,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn update_identity(&self, id: Uuid, update: IdentityUpdate) -> Result<Option<User>> {
        let mut tables = self.tables.lock().await;
        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(name) = update.name {
            user.name = Some(name);
        }
        if let Some(phone) = update.phone {
            user.phone = Some(phone);
        }
        if let Some(address) = update.address {
            user.address = Some(address);
        }
        if let Some(birthday) = update.birthday {
            user.birthday = Some(birthday);
        }
        if let Some(goal) = update.fitness_goal {
            user.fitness_goal = Some(goal);
        }
        if let Some(url) = update.image_url {
            user.image_url = Some(url);
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl MeasurementStore for MemoryStore {
    async fn current_measurement(&self, user_id: Uuid) -> Result<Option<CurrentMeasurement>> {
        Ok(self.tables.lock().await.measurements.get(&user_id).cloned())
    }

    async fn commit_measurement(
        &self,
        user_id: Uuid,
        planner: &MeasurementPlanner,
    ) -> Result<CommittedMeasurement, LedgerError> {
        let mut tables = self.tables.lock().await;

        let user = tables
            .users
            .get(&user_id)
            .cloned()
            .ok_or(LedgerError::UserNotFound(user_id))?;
        let existing = tables.measurements.get(&user_id).cloned();

        let plan = planner(&user, existing.as_ref())?;

        let measurement = CurrentMeasurement {
            user_id,
            latest_weight_kg: round_2dp(plan.latest_weight_kg),
            starting_weight_kg: existing
                .as_ref()
                .map(|m| m.starting_weight_kg)
                .unwrap_or_else(|| round_2dp(plan.starting_weight_kg)),
            weight_change_kg: round_2dp(plan.weight_change_kg),
            height_cm: plan.height_cm.map(round_2dp),
            gender: plan.gender,
            activity_factor: plan.activity_factor,
            daily_calorie_target: plan.daily_calorie_target,
            last_updated: plan.last_updated,
        };
        let entry = plan.history.map(|new_entry| WeightHistoryEntry {
            id: tables.next_weight_id + 1,
            user_id,
            measured_on: new_entry.measured_on,
            weight_kg: round_2dp(new_entry.weight_kg),
            recorded_at: Utc::now(),
        });

        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(LedgerError::Persistence(anyhow!(
                "simulated storage failure during commit"
            )));
        }

        tables.measurements.insert(user_id, measurement.clone());
        if let Some(entry) = &entry {
            tables.next_weight_id = entry.id;
            tables.weight_history.push(entry.clone());
        }

        Ok(CommittedMeasurement { measurement, entry })
    }

    async fn weight_history(&self, user_id: Uuid, limit: i64) -> Result<Vec<WeightHistoryEntry>> {
        let tables = self.tables.lock().await;
        let mut entries: Vec<_> = tables
            .weight_history
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| (b.measured_on, b.id).cmp(&(a.measured_on, a.id)));
        entries.truncate(limit.max(0) as usize);
        Ok(entries)
    }
}

#[async_trait]
impl MealStore for MemoryStore {
    async fn insert_meal(&self, input: NewMealEntry) -> Result<MealEntry> {
        let mut tables = self.tables.lock().await;
        if !tables.users.contains_key(&input.user_id) {
            bail!("meal references unknown user {}", input.user_id);
        }

        tables.next_meal_id += 1;
        let meal = MealEntry {
            id: tables.next_meal_id,
            user_id: input.user_id,
            eaten_on: input.eaten_on,
            food_name: input.food_name,
            calories: round_2dp(input.calories),
            macros: input.macros,
            recorded_at: Utc::now(),
        };
        tables.meals.push(meal.clone());
        Ok(meal)
    }

    async fn meals_on(&self, user_id: Uuid, date: NaiveDate) -> Result<Vec<MealEntry>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .meals
            .iter()
            .filter(|m| m.user_id == user_id && m.eaten_on == date)
            .cloned()
            .collect())
    }

    async fn calorie_history(&self, user_id: Uuid, limit: i64) -> Result<Vec<DailyValue>> {
        let tables = self.tables.lock().await;
        let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for meal in tables.meals.iter().filter(|m| m.user_id == user_id) {
            *totals.entry(meal.eaten_on).or_default() += meal.calories;
        }

        Ok(totals
            .into_iter()
            .rev()
            .take(limit.max(0) as usize)
            .map(|(date, value)| DailyValue {
                date,
                value: round_2dp(value),
            })
            .collect())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn health_check(&self) -> Result<()> {
        if self.unhealthy.load(Ordering::SeqCst) {
            bail!("memory store marked unhealthy");
        }
        Ok(())
    }
}
