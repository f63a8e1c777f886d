//! Profile and measurement update service
//!
//! Turns a loosely-shaped profile request into a validated command in one
//! pass, then writes the measurement half through the ledger and the
//! identity half to the user record. The two writes are independent: a
//! failed identity write after a committed measurement is repaired by
//! retrying the same request, which lands on the same measurement state.

use crate::clock::Clock;
use crate::error::LedgerError;
use crate::repositories::{LedgerStore, MeasurementStore, UserStore};
use crate::services::ledger::{MeasurementLedger, MeasurementUpdate};
use chrono::NaiveDate;
use fitness_tracker_shared::validation::{
    validate_activity_factor, validate_date_of_birth, validate_height_cm, validate_image_url,
    validate_name, validate_phone, validate_weight,
};
use fitness_tracker_shared::{
    compute_age, round_2dp, Gender, IdentityUpdate, ProfileSnapshot, ProfileUpdateRequest,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Measurement fields of a profile update, validated and in SI units
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementFields {
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub gender: Option<Gender>,
    pub activity_factor: Option<f64>,
}

/// A fully validated profile update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileCommand {
    pub identity: IdentityUpdate,
    /// `None` when the request carries no measurement field at all
    pub measurement: Option<MeasurementFields>,
}

fn invalid(field: &'static str) -> impl Fn(String) -> LedgerError {
    move |msg| LedgerError::invalid_measurement(field, msg)
}

/// Blank strings count as "not supplied"
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ProfileCommand {
    /// Validate every supplied field, converting units on the way
    pub fn parse(req: ProfileUpdateRequest, today: NaiveDate) -> Result<Self, LedgerError> {
        let name = non_blank(req.name)
            .map(|n| validate_name(&n))
            .transpose()
            .map_err(invalid("name"))?;

        let phone = non_blank(req.phone);
        if let Some(p) = &phone {
            validate_phone(p).map_err(invalid("phone"))?;
        }

        let image_url = non_blank(req.image_url);
        if let Some(url) = &image_url {
            validate_image_url(url).map_err(invalid("image_url"))?;
        }

        if let Some(dob) = req.birthday {
            validate_date_of_birth(dob, today).map_err(invalid("birthday"))?;
        }

        let weight_kg = req
            .weight
            .map(|w| {
                let kg = round_2dp(req.unit.to_kg(w));
                validate_weight(kg).map(|_| kg)
            })
            .transpose()
            .map_err(invalid("weight"))?;

        let height_cm = req
            .height
            .map(|h| {
                let cm = round_2dp(req.height_unit.to_cm(h));
                validate_height_cm(cm).map(|_| cm)
            })
            .transpose()
            .map_err(invalid("height"))?;

        let gender = req
            .gender
            .as_deref()
            .map(str::parse::<Gender>)
            .transpose()
            .map_err(invalid("gender"))?;

        let activity_factor = req.activity_level.map(|a| a.factor());
        if let Some(f) = activity_factor {
            validate_activity_factor(f).map_err(invalid("activity_level"))?;
        }

        let measurement = MeasurementFields {
            weight_kg,
            height_cm,
            gender,
            activity_factor,
        };
        let has_measurement = measurement != MeasurementFields::default();

        Ok(Self {
            identity: IdentityUpdate {
                name,
                phone,
                address: non_blank(req.address),
                birthday: req.birthday,
                fitness_goal: non_blank(req.fitness_goal),
                image_url,
            },
            measurement: has_measurement.then_some(measurement),
        })
    }
}

pub struct ProfileService {
    store: Arc<dyn LedgerStore>,
    ledger: Arc<MeasurementLedger>,
    clock: Arc<dyn Clock>,
}

impl ProfileService {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        ledger: Arc<MeasurementLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            ledger,
            clock,
        }
    }

    /// Get identity, age and current measurement
    pub async fn get_profile(&self, user_id: Uuid) -> Result<ProfileSnapshot, LedgerError> {
        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or(LedgerError::UserNotFound(user_id))?;
        let measurement = self.store.current_measurement(user_id).await?;
        let today = self.clock.today();

        Ok(ProfileSnapshot {
            age: user.birthday.map(|b| compute_age(b, today)),
            user,
            measurement,
        })
    }

    /// Validate, write the measurement, then the identity fields
    pub async fn update_profile_and_measurement(
        &self,
        user_id: Uuid,
        req: ProfileUpdateRequest,
    ) -> Result<ProfileSnapshot, LedgerError> {
        let today = self.clock.today();
        let command = ProfileCommand::parse(req, today)?;

        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or(LedgerError::UserNotFound(user_id))?;

        // A new birthday changes the age, so an existing target is recomputed
        let fields = match (&command.measurement, command.identity.birthday) {
            (Some(fields), _) => Some(fields.clone()),
            (None, Some(_)) if self.store.current_measurement(user_id).await?.is_some() => {
                Some(MeasurementFields::default())
            }
            (None, _) => None,
        };

        let measurement = match fields {
            Some(fields) => {
                let update = MeasurementUpdate {
                    weight_kg: fields.weight_kg,
                    height_cm: fields.height_cm,
                    gender: fields.gender,
                    activity_factor: fields.activity_factor,
                    birthday: command.identity.birthday,
                    measured_on: today,
                };
                Some(self.ledger.record_measurement(user_id, update).await?.measurement)
            }
            None => self.store.current_measurement(user_id).await?,
        };

        let user = if command.identity.is_empty() {
            user
        } else {
            self.store
                .update_identity(user_id, command.identity)
                .await?
                .ok_or(LedgerError::UserNotFound(user_id))?
        };

        info!(
            user_id = %user_id,
            measured = command.measurement.is_some(),
            "Profile updated"
        );

        Ok(ProfileSnapshot {
            age: user.birthday.map(|b| compute_age(b, today)),
            user,
            measurement,
        })
    }
}
