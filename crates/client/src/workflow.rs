//! One delivery creation, from form input to a stored record.
//!
//! ```text
//! collecting_input -> validating -> resolving_coordinates -> submitting -> created
//!                          |                 |                    |
//!                          +-----------------+--------------------+-----> failed
//! ```
//!
//! Incomplete input is not an error: the workflow stays in
//! `collecting_input` and nothing is sent anywhere. Both addresses are
//! resolved concurrently and both results must be in hand before the payload
//! is built; a miss on either fails the whole creation.

use chrono::NaiveDate;
use tracing::{debug, instrument};

use waymark_core::{ApiFailure, Coordinates, Delivery, NewDelivery};

use crate::api::DeliveryApi;
use crate::geocode::{GeocodeError, GeocodeOutcome, Geocoder};
use crate::session::Session;

/// The four fields a user fills in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryForm {
    pub customer_name: String,
    pub warehouse_address: String,
    /// `YYYY-MM-DD`
    pub delivery_date: String,
    pub delivery_address: String,
}

impl DeliveryForm {
    /// Whether every field is non-blank.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        [
            &self.customer_name,
            &self.warehouse_address,
            &self.delivery_date,
            &self.delivery_address,
        ]
        .iter()
        .all(|field| !field.trim().is_empty())
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Phase of one creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowPhase {
    CollectingInput,
    Validating,
    ResolvingCoordinates,
    Submitting,
    Created(Delivery),
    Failed(ApiFailure),
}

impl WorkflowPhase {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CollectingInput => "collecting_input",
            Self::Validating => "validating",
            Self::ResolvingCoordinates => "resolving_coordinates",
            Self::Submitting => "submitting",
            Self::Created(_) => "created",
            Self::Failed(_) => "failed",
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Created(_) | Self::Failed(_))
    }
}

/// Drives a single creation through its phases.
#[derive(Debug)]
pub struct DeliveryWorkflow {
    phase: WorkflowPhase,
    trail: Vec<&'static str>,
}

impl Default for DeliveryWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl DeliveryWorkflow {
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: WorkflowPhase::CollectingInput,
            trail: vec![WorkflowPhase::CollectingInput.name()],
        }
    }

    #[must_use]
    pub const fn phase(&self) -> &WorkflowPhase {
        &self.phase
    }

    /// Names of every phase entered so far, in order.
    #[must_use]
    pub fn trail(&self) -> &[&'static str] {
        &self.trail
    }

    /// Consume the workflow, returning its final phase.
    #[must_use]
    pub fn into_phase(self) -> WorkflowPhase {
        self.phase
    }

    fn enter(&mut self, phase: WorkflowPhase) {
        debug!(from = self.phase.name(), to = phase.name(), "Workflow transition");
        self.trail.push(phase.name());
        self.phase = phase;
    }

    fn fail(&mut self, failure: ApiFailure) {
        self.enter(WorkflowPhase::Failed(failure));
    }

    /// Run the form through to a terminal phase, or leave it collecting
    /// input if incomplete.
    #[instrument(skip_all, fields(user_id = %session.user.id))]
    pub async fn run<G, A>(
        &mut self,
        form: &DeliveryForm,
        geocoder: &G,
        api: &A,
        session: &Session,
    ) -> &WorkflowPhase
    where
        G: Geocoder + ?Sized,
        A: DeliveryApi + ?Sized,
    {
        if self.phase != WorkflowPhase::CollectingInput || !form.is_complete() {
            return &self.phase;
        }

        self.enter(WorkflowPhase::Validating);
        let delivery_date =
            match NaiveDate::parse_from_str(form.delivery_date.trim(), "%Y-%m-%d") {
                Ok(date) => date,
                Err(_) => {
                    self.fail(ApiFailure::validation(
                        "Delivery date must be a YYYY-MM-DD date",
                    ));
                    return &self.phase;
                }
            };

        self.enter(WorkflowPhase::ResolvingCoordinates);
        let (warehouse, destination) = tokio::join!(
            geocoder.resolve(&form.warehouse_address),
            geocoder.resolve(&form.delivery_address),
        );
        let pair = resolved("warehouse", &form.warehouse_address, warehouse).and_then(|w| {
            resolved("delivery", &form.delivery_address, destination).map(|d| (w, d))
        });
        let (warehouse, destination) = match pair {
            Ok(pair) => pair,
            Err(failure) => {
                self.fail(failure);
                return &self.phase;
            }
        };

        self.enter(WorkflowPhase::Submitting);
        let payload = NewDelivery::new(
            form.customer_name.trim(),
            delivery_date,
            warehouse,
            destination,
        );
        match api.create_delivery(session, &payload).await {
            Ok(delivery) => self.enter(WorkflowPhase::Created(delivery)),
            Err(failure) => self.fail(failure),
        }

        &self.phase
    }
}

/// Turn one lookup result into coordinates or a `GeocodingFailed` failure.
fn resolved(
    which: &str,
    address: &str,
    result: Result<GeocodeOutcome, GeocodeError>,
) -> Result<Coordinates, ApiFailure> {
    match result {
        Ok(GeocodeOutcome::Found(coordinates)) => Ok(coordinates),
        Ok(GeocodeOutcome::NoMatch) => Err(ApiFailure::geocoding(format!(
            "No location found for {which} address '{}'",
            address.trim()
        ))),
        Err(e) => Err(ApiFailure::geocoding(format!(
            "Could not resolve {which} address: {e}"
        ))),
    }
}
