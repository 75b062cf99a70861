//! The client state machine.
//!
//! [`DeliveryController`] owns the auth and delivery state and performs the
//! I/O behind each operation: pending is recorded before the call, the
//! outcome after it. Any `Unauthorized` answer drops the session and raises
//! [`DeliveryController::requires_login`].

use tracing::{info, instrument, warn};

use waymark_core::{ApiFailure, AuthResponse, Delivery, LoginRequest, PublicUser, RegisterRequest};

use crate::api::DeliveryApi;
use crate::geocode::Geocoder;
use crate::session::{Session, SessionStore, SessionStoreError};
use crate::state::{AuthState, DeliveryState};
use crate::workflow::{DeliveryForm, DeliveryWorkflow, WorkflowPhase};

const NOT_LOGGED_IN: &str = "Not logged in";

pub struct DeliveryController<A, G> {
    api: A,
    geocoder: G,
    sessions: SessionStore,
    auth: AuthState,
    deliveries: DeliveryState,
    requires_login: bool,
}

impl<A: DeliveryApi, G: Geocoder> DeliveryController<A, G> {
    /// Build a controller, restoring any persisted session.
    ///
    /// # Errors
    ///
    /// Returns `SessionStoreError` if the session file exists but cannot be
    /// read or parsed.
    pub async fn start(
        api: A,
        geocoder: G,
        sessions: SessionStore,
    ) -> Result<Self, SessionStoreError> {
        let session = sessions.load().await?;
        Ok(Self {
            api,
            geocoder,
            sessions,
            auth: AuthState::with_session(session),
            deliveries: DeliveryState::default(),
            requires_login: false,
        })
    }

    #[must_use]
    pub const fn auth(&self) -> &AuthState {
        &self.auth
    }

    #[must_use]
    pub const fn deliveries(&self) -> &DeliveryState {
        &self.deliveries
    }

    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.auth.session()
    }

    /// Set once the server has rejected the session; cleared by the next
    /// successful register/login.
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        self.requires_login
    }

    /// Create an account and sign in as it.
    ///
    /// # Errors
    ///
    /// Returns the server's failure verbatim.
    pub async fn register(&mut self, request: RegisterRequest) -> Result<Session, ApiFailure> {
        self.auth.pending();
        let result = self.api.register(&request).await;
        self.finish_auth(result).await
    }

    /// Sign in with existing credentials.
    ///
    /// # Errors
    ///
    /// Returns the server's failure verbatim.
    pub async fn login(&mut self, request: LoginRequest) -> Result<Session, ApiFailure> {
        self.auth.pending();
        let result = self.api.login(&request).await;
        self.finish_auth(result).await
    }

    async fn finish_auth(
        &mut self,
        result: Result<AuthResponse, ApiFailure>,
    ) -> Result<Session, ApiFailure> {
        match result {
            Ok(response) => {
                let session = Session::from(response);
                if self.session().map(|s| s.user.id) != Some(session.user.id) {
                    self.deliveries.clear();
                }
                if let Err(e) = self.sessions.save(&session).await {
                    warn!(error = %e, "Failed to persist session");
                }
                info!(user_id = %session.user.id, "Signed in");
                self.auth.fulfilled(session.clone());
                self.requires_login = false;
                Ok(session)
            }
            Err(failure) => {
                self.auth.rejected(&failure);
                self.forget_session().await;
                Err(failure)
            }
        }
    }

    /// Sign out: forget the session in memory and on disk.
    ///
    /// # Errors
    ///
    /// Returns `SessionStoreError` if the session file cannot be removed.
    pub async fn logout(&mut self) -> Result<(), SessionStoreError> {
        self.auth.logged_out();
        self.auth.reset();
        self.deliveries.clear();
        self.sessions.clear().await
    }

    /// Ask the server who the current token belongs to.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` when signed out or when the token is rejected.
    pub async fn whoami(&mut self) -> Result<PublicUser, ApiFailure> {
        let session = self.require_session()?;
        match self.api.me(&session).await {
            Ok(user) => Ok(user),
            Err(failure) => {
                self.on_failure(&failure).await;
                Err(failure)
            }
        }
    }

    /// Fetch the signed-in user's deliveries, replacing the held list.
    ///
    /// # Errors
    ///
    /// Returns the server's failure verbatim; the held list is kept.
    #[instrument(skip(self))]
    pub async fn load_deliveries(&mut self) -> Result<&[Delivery], ApiFailure> {
        let session = match self.require_session() {
            Ok(session) => session,
            Err(failure) => {
                self.deliveries.list_rejected(&failure);
                return Err(failure);
            }
        };

        self.deliveries.list_pending();
        match self.api.get_deliveries(&session).await {
            Ok(deliveries) => {
                self.deliveries.list_fulfilled(deliveries);
                Ok(self.deliveries.deliveries())
            }
            Err(failure) => {
                self.deliveries.list_rejected(&failure);
                self.on_failure(&failure).await;
                Err(failure)
            }
        }
    }

    /// Run one creation workflow for `form`.
    ///
    /// An incomplete form returns `CollectingInput` and touches nothing.
    /// On `Created` the record is appended and the form cleared; on `Failed`
    /// the form is kept for another attempt.
    #[instrument(skip_all)]
    pub async fn create_delivery(&mut self, form: &mut DeliveryForm) -> WorkflowPhase {
        if !form.is_complete() {
            return WorkflowPhase::CollectingInput;
        }

        let session = match self.require_session() {
            Ok(session) => session,
            Err(failure) => {
                self.deliveries.create_rejected(&failure);
                return WorkflowPhase::Failed(failure);
            }
        };

        self.deliveries.create_pending();
        let mut workflow = DeliveryWorkflow::new();
        workflow
            .run(form, &self.geocoder, &self.api, &session)
            .await;

        let phase = workflow.into_phase();
        match &phase {
            WorkflowPhase::Created(delivery) => {
                self.deliveries.create_fulfilled(delivery.clone());
                form.clear();
            }
            WorkflowPhase::Failed(failure) => {
                self.deliveries.create_rejected(failure);
                self.on_failure(failure).await;
            }
            _ => {}
        }
        phase
    }

    /// Clear every operation's flags and messages. Held data is kept.
    pub fn reset(&mut self) {
        self.auth.reset();
        self.deliveries.reset();
    }

    fn require_session(&mut self) -> Result<Session, ApiFailure> {
        if let Some(session) = self.session() {
            return Ok(session.clone());
        }
        self.requires_login = true;
        Err(ApiFailure::unauthorized(NOT_LOGGED_IN))
    }

    async fn on_failure(&mut self, failure: &ApiFailure) {
        if failure.is_unauthorized() {
            warn!("Session rejected by server, login required");
            self.requires_login = true;
            self.auth.logged_out();
            self.forget_session().await;
        }
    }

    async fn forget_session(&self) {
        if let Err(e) = self.sessions.clear().await {
            warn!(error = %e, "Failed to remove session file");
        }
    }
}
