//! Client-side state for async operations.
//!
//! Each operation kind gets an [`AsyncOperationState`] that moves
//! `idle -> pending -> fulfilled | rejected`. The slices here only record
//! outcomes; the controller performs the I/O.

use waymark_core::{ApiFailure, Delivery, ErrorKind};

use crate::session::Session;

/// Where an operation is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OperationStatus {
    #[default]
    Idle,
    Pending,
    Fulfilled,
    Rejected,
}

/// Status and last error of one kind of operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AsyncOperationState {
    status: OperationStatus,
    error_kind: Option<ErrorKind>,
    error_message: String,
}

impl AsyncOperationState {
    #[must_use]
    pub const fn status(&self) -> OperationStatus {
        self.status
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.status == OperationStatus::Pending
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == OperationStatus::Fulfilled
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status == OperationStatus::Rejected
    }

    /// Message of the last rejection, verbatim. Empty unless rejected.
    #[must_use]
    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    /// Kind of the last rejection.
    #[must_use]
    pub const fn error_kind(&self) -> Option<ErrorKind> {
        self.error_kind
    }

    pub fn start(&mut self) {
        self.status = OperationStatus::Pending;
    }

    pub fn fulfil(&mut self) {
        self.status = OperationStatus::Fulfilled;
        self.error_kind = None;
        self.error_message.clear();
    }

    pub fn reject(&mut self, failure: &ApiFailure) {
        self.status = OperationStatus::Rejected;
        self.error_kind = Some(failure.kind);
        self.error_message.clone_from(&failure.message);
    }

    /// Back to idle, forgetting flags and message.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// The locally held deliveries plus the state of `create` and `list`.
#[derive(Debug, Clone, Default)]
pub struct DeliveryState {
    deliveries: Vec<Delivery>,
    create: AsyncOperationState,
    list: AsyncOperationState,
}

impl DeliveryState {
    #[must_use]
    pub fn deliveries(&self) -> &[Delivery] {
        &self.deliveries
    }

    #[must_use]
    pub const fn create(&self) -> &AsyncOperationState {
        &self.create
    }

    #[must_use]
    pub const fn list(&self) -> &AsyncOperationState {
        &self.list
    }

    pub fn create_pending(&mut self) {
        self.create.start();
    }

    /// Append the new record without re-fetching.
    pub fn create_fulfilled(&mut self, delivery: Delivery) {
        self.deliveries.push(delivery);
        self.create.fulfil();
    }

    pub fn create_rejected(&mut self, failure: &ApiFailure) {
        self.create.reject(failure);
    }

    pub fn list_pending(&mut self) {
        self.list.start();
    }

    /// Replace the held list wholesale.
    pub fn list_fulfilled(&mut self, deliveries: Vec<Delivery>) {
        self.deliveries = deliveries;
        self.list.fulfil();
    }

    pub fn list_rejected(&mut self, failure: &ApiFailure) {
        self.list.reject(failure);
    }

    /// Clear both operations' flags and messages. The held list is kept.
    pub fn reset(&mut self) {
        self.create.reset();
        self.list.reset();
    }

    /// Drop everything, e.g. when the signed-in user changes.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// The current session plus the state of register/login.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    session: Option<Session>,
    operation: AsyncOperationState,
}

impl AuthState {
    /// Start from a restored session, if any.
    #[must_use]
    pub fn with_session(session: Option<Session>) -> Self {
        Self {
            session,
            operation: AsyncOperationState::default(),
        }
    }

    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    #[must_use]
    pub const fn operation(&self) -> &AsyncOperationState {
        &self.operation
    }

    pub fn pending(&mut self) {
        self.operation.start();
    }

    pub fn fulfilled(&mut self, session: Session) {
        self.session = Some(session);
        self.operation.fulfil();
    }

    /// A failed register/login leaves nobody signed in.
    pub fn rejected(&mut self, failure: &ApiFailure) {
        self.session = None;
        self.operation.reject(failure);
    }

    pub fn logged_out(&mut self) {
        self.session = None;
    }

    pub fn reset(&mut self) {
        self.operation.reset();
    }
}
