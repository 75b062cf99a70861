//! Subcommand implementations.

pub mod account;
pub mod deliveries;
pub mod migrate;

use std::error::Error;

use waymark_client::{
    ClientConfig, DeliveryController, HttpApi, NominatimGeocoder, SessionStore,
};

pub type Controller = DeliveryController<HttpApi, NominatimGeocoder>;

/// Build the client state machine from the environment, restoring any saved
/// session.
pub async fn controller() -> Result<Controller, Box<dyn Error>> {
    let config = ClientConfig::from_env()?;
    let api = HttpApi::new(&config)?;
    let geocoder = NominatimGeocoder::new(&config)?;
    let sessions = SessionStore::new(&config.session_file);

    Ok(DeliveryController::start(api, geocoder, sessions).await?)
}

/// Point the user at `wm login` after the server rejected the session.
pub fn login_hint(ctl: &Controller) {
    if ctl.requires_login() {
        tracing::warn!("Session is no longer valid; run `wm login` to sign in again");
    }
}
