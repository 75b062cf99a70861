//! Delivery creation and listing end to end: client form, geocoding, server,
//! store, and back.

use chrono::{TimeDelta, Utc};
use waymark_client::{WorkflowPhase, map};
use waymark_core::ErrorKind;
use waymark_integration_tests::{
    FakeGeocoder, TestClient, TestServer, alice_form, registration,
};
use waymark_server::db::Store;

#[tokio::test]
async fn create_then_list_round_trips_coordinates() {
    let server = TestServer::spawn().await;
    let geocoder = FakeGeocoder::spawn().await;
    let client = TestClient::new(&server, &geocoder);

    let mut ctl = client.controller().await;
    let session = ctl.register(registration("alice")).await.expect("register");

    let mut form = alice_form();
    let phase = ctl.create_delivery(&mut form).await;
    let WorkflowPhase::Created(created) = phase else {
        panic!("expected created, got {phase:?}");
    };
    assert_eq!(created.user_id, session.user.id);
    assert_eq!(created.customer_name, "Alice");
    assert_eq!(created.delivery_date.to_string(), "2024-01-01");
    assert_eq!(created.warehouse_address_lat.to_string(), "51.5237629");
    assert_eq!(created.warehouse_address_lng.to_string(), "-0.1584743");
    assert_eq!(created.delivery_address_lat.to_string(), "51.5033635");
    assert_eq!(created.delivery_address_lng.to_string(), "-0.1276248");
    assert_eq!(geocoder.lookups(), 2);
    assert!(form.customer_name.is_empty());

    // Listing from a fresh process sees exactly the stored record.
    let mut other = client.controller().await;
    let listed = other.load_deliveries().await.expect("list").to_vec();
    assert_eq!(listed, vec![created.clone()]);

    let [warehouse, destination] = map::markers(&listed[0]);
    assert!(warehouse.osm_url().contains("mlat=51.5237629"));
    assert!(destination.osm_url().contains("#map=13/51.5033635/-0.1276248"));
}

#[tokio::test]
async fn users_only_see_their_own_deliveries() {
    let server = TestServer::spawn().await;
    let geocoder = FakeGeocoder::spawn().await;

    let alice = TestClient::new(&server, &geocoder);
    let mut alice_ctl = alice.controller().await;
    alice_ctl.register(registration("alice")).await.expect("register");

    let bob = TestClient::new(&server, &geocoder);
    let mut bob_ctl = bob.controller().await;
    bob_ctl.register(registration("bob")).await.expect("register");

    assert!(matches!(
        alice_ctl.create_delivery(&mut alice_form()).await,
        WorkflowPhase::Created(_)
    ));
    let mut bobs = alice_form();
    bobs.customer_name = "Bob's customer".to_owned();
    assert!(matches!(
        bob_ctl.create_delivery(&mut bobs).await,
        WorkflowPhase::Created(_)
    ));

    let alice_list = alice_ctl.load_deliveries().await.expect("list").to_vec();
    assert_eq!(alice_list.len(), 1);
    assert_eq!(alice_list[0].customer_name, "Alice");

    let bob_list = bob_ctl.load_deliveries().await.expect("list").to_vec();
    assert_eq!(bob_list.len(), 1);
    assert_eq!(bob_list[0].customer_name, "Bob's customer");
}

#[tokio::test]
async fn geocoding_miss_persists_nothing() {
    let server = TestServer::spawn().await;
    let geocoder = FakeGeocoder::spawn().await;
    let client = TestClient::new(&server, &geocoder);

    let mut ctl = client.controller().await;
    let session = ctl.register(registration("alice")).await.expect("register");

    let mut form = alice_form();
    form.delivery_address = "1 Nowhere Lane, Atlantis".to_owned();
    let phase = ctl.create_delivery(&mut form).await;

    assert!(matches!(
        phase,
        WorkflowPhase::Failed(ref f) if f.kind == ErrorKind::GeocodingFailed
    ));
    assert_eq!(form.delivery_address, "1 Nowhere Lane, Atlantis");
    assert!(ctl.deliveries().create().is_error());
    assert!(!ctl.requires_login());

    let stored = server
        .store
        .deliveries_for(session.user.id)
        .await
        .expect("store");
    assert!(stored.is_empty());
}

#[tokio::test]
async fn incomplete_form_never_leaves_the_client() {
    let server = TestServer::spawn().await;
    let geocoder = FakeGeocoder::spawn().await;
    let client = TestClient::new(&server, &geocoder);

    let mut ctl = client.controller().await;
    ctl.register(registration("alice")).await.expect("register");

    let mut form = alice_form();
    form.warehouse_address.clear();
    let phase = ctl.create_delivery(&mut form).await;

    assert_eq!(phase, WorkflowPhase::CollectingInput);
    assert_eq!(geocoder.lookups(), 0);
}

#[tokio::test]
async fn expired_token_requires_login_and_clears_session() {
    let server = TestServer::spawn().await;
    let geocoder = FakeGeocoder::spawn().await;
    let client = TestClient::new(&server, &geocoder);

    let mut ctl = client.controller().await;
    let mut session = ctl.register(registration("alice")).await.expect("register");
    assert!(matches!(
        ctl.create_delivery(&mut alice_form()).await,
        WorkflowPhase::Created(_)
    ));

    // Swap the saved token for one that expired yesterday.
    session.token = server
        .state
        .tokens()
        .issue_at(session.user.id, Utc::now() - TimeDelta::days(31))
        .expect("issue");
    client.sessions().save(&session).await.expect("save");

    let mut ctl = client.controller().await;
    let failure = ctl.load_deliveries().await.expect_err("expired");

    assert_eq!(failure.kind, ErrorKind::Unauthorized);
    assert_eq!(failure.message, "Request is not authorized");
    assert!(ctl.requires_login());
    assert!(ctl.session().is_none());
    assert!(ctl.deliveries().deliveries().is_empty());
    assert!(client.sessions().load().await.expect("load").is_none());
}
