// End-to-end companion flows against a wiremock Fleet API.

mod common;

use common::{CHARGE_BODY, CLIMATE_BODY, OK_COMMAND, drain, fresh_session, titles, vehicle};
use sonic::display::{DisplayMessage, DisplaySink, StatusKey};
use sonic::fleet::FleetClient;
use sonic::persistence::{KeyValueStore, MemoryStore};
use sonic::session::{ACCESS_TOKEN_KEY, SETTINGS_KEY, SessionContext};
use sonic::settings::DistanceUnit;
use sonic::{Companion, CompanionEvent, Dispatcher};
use std::sync::Arc;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    server: MockServer,
    store: MemoryStore,
    companion: Companion,
    display_rx: mpsc::UnboundedReceiver<DisplayMessage>,
    events_tx: mpsc::UnboundedSender<CompanionEvent>,
}

async fn harness(store: MemoryStore) -> Harness {
    let server = MockServer::start().await;
    let client = FleetClient::with_client(reqwest::Client::new(), &server.uri(), &server.uri());
    let (display, display_rx) = DisplaySink::channel();
    let dispatcher = Dispatcher::new(
        Arc::new(client),
        SessionContext::load(Box::new(store.clone())),
        display.clone(),
        chrono::Duration::minutes(5),
    );
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    Harness {
        server,
        store,
        companion: Companion::new(dispatcher, display, events_rx),
        display_rx,
        events_tx,
    }
}

fn signed_in_store(with_vehicle: bool) -> MemoryStore {
    let store = MemoryStore::new();
    common::context(&store, fresh_session(), with_vehicle.then(vehicle));
    store
}

async fn mount_state(server: &MockServer, kind: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/api/1/vehicles/1001/data_request/{}", kind)))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn ready_without_token_prompts_for_sign_in() {
    let mut h = harness(MemoryStore::new()).await;

    let report = h.companion.handle_event(CompanionEvent::Ready).await;

    assert!(report.is_none());
    assert_eq!(titles(&drain(&mut h.display_rx)), vec!["Sonic".to_string()]);
    assert!(h.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn ready_resolves_vehicle_then_fetches_quietly() {
    let mut h = harness(signed_in_store(false)).await;
    Mock::given(method("GET"))
        .and(path("/api/1/vehicles"))
        .respond_with(ResponseTemplate::new(200).set_body_string(common::ONE_VEHICLE))
        .expect(1)
        .mount(&h.server)
        .await;
    mount_state(&h.server, "climate_state", CLIMATE_BODY).await;
    mount_state(&h.server, "charge_state", CHARGE_BODY).await;

    let report = h
        .companion
        .handle_event(CompanionEvent::Ready)
        .await
        .unwrap();

    assert!(report.is_ok());
    let msgs = drain(&mut h.display_rx);
    // Only the vehicle notice pops up; the fetches update status strings
    assert_eq!(titles(&msgs), vec!["Vehicle Found".to_string()]);
    assert!(msgs.contains(&DisplayMessage::Status {
        key: StatusKey::InteriorTemp,
        value: "21/11".into()
    }));
    assert!(msgs.iter().any(|m| matches!(
        m,
        DisplayMessage::Status { key: StatusKey::BatteryPerc, value } if value.starts_with("64% ")
    )));

    let paths: Vec<String> = h
        .server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect();
    assert_eq!(
        paths,
        vec![
            "/api/1/vehicles",
            "/api/1/vehicles/1001/data_request/climate_state",
            "/api/1/vehicles/1001/data_request/charge_state",
        ]
    );
}

#[tokio::test]
async fn start_charging_menu_opens_port_then_starts() {
    let mut h = harness(signed_in_store(true)).await;
    for name in ["charge_port_door_open", "charge_start"] {
        Mock::given(method("POST"))
            .and(path(format!("/api/1/vehicles/1001/command/{}", name)))
            .respond_with(ResponseTemplate::new(200).set_body_string(OK_COMMAND))
            .expect(1)
            .mount(&h.server)
            .await;
    }

    let report = h
        .companion
        .handle_event(CompanionEvent::MenuSelected(10))
        .await
        .unwrap();

    assert!(report.is_ok());
    let requests = h.server.received_requests().await.unwrap();
    assert!(requests[0].url.path().ends_with("charge_port_door_open"));
    assert!(requests[1].url.path().ends_with("charge_start"));
    let msgs = drain(&mut h.display_rx);
    assert_eq!(
        msgs[0],
        DisplayMessage::Notification {
            title: "Charge port".into(),
            body: "Success!".into()
        }
    );
}

#[tokio::test]
async fn climate_menu_shows_summary() {
    let mut h = harness(signed_in_store(true)).await;
    mount_state(&h.server, "climate_state", CLIMATE_BODY).await;

    h.companion
        .handle_event(CompanionEvent::MenuSelected(1))
        .await
        .unwrap();

    let msgs = drain(&mut h.display_rx);
    assert_eq!(
        msgs[0],
        DisplayMessage::Notification {
            title: "Climate".into(),
            body: "AC: ON\nInside: 21\u{00B0}C\nOutside: 11\u{00B0}C".into()
        }
    );
}

#[tokio::test]
async fn reconnect_looks_the_vehicle_up_again() {
    let mut h = harness(signed_in_store(true)).await;
    Mock::given(method("GET"))
        .and(path("/api/1/vehicles"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"response":[{"id_s":"1001","display_name":"Roadrunner"},{"id_s":"2002","display_name":"Coyote"}]}"#,
        ))
        .expect(1)
        .mount(&h.server)
        .await;
    mount_state(&h.server, "climate_state", CLIMATE_BODY).await;
    mount_state(&h.server, "charge_state", CHARGE_BODY).await;

    let report = h
        .companion
        .handle_event(CompanionEvent::MenuSelected(23))
        .await
        .unwrap();

    assert!(report.is_ok());
    let msgs = drain(&mut h.display_rx);
    assert_eq!(
        titles(&msgs),
        vec!["Reconnect", "Vehicles", "Climate", "Battery"]
    );
    assert!(msgs.contains(&DisplayMessage::Notification {
        title: "Vehicles".into(),
        body: "Found 2 vehicles. Using: Roadrunner".into()
    }));
}

#[tokio::test]
async fn configuration_with_tokens_replaces_session() {
    let mut h = harness(MemoryStore::new()).await;
    Mock::given(method("GET"))
        .and(path("/api/1/vehicles"))
        .respond_with(ResponseTemplate::new(200).set_body_string(common::ONE_VEHICLE))
        .mount(&h.server)
        .await;
    mount_state(&h.server, "climate_state", CLIMATE_BODY).await;
    mount_state(&h.server, "charge_state", CHARGE_BODY).await;

    // {"unitOfDistance":"mi","access_token":"fresh","refresh_token":"r","expires_at":4102444800}
    let payload = "%7B%22unitOfDistance%22%3A%22mi%22%2C%22access_token%22%3A%22fresh%22%2C\
                   %22refresh_token%22%3A%22r%22%2C%22expires_at%22%3A4102444800%7D";
    let report = h
        .companion
        .handle_event(CompanionEvent::ConfigurationClosed(payload.into()))
        .await
        .unwrap();

    assert!(report.is_ok());
    assert_eq!(h.store.get(ACCESS_TOKEN_KEY).as_deref(), Some("fresh"));
    let blob = h.store.get(SETTINGS_KEY).unwrap();
    assert!(blob.contains("unitOfDistance"));
    assert!(!blob.contains("fresh"));
    assert_eq!(
        h.companion.dispatcher().settings().distance_unit,
        DistanceUnit::Miles
    );

    let msgs = drain(&mut h.display_rx);
    assert_eq!(titles(&msgs), vec!["Settings Saved", "Vehicle Found"]);
    assert!(msgs.iter().any(|m| matches!(
        m,
        DisplayMessage::Status { key: StatusKey::BatteryPerc, value } if value.ends_with("mi Charging")
    )));
}

#[tokio::test]
async fn configuration_without_tokens_only_saves_units() {
    let mut h = harness(signed_in_store(true)).await;

    let report = h
        .companion
        .handle_event(CompanionEvent::ConfigurationClosed(
            r#"{"unitOfTemperature":"F"}"#.into(),
        ))
        .await;

    assert!(report.is_none());
    assert_eq!(titles(&drain(&mut h.display_rx)), vec!["Settings Saved"]);
    assert!(h.server.received_requests().await.unwrap().is_empty());
    assert_eq!(h.store.get(ACCESS_TOKEN_KEY).as_deref(), Some("access-1"));
}

#[tokio::test]
async fn malformed_configuration_is_ignored() {
    let mut h = harness(MemoryStore::new()).await;

    let report = h
        .companion
        .handle_event(CompanionEvent::ConfigurationClosed("%7Bbroken".into()))
        .await;

    assert!(report.is_none());
    assert!(drain(&mut h.display_rx).is_empty());
    assert!(h.store.get(SETTINGS_KEY).is_none());
}

#[tokio::test]
async fn run_stops_on_shutdown() {
    let mut h = harness(MemoryStore::new()).await;
    h.events_tx.send(CompanionEvent::MenuSelected(26)).unwrap();
    h.events_tx.send(CompanionEvent::Shutdown).unwrap();
    h.events_tx.send(CompanionEvent::MenuSelected(26)).unwrap();

    h.companion.run().await.unwrap();

    // The event after Shutdown is never handled
    assert_eq!(titles(&drain(&mut h.display_rx)), vec!["About Sonic"]);
}

#[tokio::test]
async fn named_actions_run_in_order_and_skip_unknown_ones() {
    let mut h = harness(signed_in_store(true)).await;
    mount_state(&h.server, "climate_state", CLIMATE_BODY).await;
    mount_state(&h.server, "charge_state", CHARGE_BODY).await;

    let event = sonic::companion::parse_command_line("run getClimateState warpDrive getChargeState")
        .unwrap();
    let report = h.companion.handle_event(event).await.unwrap();

    assert!(report.is_ok());
    assert_eq!(report.completed, vec![sonic::Intent::FetchClimate, sonic::Intent::FetchCharge]);
    assert_eq!(report.skipped, vec![sonic::Intent::Unsupported("warpDrive".into())]);
    assert_eq!(titles(&drain(&mut h.display_rx)), vec!["Climate", "Battery"]);
}
