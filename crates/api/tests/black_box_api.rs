use innkeep_api::app::{build_app, AppServices};
use innkeep_infra::AppConfig;
use reqwest::StatusCode;
use serde_json::{json, Value};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over in-memory stores, bound to an ephemeral port.
        let app = build_app(AppServices::in_memory(&AppConfig::default()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn post_json(client: &reqwest::Client, url: String, body: Value) -> (StatusCode, Value) {
    let res = client.post(url).json(&body).send().await.unwrap();
    let status = res.status();
    let body = res.json::<Value>().await.unwrap_or(Value::Null);
    (status, body)
}

async fn get_json(client: &reqwest::Client, url: String) -> (StatusCode, Value) {
    let res = client.get(url).send().await.unwrap();
    let status = res.status();
    let body = res.json::<Value>().await.unwrap_or(Value::Null);
    (status, body)
}

struct Fixture {
    guest: String,
    hotel: String,
    room_type: String,
}

async fn seed(server: &TestServer, client: &reqwest::Client, inventory: i64, email: &str) -> Fixture {
    let (status, guest) = post_json(
        client,
        server.url("/guest"),
        json!({"first_name": "Ada", "last_name": "Lovelace", "email": email, "age": 36}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{guest}");

    let (status, hotel) = post_json(
        client,
        server.url("/hotel"),
        json!({"name": "Harbour View", "address": "1 Quay St", "location": "Mombasa"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{hotel}");
    let hotel = hotel["uuid"].as_str().unwrap().to_string();

    let (status, room_type) = post_json(
        client,
        server.url("/room-type"),
        json!({"hotel_uuid": hotel, "inventory": inventory}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{room_type}");

    Fixture {
        guest: guest["uuid"].as_str().unwrap().to_string(),
        hotel,
        room_type: room_type["uuid"].as_str().unwrap().to_string(),
    }
}

#[tokio::test]
async fn health_is_ok() {
    let server = TestServer::spawn().await;
    let res = reqwest::get(format!("{}/health", server.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn guest_can_be_registered_fetched_and_listed() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let fx = seed(&server, &client, 1, "ada@example.com").await;

    let (status, guest) = get_json(&client, server.url(&format!("/guest/{}", fx.guest))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(guest["email"], "ada@example.com");
    assert_eq!(guest["active"], true);

    let (status, list) = get_json(&client, server.url("/guests")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["items"].as_array().unwrap().len(), 1);

    let (status, body) = get_json(
        &client,
        server.url("/guest/00000000-0000-0000-0000-000000000000"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn reservation_lifecycle_tracks_capacity() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let fx = seed(&server, &client, 2, "life@example.com").await;

    let (status, reservation) = post_json(
        &client,
        server.url("/reservation"),
        json!({"guest_uuid": fx.guest, "hotel_uuid": fx.hotel, "roomtype_uuid": fx.room_type}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{reservation}");
    assert_eq!(reservation["status"], "RESERVED");
    assert_eq!(reservation["guest_uuid"], fx.guest.as_str());

    let (_, capacity) =
        get_json(&client, server.url(&format!("/room-type/{}/capacity", fx.room_type))).await;
    assert_eq!(capacity["reserved"], 1);
    assert_eq!(capacity["available"], 1);

    let (status, cancelled) = post_json(
        &client,
        server.url("/cancel-reservation"),
        json!({"guest_uuid": fx.guest, "roomtype_uuid": fx.room_type}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{cancelled}");
    assert_eq!(cancelled["status"], "CANCELLED");

    let (_, capacity) =
        get_json(&client, server.url(&format!("/room-type/{}/capacity", fx.room_type))).await;
    assert_eq!(capacity["reserved"], 0);

    let (status, body) = post_json(
        &client,
        server.url("/cancel-reservation"),
        json!({"guest_uuid": fx.guest, "roomtype_uuid": fx.room_type}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "already_cancelled");

    let (status, latest) = get_json(
        &client,
        server.url(&format!(
            "/reservation?guest_uuid={}&roomtype_uuid={}",
            fx.guest, fx.room_type
        )),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(latest["status"], "CANCELLED");

    let (_, list) = get_json(&client, server.url("/reservations")).await;
    assert_eq!(list["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn full_room_type_rejects_booking() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let fx = seed(&server, &client, 1, "full@example.com").await;
    let body = json!({"guest_uuid": fx.guest, "hotel_uuid": fx.hotel, "roomtype_uuid": fx.room_type});

    let (status, _) = post_json(&client, server.url("/reservation"), body.clone()).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, err) = post_json(&client, server.url("/reservation"), body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "capacity_exceeded");

    let (_, capacity) =
        get_json(&client, server.url(&format!("/room-type/{}/capacity", fx.room_type))).await;
    assert_eq!(capacity["reserved"], 1);
}

#[tokio::test]
async fn guest_cannot_hold_two_active_reservations_on_one_room_type() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let fx = seed(&server, &client, 5, "twice@example.com").await;
    let body = json!({"guest_uuid": fx.guest, "hotel_uuid": fx.hotel, "roomtype_uuid": fx.room_type});

    let (status, _) = post_json(&client, server.url("/reservation"), body.clone()).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, err) = post_json(&client, server.url("/reservation"), body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "conflict");

    let (status, cancelled) = post_json(
        &client,
        server.url("/cancel-reservation"),
        json!({"guest_uuid": fx.guest, "roomtype_uuid": fx.room_type}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{cancelled}");

    let (_, capacity) =
        get_json(&client, server.url(&format!("/room-type/{}/capacity", fx.room_type))).await;
    assert_eq!(capacity["reserved"], 0);
}

#[tokio::test]
async fn malformed_requests_are_bad_requests() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/reservation"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_request");

    let (status, body) = post_json(
        &client,
        server.url("/reservation"),
        json!({"guest_uuid": "nope", "hotel_uuid": "nope", "roomtype_uuid": "nope"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");

    let (status, body) = post_json(
        &client,
        server.url("/cancel-reservation"),
        json!({"guest_uuid": "00000000-0000-0000-0000-000000000000"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn explicit_dates_must_be_ordered() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let fx = seed(&server, &client, 3, "dates@example.com").await;

    let (status, body) = post_json(
        &client,
        server.url("/reservation"),
        json!({
            "guest_uuid": fx.guest,
            "hotel_uuid": fx.hotel,
            "roomtype_uuid": fx.room_type,
            "start_date": "2026-05-04T12:00:00Z",
            "end_date": "2026-05-01T12:00:00Z",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, reservation) = post_json(
        &client,
        server.url("/reservation"),
        json!({
            "guest_uuid": fx.guest,
            "hotel_uuid": fx.hotel,
            "roomtype_uuid": fx.room_type,
            "start_date": "2026-05-01T12:00:00Z",
            "end_date": "2026-05-04T12:00:00Z",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{reservation}");
    assert_eq!(reservation["start_date"], "2026-05-01T12:00:00Z");
}

#[tokio::test]
async fn rooms_and_rates_are_looked_up_by_pair() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let fx = seed(&server, &client, 5, "admin@example.com").await;

    let lookup = format!("?roomtype_uuid={}&hotel_uuid={}", fx.room_type, fx.hotel);
    let (status, _) = get_json(&client, server.url(&format!("/room{lookup}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, room) = post_json(
        &client,
        server.url("/room"),
        json!({"roomtype_uuid": fx.room_type, "hotel_uuid": fx.hotel, "available": true}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{room}");

    let (status, rate) = post_json(
        &client,
        server.url("/rate"),
        json!({"hotel_uuid": fx.hotel, "roomtype_uuid": fx.room_type, "rate": 12500, "date": "2026-06-01"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{rate}");

    let (status, found) = get_json(&client, server.url(&format!("/room{lookup}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["uuid"], room["uuid"]);

    let (status, found) = get_json(&client, server.url(&format!("/rate{lookup}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["rate"], 12500);

    let (_, rooms) = get_json(&client, server.url("/rooms")).await;
    assert_eq!(rooms["items"].as_array().unwrap().len(), 1);
    let (_, rates) = get_json(&client, server.url("/rates")).await;
    assert_eq!(rates["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn tombstoned_room_type_cannot_be_booked() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let fx = seed(&server, &client, 2, "gone@example.com").await;

    let res = client
        .delete(server.url(&format!("/room-type/{}", fx.room_type)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let (status, body) = post_json(
        &client,
        server.url("/reservation"),
        json!({"guest_uuid": fx.guest, "hotel_uuid": fx.hotel, "roomtype_uuid": fx.room_type}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "not_found");

    let (status, body) =
        get_json(&client, server.url(&format!("/room-type/{}/capacity", fx.room_type))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (_, list) = get_json(&client, server.url("/room-types")).await;
    assert!(list["items"].as_array().unwrap().is_empty());
}
