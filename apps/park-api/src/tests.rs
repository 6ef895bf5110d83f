//! 路由级测试：内存存储 + 手动时钟，经 `oneshot` 走完整中间件链。

use crate::{AppState, Stores, build_app};
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use domain::ManualClock;
use park_auth::JwtManager;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const T0: i64 = 1_700_000_000_000;

struct Harness {
    app: Router,
    clock: Arc<ManualClock>,
}

fn harness() -> Harness {
    let clock = Arc::new(ManualClock::new(T0));
    let jwt = JwtManager::new("test-secret".to_string(), 3600, 86_400);
    let state = AppState::new(Stores::in_memory(), jwt, clock.clone(), 120, None);
    Harness {
        app: build_app(state),
        clock,
    }
}

impl Harness {
    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn login(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/login",
                None,
                Some(json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["data"]["accessToken"].as_str().unwrap().to_string()
    }

    async fn admin(&self) -> String {
        self.login("admin", "admin123").await
    }

    async fn create_space(&self, token: &str, code: &str) -> Value {
        let (status, body) = self
            .call(
                Method::POST,
                "/parking/spaces",
                Some(token),
                Some(json!({ "spaceCode": code })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create space failed: {body}");
        body["data"].clone()
    }

    async fn create_sensor(&self, token: &str, hw_id: &str, space_id: Option<&str>) -> Value {
        let (status, body) = self
            .call(
                Method::POST,
                "/sensors",
                Some(token),
                Some(json!({ "hwId": hw_id, "spaceId": space_id })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create sensor failed: {body}");
        body["data"].clone()
    }
}

#[tokio::test]
async fn health_is_public() {
    let h = harness();
    let (status, body) = h.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let (status, _) = h.call(Method::GET, "/readyz", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let h = harness();
    let (status, body) = h
        .call(
            Method::POST,
            "/login",
            None,
            Some(json!({ "username": "admin", "password": "nope" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn refresh_token_issues_new_access_token() {
    let h = harness();
    let (_, body) = h
        .call(
            Method::POST,
            "/login",
            None,
            Some(json!({ "username": "operator", "password": "operator123" })),
        )
        .await;
    let refresh = body["data"]["refreshToken"].as_str().unwrap().to_string();

    let (status, body) = h
        .call(
            Method::POST,
            "/refresh-token",
            None,
            Some(json!({ "refreshToken": refresh })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let access = body["data"]["accessToken"].as_str().unwrap();
    let (status, _) = h
        .call(Method::GET, "/parking/spaces", Some(access), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_require_token_and_role() {
    let h = harness();
    let (status, _) = h.call(Method::GET, "/parking/spaces", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = h
        .call(Method::GET, "/parking/spaces", Some("garbage"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let operator = h.login("operator", "operator123").await;
    let (status, body) = h
        .call(
            Method::POST,
            "/parking/spaces",
            Some(&operator),
            Some(json!({ "spaceCode": "A-01" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "AUTH.FORBIDDEN");
}

#[tokio::test]
async fn routes_are_also_served_under_api_prefix() {
    let h = harness();
    let token = h.admin().await;
    let (status, body) = h
        .call(Method::GET, "/api/parking/spaces", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn space_codes_are_validated_and_unique() {
    let h = harness();
    let token = h.admin().await;
    let space = h.create_space(&token, "a-01").await;
    assert_eq!(space["spaceCode"], "A-01");
    assert_eq!(space["status"], "unknown");

    let (status, _) = h
        .call(
            Method::POST,
            "/parking/spaces",
            Some(&token),
            Some(json!({ "spaceCode": "A-01" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = h
        .call(
            Method::POST,
            "/parking/spaces",
            Some(&token),
            Some(json!({ "spaceCode": "AA-1" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // 未给编号时分配下一个空闲编号
    let (status, body) = h
        .call(Method::POST, "/parking/spaces", Some(&token), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["spaceCode"], "A-02");
}

#[tokio::test]
async fn bulk_create_skips_taken_codes() {
    let h = harness();
    let token = h.admin().await;
    h.create_space(&token, "A-02").await;

    let (status, body) = h
        .call(
            Method::POST,
            "/parking/spaces/multiple",
            Some(&token),
            Some(json!({ "count": 3 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let codes: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["spaceCode"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["A-01", "A-03", "A-04"]);

    let (status, _) = h
        .call(
            Method::POST,
            "/parking/spaces/multiple",
            Some(&token),
            Some(json!({ "count": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sensor_event_updates_assigned_space() {
    let h = harness();
    let token = h.admin().await;
    let space = h.create_space(&token, "A-01").await;
    let space_id = space["spaceId"].as_str().unwrap();
    h.create_sensor(&token, "ESP32-001", Some(space_id)).await;

    let (status, body) = h
        .call(
            Method::POST,
            "/sensors/event",
            None,
            Some(json!({ "hwId": "ESP32-001", "status": "OCCUPIED" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["outcome"], "applied");
    assert_eq!(body["data"]["space"]["status"], "occupied");
    assert_eq!(body["data"]["event"]["spaceId"], space_id);

    let (_, body) = h
        .call(
            Method::GET,
            &format!("/occupancy/history/{space_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = h
        .call(
            Method::GET,
            &format!("/parking/spaces/{space_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(body["data"]["status"], "occupied");
    assert_eq!(body["data"]["sensors"][0]["online"], true);
}

#[tokio::test]
async fn unassigned_sensor_event_is_discarded() {
    let h = harness();
    let token = h.admin().await;
    h.create_sensor(&token, "ESP32-404", None).await;

    let (status, body) = h
        .call(
            Method::POST,
            "/sensors/event",
            None,
            Some(json!({ "hwId": "ESP32-404", "status": "occupied" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["outcome"], "discarded");
    assert_eq!(body["data"]["hwId"], "ESP32-404");

    let (_, body) = h.call(Method::GET, "/occupancy", Some(&token), None).await;
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn unknown_sensor_and_space_are_not_found() {
    let h = harness();
    let token = h.admin().await;
    let (status, _) = h
        .call(
            Method::POST,
            "/sensors/event",
            None,
            Some(json!({ "hwId": "missing", "status": "free" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = h
        .call(
            Method::POST,
            "/occupancy",
            Some(&token),
            Some(json!({ "spaceId": "missing", "status": "free" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = h.call(Method::GET, "/occupancy", Some(&token), None).await;
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn invalid_status_is_stored_as_unknown() {
    let h = harness();
    let token = h.admin().await;
    let space = h.create_space(&token, "B-01").await;
    let space_id = space["spaceId"].as_str().unwrap();

    let (status, body) = h
        .call(
            Method::POST,
            "/occupancy",
            Some(&token),
            Some(json!({ "spaceId": space_id, "status": "parked" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["event"]["status"], "unknown");

    let (status, _) = h
        .call(
            Method::POST,
            "/occupancy",
            Some(&token),
            Some(json!({ "spaceId": space_id })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_active_hw_id_is_rejected() {
    let h = harness();
    let token = h.admin().await;
    let sensor = h.create_sensor(&token, "ESP32-010", None).await;
    let (status, _) = h
        .call(
            Method::POST,
            "/sensors",
            Some(&token),
            Some(json!({ "hwId": "ESP32-010" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // 停用后同一硬件 ID 可重新登记
    let sensor_id = sensor["sensorId"].as_str().unwrap();
    let (status, _) = h
        .call(
            Method::DELETE,
            &format!("/sensors/{sensor_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    h.create_sensor(&token, "ESP32-010", None).await;
}

#[tokio::test]
async fn sensor_goes_offline_after_presence_ttl() {
    let h = harness();
    let token = h.admin().await;
    let space = h.create_space(&token, "C-01").await;
    let space_id = space["spaceId"].as_str().unwrap();
    let sensor = h.create_sensor(&token, "ESP32-020", Some(space_id)).await;
    let sensor_id = sensor["sensorId"].as_str().unwrap();
    assert_eq!(sensor["online"], false);

    h.call(
        Method::POST,
        "/sensors/event",
        None,
        Some(json!({ "hwId": "ESP32-020", "status": "free" })),
    )
    .await;
    let uri = format!("/sensors/{sensor_id}");
    let (_, body) = h.call(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(body["data"]["online"], true);
    assert_eq!(body["data"]["lastSeenAtMs"], T0);

    h.clock.advance(121_000);
    let (_, body) = h.call(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(body["data"]["online"], false);
}

#[tokio::test]
async fn report_counts_intervals_ending_occupied() {
    let h = harness();
    let token = h.admin().await;
    let space = h.create_space(&token, "A-01").await;
    let space_id = space["spaceId"].as_str().unwrap().to_string();

    for (offset, status) in [(0, "free"), (10_000, "occupied"), (25_000, "free")] {
        h.clock.set(T0 + offset);
        let (status, _) = h
            .call(
                Method::POST,
                "/occupancy",
                Some(&token),
                Some(json!({ "spaceId": space_id, "status": status })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let request = json!({
        "spaceId": space_id,
        "startDate": T0,
        "endDate": T0 + 25_000,
    });
    let (status, body) = h
        .call(
            Method::POST,
            "/reports/preview",
            Some(&token),
            Some(request.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["data"]["stateChangeCount"], 2);
    assert_eq!(body["data"]["data"]["occupiedMillis"], 10_000);

    let (status, body) = h
        .call(Method::POST, "/reports", Some(&token), Some(request))
        .await;
    assert_eq!(status, StatusCode::OK);
    let report_id = body["data"]["reportId"].as_str().unwrap().to_string();

    let (status, _) = h
        .call(
            Method::DELETE,
            &format!("/reports/{report_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = h
        .call(
            Method::GET,
            &format!("/reports/{report_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn report_rejects_inverted_range() {
    let h = harness();
    let token = h.admin().await;
    let (status, _) = h
        .call(
            Method::POST,
            "/reports",
            Some(&token),
            Some(json!({ "spaceId": "s-1", "startDate": 10, "endDate": 5 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn event_correction_requires_strict_status() {
    let h = harness();
    let token = h.admin().await;
    let space = h.create_space(&token, "D-01").await;
    let space_id = space["spaceId"].as_str().unwrap();
    let (_, body) = h
        .call(
            Method::POST,
            "/occupancy",
            Some(&token),
            Some(json!({ "spaceId": space_id, "status": "occupied" })),
        )
        .await;
    let event_id = body["data"]["event"]["eventId"].as_str().unwrap().to_string();
    let uri = format!("/occupancy/event/{event_id}");

    let (status, _) = h
        .call(
            Method::PATCH,
            &uri,
            Some(&token),
            Some(json!({ "status": "parked" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = h
        .call(
            Method::PATCH,
            &uri,
            Some(&token),
            Some(json!({ "status": "FREE" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "free");

    let (status, _) = h.call(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = h.call(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_space_unassigns_sensors() {
    let h = harness();
    let token = h.admin().await;
    let space = h.create_space(&token, "E-01").await;
    let space_id = space["spaceId"].as_str().unwrap();
    let sensor = h.create_sensor(&token, "ESP32-030", Some(space_id)).await;

    let (status, _) = h
        .call(
            Method::DELETE,
            &format!("/parking/spaces/{space_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let sensor_id = sensor["sensorId"].as_str().unwrap();
    let (_, body) = h
        .call(
            Method::GET,
            &format!("/sensors/{sensor_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(body["data"]["spaceId"], Value::Null);
}

#[tokio::test]
async fn admin_changes_are_audited_and_purgeable() {
    let h = harness();
    let token = h.admin().await;
    h.create_space(&token, "F-01").await;

    let (status, body) = h
        .call(
            Method::GET,
            "/audit?action=PARKING.SPACE.CREATE",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["actor"], "admin");
    assert_eq!(body["data"][0]["detail"]["spaceCode"], "F-01");

    let (status, _) = h.call(Method::DELETE, "/audit", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    h.clock.advance(2 * 86_400_000);
    let (status, body) = h
        .call(Method::DELETE, "/audit?days=1", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"], 1);

    let (_, body) = h
        .call(
            Method::GET,
            "/audit?action=PARKING.SPACE.CREATE",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn metrics_are_admin_only() {
    let h = harness();
    let operator = h.login("operator", "operator123").await;
    let (status, _) = h.call(Method::GET, "/metrics", Some(&operator), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = h.admin().await;
    let (status, body) = h.call(Method::GET, "/metrics", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["rawEventsHttp"].is_u64());
}

#[tokio::test]
async fn sensor_can_be_detached_from_space() {
    let h = harness();
    let token = h.admin().await;
    let space = h.create_space(&token, "G-01").await;
    let space_id = space["spaceId"].as_str().unwrap();
    let sensor = h.create_sensor(&token, "ESP32-777", Some(space_id)).await;
    let uri = format!("/sensors/{}", sensor["sensorId"].as_str().unwrap());

    // 缺省 spaceId 时保持绑定
    let (status, body) = h
        .call(
            Method::PATCH,
            &uri,
            Some(&token),
            Some(json!({ "locationNote": "pillar 3" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["spaceId"], space_id);

    let (status, body) = h
        .call(
            Method::PATCH,
            &uri,
            Some(&token),
            Some(json!({ "spaceId": null })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["spaceId"], Value::Null);
    assert_eq!(body["data"]["locationNote"], "pillar 3");

    let (_, body) = h
        .call(
            Method::POST,
            "/sensors/event",
            None,
            Some(json!({ "hwId": "ESP32-777", "status": "occupied" })),
        )
        .await;
    assert_eq!(body["data"]["outcome"], "discarded");

    let (status, _) = h
        .call(
            Method::PATCH,
            &uri,
            Some(&token),
            Some(json!({ "spaceId": "  " })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn updates_and_deletes_record_previous_values() {
    let h = harness();
    let token = h.admin().await;
    let space = h.create_space(&token, "H-01").await;
    let space_id = space["spaceId"].as_str().unwrap();
    let sensor = h.create_sensor(&token, "ESP32-888", Some(space_id)).await;
    let sensor_uri = format!("/sensors/{}", sensor["sensorId"].as_str().unwrap());

    let (status, _) = h
        .call(
            Method::PUT,
            &format!("/parking/spaces/{space_id}"),
            Some(&token),
            Some(json!({ "floor": "B1" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    h.call(
        Method::PATCH,
        &sensor_uri,
        Some(&token),
        Some(json!({ "spaceId": null })),
    )
    .await;

    let (_, body) = h
        .call(
            Method::POST,
            "/occupancy",
            Some(&token),
            Some(json!({ "spaceId": space_id, "status": "occupied" })),
        )
        .await;
    let event_uri = format!(
        "/occupancy/event/{}",
        body["data"]["event"]["eventId"].as_str().unwrap()
    );
    h.call(
        Method::PATCH,
        &event_uri,
        Some(&token),
        Some(json!({ "status": "free" })),
    )
    .await;
    h.call(Method::DELETE, &event_uri, Some(&token), None).await;

    let audit = |action: &str| format!("/audit?action={action}");
    let (_, body) = h
        .call(Method::GET, &audit("PARKING.SPACE.UPDATE"), Some(&token), None)
        .await;
    assert_eq!(body["data"][0]["oldValues"]["floor"], Value::Null);
    assert_eq!(body["data"][0]["newValues"]["floor"], "B1");

    let (_, body) = h
        .call(Method::GET, &audit("SENSOR.UPDATE"), Some(&token), None)
        .await;
    assert_eq!(body["data"][0]["oldValues"]["spaceId"], space_id);
    assert_eq!(body["data"][0]["newValues"]["spaceId"], Value::Null);

    let (_, body) = h
        .call(Method::GET, &audit("OCCUPANCY.EVENT.UPDATE"), Some(&token), None)
        .await;
    assert_eq!(body["data"][0]["oldValues"]["status"], "occupied");
    assert_eq!(body["data"][0]["newValues"]["status"], "free");

    let (_, body) = h
        .call(Method::GET, &audit("OCCUPANCY.EVENT.DELETE"), Some(&token), None)
        .await;
    assert_eq!(body["data"][0]["oldValues"]["status"], "free");
    assert_eq!(body["data"][0]["newValues"], Value::Null);
}

#[tokio::test]
async fn audit_statistics_group_by_action_and_resource() {
    let h = harness();
    let token = h.admin().await;
    let space = h.create_space(&token, "J-01").await;
    h.create_space(&token, "J-02").await;
    h.create_sensor(&token, "ESP32-900", space["spaceId"].as_str())
        .await;

    let (status, body) = h
        .call(Method::GET, "/audit/statistics", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["byAction"]["PARKING.SPACE.CREATE"], 2);
    assert_eq!(body["data"]["byAction"]["SENSOR.CREATE"], 1);
    assert_eq!(body["data"]["byResource"]["space"], 2);
    assert_eq!(body["data"]["byResource"]["sensor"], 1);

    let later = T0 + 1;
    let (_, body) = h
        .call(
            Method::GET,
            &format!("/audit/statistics?from={later}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(body["data"]["total"], 0);

    let (status, _) = h
        .call(
            Method::GET,
            "/audit/statistics?from=10&to=1",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let operator = h.login("operator", "operator123").await;
    let (status, _) = h
        .call(Method::GET, "/audit/statistics", Some(&operator), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
