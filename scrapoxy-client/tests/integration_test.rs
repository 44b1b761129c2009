//! Integration tests for scrapoxy-client against a mock commander.

use scrapoxy_client::*;
use serde_json::json;
use tokio::runtime::Handle;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// base64("password")
const AUTH: &str = "cGFzc3dvcmQ=";

async fn commander() -> (MockServer, ScrapoxyClient) {
    let server = MockServer::start().await;
    let client = ScrapoxyClient::with_engine(
        format!("{}/api/", server.uri()),
        "password",
        Handle::current(),
    );
    (server, client)
}

fn scaling_body(min: u32, required: u32, max: u32) -> serde_json::Value {
    json!({"min": min, "required": required, "max": max})
}

#[tokio::test]
async fn test_get_scaling() {
    let (server, client) = commander().await;
    Mock::given(method("GET"))
        .and(path("/api/scaling"))
        .and(header("authorization", AUTH))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(scaling_body(1, 2, 5)))
        .expect(1)
        .mount(&server)
        .await;

    let scaling = client.get_scaling().await.unwrap();
    assert_eq!(scaling, scaling_body(1, 2, 5));
}

#[tokio::test]
async fn test_get_scaling_keeps_every_field() {
    let (server, client) = commander().await;
    let body = json!({"min": 1, "required": 2, "max": 5, "downscaleDelay": 600});
    Mock::given(method("GET"))
        .and(path("/api/scaling"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
        .mount(&server)
        .await;

    assert_eq!(client.get_scaling().await.unwrap(), body);
}

#[tokio::test]
async fn test_get_scaling_does_not_validate_shape() {
    let (server, client) = commander().await;
    let body = json!({"min": -1, "required": 0, "max": 2});
    Mock::given(method("GET"))
        .and(path("/api/scaling"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
        .mount(&server)
        .await;

    assert_eq!(client.get_scaling().await.unwrap(), body);
    assert!(client.get_scaling_typed().await.unwrap_err().is_decode_failure());
}

#[tokio::test]
async fn test_get_scaling_typed() {
    let (server, client) = commander().await;
    Mock::given(method("GET"))
        .and(path("/api/scaling"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"min": 1, "required": 2, "max": 5, "downscaleDelay": 600})),
        )
        .mount(&server)
        .await;

    assert_eq!(client.get_scaling_typed().await.unwrap(), Scaling::new(1, 2, 5));
}

#[tokio::test]
async fn test_redirect_is_not_followed() {
    let (server, client) = commander().await;
    Mock::given(method("PATCH"))
        .and(path("/api/scaling"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", format!("{}/elsewhere", server.uri())),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/elsewhere"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"moved": true})))
        .expect(0)
        .mount(&server)
        .await;

    let result = client.scale(Scaling::new(1, 1, 1)).await.unwrap();
    assert_eq!(result, serde_json::Value::Null);

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].url.path(), "/api/scaling");
}

#[tokio::test]
async fn test_get_config_round_trips_json() {
    let (server, client) = commander().await;
    let config = json!({
        "instance": {"port": 3128, "scaling": {"min": 1, "max": 5}},
        "providers": [{"type": "awsec2", "region": "eu-west-1"}],
        "stats": null
    });
    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(config.clone()))
        .mount(&server)
        .await;

    assert_eq!(client.get_config().await.unwrap(), config);
}

#[tokio::test]
async fn test_update_config_sends_patch_body() {
    let (server, client) = commander().await;
    let patch = json!({"instance": {"scaling": {"max": 10}}});
    let length = serde_json::to_vec(&patch).unwrap().len().to_string();
    Mock::given(method("PATCH"))
        .and(path("/api/config"))
        .and(header("authorization", AUTH))
        .and(header("content-length", length.as_str()))
        .and(body_json(&patch))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.update_config(&patch).await.unwrap();
    assert_eq!(result, json!({"ok": true}));
}

#[tokio::test]
async fn test_get_instances() {
    let (server, client) = commander().await;
    let instances = json!([
        {"name": "instance-1", "alive": true},
        {"name": "instance-2", "alive": false}
    ]);
    Mock::given(method("GET"))
        .and(path("/api/instances"))
        .respond_with(ResponseTemplate::new(200).set_body_json(instances.clone()))
        .mount(&server)
        .await;

    assert_eq!(client.get_instances().await.unwrap(), instances);
}

#[tokio::test]
async fn test_stop_instance_posts_name() {
    let (server, client) = commander().await;
    Mock::given(method("POST"))
        .and(path("/api/instances/stop"))
        .and(body_json(json!({"name": "instance-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"alive": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.stop_instance("instance-1").await.unwrap();
    assert_eq!(result, json!({"alive": 1}));
}

#[tokio::test]
async fn test_scale_sends_triple() {
    let (server, client) = commander().await;
    Mock::given(method("PATCH"))
        .and(path("/api/scaling"))
        .and(body_json(scaling_body(2, 3, 4)))
        .respond_with(ResponseTemplate::new(200).set_body_json(scaling_body(2, 3, 4)))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.scale(Scaling::new(2, 3, 4)).await.unwrap();
    assert_eq!(result, scaling_body(2, 3, 4));
}

#[tokio::test]
async fn test_up_scale_writes_max_as_required() {
    let (server, client) = commander().await;
    Mock::given(method("GET"))
        .and(path("/api/scaling"))
        .respond_with(ResponseTemplate::new(200).set_body_json(scaling_body(1, 2, 5)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/scaling"))
        .and(body_json(scaling_body(1, 5, 5)))
        .respond_with(ResponseTemplate::new(200).set_body_json(scaling_body(1, 5, 5)))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.up_scale().await.unwrap();
    assert_eq!(result, scaling_body(1, 5, 5));
}

#[tokio::test]
async fn test_down_scale_writes_min_as_required() {
    let (server, client) = commander().await;
    Mock::given(method("GET"))
        .and(path("/api/scaling"))
        .respond_with(ResponseTemplate::new(200).set_body_json(scaling_body(1, 2, 5)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/scaling"))
        .and(body_json(scaling_body(1, 1, 5)))
        .respond_with(ResponseTemplate::new(200).set_body_json(scaling_body(1, 1, 5)))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.down_scale().await.unwrap();
    assert_eq!(result, scaling_body(1, 1, 5));
}

#[tokio::test]
async fn test_up_scale_stops_when_read_fails() {
    let (server, client) = commander().await;
    Mock::given(method("GET"))
        .and(path("/api/scaling"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client.up_scale().await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(ref body) if body == "Not Found"));

    let err = client.down_scale().await.unwrap_err();
    assert!(err.is_not_found());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.method.as_str() == "GET"));
}

#[tokio::test]
async fn test_forbidden_is_unauthorized() {
    let (server, client) = commander().await;
    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Wrong password"))
        .mount(&server)
        .await;

    let err = client.get_config().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(ref body) if body == "Wrong password"));
}

#[tokio::test]
async fn test_server_error_keeps_raw_body() {
    let (server, client) = commander().await;
    Mock::given(method("POST"))
        .and(path("/api/instances/stop"))
        .respond_with(ResponseTemplate::new(500).set_body_string("{\"error\": \"boom\""))
        .mount(&server)
        .await;

    let err = client.stop_instance("instance-9").await.unwrap_err();
    assert!(matches!(err, ApiError::Api(ref body) if body == "{\"error\": \"boom\""));
}

#[tokio::test]
async fn test_invalid_success_body_is_decode_failure() {
    let (server, client) = commander().await;
    Mock::given(method("GET"))
        .and(path("/api/instances"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(&server)
        .await;

    let err = client.get_instances().await.unwrap_err();
    assert!(err.is_decode_failure());
    assert_eq!(err.message(), Some(DECODE_FAILURE));
}

#[tokio::test]
async fn test_scaling_with_wrong_shape_is_decode_failure() {
    let (server, client) = commander().await;
    Mock::given(method("GET"))
        .and(path("/api/scaling"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"min": 1})))
        .mount(&server)
        .await;

    assert!(client.get_scaling_typed().await.unwrap_err().is_decode_failure());
}

#[tokio::test]
async fn test_unreachable_commander_is_transport_error() {
    let client = ScrapoxyClient::with_engine("http://127.0.0.1:1/api/", "password", Handle::current());

    let err = client.get_scaling().await.unwrap_err();
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_owned_engine_from_async_caller() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/instances"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = ScrapoxyClient::new(format!("{}/api/", server.uri()), "password").unwrap();
    assert!(client.engine().is_owned());
    assert_eq!(client.get_instances().await.unwrap(), json!([]));
}
