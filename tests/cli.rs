use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn roomctl(session_file: &Path) -> Command {
    let mut cmd = Command::cargo_bin("roomctl").unwrap();
    cmd.env("ROOMCTL_SESSION_FILE", session_file)
        .env_remove("ROOMCTL_POLL_MS")
        .env_remove("ROOMCTL_STORE_AUTH");
    cmd
}

async fn device_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/check"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "room2": 0, "room1": 1, "room11": 1
        })))
        .mount(&server)
        .await;
    server
}

#[test]
fn help_lists_commands() {
    let dir = TempDir::new().unwrap();
    roomctl(&dir.path().join("session.json"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("rooms"))
        .stdout(predicate::str::contains("dashboard"))
        .stdout(predicate::str::contains("watch"));
}

#[test]
fn commands_without_session_send_user_to_connect() {
    let dir = TempDir::new().unwrap();
    let session = dir.path().join("session.json");

    for args in [vec!["rooms"], vec!["dashboard"], vec!["on", "1"], vec!["watch"]] {
        roomctl(&session)
            .args(&args)
            .assert()
            .code(2)
            .stderr(predicate::str::contains("not_connected"))
            .stderr(predicate::str::contains("roomctl connect"));
    }
}

#[test]
fn status_without_session() {
    let dir = TempDir::new().unwrap();
    roomctl(&dir.path().join("session.json"))
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("not_connected"));
}

#[test]
fn connect_rejects_non_ip_address() {
    let dir = TempDir::new().unwrap();
    let session = dir.path().join("session.json");
    roomctl(&session)
        .args(["connect", "controller.local"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid_input"));
    assert!(!session.exists());
}

#[test]
fn watch_interval_has_a_floor() {
    let dir = TempDir::new().unwrap();
    roomctl(&dir.path().join("session.json"))
        .args(["watch", "--interval", "10"])
        .assert()
        .failure();
}

#[tokio::test(flavor = "multi_thread")]
async fn connect_list_toggle_disconnect() {
    let server = device_server().await;
    Mock::given(method("GET"))
        .and(path("/2/on"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let session = dir.path().join("session.json");
    let address = server.address().to_string();

    roomctl(&session)
        .args(["connect", &address])
        .assert()
        .success()
        .stdout(predicate::str::contains("connected"));
    assert!(session.exists());

    roomctl(&session)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains(address.as_str()));

    let output = roomctl(&session).arg("rooms").output().unwrap();
    assert!(output.status.success());
    let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        listed["rooms"],
        json!([
            {"room": "room1", "state": true},
            {"room": "room2", "state": false},
            {"room": "room11", "state": true},
        ])
    );
    assert_eq!(listed["all_on"], json!(false));

    let output = roomctl(&session).arg("dashboard").output().unwrap();
    let view: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(view["on_count"], 2);
    assert_eq!(view["off_count"], 1);

    roomctl(&session)
        .args(["--table", "rooms"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ROOM"))
        .stdout(predicate::str::contains("room11"));

    roomctl(&session).args(["on", "2"]).assert().success();

    roomctl(&session)
        .args(["on", "7"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("room_not_found"));

    roomctl(&session)
        .args(["all", "off"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unsupported_operation"));

    roomctl(&session)
        .arg("disconnect")
        .assert()
        .success()
        .stdout(predicate::str::contains("disconnected"));
    assert!(!session.exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn connect_to_wrong_device() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/check"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let session = dir.path().join("session.json");

    roomctl(&session)
        .args(["connect", &server.address().to_string()])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("device_unreachable"));
    assert!(!session.exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn store_session_counts_logged_in_users() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/.json"))
        .and(query_param("shallow", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Room1": true})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/loggedInUsers.json"))
        .and(body_json(json!({".sv": {"increment": 1}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(1)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/loggedInUsers.json"))
        .and(body_json(json!({".sv": {"increment": -1}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(0)))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let session = dir.path().join("session.json");
    let uri = server.uri();

    roomctl(&session)
        .args(["connect", "--store", &uri])
        .assert()
        .success()
        .stdout(predicate::str::contains("session_id"));
    assert!(session.exists());

    roomctl(&session)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("realtime"))
        .stdout(predicate::str::contains(uri.as_str()));

    roomctl(&session)
        .arg("disconnect")
        .assert()
        .success()
        .stdout(predicate::str::contains("disconnected"));
    assert!(!session.exists());

    server.verify().await;
}
