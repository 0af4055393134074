// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use screendeck_api::Client;
use screendeck_app::{
    AuthState, CellValue, Controller, Credentials, LoginReply, ScreenDescriptor, ScreenService,
    ServiceError,
};
use std::io::Read;
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Method, Response, Server};

fn json_header() -> Header {
    Header::from_bytes("Content-Type", "application/json").expect("valid content type header")
}

fn mock_server() -> (Server, String) {
    let server = Server::http("127.0.0.1:0").expect("start mock server");
    let addr = format!("http://{}", server.server_addr());
    (server, addr)
}

#[test]
fn unreachable_service_is_a_connectivity_error() {
    let client = Client::new(Some("http://127.0.0.1:1"), Duration::from_millis(200))
        .expect("client should initialize");

    let error = client
        .login(&Credentials::new("a", "b"))
        .expect_err("login should fail for unreachable endpoint");
    assert!(matches!(error, ServiceError::Connectivity(_)));
    assert!(error.to_string().contains("127.0.0.1:1"));
}

#[test]
fn login_posts_credentials_as_json() {
    let (server, addr) = mock_server();

    let handle = thread::spawn(move || {
        let mut request = server.recv().expect("request expected");
        assert_eq!(request.method(), &Method::Post);
        assert_eq!(request.url(), "/login");
        let mut body = String::new();
        request
            .as_reader()
            .read_to_string(&mut body)
            .expect("read request body");
        let parsed: serde_json::Value = serde_json::from_str(&body).expect("json body");
        assert_eq!(parsed["username"], "a");
        assert_eq!(parsed["password"], "b");

        let response = Response::from_string(r#"{"status":"success","msg":"Login Successful"}"#)
            .with_status_code(200)
            .with_header(json_header());
        request.respond(response).expect("response should succeed");
    });

    let client = Client::new(Some(&addr), Duration::from_secs(2)).expect("client");
    let reply = client
        .login(&Credentials::new("a", "b"))
        .expect("login should decode");
    assert!(reply.is_success());

    handle.join().expect("server thread should join");
}

#[test]
fn rejected_login_is_decoded_from_401_body() {
    let (server, addr) = mock_server();

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        let response = Response::from_string(r#"{"status":"error","msg":"Invalid Credentials"}"#)
            .with_status_code(401)
            .with_header(json_header());
        request.respond(response).expect("response should succeed");
    });

    let client = Client::new(Some(&addr), Duration::from_secs(2)).expect("client");
    let reply = client
        .login(&Credentials::new("a", "wrong"))
        .expect("401 body should still decode");
    assert_eq!(reply, LoginReply::rejected("error", "Invalid Credentials"));

    handle.join().expect("server thread should join");
}

#[test]
fn screens_and_run_round_trip_against_mock_server() {
    let (server, addr) = mock_server();

    let handle = thread::spawn(move || {
        let request = server.recv().expect("screens request expected");
        assert_eq!(request.method(), &Method::Get);
        assert_eq!(request.url(), "/screens");
        let response = Response::from_string(
            r#"[{"name":"Low PE","url":"https://www.screener.in/screens/1/low-pe/"},{"name":"Growth","url":"https://www.screener.in/screens/2/growth/"}]"#,
        )
        .with_status_code(200)
        .with_header(json_header());
        request.respond(response).expect("response should succeed");

        let mut request = server.recv().expect("run request expected");
        assert_eq!(request.url(), "/run");
        let mut body = String::new();
        request
            .as_reader()
            .read_to_string(&mut body)
            .expect("read request body");
        assert_eq!(body, r#"{"url":"https://www.screener.in/screens/1/low-pe/"}"#);
        let response = Response::from_string(r#"[{"S.No.":1,"Name":"ITC","P/E":24.8}]"#)
            .with_status_code(200)
            .with_header(json_header());
        request.respond(response).expect("response should succeed");
    });

    let client = Client::new(Some(&addr), Duration::from_secs(2)).expect("client");
    let screens = client.list_screens().expect("screen list");
    assert_eq!(
        screens,
        vec![
            ScreenDescriptor::new("Low PE", "https://www.screener.in/screens/1/low-pe/"),
            ScreenDescriptor::new("Growth", "https://www.screener.in/screens/2/growth/"),
        ]
    );

    let rows = client.run_screen(&screens[0].url).expect("run rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].keys().collect::<Vec<_>>(),
        vec!["S.No.", "Name", "P/E"]
    );
    assert_eq!(rows[0].get("Name"), Some(&CellValue::text("ITC")));

    handle.join().expect("server thread should join");
}

#[test]
fn run_server_error_is_a_run_failure() {
    let (server, addr) = mock_server();

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        let response = Response::from_string(r#"{"error":"Message: timeout"}"#)
            .with_status_code(500)
            .with_header(json_header());
        request.respond(response).expect("response should succeed");
    });

    let client = Client::new(Some(&addr), Duration::from_secs(2)).expect("client");
    let error = client.run_screen("u1").expect_err("500 should fail");
    assert_eq!(
        error,
        ServiceError::RunFailed("server error (500): Message: timeout".to_owned())
    );

    handle.join().expect("server thread should join");
}

#[test]
fn screens_requiring_login_fail_without_panicking() {
    let (server, addr) = mock_server();

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        let response = Response::from_string(r#"{"error":"Login required"}"#)
            .with_status_code(401)
            .with_header(json_header());
        request.respond(response).expect("response should succeed");
    });

    let client = Client::new(Some(&addr), Duration::from_secs(2)).expect("client");
    let error = client.list_screens().expect_err("401 should fail");
    assert!(error.to_string().contains("Login required"));

    handle.join().expect("server thread should join");
}

#[test]
fn ping_accepts_online_banner() {
    let (server, addr) = mock_server();

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/");
        request
            .respond(Response::from_string("Screen API is Online").with_status_code(200))
            .expect("response should succeed");
    });

    let client = Client::new(Some(&format!("{addr}/")), Duration::from_secs(2)).expect("client");
    client.ping().expect("ping should succeed");

    handle.join().expect("server thread should join");
}

#[test]
fn controller_drives_full_session_over_http() {
    let (server, addr) = mock_server();

    let handle = thread::spawn(move || {
        let request = server.recv().expect("login request expected");
        assert_eq!(request.url(), "/login");
        request
            .respond(
                Response::from_string(r#"{"status":"success"}"#)
                    .with_status_code(200)
                    .with_header(json_header()),
            )
            .expect("response should succeed");

        let request = server.recv().expect("screens request expected");
        assert_eq!(request.url(), "/screens");
        request
            .respond(
                Response::from_string(r#"[{"name":"Low PE","url":"u1"}]"#)
                    .with_status_code(200)
                    .with_header(json_header()),
            )
            .expect("response should succeed");
    });

    let client = Client::new(Some(&addr), Duration::from_secs(2)).expect("client");
    let mut controller = Controller::new(client);
    controller.login(Credentials::new("a", "b"));
    assert!(controller.wait_until_idle(Duration::from_secs(5)));

    assert_eq!(controller.state().auth, AuthState::Authenticated);
    assert_eq!(
        controller.state().screens,
        vec![ScreenDescriptor::new("Low PE", "u1")]
    );

    handle.join().expect("server thread should join");
}
