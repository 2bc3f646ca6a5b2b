mod common;

use std::time::Duration;

use bbb_core::ErrorKind;
use bbb_transport::{DirectOptions, DirectTransport, Request, Transport};

use common::{TestServer, reply, unreachable_url};

#[test]
fn not_found_is_network_error() {
    let server = TestServer::start(vec![("/api/getMeetings", reply(404, "missing"))]);

    let err = DirectTransport::new()
        .send(&Request::get(server.url("api/getMeetings")))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(err.status(), Some(404));
    assert!(err.message().contains("Bad response."));
}

#[test]
fn body_and_session_are_returned() {
    let server = TestServer::start(vec![(
        "/api/",
        reply(200, "Hello from the other side!").header("set-cookie", "JSESSIONID=Monkey; Path=/"),
    )]);

    let response = DirectTransport::new()
        .send(&Request::get(server.url("api/")))
        .unwrap();

    assert_eq!(response.body(), "Hello from the other side!");
    assert_eq!(response.session_id(), Some("Monkey"));

    let recorded = server.recorded();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].method, "GET");
    assert_eq!(recorded[0].path, "/api/");
    assert_eq!(recorded[0].header("accept-charset"), Some("UTF-8"));
    assert!(recorded[0].body.is_empty());
}

#[test]
fn response_without_session_cookie() {
    let server = TestServer::start(vec![(
        "/api/",
        reply(200, "<response/>").header("set-cookie", "other=value"),
    )]);

    let response = DirectTransport::new()
        .send(&Request::get(server.url("api/")))
        .unwrap();

    assert_eq!(response.body(), "<response/>");
    assert_eq!(response.session_id(), None);
}

#[test]
fn post_sends_payload_with_headers() {
    let server = TestServer::start(vec![("/api/create", reply(200, "<response/>"))]);
    let payload = "<modules><module name=\"presentation\">é</module></modules>";

    let request = Request::post(server.url("api/create?meetingID=m1&checksum=abc"), payload)
        .with_session_id("Tiger");
    DirectTransport::new().send(&request).unwrap();

    let recorded = server.recorded();
    let received = &recorded[0];
    assert_eq!(received.method, "POST");
    assert_eq!(received.path, "/api/create?meetingID=m1&checksum=abc");
    assert_eq!(received.header("content-type"), Some("application/xml"));
    assert_eq!(
        received.header("content-length"),
        Some(payload.len().to_string().as_str())
    );
    assert_eq!(received.header("cookie"), Some("JSESSIONID=Tiger"));
    assert_eq!(received.body, payload.as_bytes());
}

#[test]
fn caller_headers_and_user_agent_are_sent() {
    let server = TestServer::start(vec![("/api/", reply(200, "ok"))]);
    let options = DirectOptions::new()
        .with_user_agent("lms/1.0")
        .with_headers(["X-Tenant: acme"]);

    DirectTransport::with_options(options)
        .send(&Request::get(server.url("api/")))
        .unwrap();

    let recorded = server.recorded();
    assert_eq!(recorded[0].header("user-agent"), Some("lms/1.0"));
    assert_eq!(recorded[0].header("x-tenant"), Some("acme"));
}

#[test]
fn redirects_are_followed() {
    let server = TestServer::start(vec![
        ("/api/start", reply(302, "").header("location", "/api/final")),
        ("/api/final", reply(200, "<response>final</response>")),
    ]);

    let response = DirectTransport::new()
        .send(&Request::get(server.url("api/start")))
        .unwrap();

    assert_eq!(response.body(), "<response>final</response>");
    assert_eq!(response.session_id(), None);
    let recorded = server.recorded();
    assert_eq!(recorded.len(), 2);
    assert_eq!(recorded[1].path, "/api/final");
}

#[test]
fn unreachable_server_is_transport_error() {
    let options = DirectOptions::new().with_connect_timeout(Duration::from_secs(2));
    let err = DirectTransport::with_options(options)
        .send(&Request::get(unreachable_url()))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(err.is_connection_failure());
    assert_eq!(err.status(), None);
}

#[test]
fn silent_server_times_out() {
    let server = TestServer::start(vec![(
        "/api/",
        reply(200, "too late").delayed(Duration::from_secs(10)),
    )]);
    let options = DirectOptions::new().with_timeout(Duration::from_secs(1));

    let err = DirectTransport::with_options(options)
        .send(&Request::get(server.url("api/")))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(!err.is_connection_failure());
}

#[test]
fn invalid_options_fail_before_connecting() {
    let options = DirectOptions::new().set("timeout_secs", "soon");
    let err = DirectTransport::with_options(options)
        .send(&Request::get(unreachable_url()))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn non_utf8_body_is_parsing_error() {
    let server = TestServer::start(vec![("/api/", reply(200, vec![0x3c, 0xff, 0xfe, 0x3e]))]);

    let err = DirectTransport::new()
        .send(&Request::get(server.url("api/")))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Parsing);
    assert_eq!(err.status(), None);
}

#[test]
fn session_set_during_redirect_is_kept() {
    let server = TestServer::start(vec![
        (
            "/api/start",
            reply(302, "")
                .header("location", "/api/final")
                .header("set-cookie", "JSESSIONID=Final; Path=/"),
        ),
        ("/api/final", reply(200, "<response/>")),
    ]);

    let response = DirectTransport::new()
        .send(&Request::get(server.url("api/start")))
        .unwrap();

    assert_eq!(response.session_id(), Some("Final"));
    assert_eq!(server.recorded().len(), 2);
}

#[test]
fn cleared_session_cookie_reads_as_none() {
    let server = TestServer::start(vec![(
        "/api/",
        reply(200, "<response/>")
            .header("set-cookie", "other=value")
            .header("set-cookie", "JSESSIONID=; Path=/"),
    )]);

    let response = DirectTransport::new()
        .send(&Request::get(server.url("api/")))
        .unwrap();

    assert_eq!(response.body(), "<response/>");
    assert_eq!(response.session_id(), None);
}
