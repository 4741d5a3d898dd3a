mod common;

use axum::http::{header, Request, StatusCode};
use common::{at, auth_cookie_header, order, response_body_string, test_state, test_state_with, FakeOrders};
use orderboard::{models::Order, routes};
use tower::ServiceExt;

fn get(uri: &str) -> Request<axum::body::Body> {
    Request::builder().uri(uri).body(axum::body::Body::empty()).unwrap()
}

fn get_with_cookie(uri: &str, cookie: &str) -> Request<axum::body::Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(axum::body::Body::empty())
        .unwrap()
}

fn kitchen() -> Vec<Order> {
    let mut o1 = order(1, "placed", at(2026, 10, 17, 9, 0));
    o1.notes = Some("no onions".to_string());
    vec![
        o1,
        order(2, "ready", at(2026, 10, 17, 10, 0)),
        order(3, "ready", at(2026, 10, 16, 20, 0)),
        order(4, "on_hold", at(2026, 10, 15, 12, 0)),
    ]
}

#[tokio::test]
async fn protected_pages_redirect_to_login_when_signed_out() {
    for path in ["/dashboard", "/history"] {
        let app = routes::app(test_state());
        let res = app.oneshot(get(path)).await.unwrap();

        assert_eq!(res.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(res.headers().get(header::LOCATION).unwrap(), "/login");
    }
}

#[tokio::test]
async fn htmx_requests_get_hx_redirect() {
    let app = routes::app(test_state());
    let req = Request::builder()
        .uri("/dashboard")
        .header("HX-Request", "true")
        .body(axum::body::Body::empty())
        .unwrap();

    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers().get("HX-Redirect").unwrap(), "/login");
}

#[tokio::test]
async fn event_stream_is_unauthorized_when_signed_out() {
    let app = routes::app(test_state());
    let req = Request::builder()
        .uri("/events/orders")
        .header(header::ACCEPT, "text/event-stream")
        .body(axum::body::Body::empty())
        .unwrap();

    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn tampered_token_counts_as_signed_out() {
    let state = test_state();
    let cookie = format!("{}={}", state.settings.auth_cookie_name, "not.a.jwt");
    let app = routes::app(state);

    let res = app.oneshot(get_with_cookie("/dashboard", &cookie)).await.unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers().get(header::LOCATION).unwrap(), "/login");
}

#[tokio::test]
async fn root_redirects_by_sign_in_state() {
    let state = test_state();
    let cookie = auth_cookie_header(&state);

    let res = routes::app(state.clone()).oneshot(get("/")).await.unwrap();
    assert_eq!(res.headers().get(header::LOCATION).unwrap(), "/login");

    let res = routes::app(state).oneshot(get_with_cookie("/", &cookie)).await.unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers().get(header::LOCATION).unwrap(), "/dashboard");
}

#[tokio::test]
async fn dashboard_shows_status_tabs_with_counts() {
    let (state, _) = test_state_with(FakeOrders::with_orders(kitchen()));
    let cookie = format!("{}; lang=en", auth_cookie_header(&state));
    let app = routes::app(state);

    let res = app.oneshot(get_with_cookie("/dashboard", &cookie)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = response_body_string(res).await;
    assert!(body.contains(r#"Placed <span dir="ltr">(1)</span>"#));
    assert!(body.contains(r#"Acknowledged <span dir="ltr">(0)</span>"#));
    assert!(body.contains(r#"Ready <span dir="ltr">(2)</span>"#));
    assert!(body.contains("Table: T1"));
    assert!(body.contains("Notes: no onions"));
    // unknown status is on no tab
    assert!(!body.contains("Table: T4"));
    assert!(body.contains(r#"sse-connect="/events/orders""#));
}

#[tokio::test]
async fn dashboard_flags_stale_data_when_fetch_fails() {
    let fake = FakeOrders::with_orders(kitchen());
    fake.set_failing(true);
    let (state, _) = test_state_with(fake);
    let cookie = format!("{}; lang=en", auth_cookie_header(&state));
    let app = routes::app(state);

    let res = app.oneshot(get_with_cookie("/dashboard", &cookie)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = response_body_string(res).await;
    assert!(body.contains("Orders could not be refreshed"));
    assert!(body.contains(r#"Placed <span dir="ltr">(0)</span>"#));
}

#[tokio::test]
async fn history_groups_by_local_date_newest_first() {
    let (state, _) = test_state_with(FakeOrders::with_orders(kitchen()));
    let cookie = format!("{}; lang=en; tz=0", auth_cookie_header(&state));
    let app = routes::app(state);

    let res = app.oneshot(get_with_cookie("/history", &cookie)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = response_body_string(res).await;
    let d17 = body.find("10/17/2026").unwrap();
    let d16 = body.find("10/16/2026").unwrap();
    let d15 = body.find("10/15/2026").unwrap();
    assert!(d17 < d16 && d16 < d15);

    // history shows every order, unknown statuses by their raw value
    assert!(body.contains("Table: T4"));
    assert!(body.contains("on_hold"));
    assert!(body.contains("Ready"));
}

#[tokio::test]
async fn history_respects_viewer_offset() {
    let (state, _) = test_state_with(FakeOrders::with_orders(vec![order(
        1,
        "placed",
        at(2026, 10, 17, 23, 30),
    )]));
    let cookie = format!("{}; lang=es; tz=120", auth_cookie_header(&state));
    let app = routes::app(state);

    let res = app.oneshot(get_with_cookie("/history", &cookie)).await.unwrap();
    let body = response_body_string(res).await;
    assert!(body.contains("18/10/2026"));
}

#[tokio::test]
async fn language_switch_sets_cookie_and_returns() {
    let app = routes::app(test_state());
    let req = Request::builder()
        .method("POST")
        .uri("/language")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(axum::body::Body::from("lang=fr&next=%2Fhistory"))
        .unwrap();

    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers().get(header::LOCATION).unwrap(), "/history");

    let cookie = res.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("lang=fr"));
}

#[tokio::test]
async fn language_switch_refuses_offsite_redirects() {
    let app = routes::app(test_state());
    let req = Request::builder()
        .method("POST")
        .uri("/language")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(axum::body::Body::from("lang=en&next=%2F%2Fevil.example"))
        .unwrap();

    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.headers().get(header::LOCATION).unwrap(), "/");
}

#[tokio::test]
async fn health_is_public() {
    let app = routes::app(test_state());
    let res = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(response_body_string(res).await, "ok");
}

#[tokio::test]
async fn event_stream_pushes_initial_tabs_then_one_update_per_change() {
    use http_body_util::BodyExt;
    use std::time::Duration;

    let fake = FakeOrders::with_orders(kitchen());
    let (state, _) = test_state_with(fake.clone());
    let cookie = format!("{}; lang=en", auth_cookie_header(&state));
    let app = routes::app(state);

    let req = Request::builder()
        .uri("/events/orders")
        .header(header::COOKIE, cookie)
        .header(header::ACCEPT, "text/event-stream")
        .body(axum::body::Body::empty())
        .unwrap();

    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(fake.log(), vec!["subscribe", "list"]);

    let mut body = res.into_body();

    let first = tokio::time::timeout(Duration::from_secs(1), body.frame())
        .await
        .unwrap()
        .unwrap()
        .unwrap()
        .into_data()
        .unwrap();
    let first = String::from_utf8_lossy(&first).to_string();
    assert!(first.starts_with("event: orders"));
    assert!(first.contains("Table: T1"));

    fake.set_orders(vec![order(9, "ack", at(2026, 10, 17, 12, 0))]);
    fake.signal().await;

    let next = tokio::time::timeout(Duration::from_secs(1), body.frame())
        .await
        .unwrap()
        .unwrap()
        .unwrap()
        .into_data()
        .unwrap();
    let next = String::from_utf8_lossy(&next).to_string();
    assert!(next.contains("Table: T9"));
    assert!(!next.contains("Table: T1"));
    assert_eq!(fake.list_calls(), 2);

    // closing the stream releases the change subscription
    drop(body);
    assert!(common::eventually(|| fake.live_subscriptions() == 0).await);
}

#[tokio::test]
async fn valueless_cookie_before_session_keeps_user_signed_in() {
    let (state, _) = test_state_with(FakeOrders::with_orders(kitchen()));
    let cookie = format!("flag; {}; lang=en", auth_cookie_header(&state));
    let app = routes::app(state);

    let res = app.oneshot(get_with_cookie("/dashboard", &cookie)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = response_body_string(res).await;
    assert!(body.contains("Table: T1"));
}

#[tokio::test]
async fn valueless_cookie_before_lang_keeps_language() {
    let app = routes::app(test_state());

    let res = app.oneshot(get_with_cookie("/login", "flag; lang=ar")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = response_body_string(res).await;
    assert!(body.contains(r#"dir="rtl""#));
}

#[tokio::test]
async fn every_tab_trigger_has_a_matching_panel() {
    let (state, _) = test_state_with(FakeOrders::with_orders(kitchen()));
    let cookie = format!("{}; lang=en", auth_cookie_header(&state));
    let app = routes::app(state);

    let res = app.oneshot(get_with_cookie("/dashboard", &cookie)).await.unwrap();
    let body = response_body_string(res).await;

    for status in ["placed", "ack", "in_progress", "ready", "delivered"] {
        assert!(body.contains(&format!(r#"data-tab="{status}""#)), "{status}");
        assert!(body.contains(&format!(r#"data-tab-panel="{status}""#)), "{status}");
    }
    // only the first panel starts visible; app.js restores the selected one
    assert_eq!(body.matches(" hidden>").count(), 4);
}

#[tokio::test]
async fn dashboard_visit_costs_one_query_per_mount() {
    let fake = FakeOrders::with_orders(kitchen());
    let (state, _) = test_state_with(fake.clone());
    let cookie = format!("{}; lang=en", auth_cookie_header(&state));

    let res = routes::app(state.clone())
        .oneshot(get_with_cookie("/dashboard", &cookie))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(fake.log(), vec!["list"]);

    let req = Request::builder()
        .uri("/events/orders")
        .header(header::COOKIE, cookie)
        .header(header::ACCEPT, "text/event-stream")
        .body(axum::body::Body::empty())
        .unwrap();
    let stream = routes::app(state).oneshot(req).await.unwrap();
    assert_eq!(stream.status(), StatusCode::OK);

    // the stream's own mount subscribes before its single fetch
    assert_eq!(fake.log(), vec!["list", "subscribe", "list"]);
}
