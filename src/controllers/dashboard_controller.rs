use axum::{
    extract::{Extension, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde_json::json;

use crate::{
    auth::is_htmx,
    models::CurrentUser,
    render,
    services::order_view_model::OrderViewModel,
    AppState,
};

// GET /dashboard
//
// Server-side first paint. The page then opens /events/orders, which mounts
// its own view model and keeps the tabs current.
pub async fn get_dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
    Extension(user): Extension<CurrentUser>,
) -> Response {
    let lang = render::viewer_language(&state, &headers);
    let offset = render::viewer_offset(&state, &headers);

    let view = OrderViewModel::for_user(&state, &user);
    let stale = view.refresh().await.is_err();
    let orders = view.orders();

    let tabs_html = match render::render_order_tabs(&state, &orders, lang, offset, stale) {
        Ok(s) => s,
        Err(e) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, Html(format!("template error: {e}")))
                .into_response()
        }
    };

    let ctx = render::page_ctx(lang, Some(&user), "/dashboard", json!({ "tabs_html": tabs_html }));
    let body = match state.hbs.render("pages/dashboard", &ctx) {
        Ok(s) => s,
        Err(e) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, Html(format!("template error: {e}")))
                .into_response()
        }
    };

    if is_htmx(&headers) {
        return (StatusCode::OK, Html(body)).into_response();
    }

    match render::render_full(&state, lang, &lang.translate("dashboard"), body, Some(&user), "/dashboard") {
        Ok(page) => (StatusCode::OK, Html(page)).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, Html(e)).into_response(),
    }
}
