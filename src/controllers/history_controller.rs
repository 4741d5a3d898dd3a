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
    services::{order_view_model::OrderViewModel, order_views},
    AppState,
};

// GET /history
pub async fn get_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Extension(user): Extension<CurrentUser>,
) -> Response {
    let lang = render::viewer_language(&state, &headers);
    let offset = render::viewer_offset(&state, &headers);

    let view = OrderViewModel::for_user(&state, &user);
    let stale = view.refresh().await.is_err();
    let orders = view.orders();

    let buckets = order_views::bucket_by_date(&orders, offset, lang);

    let ctx = render::page_ctx(
        lang,
        Some(&user),
        "/history",
        json!({
            "groups": render::date_buckets_json(&buckets, lang, offset),
            "show_status": true,
            "stale": stale,
        }),
    );

    let body = match state.hbs.render("pages/history", &ctx) {
        Ok(s) => s,
        Err(e) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, Html(format!("template error: {e}")))
                .into_response()
        }
    };

    if is_htmx(&headers) {
        return (StatusCode::OK, Html(body)).into_response();
    }

    match render::render_full(&state, lang, &lang.translate("history"), body, Some(&user), "/history") {
        Ok(page) => (StatusCode::OK, Html(page)).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, Html(e)).into_response(),
    }
}
