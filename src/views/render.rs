use axum::http::HeaderMap;
use chrono::FixedOffset;
use serde_json::{json, Value};

use crate::{
    auth::get_cookie,
    models::{CurrentUser, Order},
    services::{
        i18n::Language,
        order_views::{self, DateBucket, StatusTab},
    },
    AppState,
};

pub const LANG_COOKIE: &str = "lang";
pub const TZ_COOKIE: &str = "tz";

/// Active language: `lang` cookie, else the configured default.
pub fn viewer_language(state: &AppState, headers: &HeaderMap) -> Language {
    get_cookie(headers, LANG_COOKIE)
        .and_then(|tag| Language::from_tag(&tag))
        .unwrap_or(state.settings.default_language)
}

/// The browser reports its offset (minutes east of UTC) in the `tz` cookie.
pub fn viewer_offset(state: &AppState, headers: &HeaderMap) -> FixedOffset {
    let minutes = get_cookie(headers, TZ_COOKIE)
        .and_then(|v| v.parse::<i32>().ok())
        .unwrap_or(state.settings.default_utc_offset_minutes);
    order_views::offset_from_minutes(minutes)
}

/// Language and user bits every page template can use.
pub fn chrome(lang: Language, user: Option<&CurrentUser>, path: &str) -> Value {
    let (is_logged_in, user_json) = match user {
        Some(u) => (true, json!({ "id": u.id, "email": u.email })),
        None => (false, Value::Null),
    };

    json!({
        "lang": lang.tag(),
        "dir": lang.dir(),
        "t": lang.strings(),
        "languages": lang.options(),
        "is_logged_in": is_logged_in,
        "user": user_json,
        "path": path,
    })
}

/// Merges page-specific fields over the shared chrome.
pub fn page_ctx(lang: Language, user: Option<&CurrentUser>, path: &str, extra: Value) -> Value {
    let mut ctx = chrome(lang, user, path);
    if let (Some(base), Value::Object(extra)) = (ctx.as_object_mut(), extra) {
        base.extend(extra);
    }
    ctx
}

pub fn render_full(
    state: &AppState,
    lang: Language,
    title: &str,
    body_html: String,
    user: Option<&CurrentUser>,
    path: &str,
) -> Result<String, String> {
    let ctx = page_ctx(
        lang,
        user,
        path,
        json!({
            "title": title,
            "body": body_html,
        }),
    );

    state
        .hbs
        .render("layouts/base", &ctx)
        .map_err(|e| e.to_string())
}

pub fn order_card(order: &Order, lang: Language, offset: FixedOffset) -> Value {
    let local = order.created_at.with_timezone(&offset).naive_local();

    json!({
        "id": order.id,
        "table_no": order.table_no,
        "status": order.status,
        // unknown statuses fall back to their raw value
        "status_label": lang.translate(&order.status),
        "created_at": lang.format_datetime(local),
        "notes": order.notes.as_deref().filter(|n| !n.is_empty()),
    })
}

pub fn status_tabs_json(tabs: &[StatusTab<'_>], lang: Language, offset: FixedOffset) -> Value {
    let tabs: Vec<Value> = tabs
        .iter()
        .enumerate()
        .map(|(i, tab)| {
            let status = tab.status.as_str();
            json!({
                "status": status,
                "label": lang.translate(status),
                "count": tab.orders.len(),
                "first": i == 0,
                "orders": tab
                    .orders
                    .iter()
                    .map(|o| order_card(o, lang, offset))
                    .collect::<Vec<_>>(),
            })
        })
        .collect();

    Value::Array(tabs)
}

pub fn date_buckets_json(buckets: &[DateBucket<'_>], lang: Language, offset: FixedOffset) -> Value {
    let groups: Vec<Value> = buckets
        .iter()
        .map(|b| {
            json!({
                "date": b.date,
                "orders": b
                    .orders
                    .iter()
                    .map(|o| order_card(o, lang, offset))
                    .collect::<Vec<_>>(),
            })
        })
        .collect();

    Value::Array(groups)
}

/// The dashboard's live region; also what the event stream pushes.
pub fn render_order_tabs(
    state: &AppState,
    orders: &[Order],
    lang: Language,
    offset: FixedOffset,
    stale: bool,
) -> Result<String, String> {
    let tabs = order_views::status_tabs(orders);

    state
        .hbs
        .render(
            "partials/order_tabs",
            &json!({
                "t": lang.strings(),
                "tabs": status_tabs_json(&tabs, lang, offset),
                "stale": stale,
            }),
        )
        .map_err(|e| e.to_string())
}
