//! Pure derivations over an order snapshot.
//!
//! Nothing here reorders: every view is a subsequence of its input, so the
//! newest-first order of the snapshot carries through to the page.

use std::collections::HashMap;

use chrono::{FixedOffset, Offset, Utc};
use serde::Serialize;

use crate::{
    models::{Order, OrderStatus},
    services::i18n::Language,
};

/// Orders whose raw status equals `status`, in input order.
///
/// Statuses outside the enumeration never match anything.
pub fn bucket_by_status(orders: &[Order], status: OrderStatus) -> Vec<&Order> {
    orders
        .iter()
        .filter(|o| o.status() == Some(status))
        .collect()
}

/// One dashboard tab.
#[derive(Debug)]
pub struct StatusTab<'a> {
    pub status: OrderStatus,
    pub orders: Vec<&'a Order>,
}

/// The five status buckets, in tab order.
pub fn status_tabs(orders: &[Order]) -> Vec<StatusTab<'_>> {
    OrderStatus::ALL
        .into_iter()
        .map(|status| StatusTab {
            status,
            orders: bucket_by_status(orders, status),
        })
        .collect()
}

/// Orders sharing one local calendar date.
#[derive(Debug, Serialize)]
pub struct DateBucket<'a> {
    pub date: String,
    pub orders: Vec<&'a Order>,
}

/// Groups by the calendar date of `created_at` at the viewer's UTC offset,
/// rendered the way `language` writes dates.
///
/// Buckets come out in the order their date is first seen; orders keep
/// their input order inside a bucket.
pub fn bucket_by_date<'a>(
    orders: &'a [Order],
    offset: FixedOffset,
    language: Language,
) -> Vec<DateBucket<'a>> {
    let mut buckets: Vec<DateBucket<'a>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for order in orders {
        let local = order.created_at.with_timezone(&offset).date_naive();
        let key = language.format_date(local);

        match index.get(&key) {
            Some(&i) => buckets[i].orders.push(order),
            None => {
                index.insert(key.clone(), buckets.len());
                buckets.push(DateBucket {
                    date: key,
                    orders: vec![order],
                });
            }
        }
    }

    buckets
}

/// Viewer offset from minutes east of UTC; out-of-range values fall back to UTC.
pub fn offset_from_minutes(minutes: i32) -> FixedOffset {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix())
}
