use chrono::{Datelike, NaiveDate, NaiveDateTime};
use shared::{Order, DELIVERED};
use tracing::{info, warn};

const SECONDS_PER_DAY: i64 = 86_400;

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// A delivered order with parsed timestamps and the two derived columns.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanOrder {
    pub order_id: String,
    pub customer_id: String,
    pub order_status: String,
    pub order_purchase_timestamp: Option<NaiveDateTime>,
    pub order_approved_at: Option<String>,
    pub order_delivered_carrier_date: Option<String>,
    pub order_delivered_customer_date: Option<NaiveDateTime>,
    pub order_estimated_delivery_date: Option<NaiveDateTime>,
    pub delivery_duration_days: Option<i64>,
    pub purchase_month: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleaningReport {
    pub total: usize,
    pub delivered: usize,
    pub removed: usize,
    pub coerced_timestamps: usize,
    pub negative_durations: usize,
}

pub fn clean_orders(orders: Vec<Order>) -> (Vec<CleanOrder>, CleaningReport) {
    let mut report = CleaningReport {
        total: orders.len(),
        ..Default::default()
    };

    // Blank values are already null and are not counted.
    let mut coerce = |raw: Option<&str>| {
        let raw = raw.map(str::trim).filter(|raw| !raw.is_empty())?;
        let parsed = parse_timestamp(raw);
        if parsed.is_none() {
            report.coerced_timestamps += 1;
        }
        parsed
    };

    let parsed: Vec<(Order, [Option<NaiveDateTime>; 3])> = orders
        .into_iter()
        .map(|order| {
            let timestamps = [
                coerce(order.order_purchase_timestamp.as_deref()),
                coerce(order.order_delivered_customer_date.as_deref()),
                coerce(order.order_estimated_delivery_date.as_deref()),
            ];
            (order, timestamps)
        })
        .collect();
    info!(
        "Parsed order timestamps ({} values coerced to null)",
        report.coerced_timestamps
    );

    let cleaned: Vec<CleanOrder> = parsed
        .into_iter()
        .filter(|(order, _)| order.order_status == DELIVERED)
        .map(|(order, [purchased, delivered, estimated])| {
            let delivery_duration_days = delivery_days(purchased, delivered);
            if delivery_duration_days.is_some_and(|days| days < 0) {
                report.negative_durations += 1;
            }
            CleanOrder {
                order_id: order.order_id,
                customer_id: order.customer_id,
                order_status: order.order_status,
                order_purchase_timestamp: purchased,
                order_approved_at: order.order_approved_at,
                order_delivered_carrier_date: order.order_delivered_carrier_date,
                order_delivered_customer_date: delivered,
                order_estimated_delivery_date: estimated,
                delivery_duration_days,
                purchase_month: purchased.and_then(month_start),
            }
        })
        .collect();

    report.delivered = cleaned.len();
    report.removed = report.total - report.delivered;
    info!(
        "Kept {} '{}' orders, removed {}",
        report.delivered, DELIVERED, report.removed
    );
    if report.negative_durations > 0 {
        warn!(
            "{} delivered orders have a delivery date before their purchase date",
            report.negative_durations
        );
    }

    (cleaned, report)
}

/// Parses a timestamp, returning `None` for blank or unrecognised values.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Whole days between purchase and delivery, floored.
pub fn delivery_days(
    purchased: Option<NaiveDateTime>,
    delivered: Option<NaiveDateTime>,
) -> Option<i64> {
    let elapsed = delivered? - purchased?;
    Some(elapsed.num_seconds().div_euclid(SECONDS_PER_DAY))
}

pub fn month_start(timestamp: NaiveDateTime) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(timestamp.year(), timestamp.month(), 1)
}
