use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Double, Nullable, Text};
use shared::{Customer, OrderItem, Payment, Product};

use crate::cleaner::CleanOrder;

/// One row of the denormalized fact table. Field order follows
/// `schema::master_table`.
#[derive(Debug, Clone, PartialEq, Queryable, Insertable)]
#[diesel(table_name = crate::schema::master_table)]
#[diesel(treat_none_as_default_value = false)]
pub struct FactRow {
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
    pub order_item_id: i32,
    pub product_id: String,
    pub seller_id: String,
    pub shipping_limit_date: String,
    pub price: f64,
    pub freight_value: f64,
    pub product_category_name: Option<String>,
    pub product_name_length: Option<f64>,
    pub product_description_length: Option<f64>,
    pub product_photos_qty: Option<f64>,
    pub product_weight_g: Option<f64>,
    pub product_length_cm: Option<f64>,
    pub product_height_cm: Option<f64>,
    pub product_width_cm: Option<f64>,
    pub payment_sequential: i32,
    pub payment_type: String,
    pub payment_installments: i32,
    pub payment_value: f64,
    pub customer_unique_id: String,
    pub customer_zip_code_prefix: String,
    pub customer_city: String,
    pub customer_state: String,
}

impl FactRow {
    pub fn from_parts(
        order: &CleanOrder,
        item: &OrderItem,
        product: &Product,
        payment: &Payment,
        customer: &Customer,
    ) -> Self {
        Self {
            order_id: order.order_id.clone(),
            customer_id: order.customer_id.clone(),
            order_status: order.order_status.clone(),
            order_purchase_timestamp: order.order_purchase_timestamp,
            order_approved_at: order.order_approved_at.clone(),
            order_delivered_carrier_date: order.order_delivered_carrier_date.clone(),
            order_delivered_customer_date: order.order_delivered_customer_date,
            order_estimated_delivery_date: order.order_estimated_delivery_date,
            delivery_duration_days: order.delivery_duration_days,
            purchase_month: order.purchase_month,
            order_item_id: item.order_item_id,
            product_id: item.product_id.clone(),
            seller_id: item.seller_id.clone(),
            shipping_limit_date: item.shipping_limit_date.clone(),
            price: item.price,
            freight_value: item.freight_value,
            product_category_name: product.product_category_name.clone(),
            product_name_length: product.product_name_length,
            product_description_length: product.product_description_length,
            product_photos_qty: product.product_photos_qty,
            product_weight_g: product.product_weight_g,
            product_length_cm: product.product_length_cm,
            product_height_cm: product.product_height_cm,
            product_width_cm: product.product_width_cm,
            payment_sequential: payment.payment_sequential,
            payment_type: payment.payment_type.clone(),
            payment_installments: payment.payment_installments,
            payment_value: payment.payment_value,
            customer_unique_id: customer.customer_unique_id.clone(),
            customer_zip_code_prefix: customer.customer_zip_code_prefix.clone(),
            customer_city: customer.customer_city.clone(),
            customer_state: customer.customer_state.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, QueryableByName)]
pub struct MonthlyRevenue {
    #[diesel(sql_type = Text)]
    pub month: String,
    #[diesel(sql_type = Double)]
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, QueryableByName)]
pub struct MeanDelivery {
    #[diesel(sql_type = Nullable<Double>)]
    pub mean_delivery_days: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, QueryableByName)]
pub struct CategoryRevenue {
    #[diesel(sql_type = Text)]
    pub category: String,
    #[diesel(sql_type = Double)]
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, QueryableByName)]
pub struct CityCustomers {
    #[diesel(sql_type = Text)]
    pub city: String,
    #[diesel(sql_type = BigInt)]
    pub customers: i64,
}

#[cfg(test)]
pub mod fixtures {
    use super::*;

    /// A delivered fact row with plausible defaults; tests override the
    /// fields they care about.
    pub fn fact_row(
        order_id: &str,
        order_item_id: i32,
        payment_type: &str,
        payment_value: f64,
    ) -> FactRow {
        let purchased = NaiveDate::from_ymd_opt(2017, 1, 10)
            .and_then(|d| d.and_hms_opt(9, 30, 0));
        let delivered = NaiveDate::from_ymd_opt(2017, 1, 18)
            .and_then(|d| d.and_hms_opt(15, 0, 0));
        FactRow {
            order_id: order_id.to_string(),
            customer_id: format!("cust-{}", order_id),
            order_status: shared::DELIVERED.to_string(),
            order_purchase_timestamp: purchased,
            order_approved_at: Some("2017-01-10 10:00:00".to_string()),
            order_delivered_carrier_date: Some("2017-01-12 08:00:00".to_string()),
            order_delivered_customer_date: delivered,
            order_estimated_delivery_date: NaiveDate::from_ymd_opt(2017, 1, 30)
                .and_then(|d| d.and_hms_opt(0, 0, 0)),
            delivery_duration_days: Some(8),
            purchase_month: NaiveDate::from_ymd_opt(2017, 1, 1),
            order_item_id,
            product_id: "prod-1".to_string(),
            seller_id: "seller-1".to_string(),
            shipping_limit_date: "2017-01-14 09:30:00".to_string(),
            price: payment_value,
            freight_value: 0.0,
            product_category_name: Some("utilidades_domesticas".to_string()),
            product_name_length: Some(40.0),
            product_description_length: Some(268.0),
            product_photos_qty: Some(4.0),
            product_weight_g: Some(500.0),
            product_length_cm: Some(19.0),
            product_height_cm: Some(8.0),
            product_width_cm: Some(13.0),
            payment_sequential: 1,
            payment_type: payment_type.to_string(),
            payment_installments: 1,
            payment_value,
            customer_unique_id: format!("unique-{}", order_id),
            customer_zip_code_prefix: "01151".to_string(),
            customer_city: "sao paulo".to_string(),
            customer_state: "SP".to_string(),
        }
    }
}
