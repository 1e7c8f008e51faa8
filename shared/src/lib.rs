use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::PathBuf;

pub const DELIVERED: &str = "delivered";

/// A CSV input of the dataset. Implementors declare where the file lives and
/// which columns its header must carry.
pub trait Source: DeserializeOwned {
    const TABLE: &'static str;
    const FILE_NAME: &'static str;
    const COLUMNS: &'static [&'static str];
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub customer_id: String,
    pub order_status: String,
    pub order_purchase_timestamp: Option<String>,
    pub order_approved_at: Option<String>,
    pub order_delivered_carrier_date: Option<String>,
    pub order_delivered_customer_date: Option<String>,
    pub order_estimated_delivery_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderItem {
    pub order_id: String,
    pub order_item_id: i32,
    pub product_id: String,
    pub seller_id: String,
    pub shipping_limit_date: String,
    pub price: f64,
    pub freight_value: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Payment {
    pub order_id: String,
    pub payment_sequential: i32,
    pub payment_type: String,
    pub payment_installments: i32,
    pub payment_value: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Product {
    pub product_id: String,
    pub product_category_name: Option<String>,
    #[serde(rename = "product_name_lenght")]
    pub product_name_length: Option<f64>,
    #[serde(rename = "product_description_lenght")]
    pub product_description_length: Option<f64>,
    pub product_photos_qty: Option<f64>,
    pub product_weight_g: Option<f64>,
    pub product_length_cm: Option<f64>,
    pub product_height_cm: Option<f64>,
    pub product_width_cm: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Customer {
    pub customer_id: String,
    pub customer_unique_id: String,
    pub customer_zip_code_prefix: String,
    pub customer_city: String,
    pub customer_state: String,
}

impl Source for Order {
    const TABLE: &'static str = "orders";
    const FILE_NAME: &'static str = "olist_orders_dataset.csv";
    const COLUMNS: &'static [&'static str] = &[
        "order_id",
        "customer_id",
        "order_status",
        "order_purchase_timestamp",
        "order_approved_at",
        "order_delivered_carrier_date",
        "order_delivered_customer_date",
        "order_estimated_delivery_date",
    ];
}

impl Source for OrderItem {
    const TABLE: &'static str = "order_items";
    const FILE_NAME: &'static str = "olist_order_items_dataset.csv";
    const COLUMNS: &'static [&'static str] = &[
        "order_id",
        "order_item_id",
        "product_id",
        "seller_id",
        "shipping_limit_date",
        "price",
        "freight_value",
    ];
}

impl Source for Payment {
    const TABLE: &'static str = "payments";
    const FILE_NAME: &'static str = "olist_order_payments_dataset.csv";
    const COLUMNS: &'static [&'static str] = &[
        "order_id",
        "payment_sequential",
        "payment_type",
        "payment_installments",
        "payment_value",
    ];
}

impl Source for Product {
    const TABLE: &'static str = "products";
    const FILE_NAME: &'static str = "olist_products_dataset.csv";
    const COLUMNS: &'static [&'static str] = &[
        "product_id",
        "product_category_name",
        "product_name_lenght",
        "product_description_lenght",
        "product_photos_qty",
        "product_weight_g",
        "product_length_cm",
        "product_height_cm",
        "product_width_cm",
    ];
}

impl Source for Customer {
    const TABLE: &'static str = "customers";
    const FILE_NAME: &'static str = "olist_customers_dataset.csv";
    const COLUMNS: &'static [&'static str] = &[
        "customer_id",
        "customer_unique_id",
        "customer_zip_code_prefix",
        "customer_city",
        "customer_state",
    ];
}

/// Everything that can go wrong in a pipeline run.
///
/// `Query` and `Render` are carried inside stage outcomes and only affect
/// their own stage. Every other variant halts the run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("source '{table}' not found at {path:?}")]
    MissingSource { table: &'static str, path: PathBuf },

    #[error("failed to load '{table}': {message}")]
    Load { table: &'static str, message: String },

    #[error("table '{table}' is missing column '{column}'")]
    Schema { table: &'static str, column: String },

    #[error("store error: {0}")]
    Store(#[from] diesel::result::Error),

    #[error("store connection failed: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error("row count mismatch: wrote {expected} rows, store reports {actual}")]
    Verification { expected: usize, actual: i64 },

    #[error("query failed: {0}")]
    Query(String),

    #[error("chart rendering failed: {0}")]
    Render(String),
}

impl PipelineError {
    pub fn is_fatal(&self) -> bool {
        !matches!(self, PipelineError::Query(_) | PipelineError::Render(_))
    }
}
