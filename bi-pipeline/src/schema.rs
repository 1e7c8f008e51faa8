diesel::table! {
    master_table (order_id, order_item_id, payment_type) {
        order_id -> Text,
        customer_id -> Text,
        order_status -> Text,
        order_purchase_timestamp -> Nullable<Timestamp>,
        order_approved_at -> Nullable<Text>,
        order_delivered_carrier_date -> Nullable<Text>,
        order_delivered_customer_date -> Nullable<Timestamp>,
        order_estimated_delivery_date -> Nullable<Timestamp>,
        delivery_duration_days -> Nullable<BigInt>,
        purchase_month -> Nullable<Date>,
        order_item_id -> Integer,
        product_id -> Text,
        seller_id -> Text,
        shipping_limit_date -> Text,
        price -> Double,
        freight_value -> Double,
        product_category_name -> Nullable<Text>,
        #[sql_name = "product_name_lenght"]
        product_name_length -> Nullable<Double>,
        #[sql_name = "product_description_lenght"]
        product_description_length -> Nullable<Double>,
        product_photos_qty -> Nullable<Double>,
        product_weight_g -> Nullable<Double>,
        product_length_cm -> Nullable<Double>,
        product_height_cm -> Nullable<Double>,
        product_width_cm -> Nullable<Double>,
        payment_sequential -> Integer,
        payment_type -> Text,
        payment_installments -> Integer,
        payment_value -> Double,
        customer_unique_id -> Text,
        customer_zip_code_prefix -> Text,
        customer_city -> Text,
        customer_state -> Text,
    }
}

/// Drops and recreates `master_table`. Column order matches the `table!`
/// definition above.
pub const REPLACE_MASTER_TABLE: &str = "
DROP TABLE IF EXISTS master_table;
CREATE TABLE master_table (
    order_id TEXT NOT NULL,
    customer_id TEXT NOT NULL,
    order_status TEXT NOT NULL,
    order_purchase_timestamp TIMESTAMP,
    order_approved_at TEXT,
    order_delivered_carrier_date TEXT,
    order_delivered_customer_date TIMESTAMP,
    order_estimated_delivery_date TIMESTAMP,
    delivery_duration_days BIGINT,
    purchase_month DATE,
    order_item_id INTEGER NOT NULL,
    product_id TEXT NOT NULL,
    seller_id TEXT NOT NULL,
    shipping_limit_date TEXT NOT NULL,
    price REAL NOT NULL,
    freight_value REAL NOT NULL,
    product_category_name TEXT,
    product_name_lenght REAL,
    product_description_lenght REAL,
    product_photos_qty REAL,
    product_weight_g REAL,
    product_length_cm REAL,
    product_height_cm REAL,
    product_width_cm REAL,
    payment_sequential INTEGER NOT NULL,
    payment_type TEXT NOT NULL,
    payment_installments INTEGER NOT NULL,
    payment_value REAL NOT NULL,
    customer_unique_id TEXT NOT NULL,
    customer_zip_code_prefix TEXT NOT NULL,
    customer_city TEXT NOT NULL,
    customer_state TEXT NOT NULL,
    PRIMARY KEY (order_id, order_item_id, payment_type)
);
";
