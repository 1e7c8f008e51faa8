use diesel::prelude::*;
use diesel::query_builder::SqlQuery;
use diesel::sqlite::Sqlite;
use shared::PipelineError;
use std::path::Path;
use tracing::error;

use crate::models::{CategoryRevenue, CityCustomers, MeanDelivery, MonthlyRevenue};

pub const MONTHLY_REVENUE: &str = "
SELECT
    strftime('%Y-%m', purchase_month) AS month,
    SUM(payment_value) AS revenue
FROM master_table
WHERE purchase_month IS NOT NULL
GROUP BY month
ORDER BY month ASC";

pub const MEAN_DELIVERY_DAYS: &str = "
SELECT AVG(delivery_duration_days) AS mean_delivery_days
FROM master_table";

pub const TOP_CATEGORIES: &str = "
SELECT
    product_category_name AS category,
    SUM(payment_value) AS revenue
FROM master_table
WHERE product_category_name IS NOT NULL
GROUP BY product_category_name
ORDER BY revenue DESC
LIMIT 10";

pub const TOP_CITIES: &str = "
SELECT
    customer_city AS city,
    COUNT(DISTINCT customer_unique_id) AS customers
FROM master_table
GROUP BY customer_city
ORDER BY customers DESC
LIMIT 10";

/// Result of a query. `Rows` may be empty; `Failed` means the query never
/// produced a result set.
#[derive(Debug)]
pub enum QueryOutcome<R> {
    Rows(Vec<R>),
    Failed(PipelineError),
}

impl<R> QueryOutcome<R> {
    /// The returned rows, or an empty slice if the query failed.
    pub fn rows(&self) -> &[R] {
        match self {
            QueryOutcome::Rows(rows) => rows,
            QueryOutcome::Failed(_) => &[],
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, QueryOutcome::Failed(_))
    }
}

pub struct QueryEngine {
    database_url: String,
}

impl QueryEngine {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self { database_url: database_url.into() }
    }

    /// Runs `sql` on a fresh connection. Errors are logged and returned as
    /// `QueryOutcome::Failed`, never propagated.
    pub fn run_query<R>(&self, sql: &str) -> QueryOutcome<R>
    where
        R: QueryableByName<Sqlite> + 'static,
    {
        match self.load::<R>(diesel::sql_query(sql)) {
            Ok(rows) => QueryOutcome::Rows(rows),
            Err(e) => {
                error!("Error running query: {}", e);
                QueryOutcome::Failed(PipelineError::Query(e.to_string()))
            }
        }
    }

    fn load<R>(&self, query: SqlQuery) -> Result<Vec<R>, PipelineError>
    where
        R: QueryableByName<Sqlite> + 'static,
    {
        let mut conn = self.connect()?;
        let rows = query.load::<R>(&mut conn)?;
        Ok(rows)
    }

    /// Opens the store without creating it; analysis never writes.
    fn connect(&self) -> Result<SqliteConnection, PipelineError> {
        if !Path::new(&self.database_url).is_file() {
            return Err(diesel::ConnectionError::BadConnection(format!(
                "no store at {}",
                self.database_url
            ))
            .into());
        }
        Ok(SqliteConnection::establish(&self.database_url)?)
    }

    pub fn monthly_revenue(&self) -> QueryOutcome<MonthlyRevenue> {
        self.run_query(MONTHLY_REVENUE)
    }

    pub fn mean_delivery_days(&self) -> QueryOutcome<MeanDelivery> {
        self.run_query(MEAN_DELIVERY_DAYS)
    }

    pub fn top_categories(&self) -> QueryOutcome<CategoryRevenue> {
        self.run_query(TOP_CATEGORIES)
    }

    pub fn top_cities(&self) -> QueryOutcome<CityCustomers> {
        self.run_query(TOP_CITIES)
    }
}
