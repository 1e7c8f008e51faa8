use shared::{Customer, Order, OrderItem, Payment, PipelineError, Product, Source};
use std::path::Path;
use tracing::info;

pub struct Sources {
    pub orders: Vec<Order>,
    pub items: Vec<OrderItem>,
    pub payments: Vec<Payment>,
    pub products: Vec<Product>,
    pub customers: Vec<Customer>,
}

pub fn load_sources(data_dir: &Path) -> Result<Sources, PipelineError> {
    info!("Loading CSV sources from {}", data_dir.display());

    let sources = Sources {
        orders: load_table(data_dir)?,
        items: load_table(data_dir)?,
        payments: load_table(data_dir)?,
        products: load_table(data_dir)?,
        customers: load_table(data_dir)?,
    };

    info!("All sources loaded");
    Ok(sources)
}

pub fn load_table<T: Source>(data_dir: &Path) -> Result<Vec<T>, PipelineError> {
    let path = data_dir.join(T::FILE_NAME);
    if !path.is_file() {
        return Err(PipelineError::MissingSource { table: T::TABLE, path });
    }

    let load_error = |message: String| PipelineError::Load { table: T::TABLE, message };

    let mut reader = csv::Reader::from_path(&path).map_err(|e| load_error(e.to_string()))?;
    let headers = reader.headers().map_err(|e| load_error(e.to_string()))?.clone();

    for column in T::COLUMNS {
        if !headers.iter().any(|h| h == *column) {
            return Err(PipelineError::Schema {
                table: T::TABLE,
                column: column.to_string(),
            });
        }
    }

    let mut rows = Vec::new();
    for (idx, record) in reader.deserialize::<T>().enumerate() {
        // Header is line 1.
        let row = record.map_err(|e| load_error(format!("line {}: {}", idx + 2, e)))?;
        rows.push(row);
    }

    info!("Loaded {} rows into '{}'", rows.len(), T::TABLE);
    Ok(rows)
}
