use shared::PipelineError;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::cleaner::{clean_orders, CleaningReport};
use crate::joiner::build_fact_table;
use crate::loader::load_sources;
use crate::models::{CategoryRevenue, CityCustomers, MeanDelivery, MonthlyRevenue};
use crate::persister::{PersistReport, Persister, Verification};
use crate::queries::{QueryEngine, QueryOutcome};
use crate::reporter::{
    render_monthly_revenue, render_top_categories, ChartOutcome, MONTHLY_REVENUE_CHART,
    TOP_CATEGORIES_CHART,
};

/// Everything a run needs, passed explicitly to each stage.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub data_dir: PathBuf,
    pub database_url: String,
    pub output_dir: PathBuf,
    pub strict_verification: bool,
    pub skip_etl: bool,
}

#[derive(Debug)]
pub struct EtlSummary {
    pub cleaning: CleaningReport,
    pub fact_rows: usize,
    pub duplicates_removed: usize,
    pub persisted: PersistReport,
}

#[derive(Debug)]
pub struct Analysis {
    pub monthly_revenue: QueryOutcome<MonthlyRevenue>,
    pub mean_delivery: QueryOutcome<MeanDelivery>,
    pub top_categories: QueryOutcome<CategoryRevenue>,
    pub top_cities: QueryOutcome<CityCustomers>,
}

#[derive(Debug)]
pub struct PipelineSummary {
    pub etl: Option<EtlSummary>,
    pub analysis: Analysis,
    pub revenue_chart: ChartOutcome,
    pub categories_chart: ChartOutcome,
}

pub fn run(ctx: &PipelineContext) -> Result<PipelineSummary, PipelineError> {
    let etl = if ctx.skip_etl {
        info!("Skipping ETL, analysing existing store {}", ctx.database_url);
        None
    } else {
        Some(run_etl(ctx)?)
    };

    let analysis = run_analysis(ctx);

    info!("Rendering charts into {}", ctx.output_dir.display());
    let revenue_chart = render_monthly_revenue(
        &analysis.monthly_revenue,
        &ctx.output_dir.join(MONTHLY_REVENUE_CHART),
    );
    let categories_chart = render_top_categories(
        &analysis.top_categories,
        &ctx.output_dir.join(TOP_CATEGORIES_CHART),
    );

    Ok(PipelineSummary {
        etl,
        analysis,
        revenue_chart,
        categories_chart,
    })
}

pub fn run_etl(ctx: &PipelineContext) -> Result<EtlSummary, PipelineError> {
    let mut sources = load_sources(&ctx.data_dir)?;

    let (cleaned, cleaning) = clean_orders(std::mem::take(&mut sources.orders));

    let fact = build_fact_table(&cleaned, &sources);

    let persisted = Persister::new(ctx.database_url.as_str()).persist(&fact.rows)?;
    check_verification(persisted.verification, ctx.strict_verification)?;

    Ok(EtlSummary {
        cleaning,
        fact_rows: fact.rows.len(),
        duplicates_removed: fact.duplicates_removed,
        persisted,
    })
}

/// A row count mismatch halts the run only when `strict` is set.
fn check_verification(verification: Verification, strict: bool) -> Result<(), PipelineError> {
    match verification {
        Verification::Matched { .. } => Ok(()),
        Verification::Mismatch { expected, actual } if strict => {
            Err(PipelineError::Verification { expected, actual })
        }
        Verification::Mismatch { .. } => {
            warn!("Continuing despite row count mismatch");
            Ok(())
        }
    }
}

/// Runs the four business queries. A failing query does not stop the others.
pub fn run_analysis(ctx: &PipelineContext) -> Analysis {
    let engine = QueryEngine::new(ctx.database_url.as_str());

    info!("Monthly revenue");
    let monthly_revenue = engine.monthly_revenue();
    for row in monthly_revenue.rows() {
        info!("  {}  {:.2}", row.month, row.revenue);
    }

    info!("Mean delivery time");
    let mean_delivery = engine.mean_delivery_days();
    for row in mean_delivery.rows() {
        match row.mean_delivery_days {
            Some(days) => info!("  {:.2} days", days),
            None => info!("  no delivery durations recorded"),
        }
    }

    info!("Top 10 product categories by revenue");
    let top_categories = engine.top_categories();
    for row in top_categories.rows() {
        info!("  {}  {:.2}", row.category, row.revenue);
    }

    info!("Top 10 cities by unique customers");
    let top_cities = engine.top_cities();
    for row in top_cities.rows() {
        info!("  {}  {}", row.city, row.customers);
    }

    Analysis {
        monthly_revenue,
        mean_delivery,
        top_categories,
        top_cities,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::connection::SimpleConnection;
    use diesel::prelude::*;
    use shared::{Customer, Order, OrderItem, Payment, Product, Source};
    use std::fs;
    use tempfile::TempDir;

    const ORDERS: &str = "\
order_id,customer_id,order_status,order_purchase_timestamp,order_approved_at,order_delivered_carrier_date,order_delivered_customer_date,order_estimated_delivery_date
o1,c1,delivered,2017-01-05 10:00:00,2017-01-05 11:00:00,2017-01-06 09:00:00,2017-01-12 15:00:00,2017-01-25 00:00:00
o2,c2,delivered,2017-01-12 08:30:00,2017-01-12 09:00:00,2017-01-13 10:00:00,2017-01-20 12:00:00,2017-02-01 00:00:00
o3,c3,delivered,2017-01-28 19:45:00,2017-01-28 20:00:00,2017-01-30 10:00:00,,2017-02-15 00:00:00
o4,c1,canceled,2017-02-02 10:00:00,,,,2017-02-20 00:00:00
o5,c2,delivered,2017-02-03 10:00:00,2017-02-03 10:30:00,,2017-02-10 10:00:00,2017-02-25 00:00:00
";

    const ITEMS: &str = "\
order_id,order_item_id,product_id,seller_id,shipping_limit_date,price,freight_value
o1,1,p1,s1,2017-01-09 10:00:00,8.00,2.00
o2,1,p2,s1,2017-01-16 08:30:00,15.00,5.00
o3,1,p1,s2,2017-02-01 19:45:00,25.00,5.00
o4,1,p1,s2,2017-02-06 10:00:00,99.00,1.00
";

    const PAYMENTS: &str = "\
order_id,payment_sequential,payment_type,payment_installments,payment_value
o1,1,credit_card,1,10.00
o2,1,boleto,1,20.00
o3,1,credit_card,3,30.00
o4,1,voucher,1,100.00
o5,1,boleto,1,55.00
";

    const PRODUCTS: &str = "\
product_id,product_category_name,product_name_lenght,product_description_lenght,product_photos_qty,product_weight_g,product_length_cm,product_height_cm,product_width_cm
p1,esporte_lazer,40,287,1,225,16,10,14
p2,,,,,1000,30,18,20
";

    const CUSTOMERS: &str = "\
customer_id,customer_unique_id,customer_zip_code_prefix,customer_city,customer_state
c1,u1,01151,sao paulo,SP
c2,u2,13056,campinas,SP
c3,u3,01151,sao paulo,SP
";

    fn write_sources(dir: &TempDir) {
        fs::write(dir.path().join(Order::FILE_NAME), ORDERS).unwrap();
        fs::write(dir.path().join(OrderItem::FILE_NAME), ITEMS).unwrap();
        fs::write(dir.path().join(Payment::FILE_NAME), PAYMENTS).unwrap();
        fs::write(dir.path().join(Product::FILE_NAME), PRODUCTS).unwrap();
        fs::write(dir.path().join(Customer::FILE_NAME), CUSTOMERS).unwrap();
    }

    fn context(dir: &TempDir) -> PipelineContext {
        PipelineContext {
            data_dir: dir.path().to_path_buf(),
            database_url: dir.path().join("ecommerce_analysis.db").to_string_lossy().into_owned(),
            output_dir: dir.path().to_path_buf(),
            strict_verification: true,
            skip_etl: false,
        }
    }

    #[test]
    fn end_to_end_run_answers_all_questions() {
        let dir = TempDir::new().unwrap();
        write_sources(&dir);

        let summary = run(&context(&dir)).unwrap();

        let etl = summary.etl.unwrap();
        assert_eq!(etl.cleaning.removed, 1);
        // o5 has no item and o4 is not delivered.
        assert_eq!(etl.fact_rows, 3);
        assert_eq!(etl.persisted.verification, Verification::Matched { rows: 3 });

        assert_eq!(
            summary.analysis.monthly_revenue.rows(),
            &[MonthlyRevenue { month: "2017-01".to_string(), revenue: 60.0 }]
        );
        assert_eq!(
            summary.analysis.mean_delivery.rows(),
            &[MeanDelivery { mean_delivery_days: Some(7.5) }]
        );
        assert_eq!(
            summary.analysis.top_categories.rows(),
            &[CategoryRevenue { category: "esporte_lazer".to_string(), revenue: 40.0 }]
        );
        assert_eq!(
            summary.analysis.top_cities.rows(),
            &[
                CityCustomers { city: "sao paulo".to_string(), customers: 2 },
                CityCustomers { city: "campinas".to_string(), customers: 1 },
            ]
        );

        assert!(matches!(summary.revenue_chart, ChartOutcome::Saved(_)));
        assert!(matches!(summary.categories_chart, ChartOutcome::Saved(_)));
        assert!(dir.path().join(MONTHLY_REVENUE_CHART).exists());
        assert!(dir.path().join(TOP_CATEGORIES_CHART).exists());
    }

    #[test]
    fn missing_source_halts_before_store_is_touched() {
        let dir = TempDir::new().unwrap();
        write_sources(&dir);
        fs::remove_file(dir.path().join(Customer::FILE_NAME)).unwrap();
        let ctx = context(&dir);

        let result = run(&ctx);

        assert!(matches!(
            result,
            Err(PipelineError::MissingSource { table: "customers", .. })
        ));
        assert!(!dir.path().join("ecommerce_analysis.db").exists());
        assert!(!dir.path().join(MONTHLY_REVENUE_CHART).exists());
    }

    #[test]
    fn skip_etl_reuses_existing_store() {
        let dir = TempDir::new().unwrap();
        write_sources(&dir);
        let mut ctx = context(&dir);
        run(&ctx).unwrap();

        for name in [Order::FILE_NAME, OrderItem::FILE_NAME] {
            fs::remove_file(dir.path().join(name)).unwrap();
        }
        ctx.skip_etl = true;
        let summary = run(&ctx).unwrap();

        assert!(summary.etl.is_none());
        assert_eq!(summary.analysis.monthly_revenue.rows().len(), 1);
    }

    #[test]
    fn mismatch_is_fatal_only_when_strict() {
        let mismatch = Verification::Mismatch { expected: 3, actual: 2 };

        assert!(check_verification(mismatch, false).is_ok());
        assert!(matches!(
            check_verification(mismatch, true),
            Err(PipelineError::Verification { expected: 3, actual: 2 })
        ));
        assert!(check_verification(Verification::Matched { rows: 3 }, true).is_ok());
    }

    #[test]
    fn one_failing_query_leaves_the_others_answered() {
        let dir = TempDir::new().unwrap();
        write_sources(&dir);
        let ctx = context(&dir);
        run(&ctx).unwrap();

        let mut conn = SqliteConnection::establish(&ctx.database_url).unwrap();
        conn.batch_execute(
            "ALTER TABLE master_table RENAME COLUMN customer_unique_id TO unique_customer",
        )
        .unwrap();
        drop(conn);

        let analysis = run_analysis(&ctx);

        assert!(analysis.top_cities.is_failed());
        assert_eq!(analysis.monthly_revenue.rows().len(), 1);
        assert_eq!(
            analysis.mean_delivery.rows(),
            &[MeanDelivery { mean_delivery_days: Some(7.5) }]
        );
        assert_eq!(analysis.top_categories.rows().len(), 1);
    }

    #[test]
    fn analysis_without_store_fails_each_query_independently() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir);
        ctx.skip_etl = true;

        let summary = run(&ctx).unwrap();

        assert!(summary.analysis.monthly_revenue.is_failed());
        assert!(summary.analysis.mean_delivery.is_failed());
        assert!(summary.analysis.top_categories.is_failed());
        assert!(summary.analysis.top_cities.is_failed());
        assert!(matches!(summary.revenue_chart, ChartOutcome::Skipped(_)));
        assert!(matches!(summary.categories_chart, ChartOutcome::Skipped(_)));
    }
}
