use std::collections::{HashMap, HashSet};
use tracing::info;

use crate::cleaner::CleanOrder;
use crate::loader::Sources;
use crate::models::FactRow;

pub struct FactTable {
    pub rows: Vec<FactRow>,
    pub joined: usize,
    pub duplicates_removed: usize,
}

/// Joins cleaned orders with items, products, payments and customers (inner
/// joins, in that order) and drops rows repeating
/// `(order_id, order_item_id, payment_type)`.
pub fn build_fact_table(orders: &[CleanOrder], sources: &Sources) -> FactTable {
    info!("Joining orders with items, products, payments and customers");

    let orders: Vec<&CleanOrder> = orders.iter().collect();
    let with_items = inner_join(
        orders,
        &sources.items,
        |o| o.order_id.as_str(),
        |i| i.order_id.as_str(),
    );
    let with_products = inner_join(
        with_items,
        &sources.products,
        |(_, item)| item.product_id.as_str(),
        |p| p.product_id.as_str(),
    );
    let with_payments = inner_join(
        with_products,
        &sources.payments,
        |((order, _), _)| order.order_id.as_str(),
        |p| p.order_id.as_str(),
    );
    let joined = inner_join(
        with_payments,
        &sources.customers,
        |(((order, _), _), _)| order.customer_id.as_str(),
        |c| c.customer_id.as_str(),
    );
    let joined_count = joined.len();

    let mut seen = HashSet::new();
    let rows: Vec<FactRow> = joined
        .into_iter()
        .filter(|&((((order, item), _), payment), _)| {
            seen.insert((
                order.order_id.as_str(),
                item.order_item_id,
                payment.payment_type.as_str(),
            ))
        })
        .map(|((((order, item), product), payment), customer)| {
            FactRow::from_parts(order, item, product, payment, customer)
        })
        .collect();

    let duplicates_removed = joined_count - rows.len();
    info!(
        "Fact table built: {} joined rows, {} duplicates removed, {} final rows",
        joined_count,
        duplicates_removed,
        rows.len()
    );

    FactTable {
        rows,
        joined: joined_count,
        duplicates_removed,
    }
}

/// Hash inner join. Output keeps the order of `left`, and for each left row
/// the order of its matches in `right`.
fn inner_join<'a, L, R, FL, FR>(
    left: Vec<L>,
    right: &'a [R],
    left_key: FL,
    right_key: FR,
) -> Vec<(L, &'a R)>
where
    L: Copy,
    FL: Fn(L) -> &'a str,
    FR: Fn(&'a R) -> &'a str,
{
    let mut index: HashMap<&'a str, Vec<&'a R>> = HashMap::new();
    for row in right {
        index.entry(right_key(row)).or_default().push(row);
    }

    let mut joined = Vec::new();
    for row in left {
        if let Some(matches) = index.get(left_key(row)) {
            joined.extend(matches.iter().map(|m| (row, *m)));
        }
    }
    joined
}
