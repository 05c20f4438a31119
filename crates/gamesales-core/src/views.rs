//! The five aggregated views derived from the fact table.
//!
//! Every view groups with a stable key order and sorts with `maintain_order`,
//! so identical input always yields identically ordered output.

use polars::prelude::*;

use crate::denormalize::is_store_sale;
use crate::tables::{customers, fact, games, sales, OutputTable};

pub const MONTH: &str = "month";
pub const NUM_SALES: &str = "num_sales";
pub const TOTAL_REVENUE: &str = "total_revenue";
pub const AVG_SALE_VALUE: &str = "avg_sale_value";
pub const UNITS_SOLD: &str = "units_sold";
pub const AVG_DISCOUNT: &str = "avg_discount";
pub const NUM_CUSTOMERS: &str = "num_customers";
pub const NUM_TRANSACTIONS: &str = "num_transactions";
pub const TOTAL_SPENT: &str = "total_spent";
pub const AVG_SPENT_PER_CUSTOMER: &str = "avg_spent_per_customer";
pub const STORE_OR_ONLINE: &str = "store_or_online";
pub const AVG_TRANSACTION_VALUE: &str = "avg_transaction_value";

pub type ViewFn = fn(LazyFrame) -> LazyFrame;

/// `sale_date` rendered as `yyyy-MM`.
pub fn month_expr() -> Expr {
    col(sales::SALE_DATE).dt().strftime("%Y-%m").alias(MONTH)
}

/// Distinct non-null values, as SQL `count(distinct ..)` counts them.
fn distinct_values(column: &str) -> Expr {
    col(column).drop_nulls().n_unique()
}

fn distinct_count(column: &str) -> Expr {
    distinct_values(column).cast(DataType::Int64)
}

/// Sum of `total_amount`; null when the group has no non-null amount.
fn revenue() -> Expr {
    when(col(sales::TOTAL_AMOUNT).count().gt(lit(0)))
        .then(col(sales::TOTAL_AMOUNT).sum())
        .otherwise(lit(NULL))
}

fn ratio(numerator: Expr, denominator: Expr) -> Expr {
    numerator.cast(DataType::Float64) / denominator.cast(DataType::Float64)
}

fn descending(column: &str) -> (Vec<PlSmallStr>, SortMultipleOptions) {
    (
        vec![column.into()],
        SortMultipleOptions::default()
            .with_order_descending(true)
            .with_nulls_last(true)
            .with_maintain_order(true),
    )
}

pub fn monthly_platform_sales(full_sales: LazyFrame) -> LazyFrame {
    full_sales
        .group_by_stable([month_expr(), col(games::PLATFORM)])
        .agg([
            distinct_count(sales::SALE_ID).alias(NUM_SALES),
            revenue().alias(TOTAL_REVENUE),
            col(sales::TOTAL_AMOUNT).mean().alias(AVG_SALE_VALUE),
        ])
        .sort(
            [MONTH, games::PLATFORM],
            SortMultipleOptions::default().with_maintain_order(true),
        )
}

pub fn game_performance(full_sales: LazyFrame) -> LazyFrame {
    let (by, options) = descending(TOTAL_REVENUE);
    full_sales
        .group_by_stable([
            col(sales::GAME_ID),
            col(fact::GAME_TITLE),
            col(games::GENRE),
            col(games::PLATFORM),
            col(games::PUBLISHER),
        ])
        .agg([
            distinct_count(sales::SALE_ID).alias(NUM_SALES),
            col(sales::QUANTITY).sum().alias(UNITS_SOLD),
            revenue().alias(TOTAL_REVENUE),
            col(sales::DISCOUNT_PERCENTAGE).mean().alias(AVG_DISCOUNT),
        ])
        .sort(by, options)
}

pub fn customer_segments(full_sales: LazyFrame) -> LazyFrame {
    let (by, options) = descending(TOTAL_SPENT);
    full_sales
        .group_by_stable([
            col(customers::SEGMENT),
            col(customers::LOYALTY_STATUS),
            col(customers::AGE_GROUP),
            col(customers::COUNTRY),
        ])
        .agg([
            distinct_count(customers::CUSTOMER_ID).alias(NUM_CUSTOMERS),
            distinct_count(sales::SALE_ID).alias(NUM_TRANSACTIONS),
            revenue().alias(TOTAL_SPENT),
            ratio(revenue(), distinct_values(customers::CUSTOMER_ID))
                .alias(AVG_SPENT_PER_CUSTOMER),
        ])
        .sort(by, options)
}

pub fn channel_performance(full_sales: LazyFrame) -> LazyFrame {
    let (by, options) = descending(TOTAL_REVENUE);
    full_sales
        .group_by_stable([
            col(sales::SALES_CHANNEL),
            when(is_store_sale())
                .then(col(fact::STORE_NAME))
                .otherwise(lit(fact::ONLINE_LABEL))
                .alias(STORE_OR_ONLINE),
        ])
        .agg([
            distinct_count(sales::SALE_ID).alias(NUM_SALES),
            revenue().alias(TOTAL_REVENUE),
            ratio(revenue(), distinct_values(sales::SALE_ID)).alias(AVG_TRANSACTION_VALUE),
        ])
        .sort(by, options)
}

pub fn genre_trends(full_sales: LazyFrame) -> LazyFrame {
    full_sales
        .group_by_stable([month_expr(), col(games::GENRE)])
        .agg([
            distinct_count(sales::SALE_ID).alias(NUM_SALES),
            revenue().alias(TOTAL_REVENUE),
        ])
        .sort(
            [MONTH, TOTAL_REVENUE],
            SortMultipleOptions::default()
                .with_order_descending_multi([false, true])
                .with_nulls_last_multi([false, true])
                .with_maintain_order(true),
        )
}

/// The five views with their builders, in output order.
pub fn all_views() -> Vec<(OutputTable, ViewFn)> {
    vec![
        (OutputTable::MonthlyPlatformSales, monthly_platform_sales as ViewFn),
        (OutputTable::GamePerformance, game_performance),
        (OutputTable::CustomerSegments, customer_segments),
        (OutputTable::ChannelPerformance, channel_performance),
        (OutputTable::GenreTrends, genre_trends),
    ]
}
