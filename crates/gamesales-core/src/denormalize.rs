use polars::prelude::*;

use crate::enrichment::columns;
use crate::tables::{customers, fact, games, sales, stores};

const STORE_LOOKUP_NAME: &str = "store_lookup_name";
const STORE_LOOKUP_COUNTRY: &str = "store_lookup_country";

/// Columns of the fact table, in output order.
pub const FULL_SALE_COLUMNS: [&str; 22] = [
    sales::SALE_ID,
    sales::SALE_DATE,
    sales::GAME_ID,
    fact::GAME_TITLE,
    games::GENRE,
    games::PLATFORM,
    games::PUBLISHER,
    games::AGE_RATING,
    games::RELEASE_DATE,
    games::BASE_PRICE,
    sales::QUANTITY,
    sales::UNIT_PRICE,
    sales::DISCOUNT_PERCENTAGE,
    sales::TOTAL_AMOUNT,
    sales::SALES_CHANNEL,
    fact::STORE_NAME,
    fact::SALE_COUNTRY,
    customers::CUSTOMER_ID,
    customers::SEGMENT,
    customers::LOYALTY_STATUS,
    customers::AGE_GROUP,
    customers::COUNTRY,
];

/// Predicate selecting sales made through a physical store. A null channel
/// evaluates as not-a-store.
pub fn is_store_sale() -> Expr {
    col(sales::SALES_CHANNEL).eq(lit(sales::STORE_CHANNEL))
}

/// Joins enriched sales to the game, customer and store dimensions and
/// resolves the channel-dependent location fields.
///
/// Game and customer joins are inner; the store join is left-optional. For a
/// store sale whose `store_id` has no matching store, both `store_name` and
/// `sale_country` come out null.
pub fn denormalize(
    enriched: LazyFrame,
    game_rows: LazyFrame,
    customer_rows: LazyFrame,
    store_rows: LazyFrame,
) -> LazyFrame {
    let game_details = game_rows.select([
        col(games::GAME_ID),
        col(games::PUBLISHER),
        col(games::AGE_RATING),
        col(games::RELEASE_DATE),
        col(games::BASE_PRICE),
    ]);
    let customer_dim = customer_rows.select([
        col(customers::CUSTOMER_ID),
        col(customers::SEGMENT),
        col(customers::LOYALTY_STATUS),
        col(customers::AGE_GROUP),
        col(customers::COUNTRY),
    ]);
    let store_dim = store_rows.select([
        col(stores::STORE_ID),
        col(stores::STORE_NAME).alias(STORE_LOOKUP_NAME),
        col(stores::COUNTRY).alias(STORE_LOOKUP_COUNTRY),
    ]);

    enriched
        .join(
            game_details,
            [col(sales::GAME_ID)],
            [col(games::GAME_ID)],
            JoinArgs::new(JoinType::Inner),
        )
        .join(
            customer_dim,
            [col(sales::CUSTOMER_ID)],
            [col(customers::CUSTOMER_ID)],
            JoinArgs::new(JoinType::Inner),
        )
        .join(
            store_dim,
            [col(sales::STORE_ID)],
            [col(stores::STORE_ID)],
            JoinArgs::new(JoinType::Left),
        )
        .with_columns([
            when(is_store_sale())
                .then(col(STORE_LOOKUP_NAME))
                .otherwise(lit(fact::ONLINE_LABEL))
                .alias(fact::STORE_NAME),
            when(is_store_sale())
                .then(col(STORE_LOOKUP_COUNTRY))
                .otherwise(col(customers::COUNTRY))
                .alias(fact::SALE_COUNTRY),
        ])
        .select(columns(&FULL_SALE_COLUMNS))
}

/// Number of store sales whose store could not be resolved.
pub fn unresolved_store_sales(full_sales: &DataFrame) -> PolarsResult<usize> {
    let flagged = full_sales
        .clone()
        .lazy()
        .filter(is_store_sale().and(col(fact::STORE_NAME).is_null()))
        .collect()?;
    Ok(flagged.height())
}
