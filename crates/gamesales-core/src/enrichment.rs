use polars::prelude::*;

use crate::tables::{fact, games, sales};

/// Columns of an enriched sale, in output order.
pub const ENRICHED_SALE_COLUMNS: [&str; 13] = [
    sales::SALE_ID,
    sales::SALE_DATE,
    sales::GAME_ID,
    fact::GAME_TITLE,
    games::GENRE,
    games::PLATFORM,
    sales::QUANTITY,
    sales::UNIT_PRICE,
    sales::DISCOUNT_PERCENTAGE,
    sales::TOTAL_AMOUNT,
    sales::SALES_CHANNEL,
    sales::STORE_ID,
    sales::CUSTOMER_ID,
];

/// Attaches title, genre and platform to every sale whose game exists.
///
/// This is an inner join: a sale referencing an unknown `game_id` is dropped
/// from the result without any diagnostic.
pub fn enrich_sales(sale_rows: LazyFrame, game_rows: LazyFrame) -> LazyFrame {
    let game_lookup = game_rows.select([
        col(games::GAME_ID),
        col(games::TITLE).alias(fact::GAME_TITLE),
        col(games::GENRE),
        col(games::PLATFORM),
    ]);

    sale_rows
        .join(
            game_lookup,
            [col(sales::GAME_ID)],
            [col(games::GAME_ID)],
            JoinArgs::new(JoinType::Inner),
        )
        .select(columns(&ENRICHED_SALE_COLUMNS))
}

pub(crate) fn columns(names: &[&str]) -> Vec<Expr> {
    names.iter().map(|name| col(*name)).collect()
}
