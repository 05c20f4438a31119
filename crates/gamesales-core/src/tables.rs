//! Column names and relation handles shared by every stage.

use polars::prelude::DataFrame;

use crate::error::{PipelineError, Result};

pub mod games {
    pub const GAME_ID: &str = "game_id";
    pub const TITLE: &str = "title";
    pub const GENRE: &str = "genre";
    pub const PLATFORM: &str = "platform";
    pub const PUBLISHER: &str = "publisher";
    pub const AGE_RATING: &str = "age_rating";
    pub const RELEASE_DATE: &str = "release_date";
    pub const BASE_PRICE: &str = "base_price";
}

pub mod sales {
    pub const SALE_ID: &str = "sale_id";
    pub const SALE_DATE: &str = "sale_date";
    pub const GAME_ID: &str = "game_id";
    pub const QUANTITY: &str = "quantity";
    pub const UNIT_PRICE: &str = "unit_price";
    pub const DISCOUNT_PERCENTAGE: &str = "discount_percentage";
    pub const TOTAL_AMOUNT: &str = "total_amount";
    pub const SALES_CHANNEL: &str = "sales_channel";
    pub const STORE_ID: &str = "store_id";
    pub const CUSTOMER_ID: &str = "customer_id";

    /// Channel value routing location fields through the Store dimension.
    pub const STORE_CHANNEL: &str = "store";
}

pub mod customers {
    pub const CUSTOMER_ID: &str = "customer_id";
    pub const SEGMENT: &str = "segment";
    pub const LOYALTY_STATUS: &str = "loyalty_status";
    pub const AGE_GROUP: &str = "age_group";
    pub const COUNTRY: &str = "country";
}

pub mod stores {
    pub const STORE_ID: &str = "store_id";
    pub const STORE_NAME: &str = "store_name";
    pub const COUNTRY: &str = "country";
}

/// Derived columns of the enriched and fact relations.
pub mod fact {
    pub const GAME_TITLE: &str = "game_title";
    pub const STORE_NAME: &str = "store_name";
    pub const SALE_COUNTRY: &str = "sale_country";

    /// Label used for every sale that did not happen in a physical store.
    pub const ONLINE_LABEL: &str = "Online";
}

/// One of the four raw CSV extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Games,
    Sales,
    Customers,
    Stores,
}

impl Source {
    pub fn name(self) -> &'static str {
        match self {
            Source::Games => "games",
            Source::Sales => "sales",
            Source::Customers => "customers",
            Source::Stores => "stores",
        }
    }

    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            Source::Games => &[
                games::GAME_ID,
                games::TITLE,
                games::GENRE,
                games::PLATFORM,
                games::PUBLISHER,
                games::AGE_RATING,
                games::RELEASE_DATE,
                games::BASE_PRICE,
            ],
            Source::Sales => &[
                sales::SALE_ID,
                sales::SALE_DATE,
                sales::GAME_ID,
                sales::QUANTITY,
                sales::UNIT_PRICE,
                sales::DISCOUNT_PERCENTAGE,
                sales::TOTAL_AMOUNT,
                sales::SALES_CHANNEL,
                sales::STORE_ID,
                sales::CUSTOMER_ID,
            ],
            Source::Customers => &[
                customers::CUSTOMER_ID,
                customers::SEGMENT,
                customers::LOYALTY_STATUS,
                customers::AGE_GROUP,
                customers::COUNTRY,
            ],
            Source::Stores => &[stores::STORE_ID, stores::STORE_NAME, stores::COUNTRY],
        }
    }
}

/// The six persisted outputs, in the order they are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputTable {
    GameSalesFull,
    MonthlyPlatformSales,
    GamePerformance,
    CustomerSegments,
    ChannelPerformance,
    GenreTrends,
}

impl OutputTable {
    pub fn table_name(self) -> &'static str {
        match self {
            OutputTable::GameSalesFull => "game_sales_full",
            OutputTable::MonthlyPlatformSales => "monthly_platform_sales",
            OutputTable::GamePerformance => "game_performance",
            OutputTable::CustomerSegments => "customer_segments",
            OutputTable::ChannelPerformance => "channel_performance",
            OutputTable::GenreTrends => "genre_trends",
        }
    }

    pub fn views() -> [OutputTable; 5] {
        [
            OutputTable::MonthlyPlatformSales,
            OutputTable::GamePerformance,
            OutputTable::CustomerSegments,
            OutputTable::ChannelPerformance,
            OutputTable::GenreTrends,
        ]
    }
}

/// The four ingested relations.
#[derive(Debug, Clone)]
pub struct RawTables {
    pub games: DataFrame,
    pub sales: DataFrame,
    pub customers: DataFrame,
    pub stores: DataFrame,
}

pub fn require_columns(df: &DataFrame, columns: &[&str], stage: &'static str) -> Result<()> {
    for name in columns {
        if df.column(name).is_err() {
            return Err(PipelineError::SchemaMismatch {
                stage,
                message: format!("missing expected column `{name}`"),
            });
        }
    }
    Ok(())
}

/// Fails when a foreign key and the key it references were inferred with
/// different types, which would make the join between them invalid.
pub fn require_matching_key(
    left: &DataFrame,
    left_key: &str,
    right: &DataFrame,
    right_key: &str,
    stage: &'static str,
) -> Result<()> {
    let left_dtype = left
        .column(left_key)
        .map_err(|err| PipelineError::from_polars(stage, err))?
        .dtype();
    let right_dtype = right
        .column(right_key)
        .map_err(|err| PipelineError::from_polars(stage, err))?
        .dtype();

    if left_dtype != right_dtype {
        return Err(PipelineError::SchemaMismatch {
            stage,
            message: format!(
                "join key `{left_key}` is {left_dtype} but `{right_key}` is {right_dtype}"
            ),
        });
    }
    Ok(())
}
