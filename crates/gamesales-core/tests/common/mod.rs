#![allow(dead_code)]

use std::fs;
use std::path::Path;

use gamesales_core::ingestion::{assemble, parse_source};
use gamesales_core::tables::{RawTables, Source};

pub const GAMES_CSV: &str = "\
game_id,title,genre,platform,publisher,age_rating,release_date,base_price
10,X,RPG,PC,Studio A,PEGI 16,2023-11-01,59.99
11,Y,Action,PS5,Studio B,PEGI 18,2022-05-20,69.99
12,Z,RPG,Switch,Studio A,PEGI 7,2021-09-10,49.99
";

pub const CUSTOMERS_CSV: &str = "\
customer_id,segment,loyalty_status,age_group,country
100,core,gold,18-25,US
101,casual,silver,26-35,FR
102,core,gold,18-25,US
";

pub const STORES_CSV: &str = "\
store_id,store_name,country
1,Downtown Paris,FR
2,Berlin Mitte,DE
";

// Sale 5 references an unknown game, sale 6 an unknown store and sale 7 an
// unknown customer.
pub const SALES_CSV: &str = "\
sale_id,sale_date,game_id,quantity,unit_price,discount_percentage,total_amount,sales_channel,store_id,customer_id
1,2024-03-15,10,1,59.99,0,59.99,online,,100
2,2024-03-20,11,2,69.99,10,125.98,store,1,101
3,2024-03-22,10,1,59.99,20,47.99,store,2,102
4,2024-04-02,12,1,49.99,0,49.99,online,1,100
5,2024-04-05,99,1,10.0,0,10.0,online,,100
6,2024-04-09,12,1,49.99,0,49.99,store,42,102
7,2024-04-10,10,1,59.99,0,59.99,online,,999
";

pub fn raw_tables(games: &str, sales: &str, customers: &str, stores: &str) -> RawTables {
    let parse = |source: Source, csv: &str| {
        parse_source(source, csv.as_bytes().to_vec(), Some(100)).expect("parse fixture")
    };
    assemble(
        parse(Source::Games, games),
        parse(Source::Sales, sales),
        parse(Source::Customers, customers),
        parse(Source::Stores, stores),
    )
    .expect("assemble fixtures")
}

pub fn sample_tables() -> RawTables {
    raw_tables(GAMES_CSV, SALES_CSV, CUSTOMERS_CSV, STORES_CSV)
}

pub fn write_sources(dir: &Path, games: &str, sales: &str, customers: &str, stores: &str) {
    fs::create_dir_all(dir).expect("create input dir");
    fs::write(dir.join("games.csv"), games).expect("write games");
    fs::write(dir.join("sales.csv"), sales).expect("write sales");
    fs::write(dir.join("customers.csv"), customers).expect("write customers");
    fs::write(dir.join("stores.csv"), stores).expect("write stores");
}

pub fn approx_eq(left: f64, right: f64) -> bool {
    (left - right).abs() < 1e-9
}
