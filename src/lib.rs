//! comtrade_rs
//!
//! A small Rust library for retrieving UN Comtrade trade statistics, reshaping
//! them into a tidy table, and deriving bilateral net exports. Pairs with the
//! `comtrade` CLI.
//!
//! ### Features
//! - Build API calls from a typed query (reporters, partners, commodities, years),
//!   split into groups of at most five years per call
//! - Fetch and concatenate the results into one [`TradeTable`]
//! - Derive `Net Export` rows from matching export/import pairs
//! - Save as CSV or JSON; quick grouped summaries
//!
//! ### Example
//! ```no_run
//! use comtrade_rs::{Client, TradeQuery, YearRange};
//!
//! let client = Client::default();
//! let query = TradeQuery::new(["842", "124"], ["0"], ["TOTAL"], YearRange::new(2012, 2018));
//! let table = client.fetch_report(&query)?;
//! comtrade_rs::storage::save_csv(&table, "trade.csv")?;
//! let stats = comtrade_rs::stats::grouped_summary(&table);
//! println!("{:#?}", stats);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod api;
pub mod models;
pub mod net_exports;
pub mod query;
pub mod stats;
pub mod storage;

pub use api::Client;
pub use models::{FlowType, GroupKey, PairKey, TradeRecord, TradeTable};
pub use net_exports::derive_net_exports;
pub use query::{QueryError, TradeQuery, YearRange};
