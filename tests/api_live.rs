//! Live API tests. Run with: `cargo test --features online --test api_live -- --nocapture`
#![cfg(feature = "online")]

use comtrade_rs::{Client, FlowType, TradeQuery, YearRange};

#[test]
fn fetch_usa_canada_totals() {
    let client = Client::default();
    let query = TradeQuery::new(["842"], ["124"], ["TOTAL"], YearRange::new(2016, 2018));
    let table = client.fetch_report(&query).unwrap();
    // The public endpoint may throttle anonymous calls; an empty result is
    // acceptable, a malformed one is not.
    for r in table.iter() {
        assert!(matches!(
            r.flow,
            FlowType::Export | FlowType::Import | FlowType::NetExport
        ));
        assert_eq!(r.reporter_code, "842");
    }
}
