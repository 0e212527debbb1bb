use comtrade_rs::models::{FlowType, GroupKey, TradeRecord, TradeTable};
use comtrade_rs::stats::grouped_summary;

fn rec(partner: &str, flow: FlowType, year: i32, v: f64) -> TradeRecord {
    TradeRecord {
        classification: "HS".into(),
        year,
        flow,
        reporter_code: "276".into(),
        reporter_name: "Germany".into(),
        partner_code: partner.into(),
        partner_name: "Partner".into(),
        commodity_code: "TOTAL".into(),
        commodity_name: "All Commodities".into(),
        trade_value: v,
    }
}

#[test]
fn grouped_stats_per_partner_and_flow() {
    let table = TradeTable::from(vec![
        rec("250", FlowType::Export, 2018, 1.0),
        rec("250", FlowType::Export, 2019, 2.0),
        rec("250", FlowType::Export, 2020, 3.0),
        rec("250", FlowType::Export, 2021, 4.0),
        rec("250", FlowType::Import, 2018, 10.0),
        rec("250", FlowType::Import, 2019, f64::NAN),
        rec("250", FlowType::Import, 2020, 30.0),
    ]);
    let got = grouped_summary(&table);
    assert_eq!(got.len(), 2);

    let a = &got[0];
    assert_eq!(
        a.key,
        GroupKey {
            reporter_code: "276".into(),
            partner_code: "250".into(),
            flow: FlowType::Import,
        }
    );
    assert_eq!(a.count, 2);
    assert_eq!((a.first_year, a.last_year), (2018, 2020));
    assert_eq!(a.total, 40.0);
    assert_eq!(a.median, 20.0);

    let b = &got[1];
    assert_eq!(b.key.flow, FlowType::Export);
    assert_eq!(b.count, 4);
    assert_eq!(b.min, 1.0);
    assert_eq!(b.max, 4.0);
    assert!((b.mean - 2.5).abs() < 1e-9);
    assert!((b.median - 2.5).abs() < 1e-9);
}
