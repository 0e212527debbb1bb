use crate::models::{FlowType, PairKey, TradeRecord, TradeTable};
use ahash::AHashMap;
use log::debug;

/// Append a `NetExport` row for every export that has exactly one matching import.
///
/// Rows whose flow is neither `Export` nor `Import` are dropped first. An
/// export and an import match when they share (year, reporter, partner,
/// commodity). The derived row copies the export's descriptive fields and
/// carries `export - import` as its value. Exports with no import, or with
/// more than one, produce nothing.
///
/// The output keeps the surviving input rows in order, followed by the
/// derived rows in export order.
pub fn derive_net_exports(table: TradeTable) -> TradeTable {
    let mut rows: Vec<TradeRecord> = table
        .into_iter()
        .filter(|r| matches!(r.flow, FlowType::Export | FlowType::Import))
        .collect();

    // key -> (number of imports, value of the first one)
    let mut imports: AHashMap<PairKey, (usize, f64)> = AHashMap::new();
    for r in rows.iter().filter(|r| r.flow == FlowType::Import) {
        let slot = imports.entry(r.pair_key()).or_insert((0, r.trade_value));
        slot.0 += 1;
    }

    let derived: Vec<TradeRecord> = rows
        .iter()
        .filter(|r| r.flow == FlowType::Export)
        .filter_map(|export| {
            let key = export.pair_key();
            match imports.get(&key) {
                Some(&(1, import_value)) => Some(TradeRecord {
                    flow: FlowType::NetExport,
                    trade_value: export.trade_value - import_value,
                    ..export.clone()
                }),
                Some(&(n, _)) => {
                    debug!("skipping net export for {key:?}: {n} matching imports");
                    None
                }
                None => None,
            }
        })
        .collect();

    rows.extend(derived);
    TradeTable::from(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(flow: FlowType, partner: &str, value: f64) -> TradeRecord {
        TradeRecord {
            classification: "H4".into(),
            year: 2016,
            flow,
            reporter_code: "842".into(),
            reporter_name: "USA".into(),
            partner_code: partner.into(),
            partner_name: "Partner".into(),
            commodity_code: "TOTAL".into(),
            commodity_name: "All Commodities".into(),
            trade_value: value,
        }
    }

    #[test]
    fn re_flows_are_dropped() {
        let t = TradeTable::from(vec![
            rec(FlowType::Export, "124", 10.0),
            rec(FlowType::ReExport, "124", 3.0),
            rec(FlowType::ReImport, "124", 2.0),
        ]);
        let out = derive_net_exports(t);
        assert_eq!(out.len(), 1);
        assert_eq!(out.rows()[0].flow, FlowType::Export);
    }

    #[test]
    fn import_without_export_is_kept_but_not_paired() {
        let t = TradeTable::from(vec![rec(FlowType::Import, "124", 4.0)]);
        let out = derive_net_exports(t);
        assert_eq!(out.len(), 1);
        assert!(out.iter().all(|r| r.flow != FlowType::NetExport));
    }

    #[test]
    fn pairs_are_independent_per_partner() {
        let t = TradeTable::from(vec![
            rec(FlowType::Export, "124", 10.0),
            rec(FlowType::Import, "124", 4.0),
            rec(FlowType::Export, "484", 1.0),
            rec(FlowType::Import, "484", 6.5),
        ]);
        let out = derive_net_exports(t);
        let net: Vec<_> = out
            .iter()
            .filter(|r| r.flow == FlowType::NetExport)
            .map(|r| (r.partner_code.as_str(), r.trade_value))
            .collect();
        assert_eq!(net, vec![("124", 6.0), ("484", -5.5)]);
    }
}
