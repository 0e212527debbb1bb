use crate::models::{GroupKey, TradeTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Summary statistics for one (reporter, partner, flow) group across years
/// and commodities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub key: GroupKey,
    pub count: usize,
    pub first_year: i32,
    pub last_year: i32,
    pub total: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

/// Compute grouped statistics by (reporter_code, partner_code, flow).
///
/// Non-finite values are ignored. Groups are returned in key order.
pub fn grouped_summary(table: &TradeTable) -> Vec<Summary> {
    let mut groups: BTreeMap<GroupKey, Vec<(i32, f64)>> = BTreeMap::new();
    for r in table.iter().filter(|r| r.trade_value.is_finite()) {
        let key = GroupKey {
            reporter_code: r.reporter_code.clone(),
            partner_code: r.partner_code.clone(),
            flow: r.flow,
        };
        groups.entry(key).or_default().push((r.year, r.trade_value));
    }

    let mut out = Vec::new();
    for (key, obs) in groups {
        let mut vals: Vec<f64> = obs.iter().map(|(_, v)| *v).collect();
        vals.sort_by(f64::total_cmp);
        let count = vals.len();
        let total: f64 = vals.iter().sum();
        let median = if count % 2 == 1 {
            vals[count / 2]
        } else {
            (vals[count / 2 - 1] + vals[count / 2]) / 2.0
        };
        // groups only exist once a value was pushed, so count >= 1
        out.push(Summary {
            first_year: obs.iter().map(|(y, _)| *y).min().unwrap_or_default(),
            last_year: obs.iter().map(|(y, _)| *y).max().unwrap_or_default(),
            count,
            total,
            min: vals[0],
            max: vals[count - 1],
            mean: total / count as f64,
            median,
            key,
        });
    }
    out
}
