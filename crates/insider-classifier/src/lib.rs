use currency_utils::safe_number;
use screener_core::{InsiderActivitySummary, InsiderHeadline};
use serde_json::{Map, Value};

// Two historical key schemes per logical quantity; scheme one wins when
// its key is present at all.
const BUY_KEYS: [&str; 2] = ["total_buy_trades", "buys_count"];
const SELL_KEYS: [&str; 2] = ["total_sell_trades", "sells_count"];
const NET_KEYS: [&str; 2] = ["net_shares_change", "net_shares"];
const DATE_KEYS: [&str; 2] = ["last_activity_date", "as_of"];

fn aliased_number(blob: &Map<String, Value>, keys: [&str; 2]) -> Option<f64> {
    let raw = if blob.contains_key(keys[0]) {
        blob.get(keys[0])
    } else {
        blob.get(keys[1])
    };
    raw.and_then(safe_number)
}

fn aliased_string(blob: &Map<String, Value>, keys: [&str; 2]) -> Option<String> {
    keys.iter()
        .find_map(|k| blob.get(*k).and_then(Value::as_str))
        .map(str::to_string)
}

fn empty_summary() -> InsiderActivitySummary {
    InsiderActivitySummary {
        headline: InsiderHeadline::None,
        total_buy_trades: None,
        total_sell_trades: None,
        net_shares_change: None,
        last_activity_date: None,
        source: None,
    }
}

/// Collapse a raw insider-activity blob into a categorical headline plus
/// the quantities it was derived from.
///
/// Classification order is deliberate: the net-shares direction gives a
/// provisional Net Buy / Net Sell, and one-sided trade-count dominance
/// (buys with zero sells, or the reverse) overrides it afterwards, even
/// when the two disagree.
pub fn insider_signal(blob: Option<&Value>) -> InsiderActivitySummary {
    let map = match blob.and_then(Value::as_object) {
        Some(m) if !m.is_empty() => m,
        _ => return empty_summary(),
    };

    let total_buy = aliased_number(map, BUY_KEYS);
    let total_sell = aliased_number(map, SELL_KEYS);
    let net_change = aliased_number(map, NET_KEYS);
    let last_activity_date = aliased_string(map, DATE_KEYS);
    let source = map
        .get("source")
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut headline = InsiderHeadline::Unknown;
    if total_buy.is_none() && total_sell.is_none() && net_change.is_none() {
        headline = InsiderHeadline::None;
    } else {
        if let Some(net) = net_change {
            if net > 0.0 {
                headline = InsiderHeadline::NetBuy;
            } else if net < 0.0 {
                headline = InsiderHeadline::NetSell;
            }
        }

        if let (Some(buys), Some(sells)) = (total_buy, total_sell) {
            if buys > 0.0 && sells == 0.0 {
                headline = InsiderHeadline::Buy;
            }
            if sells > 0.0 && buys == 0.0 {
                headline = InsiderHeadline::Sell;
            }
        }
    }

    InsiderActivitySummary {
        headline,
        total_buy_trades: total_buy,
        total_sell_trades: total_sell,
        net_shares_change: net_change,
        last_activity_date,
        source,
    }
}
