use screener_core::FlagThresholds;

/// Everything the flag rules look at. Absent inputs skip their rule
/// silently.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlagInputs {
    pub price_to_ncavps: Option<f64>,
    pub current_ratio: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub ncav_qoq: Option<f64>,
    pub ncav_hoh: Option<f64>,
    pub ncav_yoy: Option<f64>,
    pub dilution_qoq: Option<f64>,
    pub dilution_hoh: Option<f64>,
    pub dilution_yoy: Option<f64>,
    pub max_dilution_1y: Option<f64>,
    pub max_issue_3y: Option<f64>,
    pub max_buyback_3y: Option<f64>,
    pub is_outdated: bool,
}

/// Produce green and red flag labels from Graham-style heuristics.
///
/// Rules run in a fixed order and the output lists keep that order;
/// consumers rely on it, so nothing here re-sorts.
pub fn classify_flags(inputs: &FlagInputs, t: &FlagThresholds) -> (Vec<String>, Vec<String>) {
    let mut green: Vec<String> = Vec::new();
    let mut red: Vec<String> = Vec::new();

    // value
    if let Some(ratio) = inputs.price_to_ncavps {
        if ratio <= t.price_to_ncav {
            green.push("Trading ≤ 2/3 NCAV".to_string());
        }
    }

    // liquidity
    if let Some(cr) = inputs.current_ratio {
        if cr >= t.current_ratio {
            green.push("Current ratio ≥ 2".to_string());
        }
    }

    // capital discipline
    if let Some(buyback) = inputs.max_buyback_3y {
        if buyback < t.buyback_3y {
            green.push("Meaningful buyback in last 3y".to_string());
        }
    }

    // NCAV not burning
    if let Some(yoy) = inputs.ncav_yoy {
        if yoy >= 0.0 {
            green.push("NCAV stable YoY or improving".to_string());
        }
    }

    // stale data
    if inputs.is_outdated {
        red.push("Financials are stale".to_string());
    }

    // leverage
    if let Some(de) = inputs.debt_to_equity {
        if de > t.debt_to_equity {
            red.push("High leverage".to_string());
        }
    }

    // NCAV burn per horizon
    for (label, change) in [
        ("QoQ", inputs.ncav_qoq),
        ("HoH", inputs.ncav_hoh),
        ("YoY", inputs.ncav_yoy),
    ] {
        if let Some(chg) = change {
            if chg < t.ncav_drop {
                red.push(format!("NCAV down {label} >20%"));
            }
        }
    }

    // recent dilution per horizon
    for (label, dilution) in [
        ("QoQ", inputs.dilution_qoq),
        ("HoH", inputs.dilution_hoh),
        ("YoY", inputs.dilution_yoy),
    ] {
        if let Some(dil) = dilution {
            if dil > t.dilution {
                red.push(format!("Dilution {label} >5%"));
            }
        }
    }

    // worst 12m issuance
    if let Some(dil) = inputs.max_dilution_1y {
        if dil > t.dilution_1y {
            red.push("Issued >8% in last 12m".to_string());
        }
    }

    // worst 3y issuance
    if let Some(issue) = inputs.max_issue_3y {
        if issue > t.issue_3y {
            red.push("Issued >20% in last 3y".to_string());
        }
    }

    (green, red)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> FlagThresholds {
        FlagThresholds::default()
    }

    #[test]
    fn healthy_netnet_collects_green_flags_only() {
        let inputs = FlagInputs {
            price_to_ncavps: Some(0.6),
            current_ratio: Some(2.5),
            debt_to_equity: Some(0.8),
            ncav_yoy: Some(0.05),
            dilution_qoq: Some(0.0),
            dilution_hoh: Some(0.0),
            dilution_yoy: Some(0.0),
            ..FlagInputs::default()
        };
        let (green, red) = classify_flags(&inputs, &thresholds());
        assert_eq!(
            green,
            vec![
                "Trading ≤ 2/3 NCAV",
                "Current ratio ≥ 2",
                "NCAV stable YoY or improving",
            ]
        );
        assert!(red.is_empty());
    }

    #[test]
    fn absent_inputs_skip_their_rules() {
        let (green, red) = classify_flags(&FlagInputs::default(), &thresholds());
        assert!(green.is_empty());
        assert!(red.is_empty());
    }

    #[test]
    fn burn_dilution_and_staleness_all_go_red_in_rule_order() {
        let inputs = FlagInputs {
            debt_to_equity: Some(2.0),
            ncav_qoq: Some(-0.25),
            ncav_yoy: Some(-0.30),
            dilution_hoh: Some(0.06),
            max_dilution_1y: Some(0.09),
            max_issue_3y: Some(0.25),
            is_outdated: true,
            ..FlagInputs::default()
        };
        let (green, red) = classify_flags(&inputs, &thresholds());
        assert!(green.is_empty());
        assert_eq!(
            red,
            vec![
                "Financials are stale",
                "High leverage",
                "NCAV down QoQ >20%",
                "NCAV down YoY >20%",
                "Dilution HoH >5%",
                "Issued >8% in last 12m",
                "Issued >20% in last 3y",
            ]
        );
    }

    #[test]
    fn buyback_threshold_is_strictly_below() {
        let at_threshold = FlagInputs {
            max_buyback_3y: Some(-0.05),
            ..FlagInputs::default()
        };
        let (green, _) = classify_flags(&at_threshold, &thresholds());
        assert!(green.is_empty());

        let beyond = FlagInputs {
            max_buyback_3y: Some(-0.06),
            ..FlagInputs::default()
        };
        let (green, _) = classify_flags(&beyond, &thresholds());
        assert_eq!(green, vec!["Meaningful buyback in last 3y"]);
    }

    #[test]
    fn ncav_exactly_flat_yoy_is_still_green() {
        let inputs = FlagInputs {
            ncav_yoy: Some(0.0),
            ..FlagInputs::default()
        };
        let (green, red) = classify_flags(&inputs, &thresholds());
        assert_eq!(green, vec!["NCAV stable YoY or improving"]);
        assert!(red.is_empty());
    }
}
