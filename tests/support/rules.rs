/// Two sectors, three tickers. AAPL carries the full rule.
pub const RULES_JSON: &str = r#"{
    "tech": {
        "AAPL": {
            "above": 200,
            "below": 180,
            "description": "Core holding",
            "strong_buy": 170,
            "strong_sell": 215,
            "support_levels": [185],
            "resistance_levels": [198]
        },
        "MSFT": { "above": 450, "below": 400, "description": "Cloud" }
    },
    "energy": {
        "XOM": { "below": 100, "description": "Dividend" }
    }
}"#;
