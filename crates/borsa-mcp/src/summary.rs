//! Human-readable tool catalog summary
//!
//! Groups tools into coarse categories inferred from name patterns. Purely
//! presentational; the orchestrator never routes on these categories.

use crate::client::MCPToolDefinition;
use std::collections::BTreeMap;

/// Format the tool catalog as a categorized listing for the terminal
pub fn tools_summary(tools: &[MCPToolDefinition]) -> String {
    if tools.is_empty() {
        return "Araç kataloğu boş. Sunucu bağlantısını kontrol edin.".to_string();
    }

    let mut lines = vec![format!("📊 Borsa MCP Araçları ({} adet):", tools.len())];

    // BTreeMap keeps the category order stable across runs
    let mut categories: BTreeMap<&str, Vec<&MCPToolDefinition>> = BTreeMap::new();
    for tool in tools {
        categories.entry(categorize(&tool.name)).or_default().push(tool);
    }

    for (category, tools) in categories {
        lines.push(format!("\n{category}:"));
        for tool in tools {
            let description = tool.description.as_deref().unwrap_or("");
            let short: String = description.chars().take(80).collect();
            let ellipsis = if description.chars().count() > 80 { "..." } else { "" };
            lines.push(format!("  - {}: {}{}", tool.name, short, ellipsis));
        }
    }

    lines.join("\n")
}

/// Coarse category from the tool name
fn categorize(name: &str) -> &'static str {
    if name.contains("bist") || name.contains("company") || name.contains("stock") {
        "BIST Hisseleri"
    } else if name.contains("fund") || name.contains("tefas") {
        "Yatırım Fonları"
    } else if name.contains("btcturk") || name.contains("coinbase") || name.contains("crypto") {
        "Kripto Para"
    } else if name.contains("forex") || name.contains("commodity") || name.contains("fuel") {
        "Döviz ve Emtia"
    } else if name.contains("inflation") || name.contains("economic") || name.contains("calendar")
    {
        "Ekonomik Veriler"
    } else if name.contains("kap") || name.contains("news") {
        "Haberler ve Bildirimler"
    } else {
        "Diğer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tool(name: &str, description: &str) -> MCPToolDefinition {
        MCPToolDefinition {
            name: name.to_string(),
            description: Some(description.to_string()),
            input_schema: json!({"type": "object"}),
        }
    }

    #[test]
    fn test_empty_catalog() {
        let summary = tools_summary(&[]);
        assert!(summary.contains("boş"));
    }

    #[test]
    fn test_categorization() {
        assert_eq!(categorize("get_bist_price"), "BIST Hisseleri");
        assert_eq!(categorize("search_tefas_funds"), "Yatırım Fonları");
        assert_eq!(categorize("get_crypto_ticker"), "Kripto Para");
        assert_eq!(categorize("get_forex_rates"), "Döviz ve Emtia");
        assert_eq!(categorize("get_inflation_data"), "Ekonomik Veriler");
        assert_eq!(categorize("get_kap_disclosures"), "Haberler ve Bildirimler");
        assert_eq!(categorize("calculate_buffett_value_analysis"), "Diğer");
    }

    #[test]
    fn test_summary_groups_and_truncates() {
        let long_desc = "a".repeat(120);
        let tools = vec![
            tool("get_bist_price", "Hisse fiyatı"),
            tool("get_news", &long_desc),
        ];

        let summary = tools_summary(&tools);
        assert!(summary.contains("2 adet"));
        assert!(summary.contains("BIST Hisseleri:"));
        assert!(summary.contains("Haberler ve Bildirimler:"));
        assert!(summary.contains("..."));
    }
}
