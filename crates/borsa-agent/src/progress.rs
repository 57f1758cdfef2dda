//! Turkish progress lines shown while MCP tools run

use std::collections::HashMap;

/// Progress line per tool name. Tools without an entry stay silent.
pub fn tool_messages() -> HashMap<String, String> {
    [
        ("hisse_fiyati", "📈 Güncel hisse fiyatı alınıyor..."),
        ("hisse_profili", "🏢 Şirket profili getiriliyor..."),
        ("finansal_tablolar", "📊 Finansal tablolar inceleniyor..."),
        ("finansal_oranlar", "🧮 Finansal oranlar hesaplanıyor..."),
        ("teknik_analiz", "📉 Teknik göstergeler hesaplanıyor..."),
        ("temettu_gecmisi", "💰 Temettü geçmişi taranıyor..."),
        ("endeks_verisi", "🗂️ Endeks verileri alınıyor..."),
        ("fon_bilgisi", "🏦 Fon bilgileri getiriliyor..."),
        ("kripto_fiyat", "🪙 Kripto fiyatları alınıyor..."),
        ("doviz_kuru", "💱 Döviz kurları alınıyor..."),
        ("enflasyon_verisi", "📅 Ekonomik veriler taranıyor..."),
        ("sirket_haberleri", "📰 Şirket haberleri taranıyor..."),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tools_have_messages() {
        let messages = tool_messages();
        assert!(messages.contains_key("hisse_fiyati"));
        assert!(!messages.contains_key("bilinmeyen"));
    }
}
