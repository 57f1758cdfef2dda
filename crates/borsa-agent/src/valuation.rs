//! Two-phase company valuation workflow
//!
//! Phase one collects fundamentals through MCP tools, phase two scores the
//! bundle against a fixed rubric and renders a buy/watch/pass decision.
//! The rubric itself (floors, weights, thresholds) lives in
//! [`borsa_core::valuation`] so the decision logic is enforced in code
//! rather than left to the model.

use std::sync::Arc;

use borsa_core::{Error, Result, UsageTracker, ValuationScores};
use borsa_llm::{CompletionRequest, LLMProvider, Message, structured};
use serde::Deserialize;
use tracing::{info, warn};

use crate::agents::{Actor, complete};

use crate::prompts::DISCLAIMER;

/// Collected data shorter than this is treated as a failed collection.
const MIN_DATA_LEN: usize = 100;

#[derive(Debug, Deserialize)]
struct AnalysisOutput {
    #[serde(flatten)]
    scores: ValuationScores,
    #[serde(default)]
    commentary: String,
}

pub struct ValuationWorkflow {
    collector: Actor,
    provider: Arc<dyn LLMProvider>,
    model: String,
    analysis_prompt: String,
}

impl ValuationWorkflow {
    pub fn new(
        collector: Actor,
        provider: Arc<dyn LLMProvider>,
        model: String,
        analysis_prompt: String,
    ) -> Self {
        Self {
            collector,
            provider,
            model,
            analysis_prompt,
        }
    }

    /// Run both phases and render the decision report.
    pub async fn analyze(&self, query: &str, usage: &UsageTracker) -> Result<String> {
        info!("Değerleme analizi başlıyor");
        let data = self
            .collector
            .act(
                &format!("Kullanıcı Sorusu: {query}\n\nDeğerleme için gerekli verileri topla."),
                usage,
            )
            .await?;

        if data.len() < MIN_DATA_LEN {
            warn!(data_len = data.len(), "Collected data too thin for valuation");
            return Err(Error::ProcessingFailed(
                "Veri toplama başarısız - yeterli veri toplanamadı".to_string(),
            ));
        }

        let request = CompletionRequest::builder(&self.model)
            .messages(vec![Message::user(format!(
                "Finansal Veri Paketi:\n{data}"
            ))])
            .system(&self.analysis_prompt)
            .max_tokens(4096)
            .temperature(0.2)
            .build();

        let response = complete(self.provider.as_ref(), request, usage).await?;
        let analysis: AnalysisOutput = structured::parse_json(&response.message.full_text())?;

        Ok(render_report(&analysis.scores, &analysis.commentary))
    }
}

fn render_report(scores: &ValuationScores, commentary: &str) -> String {
    let decision = scores.decide();
    let mut report = String::new();
    report.push_str(&format!("## Değerleme Sonucu: {}\n\n", decision.label()));
    report.push_str(&format!(
        "| Eksen | Puan |\n|---|---|\n\
         | Yönetim yetkinliği | {:.2} |\n\
         | Rekabet avantajı | {:.2} |\n\
         | Kazanç kalitesi | {:.2} |\n\
         | Güvenlik marjı | {:.2} |\n\
         | Pozisyon uygunluğu | {:.2} |\n\n",
        scores.competence,
        scores.moat,
        scores.earnings_quality,
        scores.safety_margin,
        scores.position_sizing,
    ));
    report.push_str(&format!(
        "Ağırlıklı toplam: {:.2}\n\n",
        scores.weighted_total()
    ));
    if scores.hard_stop() {
        report.push_str("Eleme kriteri tetiklendi: temel eşiklerin altında kalındı.\n\n");
    }
    if !commentary.is_empty() {
        report.push_str(commentary);
        report.push_str("\n\n");
    }
    report.push_str(DISCLAIMER);
    report
}
