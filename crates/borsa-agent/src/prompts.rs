//! Prompt templates for the pipeline stages
//!
//! All stage prompts are Turkish and rendered through MiniJinja so that
//! runtime context (current date, tool catalog) can be interpolated.
//! Output-format examples in the templates use single braces on purpose:
//! MiniJinja only treats `{{` and `{%` as syntax.

use borsa_core::{Error, Result};
use chrono::Local;
use minijinja::{Environment, context};

/// Investment disclaimer appended to every synthesized answer.
pub const DISCLAIMER: &str =
    "⚠️ Bu bilgiler sadece bilgilendirme amaçlıdır. Yatırım tavsiyesi değildir.";

const ROUTING_TEMPLATE: &str = r#"Sen BIST (Borsa İstanbul) ve finansal piyasalar konusunda uzman bir yönlendirme asistanısın. Bugünün tarihi: {{ current_date }}.

Görevin: Kullanıcının sorusunu incele ve nasıl cevaplanacağına karar ver.

BASİT SORU (is_simple: true):
- Genel bilgi, tanım veya kavram soruları ("F/K oranı nedir?", "Temettü ne demek?")
- Selamlaşma ve sohbet ("merhaba", "teşekkürler")
- Güncel veri GEREKTİRMEYEN her soru
Bu durumda cevabı doğrudan "answer" alanına yaz.

KARMAŞIK SORU (is_simple: false):
- Güncel fiyat, hacim veya finansal veri gerektiren sorular
- Karşılaştırma, analiz veya hesaplama isteyen sorular
- Birden fazla kaynaktan veri toplamayı gerektiren sorular
Bu durumda "answer" alanını boş bırak, planlama aşaması devreye girecek.

DEĞERLEME ANALİZİ (valuation: true):
- Kullanıcı bir şirket için kapsamlı değerleme, "Buffett analizi", içsel değer
  veya "değerleme" istiyorsa valuation alanını true yap.

SADECE şu JSON formatında cevap ver:
{ "is_simple": true, "confidence": 0.95, "answer": "cevap metni veya null", "reasoning": "kısa gerekçe", "valuation": false }"#;

const PLANNING_TEMPLATE: &str = r#"Sen BIST ve finansal piyasalar için görev planlayıcısısın. Bugünün tarihi: {{ current_date }}.

Kullanıcının sorusunu, araçlarla yürütülebilecek somut görevlere böl.

KULLANILABİLİR ARAÇLAR:
{{ tool_catalog }}

KURALLAR:
1. Her görev TEK bir veri toplama veya analiz adımı olmalı.
2. Görevlere 1'den başlayan benzersiz id ver.
3. Bir görev başka bir görevin çıktısına ihtiyaç duyuyorsa depends_on alanına
   o görevin id'sini yaz. Bağımsız görevler paralel çalıştırılır.
4. Mümkünse görevleri bağımsız tut, gereksiz bağımlılık ekleme.
5. Soru önceki cevaplarla ilgili bir takip sorusuysa ve yeni veri GEREKMİYORSA
   BOŞ görev listesi döndür; cevap mevcut bağlamdan üretilecek.
6. En fazla 10 görev planla.

SADECE şu JSON formatında cevap ver:
{ "tasks": [ { "id": 1, "description": "görev açıklaması", "tool_name": "arac_adi veya null", "depends_on": [] } ], "reasoning": "planın kısa gerekçesi" }"#;

const ACTION_TEMPLATE: &str = r#"Sen BIST ve finansal piyasalar için veri toplama uzmanısın. Bugünün tarihi: {{ current_date }}.

Sana verilen görevi, elindeki araçları çağırarak yerine getir.

KURALLAR:
1. Görev için en uygun aracı seç ve doğru parametrelerle çağır.
2. Araç sonuçlarını olduğu gibi aktar, sayısal verileri DEĞİŞTİRME.
3. Tarih, fiyat ve oran gibi değerleri kaynakta geçtiği şekilde koru.
4. Araç hata dönerse alternatif bir araç veya parametre dene.
5. Sonucu kısa ve veri odaklı bir metin olarak özetle."#;

const VALIDATION_TEMPLATE: &str = r#"Sen görev tamamlanma denetçisisin. Bugünün tarihi: {{ current_date }}.

Sana bir görev açıklaması ve o görev için üretilen çıktılar verilecek.
Görevin gerçekten tamamlanıp tamamlanmadığına karar ver.

DEĞERLENDİRME:
- Çıktılar görevin istediği veriyi içeriyorsa done: true.
- Çıktılar boş, alakasız veya hata mesajıysa done: false.
- confidence 0 ile 1 arasında olmalı.

SADECE şu JSON formatında cevap ver:
{ "done": true, "reason": "kısa gerekçe", "confidence": 0.9 }"#;

const ANSWER_TEMPLATE: &str = r#"Sen BIST ve finansal piyasalar uzmanı bir asistansın. Bugünün tarihi: {{ current_date }}.

Toplanan verileri kullanarak kullanıcının sorusuna Türkçe, net ve iyi
yapılandırılmış bir cevap üret.

KURALLAR:
1. SADECE toplanan verilerdeki bilgileri kullan, veri uydurma.
2. Sayısal değerleri aynen aktar, birimleri belirt.
3. Veriler yetersizse bunu açıkça söyle.
4. Cevabın sonuna şu uyarıyı ekle:
   "⚠️ Bu bilgiler sadece bilgilendirme amaçlıdır. Yatırım tavsiyesi değildir."

SADECE şu JSON formatında cevap ver:
{ "answer": "cevap metni", "confidence": 0.9, "data_sources": ["kaynak1"], "warnings": [] }"#;

const COLLECTION_TEMPLATE: &str = r#"Sen bir şirket değerleme analisti için veri toplama uzmanısın. Bugünün tarihi: {{ current_date }}.

Verilen şirket için değerleme analizinde kullanılacak verileri araçlarla topla:
- Şirket profili ve faaliyet alanı
- Finansal tablolar (bilanço, gelir tablosu, nakit akışı)
- Finansal oranlar (F/K, PD/DD, özsermaye karlılığı, borçluluk)
- Güncel fiyat ve piyasa değeri
- Temettü geçmişi

Topladığın tüm verileri kaynak belirterek, sayıları değiştirmeden aktar."#;

const ANALYSIS_TEMPLATE: &str = r#"Sen değer yatırımı ilkeleriyle çalışan bir şirket analisti olarak görev yapıyorsun. Bugünün tarihi: {{ current_date }}.

Sana verilen finansal veri paketini şu eksenlerde 0 ile 1 arasında puanla:
- competence: yönetim yetkinliği ve sermaye dağıtımı
- moat: kalıcı rekabet avantajı
- earnings_quality: kazanç kalitesi ve nakit dönüşümü
- safety_margin: içsel değere göre güvenlik marjı
- position_sizing: pozisyon büyüklüğüne uygunluk
- owner_earnings: sahip kazancı (TL, negatif olabilir)

SADECE şu JSON formatında cevap ver:
{ "competence": 0.7, "moat": 0.6, "earnings_quality": 0.8, "safety_margin": 0.5, "position_sizing": 0.6, "owner_earnings": 1000000.0, "commentary": "kısa Türkçe değerlendirme" }"#;

/// Renders stage prompts with runtime context.
pub struct Prompts {
    env: Environment<'static>,
}

impl Prompts {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        let templates = [
            ("routing", ROUTING_TEMPLATE),
            ("planning", PLANNING_TEMPLATE),
            ("action", ACTION_TEMPLATE),
            ("validation", VALIDATION_TEMPLATE),
            ("answer", ANSWER_TEMPLATE),
            ("collection", COLLECTION_TEMPLATE),
            ("analysis", ANALYSIS_TEMPLATE),
        ];
        for (name, source) in templates {
            env.add_template(name, source)
                .map_err(|e| Error::InitializationFailed(format!("template {name}: {e}")))?;
        }
        Ok(Self { env })
    }

    fn render(&self, name: &str, tool_catalog: Option<&str>) -> Result<String> {
        let template = self
            .env
            .get_template(name)
            .map_err(|e| Error::ProcessingFailed(e.to_string()))?;
        let current_date = Local::now().format("%d.%m.%Y").to_string();
        template
            .render(context! { current_date, tool_catalog })
            .map_err(|e| Error::ProcessingFailed(e.to_string()))
    }

    pub fn routing(&self) -> Result<String> {
        self.render("routing", None)
    }

    /// Planning prompt, parameterized with the live tool catalog.
    pub fn planning(&self, tool_catalog: &str) -> Result<String> {
        self.render("planning", Some(tool_catalog))
    }

    pub fn action(&self) -> Result<String> {
        self.render("action", None)
    }

    pub fn validation(&self) -> Result<String> {
        self.render("validation", None)
    }

    pub fn answer(&self) -> Result<String> {
        self.render("answer", None)
    }

    pub fn valuation_collection(&self) -> Result<String> {
        self.render("collection", None)
    }

    pub fn valuation_analysis(&self) -> Result<String> {
        self.render("analysis", None)
    }
}

/// User prompt for a task iteration. Embeds the last two prior outputs so
/// retries can see what already happened.
pub fn action_user(description: &str, prior_outputs: &[String]) -> String {
    let context = if prior_outputs.is_empty() {
        "İlk deneme".to_string()
    } else {
        let window = prior_outputs
            .iter()
            .rev()
            .take(2)
            .rev()
            .cloned()
            .collect::<Vec<_>>()
            .join("\n---\n");
        format!("Önceki çıktılar:\n{window}")
    };
    format!("Görev: {description}\n\n{context}")
}

/// User prompt for validation. Shows the last three outputs.
pub fn validation_user(description: &str, outputs: &[String]) -> String {
    let window = outputs
        .iter()
        .rev()
        .take(3)
        .rev()
        .cloned()
        .collect::<Vec<_>>()
        .join("\n---\n");
    format!("Görev: {description}\n\nÜretilen çıktılar:\n{window}")
}

/// User prompt for answer synthesis over all collected task outputs.
pub fn answer_user(query: &str, outputs: &[String]) -> String {
    format!(
        "Kullanıcı Sorusu: {query}\n\nToplanan Veriler:\n{}",
        outputs.join("\n---\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_render_with_date() {
        let prompts = Prompts::new().unwrap();
        let routing = prompts.routing().unwrap();
        assert!(routing.contains("Bugünün tarihi"));
        assert!(!routing.contains("{{"));
    }

    #[test]
    fn planning_embeds_tool_catalog() {
        let prompts = Prompts::new().unwrap();
        let rendered = prompts.planning("- hisse_fiyati: güncel fiyat").unwrap();
        assert!(rendered.contains("hisse_fiyati"));
    }

    #[test]
    fn action_user_first_attempt() {
        let prompt = action_user("THYAO fiyatını getir", &[]);
        assert!(prompt.contains("İlk deneme"));
    }

    #[test]
    fn action_user_windows_last_two() {
        let outputs = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let prompt = action_user("görev", &outputs);
        assert!(!prompt.contains("\na\n"));
        assert!(prompt.contains('b'));
        assert!(prompt.contains('c'));
    }

    #[test]
    fn validation_user_windows_last_three() {
        let outputs: Vec<String> = (1..=5).map(|i| format!("çıktı-{i}")).collect();
        let prompt = validation_user("görev", &outputs);
        assert!(!prompt.contains("çıktı-2"));
        assert!(prompt.contains("çıktı-3"));
        assert!(prompt.contains("çıktı-5"));
    }
}
