//! Terminal texts and helpers

pub const BANNER: &str = r#"
 ____                        ____ ___
| __ )  ___  _ __ ___  __ _ / ___|_ _|
|  _ \ / _ \| '__/ __|/ _` | |    | |
| |_) | (_) | |  \__ \ (_| | |___ | |
|____/ \___/|_|  |___/\__,_|\____|___|

BIST ve finansal piyasalar asistanı
"#;

pub const GOODBYE: &str = "Hoşçakalın! 👋";

pub const HELP: &str = "\
Komutlar:
  yardım, help, ?       Bu mesajı göster
  araçlar, tools        Kullanılabilir araçları listele
  temizle, clear        Sohbet geçmişini sıfırla
  çık, exit, quit, q    Programdan çık

Örnek sorular:
  THYAO fiyatı nedir?
  GARAN ile AKBNK'yi karşılaştır
  ASELS için buffett analizi yap
  THYAO son 1 ay mum grafiği çiz";

pub fn print_banner() {
    println!("{BANNER}");
    println!("Çıkmak için 'çık', yardım için 'yardım' yazın.\n");
}

pub fn print_answer(answer: &str) {
    println!("\n{answer}\n");
}

pub fn print_chart(chart: &str) {
    println!("{chart}");
}
