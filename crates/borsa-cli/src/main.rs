//! Terminal chat assistant for BIST and Turkish financial markets

mod ui;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use borsa_agent::{ModelConfig, Orchestrator, OrchestratorConfig};
use borsa_llm::Message;
use borsa_llm::providers::OpenRouterProvider;
use borsa_mcp::{DEFAULT_MCP_URL, HttpMCPClient, MCPClient, tools_summary};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "borsa")]
#[command(about = "BIST ve finansal piyasalar için sohbet asistanı", version)]
struct Args {
    /// Tek seferlik soru; boş bırakılırsa etkileşimli mod başlar
    query: Option<String>,

    /// Ayrıntılı günlük çıktısı
    #[arg(long)]
    debug: bool,

    /// Bir sorudaki toplam adım bütçesi
    #[arg(long)]
    max_steps: Option<usize>,

    /// Görev başına deneme sınırı
    #[arg(long)]
    max_steps_per_task: Option<usize>,

    /// MCP sunucu adresi
    #[arg(long)]
    mcp_url: Option<String>,

    /// Hızlı aşamaların modeli (yönlendirme, eylem, doğrulama, sentez)
    #[arg(long)]
    model: Option<String>,

    /// Planlama aşamasının modeli
    #[arg(long)]
    planning_model: Option<String>,

    /// Bağımsız görevleri paralel yerine sırayla çalıştır
    #[arg(long)]
    sequential: bool,
}

fn init_tracing(debug: bool) {
    let default_filter = if debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn build_config(args: &Args) -> OrchestratorConfig {
    let mut config = OrchestratorConfig::new()
        .with_parallel(!args.sequential)
        .with_debug(args.debug);
    if let Some(max_steps) = args.max_steps {
        config = config.with_max_steps(max_steps);
    } else if let Ok(value) = std::env::var("MAX_STEPS") {
        if let Ok(max_steps) = value.parse() {
            config = config.with_max_steps(max_steps);
        }
    }
    if let Some(per_task) = args.max_steps_per_task {
        config = config.with_max_steps_per_task(per_task);
    } else if let Ok(value) = std::env::var("MAX_STEPS_PER_TASK") {
        if let Ok(per_task) = value.parse() {
            config = config.with_max_steps_per_task(per_task);
        }
    }
    if args.model.is_some() || args.planning_model.is_some() {
        let mut models = ModelConfig::default();
        if let Some(model) = &args.model {
            models.routing.clone_from(model);
            models.action.clone_from(model);
            models.validation.clone_from(model);
            models.synthesis.clone_from(model);
        }
        if let Some(model) = &args.planning_model {
            models.planning.clone_from(model);
        }
        config = config.with_models(models);
    }
    config
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.debug);

    if std::env::var("OPENROUTER_API_KEY").is_err() {
        anyhow::bail!(
            "OPENROUTER_API_KEY tanımlı değil. https://openrouter.ai/keys adresinden bir anahtar alıp ortam değişkeni olarak ayarlayın."
        );
    }

    let provider = Arc::new(
        OpenRouterProvider::from_env()
            .context("OpenRouter sağlayıcısı oluşturulamadı")?,
    );

    let mcp_url = args
        .mcp_url
        .clone()
        .or_else(|| std::env::var("BORSA_MCP_URL").ok())
        .unwrap_or_else(|| DEFAULT_MCP_URL.to_string());
    let mcp: Arc<HttpMCPClient> = Arc::new(
        HttpMCPClient::new(&mcp_url, Duration::from_secs(60))
            .context("MCP istemcisi oluşturulamadı")?,
    );
    mcp.connect()
        .await
        .with_context(|| format!("MCP sunucusuna bağlanılamadı: {mcp_url}"))?;
    info!(url = %mcp_url, "MCP bağlantısı kuruldu");

    let config = build_config(&args);
    let orchestrator = Orchestrator::new(provider, mcp.clone(), config)
        .context("Orkestratör başlatılamadı")?;

    match args.query {
        Some(query) => {
            let outcome = orchestrator.run(&query, Vec::new()).await?;
            ui::print_answer(&outcome.answer);
            if let Some(chart) = outcome.chart {
                ui::print_chart(&chart);
            }
            Ok(())
        }
        None => interactive(&orchestrator, mcp.as_ref()).await,
    }
}

async fn interactive(orchestrator: &Orchestrator, mcp: &HttpMCPClient) -> anyhow::Result<()> {
    ui::print_banner();
    let mut history: Vec<Message> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("siz> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input.to_lowercase().as_str() {
            "exit" | "quit" | "çık" | "q" => break,
            "help" | "yardım" | "h" | "?" => {
                println!("{}", ui::HELP);
                continue;
            }
            "tools" | "araçlar" => {
                match mcp.list_tools().await {
                    Ok(tools) => println!("{}", tools_summary(&tools)),
                    Err(e) => eprintln!("Araç listesi alınamadı: {e}"),
                }
                continue;
            }
            "clear" | "temizle" => {
                history.clear();
                println!("Sohbet geçmişi temizlendi.");
                continue;
            }
            _ => {}
        }

        match orchestrator.run(input, std::mem::take(&mut history)).await {
            Ok(outcome) => {
                ui::print_answer(&outcome.answer);
                if let Some(chart) = outcome.chart {
                    ui::print_chart(&chart);
                }
                history = outcome.history;
            }
            Err(e) => eprintln!("Hata: {e}"),
        }
    }

    println!("{}", ui::GOODBYE);
    Ok(())
}
