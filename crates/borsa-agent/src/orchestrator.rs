//! Pipeline orchestrator
//!
//! Drives a query through routing, planning, scheduled execution,
//! validation and synthesis. Every stage has a timeout and a degradation
//! path; the only unrecoverable condition is a dependency cycle in the
//! plan.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use borsa_core::{IsDone, Result, Task, TaskList, UsageSnapshot, UsageTracker};
use borsa_llm::{LLMProvider, Message};
use borsa_mcp::ArcMCPClient;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::agents::{Actor, Planner, Router, Synthesizer, Validator};
use crate::chart;
use crate::config::OrchestratorConfig;
use crate::progress;
use crate::prompts::{self, DISCLAIMER, Prompts};
use crate::scheduler::{self, ExecutionReport, TaskRunner};
use crate::valuation::ValuationWorkflow;

/// Fallback answer when synthesis itself fails: apologize and show a
/// prefix of the raw data instead of nothing.
const APOLOGY_DATA_PREFIX: usize = 500;

/// Result of a single orchestrated run.
#[derive(Debug)]
pub struct RunOutcome {
    /// Final answer text shown to the user
    pub answer: String,

    /// Rendered terminal chart, when the query asked for one
    pub chart: Option<String>,

    /// Conversation history including this exchange
    pub history: Vec<Message>,

    /// Token usage across all stage calls of this run
    pub usage: UsageSnapshot,
}

pub struct Orchestrator {
    mcp: ArcMCPClient,
    config: OrchestratorConfig,
    prompts: Prompts,
    router: Router,
    planner: Planner,
    actor: Actor,
    validator: Validator,
    synthesizer: Synthesizer,
    valuation: ValuationWorkflow,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        mcp: ArcMCPClient,
        config: OrchestratorConfig,
    ) -> Result<Self> {
        let prompts = Prompts::new()?;

        let router = Router::new(
            provider.clone(),
            config.models.routing.clone(),
            prompts.routing()?,
        );
        let planner = Planner::new(provider.clone(), config.models.planning.clone());
        let actor = Actor::new(
            provider.clone(),
            mcp.clone(),
            config.models.action.clone(),
            prompts.action()?,
        )
        .with_progress_messages(progress::tool_messages());
        let validator = Validator::new(
            provider.clone(),
            config.models.validation.clone(),
            prompts.validation()?,
        );
        let synthesizer = Synthesizer::new(
            provider.clone(),
            config.models.synthesis.clone(),
            prompts.answer()?,
        );
        let collector = Actor::new(
            provider.clone(),
            mcp.clone(),
            config.models.action.clone(),
            prompts.valuation_collection()?,
        )
        .with_progress_messages(progress::tool_messages());
        let valuation = ValuationWorkflow::new(
            collector,
            provider,
            config.models.planning.clone(),
            prompts.valuation_analysis()?,
        );

        Ok(Self {
            mcp,
            config,
            prompts,
            router,
            planner,
            actor,
            validator,
            synthesizer,
            valuation,
        })
    }

    /// Process one query against the conversation history.
    pub async fn run(&self, query: &str, history: Vec<Message>) -> Result<RunOutcome> {
        let usage = UsageTracker::new();
        info!(query_len = query.len(), "Run started");

        // Routing. Timeouts and errors fall through to planning.
        match timeout(
            self.config.timeouts.route,
            self.router.route(query, &history, &usage),
        )
        .await
        {
            Ok(Ok(decision)) => {
                if decision.valuation {
                    match self.valuation.analyze(query, &usage).await {
                        Ok(report) => {
                            return Ok(self.finish(query, report, None, history, &usage));
                        }
                        Err(e) => {
                            warn!(error = %e, "Valuation failed, falling back to planning")
                        }
                    }
                } else if decision.takes_simple_path() {
                    let answer = decision.answer.unwrap_or_default();
                    info!("Simple path taken");
                    return Ok(self.finish(query, answer, None, history, &usage));
                }
            }
            Ok(Err(e)) => warn!(error = %e, "Routing failed, proceeding to planning"),
            Err(_) => warn!("Routing timed out, proceeding to planning"),
        }

        // Planning. An empty plan is valid and skips straight to synthesis.
        let task_list = match timeout(
            self.config.timeouts.plan,
            self.plan_with_catalog(query, &history, &usage),
        )
        .await
        {
            Ok(Ok(task_list)) => task_list,
            Ok(Err(e)) => {
                warn!(error = %e, "Planning failed, synthesizing from context");
                TaskList::default()
            }
            Err(_) => {
                warn!("Planning timed out, synthesizing from context");
                TaskList::default()
            }
        };

        // Execution. A dependency cycle is the one fatal planning defect.
        let report = if task_list.is_empty() {
            debug!("Empty plan, no tasks to execute");
            ExecutionReport::empty()
        } else {
            let plan = scheduler::build_execution_plan(&task_list.tasks)?;
            info!(
                tasks = task_list.tasks.len(),
                levels = plan.len(),
                "Executing plan"
            );
            if self.config.debug {
                for (i, level) in plan.iter().enumerate() {
                    let ids: Vec<u32> = level.iter().map(|t| t.id).collect();
                    info!(level = i, tasks = ?ids, "Plan level");
                }
            }
            let executor = TaskExecutor {
                actor: &self.actor,
                validator: &self.validator,
                usage: &usage,
                max_steps_per_task: self.config.max_steps_per_task,
                act_timeout: self.config.timeouts.act,
                validate_timeout: self.config.timeouts.validate,
            };
            scheduler::execute_plan(
                &plan,
                &executor,
                self.config.max_steps,
                self.config.parallel,
            )
            .await
        };

        // Synthesis, with an apologetic fallback that still shows data.
        let answer = match timeout(
            self.config.timeouts.synthesize,
            self.synthesizer.synthesize(query, &report.outputs, &usage),
        )
        .await
        {
            Ok(Ok(answer)) => ensure_disclaimer(answer.answer),
            Ok(Err(e)) => {
                warn!(error = %e, "Synthesis failed");
                apology(&report.outputs)
            }
            Err(_) => {
                warn!("Synthesis timed out");
                apology(&report.outputs)
            }
        };

        let rendered_chart = if chart::wants_chart(query) {
            chart::render_from_outputs(&report.outputs)
        } else {
            None
        };

        Ok(self.finish(query, answer, rendered_chart, history, &usage))
    }

    async fn plan_with_catalog(
        &self,
        query: &str,
        history: &[Message],
        usage: &UsageTracker,
    ) -> Result<TaskList> {
        let catalog = match self.mcp.list_tools().await {
            Ok(tools) => tools
                .iter()
                .map(|t| {
                    format!("- {}: {}", t.name, t.description.clone().unwrap_or_default())
                })
                .collect::<Vec<_>>()
                .join("\n"),
            Err(e) => {
                warn!(error = %e, "Tool catalog unavailable for planning");
                String::new()
            }
        };
        let system_prompt = self.prompts.planning(&catalog)?;
        self.planner.plan(query, history, &system_prompt, usage).await
    }

    fn finish(
        &self,
        query: &str,
        answer: String,
        chart: Option<String>,
        mut history: Vec<Message>,
        usage: &UsageTracker,
    ) -> RunOutcome {
        history.push(Message::user(query));
        history.push(Message::assistant(&answer));
        let snapshot = usage.snapshot();
        info!(
            requests = snapshot.requests,
            total_tokens = snapshot.total_tokens(),
            "Run finished"
        );
        RunOutcome {
            answer,
            chart,
            history,
            usage: snapshot,
        }
    }
}

fn ensure_disclaimer(answer: String) -> String {
    if answer.contains("Yatırım tavsiyesi değildir") {
        answer
    } else {
        format!("{answer}\n\n{DISCLAIMER}")
    }
}

fn apology(outputs: &[String]) -> String {
    let data = outputs.join("\n");
    let prefix: String = data.chars().take(APOLOGY_DATA_PREFIX).collect();
    format!(
        "Üzgünüm, cevabı oluştururken bir sorun yaşadım. Toplanan veriler şunlardı:\n\n{prefix}\n\n{DISCLAIMER}"
    )
}

/// Runs one task: act, validate, retry, within the per-task cap and the
/// remaining global budget.
struct TaskExecutor<'a> {
    actor: &'a Actor,
    validator: &'a Validator,
    usage: &'a UsageTracker,
    max_steps_per_task: usize,
    act_timeout: Duration,
    validate_timeout: Duration,
}

#[async_trait]
impl TaskRunner for TaskExecutor<'_> {
    async fn run_task(&self, task: &Task, budget_remaining: usize) -> Result<Vec<String>> {
        let cap = self.max_steps_per_task.min(budget_remaining);
        let mut outputs: Vec<String> = Vec::new();

        for iteration in 0..cap {
            debug!(task_id = task.id, iteration, "Task iteration");
            let prompt = prompts::action_user(&task.description, &outputs);

            // An act error degrades into an output and still gets validated;
            // only a timeout ends the task loop immediately.
            let output = match timeout(self.act_timeout, self.actor.act(&prompt, self.usage)).await
            {
                Ok(Ok(text)) => text,
                Ok(Err(e)) => {
                    warn!(task_id = task.id, error = %e, "Act failed");
                    format!("Araç çağrısı başarısız: {e}")
                }
                Err(_) => {
                    warn!(task_id = task.id, "Act timed out");
                    outputs.push("İşlem zaman aşımına uğradı".to_string());
                    break;
                }
            };
            outputs.push(output);

            let verdict = match timeout(
                self.validate_timeout,
                self.validator
                    .validate(&task.description, &outputs, self.usage),
            )
            .await
            {
                Ok(Ok(verdict)) => verdict,
                Ok(Err(e)) => {
                    warn!(task_id = task.id, error = %e, "Validation failed, retrying task");
                    IsDone::error_default()
                }
                Err(_) => {
                    warn!(task_id = task.id, "Validation timed out, counting task as done");
                    IsDone::timeout_default()
                }
            };
            if verdict.done {
                debug!(task_id = task.id, reason = %verdict.reason, "Task done");
                break;
            }
        }

        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::testing::{MockMCP, MockProvider};
    use crate::config::Timeouts;

    fn orchestrator(
        provider: Arc<MockProvider>,
        mcp: Arc<MockMCP>,
        config: OrchestratorConfig,
    ) -> Orchestrator {
        Orchestrator::new(provider, mcp, config).unwrap()
    }

    fn fast_timeouts() -> Timeouts {
        Timeouts {
            route: Duration::from_millis(100),
            plan: Duration::from_millis(100),
            act: Duration::from_millis(100),
            validate: Duration::from_millis(50),
            synthesize: Duration::from_millis(100),
        }
    }

    #[tokio::test]
    async fn simple_route_answers_without_planning() {
        let provider = Arc::new(MockProvider::new());
        provider.push_text(
            r#"{"is_simple": true, "confidence": 0.95, "answer": "F/K, fiyatın hisse başına kazanca oranıdır.", "reasoning": "tanım"}"#,
        );
        let orch = orchestrator(
            provider.clone(),
            Arc::new(MockMCP::new()),
            OrchestratorConfig::default(),
        );
        let outcome = orch.run("F/K nedir?", Vec::new()).await.unwrap();
        assert_eq!(outcome.answer, "F/K, fiyatın hisse başına kazanca oranıdır.");
        assert_eq!(provider.calls(), 1);
        assert_eq!(outcome.history.len(), 2);
    }

    #[tokio::test]
    async fn low_confidence_simple_route_goes_through_pipeline() {
        let provider = Arc::new(MockProvider::new());
        // Confidence below the simple-path gate.
        provider.push_text(
            r#"{"is_simple": true, "confidence": 0.5, "answer": "belki", "reasoning": "emin değilim"}"#,
        );
        provider.push_text(r#"{"tasks": [], "reasoning": "bağlamdan cevaplanır"}"#);
        provider.push_text(
            r#"{"answer": "Bağlamdan cevap.", "confidence": 0.7, "data_sources": [], "warnings": []}"#,
        );
        let orch = orchestrator(
            provider.clone(),
            Arc::new(MockMCP::new()),
            OrchestratorConfig::default(),
        );
        let outcome = orch.run("Peki ya dün?", Vec::new()).await.unwrap();
        assert!(outcome.answer.contains("Bağlamdan cevap."));
        assert!(outcome.answer.contains("Yatırım tavsiyesi değildir"));
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn full_pipeline_executes_tasks() {
        let provider = Arc::new(MockProvider::new());
        provider.push_text(
            r#"{"is_simple": false, "confidence": 0.9, "answer": null, "reasoning": "veri gerekli"}"#,
        );
        provider.push_text(
            r#"{"tasks": [{"id": 1, "description": "THYAO fiyatını getir", "tool_name": "hisse_fiyati"}], "reasoning": "tek adım"}"#,
        );
        // Act iteration, then validation, then synthesis.
        provider.push_text("THYAO 320,50 TL");
        provider.push_text(r#"{"done": true, "reason": "fiyat alındı", "confidence": 0.95}"#);
        provider.push_text(
            r#"{"answer": "THYAO güncel fiyatı 320,50 TL.", "confidence": 0.9, "data_sources": ["hisse_fiyati"], "warnings": []}"#,
        );
        let orch = orchestrator(
            provider.clone(),
            Arc::new(MockMCP::new()),
            OrchestratorConfig::default(),
        );
        let outcome = orch.run("THYAO fiyatı nedir?", Vec::new()).await.unwrap();
        assert!(outcome.answer.contains("320,50"));
        assert!(outcome.answer.contains("Yatırım tavsiyesi değildir"));
        assert_eq!(provider.calls(), 5);
        assert_eq!(outcome.usage.requests, 5);
    }

    #[tokio::test]
    async fn circular_plan_is_fatal() {
        let provider = Arc::new(MockProvider::new());
        provider.push_text(
            r#"{"is_simple": false, "confidence": 0.9, "answer": null, "reasoning": "veri"}"#,
        );
        provider.push_text(
            r#"{"tasks": [{"id": 1, "description": "a", "depends_on": [2]}, {"id": 2, "description": "b", "depends_on": [1]}], "reasoning": "döngü"}"#,
        );
        let orch = orchestrator(
            provider,
            Arc::new(MockMCP::new()),
            OrchestratorConfig::default(),
        );
        let err = orch.run("soru", Vec::new()).await.unwrap_err();
        assert!(matches!(
            err,
            borsa_core::Error::CircularDependency { ids } if ids == vec![1, 2]
        ));
    }

    #[tokio::test]
    async fn routing_failure_falls_through_to_planning() {
        let provider = Arc::new(MockProvider::new());
        provider.push_error("model kullanılamıyor");
        provider.push_text(r#"{"tasks": [], "reasoning": "veri gerekmez"}"#);
        provider.push_text("Serbest metin cevap");
        let orch = orchestrator(
            provider.clone(),
            Arc::new(MockMCP::new()),
            OrchestratorConfig::default(),
        );
        let outcome = orch.run("merhaba", Vec::new()).await.unwrap();
        assert!(outcome.answer.contains("Serbest metin cevap"));
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn synthesis_failure_apologizes_with_data() {
        let provider = Arc::new(MockProvider::new());
        provider.push_text(
            r#"{"is_simple": false, "confidence": 0.9, "answer": null, "reasoning": "veri"}"#,
        );
        provider.push_text(
            r#"{"tasks": [{"id": 1, "description": "veri getir"}], "reasoning": "tek adım"}"#,
        );
        provider.push_text("toplanan önemli veri");
        provider.push_text(r#"{"done": true, "reason": "tamam", "confidence": 0.9}"#);
        provider.push_error("sentez hatası");
        let orch = orchestrator(
            provider,
            Arc::new(MockMCP::new()),
            OrchestratorConfig::default(),
        );
        let outcome = orch.run("soru", Vec::new()).await.unwrap();
        assert!(outcome.answer.contains("Üzgünüm"));
        assert!(outcome.answer.contains("toplanan önemli veri"));
        assert!(outcome.answer.contains("Yatırım tavsiyesi değildir"));
    }

    #[tokio::test]
    async fn validation_timeout_counts_task_done() {
        let provider = Arc::new(MockProvider::new());
        provider.push_text("ilk çıktı");
        // Validation response arrives after the validate timeout.
        provider.push_slow_text(
            Duration::from_millis(300),
            r#"{"done": false, "reason": "geç", "confidence": 0.2}"#,
        );
        let mcp = Arc::new(MockMCP::new());
        let config = OrchestratorConfig::default().with_timeouts(fast_timeouts());
        let orch = orchestrator(provider.clone(), mcp, config);
        let executor = TaskExecutor {
            actor: &orch.actor,
            validator: &orch.validator,
            usage: &UsageTracker::new(),
            max_steps_per_task: 5,
            act_timeout: Duration::from_millis(100),
            validate_timeout: Duration::from_millis(50),
        };
        let task = Task::new(1, "veri getir");
        let outputs = executor.run_task(&task, 20).await.unwrap();
        // Single iteration: the timed-out validation counted the task done.
        assert_eq!(outputs, vec!["ilk çıktı".to_string()]);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn validation_error_retries_task() {
        let provider = Arc::new(MockProvider::new());
        provider.push_text("ilk çıktı");
        provider.push_error("doğrulama hatası");
        provider.push_text("ikinci çıktı");
        provider.push_text(r#"{"done": true, "reason": "tamam", "confidence": 0.9}"#);
        let mcp = Arc::new(MockMCP::new());
        let orch = orchestrator(provider, mcp, OrchestratorConfig::default());
        let executor = TaskExecutor {
            actor: &orch.actor,
            validator: &orch.validator,
            usage: &UsageTracker::new(),
            max_steps_per_task: 5,
            act_timeout: Duration::from_secs(5),
            validate_timeout: Duration::from_secs(5),
        };
        let task = Task::new(1, "veri getir");
        let outputs = executor.run_task(&task, 20).await.unwrap();
        assert_eq!(
            outputs,
            vec!["ilk çıktı".to_string(), "ikinci çıktı".to_string()]
        );
    }

    #[tokio::test]
    async fn act_error_keeps_prior_outputs_and_validates() {
        let provider = Arc::new(MockProvider::new());
        provider.push_text("ilk çıktı");
        provider.push_text(r#"{"done": false, "reason": "eksik", "confidence": 0.4}"#);
        // Second iteration: the act call itself fails, the degraded output
        // is appended and the validator still gets consulted.
        provider.push_error("model hatası");
        provider.push_text(r#"{"done": true, "reason": "yeterli", "confidence": 0.8}"#);
        let mcp = Arc::new(MockMCP::new());
        let orch = orchestrator(provider.clone(), mcp, OrchestratorConfig::default());
        let executor = TaskExecutor {
            actor: &orch.actor,
            validator: &orch.validator,
            usage: &UsageTracker::new(),
            max_steps_per_task: 5,
            act_timeout: Duration::from_secs(5),
            validate_timeout: Duration::from_secs(5),
        };
        let task = Task::new(1, "veri getir");
        let outputs = executor.run_task(&task, 20).await.unwrap();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0], "ilk çıktı");
        assert!(outputs[1].starts_with("Araç çağrısı başarısız:"));
        assert!(outputs[1].contains("model hatası"));
        // Both act calls and both validations reached the provider.
        assert_eq!(provider.calls(), 4);
    }

    #[tokio::test]
    async fn act_timeout_produces_placeholder_output() {
        let provider = Arc::new(MockProvider::new());
        provider.push_slow_text(Duration::from_millis(300), "çok geç");
        let mcp = Arc::new(MockMCP::new());
        let orch = orchestrator(provider, mcp, OrchestratorConfig::default());
        let executor = TaskExecutor {
            actor: &orch.actor,
            validator: &orch.validator,
            usage: &UsageTracker::new(),
            max_steps_per_task: 5,
            act_timeout: Duration::from_millis(50),
            validate_timeout: Duration::from_millis(50),
        };
        let task = Task::new(1, "veri getir");
        let outputs = executor.run_task(&task, 20).await.unwrap();
        assert_eq!(outputs, vec!["İşlem zaman aşımına uğradı".to_string()]);
    }

    #[tokio::test]
    async fn valuation_route_runs_workflow() {
        let provider = Arc::new(MockProvider::new());
        provider.push_text(
            r#"{"is_simple": false, "confidence": 0.9, "answer": null, "reasoning": "değerleme istendi", "valuation": true}"#,
        );
        provider.push_text(&"THYAO bilanço ve nakit akışı verileri. ".repeat(5));
        provider.push_text(
            r#"{"competence": 0.8, "moat": 0.7, "earnings_quality": 0.8, "safety_margin": 0.7, "position_sizing": 0.6, "owner_earnings": 1000000.0, "commentary": "Güçlü."}"#,
        );
        let orch = orchestrator(
            provider,
            Arc::new(MockMCP::new()),
            OrchestratorConfig::default(),
        );
        let outcome = orch
            .run("THYAO için buffett analizi yap", Vec::new())
            .await
            .unwrap();
        assert!(outcome.answer.contains("Değerleme Sonucu"));
        assert!(outcome.answer.contains("Yatırım tavsiyesi değildir"));
    }
}
