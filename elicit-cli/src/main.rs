//! Elicit CLI
//!
//! Runs one elicitation session: picks a problem instance for the chosen
//! task, wires up the provider and response cache, drives the round loop,
//! and writes the transcript plus a metrics summary.

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use colored::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

use elicit::agent::{ActiveLearningAgent, GenerativeQuestionsAgent, InteractiveUserAgent};
use elicit::config::{ElicitConfig, LlmConfig, SessionConfig};
use elicit::elicitation::{run_session, EvalCondition, LoopConfig, QueryInput};
use elicit::llm::{LlmProviderType, ProviderFactory, QueryService, ResponseCache};
use elicit::transcript::TranscriptWriter;
use elicit::types::ProblemInstance;

#[derive(Parser, Debug)]
#[command(name = "elicit", about = "Active preference elicitation sessions")]
struct Args {
    /// Target format family; names a subdirectory of --tasks-dir.
    #[arg(long, default_value = "email_regex")]
    task: String,

    /// Optional TOML config file. When given, provider and session settings
    /// come from it and the corresponding flags below are ignored.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Provider type: stub, openai, anthropic.
    #[arg(long, default_value = "stub")]
    provider: String,

    /// Model identifier passed to the provider.
    #[arg(long, default_value = "stub-model")]
    engine: String,

    /// Number of interaction rounds.
    #[arg(long, default_value_t = 5)]
    num_interactions: usize,

    /// Question type for the generative agent: yn or open.
    #[arg(long, default_value = "open")]
    question_type: String,

    /// Candidate questions generated per round.
    #[arg(long, default_value_t = 1)]
    num_candidate_questions: usize,

    /// Sampling temperature for every service call.
    #[arg(long, default_value_t = 0.0)]
    temperature: f64,

    /// Seed for problem-instance selection.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Disable the durable response cache.
    #[arg(long)]
    no_cache: bool,

    /// Type questions yourself instead of generating them.
    #[arg(long)]
    interactive: bool,

    /// Evaluate metrics only after the final round.
    #[arg(long)]
    eval_at_end: bool,

    /// Directory holding per-task problem instance files.
    #[arg(long, default_value = "tasks", env = "ELICIT_TASKS_DIR")]
    tasks_dir: PathBuf,

    /// Directory for transcripts and summaries.
    #[arg(long, default_value = "results", env = "ELICIT_OUTPUT_DIR")]
    output_dir: PathBuf,
}

impl Args {
    /// Resolve provider and session settings from the config file or from
    /// the flags.
    fn resolve_config(&self) -> anyhow::Result<(LlmConfig, SessionConfig)> {
        if let Some(path) = &self.config {
            let config = ElicitConfig::load(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            return Ok((config.llm, config.session));
        }

        let provider_type = match self.provider.as_str() {
            "stub" => LlmProviderType::Stub,
            "openai" => LlmProviderType::OpenAi,
            "anthropic" => LlmProviderType::Anthropic,
            other => bail!("unknown provider: {other} (expected stub, openai, or anthropic)"),
        };
        let llm = LlmConfig {
            provider_type,
            model: self.engine.clone(),
            ..Default::default()
        };
        let session = SessionConfig {
            num_rounds: self.num_interactions,
            question_type: self.question_type.clone(),
            num_candidate_questions: self.num_candidate_questions,
            temperature: self.temperature,
            eval_condition: if self.eval_at_end {
                EvalCondition::AtEnd
            } else {
                EvalCondition::PerTurn
            },
            ..Default::default()
        };
        Ok((llm, session))
    }
}

/// Reads questions from stdin with a visible prompt.
struct StdinInput;

impl QueryInput for StdinInput {
    fn next_query(&mut self) -> elicit::Result<String> {
        print!("{} ", "Your question (or 'quit' to exit):".yellow().bold());
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        Ok(line.trim().to_string())
    }
}

/// Forwards transcript output to the file and to the terminal, so
/// interactive users see each round as it completes.
struct Tee {
    file: File,
    term: io::Stdout,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.file.write(buf)?;
        self.term.write_all(&buf[..n])?;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.term.flush()
    }
}

/// Pick one instance file for the task, deterministically under the seed.
fn pick_instance(tasks_dir: &PathBuf, task: &str, seed: u64) -> anyhow::Result<PathBuf> {
    let task_dir = tasks_dir.join(task);
    let mut instances: Vec<PathBuf> = std::fs::read_dir(&task_dir)
        .with_context(|| format!("failed to read task directory {}", task_dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    instances.sort();

    if instances.is_empty() {
        bail!("no problem instances found in {}", task_dir.display());
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let index = rng.gen_range(0..instances.len());
    Ok(instances[index].clone())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let (llm_config, session_config) = args.resolve_config()?;

    let instance_path = pick_instance(&args.tasks_dir, &args.task, args.seed)?;
    let instance = ProblemInstance::load(&instance_path)
        .with_context(|| format!("failed to load {}", instance_path.display()))?;
    tracing::info!(instance = %instance_path.display(), "selected problem instance");

    let provider = ProviderFactory::create(llm_config.to_provider_config())?;

    let cache = if args.no_cache {
        None
    } else {
        let cache_path = format!("{}-cache-seed-{}.jsonl", llm_config.model, args.seed);
        Some(ResponseCache::open(cache_path)?)
    };
    let service = QueryService::new(provider, cache);

    let mut agent: Box<dyn ActiveLearningAgent> = if args.interactive {
        Box::new(InteractiveUserAgent::new(
            instance,
            service,
            session_config.temperature,
        ))
    } else {
        Box::new(GenerativeQuestionsAgent::new(
            instance,
            service,
            session_config.temperature,
            &session_config.question_type,
            session_config.implementation.clone(),
            session_config.num_candidate_questions,
        )?)
    };

    let output_dir = args.output_dir.join(&args.task);
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let query_mode = if args.interactive {
        "interactive".to_string()
    } else {
        format!("questions_{}", session_config.question_type)
    };
    let stem = format!("{}_{}_{}", llm_config.model, args.seed, query_mode);
    let transcript_path = output_dir.join(format!("{stem}.txt"));
    let summary_path = output_dir.join(format!("{stem}.json"));

    let loop_config = LoopConfig {
        num_rounds: session_config.num_rounds,
        eval_condition: session_config.eval_condition,
    };

    let file = File::create(&transcript_path)
        .with_context(|| format!("failed to create {}", transcript_path.display()))?;

    let outcome = if args.interactive {
        println!("{}", "=========================================".blue());
        println!("{}", "        Elicit Interactive Session       ".blue().bold());
        println!("{}", "=========================================".blue());
        println!("Task:   {}", args.task.green());
        println!("Rounds: {}", session_config.num_rounds.to_string().green());
        println!("{}", "Type 'quit', 'exit', or 'stop' to finish.".dimmed());
        println!("{}", "=========================================".blue());

        let mut transcript = TranscriptWriter::new(Tee {
            file,
            term: io::stdout(),
        });
        let mut input = StdinInput;
        run_session(
            agent.as_mut(),
            &loop_config,
            Some(&mut input),
            Some(&mut transcript),
        )
        .await?
    } else {
        let mut transcript = TranscriptWriter::new(file);
        run_session(agent.as_mut(), &loop_config, None, Some(&mut transcript)).await?
    };

    let summary = serde_json::json!({
        "task": args.task,
        "engine": llm_config.model,
        "seed": args.seed,
        "query_mode": query_mode,
        "completed_rounds": outcome.completed_rounds,
        "recorded_at": chrono::Utc::now().to_rfc3339(),
        "features": outcome.features,
        "scores": outcome.scores,
    });
    std::fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)
        .with_context(|| format!("failed to write {}", summary_path.display()))?;

    println!(
        "{} {} rounds completed, transcript at {}",
        "done:".green().bold(),
        outcome.completed_rounds,
        transcript_path.display()
    );
    if let Some(series) = outcome.scores.get("accuracy") {
        println!("accuracy across rounds: {:?}", series);
    }
    Ok(())
}
