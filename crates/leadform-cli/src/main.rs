mod logging;
mod page;
mod settings;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use leadform_core::{
    Document, Error as CoreError, FieldRule, FormId, FormState, Page, classes, compute_rules,
    lock_form,
};
use leadform_submit::{
    FormSite, HttpTransport, ModalBridge, ModalManager, ModalRegistry, RetryStore,
    SubmissionPipeline, SubmitError, SubmitOutcome, lock_modals,
};
use logging::init_logging;
use page::{Step, load_page, load_script};
use serde::Serialize;
use settings::{Settings, load_settings};
use thiserror::Error;

#[derive(Debug, Error)]
enum CliError {
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("submit error: {0}")]
    Submit(#[from] SubmitError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("logging error: {0}")]
    Logging(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

type CliResult<T> = Result<T, CliError>;

#[derive(Parser, Debug)]
#[command(name = "leadform", version, about = "Lead form validation and submission")]
struct Cli {
    /// Settings file.
    #[arg(long, global = true, default_value = "leadform.toml")]
    settings: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the rule set generated for every lead form on a page.
    Rules(RulesArgs),
    /// Print the JSON schema of page descriptions.
    Schema,
    /// Replay a scripted interaction and send valid forms to the endpoint.
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct RulesArgs {
    /// Page description (TOML or JSON).
    #[arg(long)]
    page: PathBuf,
    /// Override every contact selector with this value.
    #[arg(long)]
    select: Option<String>,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Page description (TOML or JSON).
    #[arg(long)]
    page: PathBuf,
    /// Interaction script (TOML or JSON).
    #[arg(long)]
    script: PathBuf,
    /// Site origin; overrides `submit.origin`.
    #[arg(long)]
    origin: Option<String>,
    /// Request timeout in milliseconds; overrides `submit.timeout_ms`.
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Write the final page state here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let settings = load_settings(&cli.settings)?;
    init_logging(&settings.log.filter, settings.log.json_file.as_deref())?;

    match cli.command {
        Command::Rules(args) => run_rules(args),
        Command::Schema => run_schema(),
        Command::Run(args) => run_script(settings, args).await,
    }
}

#[derive(Serialize)]
struct FormRules {
    form: FormId,
    mode: String,
    rules: Vec<FieldRule>,
}

fn run_rules(args: RulesArgs) -> CliResult<()> {
    let mut document = Document::from_page(load_page(&args.page)?);
    let mut report = Vec::new();
    for (id, shared) in document.discover_forms() {
        let mut form = lock_form(&shared);
        if let Some(value) = args.select.as_deref() {
            form.set_value(classes::SELECT, value);
        }
        let state = FormState::capture(id, &form);
        report.push(FormRules {
            form: id,
            mode: state.mode().to_string(),
            rules: compute_rules(&state),
        });
    }
    tracing::info!(event = "rules_generated", forms = report.len());
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_schema() -> CliResult<()> {
    let schema = schemars::schema_for!(Page);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

#[derive(Serialize)]
struct StepReport {
    step: usize,
    action: Step,
    outcome: String,
    active_modal: Option<String>,
}

#[derive(Serialize)]
struct RunReport {
    steps: Vec<StepReport>,
    pending_retry: bool,
    page: Page,
}

async fn run_script(mut settings: Settings, args: RunArgs) -> CliResult<()> {
    if let Some(origin) = args.origin {
        settings.submit.origin = origin;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        if timeout_ms == 0 {
            return Err(CliError::InvalidConfig(
                "--timeout-ms must be greater than zero".to_string(),
            ));
        }
        settings.submit.timeout_ms = timeout_ms;
    }

    let script = load_script(&args.script)?;
    let document = Document::from_page(load_page(&args.page)?);
    let destination = settings.submit.destination()?;

    let client = reqwest::Client::builder()
        .user_agent(concat!("leadform/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let modals = ModalRegistry::new(settings.modal_specs()).shared();
    let pipeline = SubmissionPipeline::new(
        Arc::new(HttpTransport::with_client(client)),
        Arc::new(RetryStore::new()),
        ModalBridge::new(Arc::clone(&modals), settings.submit.modals.clone()),
        destination.clone(),
        settings.submit.timeout(),
    )
    .with_after_submit(Arc::new(|form| {
        tracing::info!(event = "lead_delivered", form = %form);
        Ok(())
    }));

    let mut site = FormSite::new(document, pipeline);
    let registered = site.init();
    tracing::info!(
        event = "run_started",
        forms = registered.len(),
        destination = %destination,
        steps = script.steps.len()
    );

    let timer = Instant::now();
    let mut steps = Vec::with_capacity(script.steps.len());
    for (index, step) in script.steps.into_iter().enumerate() {
        let outcome = match &step {
            Step::Select { form, value } => site
                .select_contact(*form, value)
                .map(|mode| format!("mode {mode}")),
            Step::Input { form, class, value } => {
                site.input(*form, class, value).map(|()| "ok".to_string())
            }
            Step::Submit { form } => match site.submit(*form) {
                Ok(dispatch) => Ok(describe(&dispatch.outcome().await)),
                Err(err) => Err(err),
            },
            Step::Retry => Ok(describe(&site.retry().outcome().await)),
            Step::Acknowledge { modal } => {
                site.acknowledge(modal.as_deref());
                Ok("ok".to_string())
            }
        };
        let outcome = outcome.unwrap_or_else(|err| {
            tracing::warn!(event = "step_failed", step = index, error = %err);
            format!("error: {err}")
        });
        let active_modal = lock_modals(&modals).active_modal();
        tracing::info!(event = "step_finished", step = index, outcome = %outcome);
        steps.push(StepReport {
            step: index,
            action: step,
            outcome,
            active_modal,
        });
    }

    let report = RunReport {
        steps,
        pending_retry: !site.pipeline().store().is_empty(),
        page: site.document().to_page(),
    };
    let rendered = serde_json::to_string_pretty(&report)?;
    match args.out {
        Some(path) => {
            std::fs::write(&path, rendered)?;
            tracing::info!(event = "report_written", path = %path.display());
        }
        None => println!("{rendered}"),
    }

    let duration_ms = timer.elapsed().as_millis();
    tracing::info!(event = "run_finished", duration_ms = duration_ms);
    Ok(())
}

fn describe(outcome: &SubmitOutcome) -> String {
    match outcome {
        SubmitOutcome::Success => "success".to_string(),
        SubmitOutcome::Failed(failure) => format!("failed: {failure}"),
        SubmitOutcome::Skipped(reason) => format!("skipped: {reason}"),
    }
}
