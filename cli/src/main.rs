//! CLI entrypoint for form-solver
//!
//! This is the main binary that wires together all layers using
//! dependency injection. It dry-runs the pipeline against a saved form page
//! and reports every mutation the adapters would make on the live page.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use solver_application::ports::form_adapter::FormAdapter;
use solver_application::{Dispatcher, SolveFormUseCase, UiState};
use solver_infrastructure::page::memory::QuestionControls;
use solver_infrastructure::{
    FileSettingsStore, GeminiGateway, GoogleFormAdapter, MemoryFormPage, MsFormAdapter,
    OpenAiGateway,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormFlavor {
    Google,
    Microsoft,
}

#[derive(Parser)]
#[command(name = "form-solver", version, about = "Answer a saved form page with reconciled LLM answers")]
struct Cli {
    /// Form flavor of the page
    #[arg(long, value_enum, default_value_t = FormFlavor::Google)]
    form: FormFlavor,

    /// Saved form page (HTML) to solve
    #[arg(long)]
    page: Option<PathBuf>,

    /// Settings file holding the API keys and the UI flag
    #[arg(long, default_value = "settings.toml")]
    settings: PathBuf,

    /// Delay between questions in milliseconds
    #[arg(long, default_value_t = 500)]
    delay_ms: u64,

    /// Persist the UI flag as visible and exit
    #[arg(long, conflicts_with = "hide_ui")]
    show_ui: bool,

    /// Persist the UI flag as hidden and exit
    #[arg(long)]
    hide_ui: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Starting form-solver");

    let html = match &cli.page {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read page {}", path.display()))?,
        None => String::new(),
    };

    // === Dependency Injection ===
    let page = Arc::new(MemoryFormPage::new(html));
    let google = Arc::new(GoogleFormAdapter::new(page.clone()));
    let microsoft = Arc::new(MsFormAdapter::new(page.clone()));
    let settings = Arc::new(FileSettingsStore::new(cli.settings.clone()));
    let ui = UiState::default();

    let use_case = SolveFormUseCase::new(
        Arc::new(OpenAiGateway::new()),
        Arc::new(GeminiGateway::new()),
        settings.clone(),
        ui.clone(),
    )
    .with_question_delay(Duration::from_millis(cli.delay_ms));

    let dispatcher = Dispatcher::new(
        use_case,
        google.clone(),
        microsoft.clone(),
        settings,
        ui,
    );
    dispatcher.sync_ui_from_settings().await;

    // UI maintenance actions short-circuit the solve.
    if cli.show_ui || cli.hide_ui {
        let action = if cli.show_ui { "showUI" } else { "hideUI" };
        let response = dispatcher.handle_raw(action).await;
        println!("{}", response.status);
        return Ok(());
    }

    if cli.page.is_none() {
        bail!("A form page is required. Pass one with --page.");
    }

    // Size the simulated page to the questions the chosen adapter sees.
    let (action, adapter): (&str, &dyn FormAdapter) = match cli.form {
        FormFlavor::Google => ("runScript-gform", google.as_ref()),
        FormFlavor::Microsoft => ("runScript-msform", microsoft.as_ref()),
    };
    let questions = adapter
        .extract_questions()
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    page.register_questions(&questions);
    println!("Detected {} question(s)", questions.len());

    let response = dispatcher.handle_raw(action).await;
    println!("{}", response.status);

    print_mutations(&questions.iter().map(|q| q.text.clone()).collect::<Vec<_>>(), &page.snapshot());
    Ok(())
}

/// Report what would have changed on the live page.
fn print_mutations(titles: &[String], controls: &[QuestionControls]) {
    for (index, state) in controls.iter().enumerate() {
        let title = titles.get(index).map(String::as_str).unwrap_or("");
        println!();
        println!("[{}] {}", index + 1, title);

        let marked: Vec<usize> = state
            .checks
            .iter()
            .enumerate()
            .filter_map(|(i, checked)| checked.then_some(i + 1))
            .collect();
        if !marked.is_empty() {
            println!(
                "  marked option(s): {}",
                marked
                    .iter()
                    .map(|i| i.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        if let Some(dropdown) = &state.dropdown {
            if let Some(chosen) = &dropdown.chosen {
                println!("  dropdown choice: {}", chosen);
            }
        }
        if let Some(text) = &state.text {
            println!("  text written: {}", text);
        }
        if let Some(annotation) = &state.annotation {
            println!(
                "  annotation: {} ({})",
                annotation.text,
                if annotation.visible { "shown" } else { "hidden" }
            );
        }
    }
}
