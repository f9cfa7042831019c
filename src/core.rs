//! Main execution logic
//!
//! Parses arguments, loads configuration, installs logging and dispatches to
//! the `debug`, `test-step` and `pick` commands.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader, Lines, Stdin};
use tracing::{debug, error, info, warn};

use crate::chain::{
    format_session_summary, format_session_summary_json, load_chain, ChainDebugger, ChainDefinition, DebugSession,
    StepForm, StepIsolationTester, StepOutcome, StepStatus,
};
use crate::cli::commands::{DEBUG_HELP, PICKER_HELP};
use crate::cli::{Args, Command, DebugArgs, DebugCommand, PickArgs, PickerCommand, TestStepArgs};
use crate::client::{ChainBackend, HttpBackend};
use crate::config::Config;
use crate::errors::{ChainpulseError, Result};
use crate::logging;
use crate::models::ResponseBody;
use crate::output::{format_json_value, JsonFormatterOptions, Palette, TerminalDebuggerView, TerminalIsolationView};
use crate::picker::{PickerEvent, ResponseDataPicker, RulesField, TerminalRenderer, TreeBuilder};
use crate::signals;
use crate::status::ExitStatus;

/// Main entry point for the CLI.
pub fn run(args: Vec<String>) -> ExitStatus {
    let parsed = match Args::try_parse_from(&args) {
        Ok(args) => args,
        Err(e) => {
            e.print().ok();
            return if e.kind() == clap::error::ErrorKind::DisplayHelp
                || e.kind() == clap::error::ErrorKind::DisplayVersion {
                ExitStatus::Success
            } else {
                ExitStatus::Error
            };
        }
    };

    logging::init(parsed.verbose, parsed.log_format);

    let config = match load_config(&parsed) {
        Ok(config) => config,
        Err(e) => return handle_error(e),
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => return handle_error(e.into()),
    };

    match runtime.block_on(program(parsed, config)) {
        Ok(status) => status,
        Err(e) => handle_error(e),
    }
}

/// Config file first, then command-line overrides
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) if args.config.is_none() => {
            eprintln!("Warning: Failed to load config: {}", e);
            warn!(error = %e, "falling back to default configuration");
            Config::default()
        }
        Err(e) => return Err(e),
    };

    if let Some(ref base_url) = args.base_url {
        config.set_base_url(base_url)?;
    }
    if let Some(ref timeout) = args.timeout {
        config.set_timeout(timeout)?;
    }
    if args.no_color {
        config.output.colors = false;
    }

    debug!(base_url = %config.server.base_url, timeout = ?config.server.timeout, "configuration loaded");
    Ok(config)
}

pub async fn program(args: Args, config: Config) -> Result<ExitStatus> {
    let palette = Palette::detect(config.output.colors);

    match args.command {
        Command::Debug(ref debug_args) => run_debug(debug_args, &config, palette).await,
        Command::TestStep(ref test_args) => run_test_step(test_args, &config, palette).await,
        Command::Pick(ref pick_args) => run_pick(pick_args, &config, palette).await,
    }
}

fn handle_error(error: ChainpulseError) -> ExitStatus {
    error!(error = %error, "command failed");
    eprintln!("Error: {}", error);

    match error {
        ChainpulseError::Cancelled => ExitStatus::Interrupted,
        _ => ExitStatus::Error,
    }
}

// =============================================================================
// PROMPT
// =============================================================================

/// Line-oriented stdin reader that gives up when Ctrl+C is pressed
struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    fn new() -> Self {
        Self { lines: BufReader::new(tokio::io::stdin()).lines() }
    }

    /// Next trimmed line, or `None` at end of input or on interrupt
    async fn read(&mut self, label: &str) -> Result<Option<String>> {
        print!("{}", label);
        std::io::stdout().flush()?;

        tokio::select! {
            line = self.lines.next_line() => Ok(line?.map(|l| l.trim().to_string())),
            _ = wait_for_interrupt() => Ok(None),
        }
    }
}

async fn wait_for_interrupt() {
    while !signals::was_interrupted() {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

// =============================================================================
// DEBUG
// =============================================================================

async fn run_debug(args: &DebugArgs, config: &Config, palette: Palette) -> Result<ExitStatus> {
    let chain = match args.chain {
        Some(ref path) => load_chain(path)?,
        None => ChainDefinition::from_step_ids(args.steps.iter().cloned())?,
    };
    info!(chain = %chain.name, steps = chain.len(), "starting debug session");

    let backend = HttpBackend::new(&config.server)?;
    let view = TerminalDebuggerView::stdout(palette, config.output.pretty);
    let mut debugger = ChainDebugger::new(backend, chain, view);

    signals::register_request(debugger.cancel_handle());
    let result = if args.all {
        debug_to_end(&mut debugger, args.json).await
    } else {
        debug_interactively(&mut debugger, args.json, palette).await
    };
    signals::clear_request();

    result
}

async fn debug_to_end<B: ChainBackend>(
    debugger: &mut ChainDebugger<B, TerminalDebuggerView>,
    json: bool,
) -> Result<ExitStatus> {
    let outcomes = debugger.run_to_end().await;
    print_summary(debugger.session(), json);

    let failed = outcomes.last().is_some_and(|o| matches!(o, StepOutcome::Failed { .. }));
    Ok(if failed { ExitStatus::StepFailed } else { ExitStatus::Success })
}

async fn debug_interactively<B: ChainBackend>(
    debugger: &mut ChainDebugger<B, TerminalDebuggerView>,
    json: bool,
    palette: Palette,
) -> Result<ExitStatus> {
    let session = debugger.session();
    println!(
        "Chain {} ({} steps). Type 'help' for commands.",
        palette.label(&session.chain().name),
        session.steps().len()
    );

    let mut prompt = Prompt::new();
    loop {
        let label = prompt_label(debugger.session());
        let Some(line) = prompt.read(&label).await? else { break };
        if line.is_empty() {
            continue;
        }

        let command = match line.parse::<DebugCommand>() {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{}", palette.error(&e.to_string()));
                continue;
            }
        };

        match command {
            DebugCommand::Next => {
                if debugger.run_next_step().await == StepOutcome::Exhausted {
                    println!("All steps have run. Type 'r' to start over.");
                }
            }
            DebugCommand::Reset => debugger.reset_session(),
            DebugCommand::Context => {
                let context = serde_json::to_value(debugger.session().context())?;
                println!("{}", format_json_value(&context, &JsonFormatterOptions::default()).unwrap_or_default());
            }
            DebugCommand::Status => print_summary(debugger.session(), json),
            DebugCommand::Help => println!("{}", DEBUG_HELP),
            DebugCommand::Quit => break,
        }
    }

    Ok(session_status(debugger.session()))
}

fn prompt_label(session: &DebugSession) -> String {
    match session.current_step() {
        Some(step) => format!("step {}/{} {}> ", session.cursor() + 1, session.steps().len(), step.display_name()),
        None => "done> ".to_string(),
    }
}

fn print_summary(session: &DebugSession, json: bool) {
    if json {
        print!("{}", format_session_summary_json(session));
    } else {
        print!("{}", format_session_summary(session));
    }
}

/// Step failed when the session stopped on a failed or cancelled step
fn session_status(session: &DebugSession) -> ExitStatus {
    match session.status(session.cursor()) {
        Some(StepStatus::Failed) | Some(StepStatus::Cancelled) => ExitStatus::StepFailed,
        _ => ExitStatus::Success,
    }
}

// =============================================================================
// TEST-STEP
// =============================================================================

async fn run_test_step(args: &TestStepArgs, config: &Config, palette: Palette) -> Result<ExitStatus> {
    let form = StepForm {
        endpoint_id: args.endpoint_id.clone(),
        payload: read_arg(&args.payload)?,
        headers: read_arg(&args.headers)?,
        data_extraction_rules: read_arg(&args.rules)?,
        mock_context: read_arg(&args.mock_context)?,
    };

    let backend = HttpBackend::new(&config.server)?;
    let view = TerminalIsolationView::stdout(palette, config.output.pretty);
    let mut tester = StepIsolationTester::new(backend, view);

    signals::register_request(tester.cancel_handle());
    let result = tester.test_step(&form).await;
    signals::clear_request();

    // The view has already reported any failure
    let panels = match result {
        Ok(panels) => panels,
        Err(ChainpulseError::Validation { .. }) => return Ok(ExitStatus::Error),
        Err(ChainpulseError::Cancelled) => return Ok(ExitStatus::Interrupted),
        Err(_) => return Ok(ExitStatus::StepFailed),
    };

    if args.pick {
        let mut field = load_rules_field(args.rules_out.as_deref(), &form.data_extraction_rules)?;
        let mut picker = new_picker(config, palette);
        picker.set_response_data(panels.response_body);
        pick_interactively(&mut picker, &mut field, args.rules_out.as_deref(), palette).await?;
    }

    Ok(ExitStatus::Success)
}

/// `@path` reads the value from a file
fn read_arg(value: &str) -> Result<String> {
    match value.strip_prefix('@') {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| ChainpulseError::Argument(format!("Cannot read {}: {}", path, e))),
        None => Ok(value.to_string()),
    }
}

// =============================================================================
// PICK
// =============================================================================

async fn run_pick(args: &PickArgs, config: &Config, palette: Palette) -> Result<ExitStatus> {
    let from_stdin = args.input.as_deref().is_none_or(|p| p == Path::new("-"));
    if from_stdin && args.select.is_empty() {
        return Err(ChainpulseError::Argument(
            "Interactive picking needs a FILE; use --select when reading stdin".to_string(),
        ));
    }

    let raw = match args.input {
        Some(ref path) if !from_stdin => fs::read_to_string(path)
            .map_err(|e| ChainpulseError::Argument(format!("Cannot read {}: {}", path.display(), e)))?,
        _ => {
            let mut raw = String::new();
            tokio::io::stdin().read_to_string(&mut raw).await?;
            raw
        }
    };

    let mut field = load_rules_field(args.rules_out.as_deref(), "")?;
    let mut picker = new_picker(config, palette);
    picker.set_response_data(ResponseBody::from_raw(&raw));

    if args.select.is_empty() {
        pick_interactively(&mut picker, &mut field, args.rules_out.as_deref(), palette).await?;
    } else {
        for path in &args.select {
            picker.toggle_path(path)?;
        }
        picker.commit(&mut field)?;
        store_rules(&field, args.rules_out.as_deref())?;
    }

    Ok(ExitStatus::Success)
}

fn new_picker(config: &Config, palette: Palette) -> ResponseDataPicker {
    let builder = TreeBuilder::new().collapse_threshold(config.output.collapse_threshold);
    let mut picker = ResponseDataPicker::new(builder, TerminalRenderer::new(palette));
    picker.on_change(move |event, _| {
        if let PickerEvent::Committed { added, skipped } = event {
            eprintln!(
                "{}",
                palette.success(&format!("Extraction rules updated: {} added, {} already present", added, skipped))
            );
        }
    });
    picker
}

async fn pick_interactively(
    picker: &mut ResponseDataPicker,
    field: &mut RulesField,
    rules_out: Option<&Path>,
    palette: Palette,
) -> Result<()> {
    show_picker(picker);

    let mut prompt = Prompt::new();
    loop {
        let Some(line) = prompt.read("pick> ").await? else { break };
        let command = match line.parse::<PickerCommand>() {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{}", palette.error(&e.to_string()));
                continue;
            }
        };

        // Ok(true) when the tree or the selections changed
        let result = match command {
            PickerCommand::Toggle(node) => picker.click_value(node).map(|_| true),
            PickerCommand::ToggleKey(node) => picker.click_key(node).map(|_| true),
            PickerCommand::Expand(node) => picker.toggle_collapse(node).map(|_| true),
            PickerCommand::Rename { selection, variable_name } => picker.rename(selection, &variable_name).map(|_| true),
            PickerCommand::Remove(selection) => picker.remove(selection).map(|_| true),
            PickerCommand::Preview(path) => {
                match picker.preview(&path) {
                    Some(value) => println!("{} = {}", palette.label(&path), value),
                    None => println!("{}", palette.muted(&format!("Nothing at '{}'", path))),
                }
                Ok(false)
            }
            PickerCommand::Show => Ok(true),
            PickerCommand::Commit => picker
                .commit(field)
                .and_then(|_| store_rules(field, rules_out))
                .map(|_| false),
            PickerCommand::Help => {
                println!("{}", PICKER_HELP);
                Ok(false)
            }
            PickerCommand::Quit => break,
        };

        match result {
            Ok(true) => show_picker(picker),
            Ok(false) => {}
            Err(e) => {
                warn!(error = %e, "picker command failed");
                eprintln!("{}", palette.error(&e.to_string()));
            }
        }
    }

    Ok(())
}

fn show_picker(picker: &ResponseDataPicker) {
    print!("{}", picker.render());
    println!("Selections:");
    print!("{}", picker.render_selections());
}

/// Existing rules in `path`, or `fallback` when there is no such file
fn load_rules_field(path: Option<&Path>, fallback: &str) -> Result<RulesField> {
    match path {
        Some(path) if path.exists() => Ok(RulesField::new(fs::read_to_string(path)?)),
        _ => Ok(RulesField::new(fallback)),
    }
}

fn store_rules(field: &RulesField, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, format!("{}\n", field.text()))?;
            info!(path = %path.display(), "extraction rules written");
            eprintln!("Rules written to {}", path.display());
        }
        None => println!("{}", field.text()),
    }
    Ok(())
}
