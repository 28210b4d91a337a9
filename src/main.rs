//! buildrun CLI entry point
//!
//! Usage:
//!   buildrun                      Compile, link and run with configured modules
//!   buildrun --modules a,b -o p   Same, for modules a and b linked into p
//!   buildrun compile|link|exec    Run a single stage
//!   buildrun plan                 Show the commands without running them
//!   buildrun clean                Remove objects and the executable
//!   buildrun config               Show configuration

use std::io::{IsTerminal, Write};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use buildrun::cli::{init_logging, Cli, Commands, OutputFormat};
use buildrun::config::{find_config_files, load_config, Config};
use buildrun::error::{exit_codes, BuildError, ErrorInfo};
use buildrun::pipeline::{
    BuildConfiguration, BuildRunner, Stage, StageObserver, StageOutcome, SystemLauncher,
};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report_error(&e),
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config.as_deref())?;
    config.apply_overrides(&cli.build.overrides());
    let build = config.build_configuration()?;
    let ui = Ui::new(cli.quiet, cli.verbose);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let runner = system_runner(&config)?;
            let mut progress = StageProgress::new(ui);
            let result = runner.run_stages_with(&build, &mut progress);
            progress.finish();
            let output = result?;

            write_stdout(output.output())?;
            ui.done(output.total_duration_ms());
        }
        Commands::Compile => {
            let runner = system_runner(&config)?;
            let mut progress = StageProgress::new(ui);
            progress.start(Stage::Compile);
            let result = runner.compile(build.modules());
            progress.finish();
            ui.warnings(&result?);
        }
        Commands::Link => {
            let runner = system_runner(&config)?;
            let mut progress = StageProgress::new(ui);
            progress.start(Stage::Link);
            let result = runner.link(build.modules(), build.executable());
            progress.finish();
            ui.warnings(&result?);
        }
        Commands::Exec => {
            let runner = system_runner(&config)?;
            let output = runner.run_executable(build.executable())?;
            write_stdout(&output)?;
        }
        Commands::Plan(args) => {
            let runner = system_runner(&config)?;
            show_plan(&runner, &build, args.format)?;
        }
        Commands::Clean => {
            let runner = system_runner(&config)?;
            for path in runner.clean(&build)? {
                if !ui.quiet {
                    eprintln!("{}: {}", "removed".cyan(), path.display());
                }
            }
        }
        Commands::Config(args) => {
            show_config(&config, &build, args.format)?;
        }
    }

    Ok(())
}

/// Runner over real processes, configured from `config`
fn system_runner(config: &Config) -> Result<BuildRunner<SystemLauncher>> {
    let launcher = SystemLauncher::new()?;
    let mut runner = BuildRunner::new(launcher, config.toolchain.clone())
        .with_working_dir(config.working_dir())
        .with_env(config.build.env.clone());
    if let Some(timeout) = config.timeout() {
        runner = runner.with_timeout(timeout);
    }
    Ok(runner)
}

/// Write program output byte-for-byte, without a trailing newline
fn write_stdout(output: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(output.as_bytes())
        .and_then(|()| stdout.flush())
        .context("Failed to write program output")
}

#[derive(Clone, Copy)]
struct Ui {
    quiet: bool,
    verbose: bool,
}

impl Ui {
    fn new(quiet: bool, verbose: bool) -> Self {
        Self { quiet, verbose }
    }

    /// Forward compiler or linker warnings from a successful stage
    fn warnings(&self, outcome: &StageOutcome) {
        if self.quiet {
            return;
        }
        if !outcome.stderr.trim().is_empty() {
            eprint!("{}", outcome.stderr);
            if !outcome.stderr.ends_with('\n') {
                eprintln!();
            }
        }
        if outcome.truncated {
            eprintln!(
                "{}: {} output was longer than the capture limit and was cut short",
                "warning".yellow().bold(),
                outcome.stage
            );
        }
    }

    fn done(&self, duration_ms: u64) {
        if self.verbose {
            eprintln!("{}: finished in {}ms", "success".green(), duration_ms);
        }
    }
}

/// Stage banners, plus a spinner while the compiler or linker runs
struct StageProgress {
    ui: Ui,
    spinner: Option<ProgressBar>,
}

impl StageProgress {
    fn new(ui: Ui) -> Self {
        Self { ui, spinner: None }
    }

    fn start(&mut self, stage: Stage) {
        self.finish();
        if self.ui.quiet {
            return;
        }

        match stage {
            Stage::Run if !self.ui.verbose => {}
            _ => eprintln!("{}", stage.banner().bold()),
        }

        // The program inherits our stderr, so no spinner for it
        if stage != Stage::Run && std::io::stderr().is_terminal() {
            let spinner = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg} {elapsed}") {
                spinner.set_style(style);
            }
            spinner.set_message(match stage {
                Stage::Compile => "compiling",
                _ => "linking",
            });
            spinner.enable_steady_tick(Duration::from_millis(100));
            self.spinner = Some(spinner);
        }
    }

    fn finish(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

impl StageObserver for StageProgress {
    fn stage_started(&mut self, stage: Stage) {
        self.start(stage);
    }

    // Warnings go out before the next stage starts, ahead of the program's own stderr
    fn stage_finished(&mut self, outcome: &StageOutcome) {
        self.finish();
        if outcome.stage != Stage::Run {
            self.ui.warnings(outcome);
        }
    }
}

fn show_plan(
    runner: &BuildRunner<SystemLauncher>,
    build: &BuildConfiguration,
    format: OutputFormat,
) -> Result<()> {
    let plan = runner.plan(build)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        OutputFormat::Plain => {
            for invocation in &plan {
                println!("{}", invocation);
            }
        }
        OutputFormat::Table => {
            println!("{}: {}", "Directory".cyan(), runner.working_dir().display());
            println!();
            for invocation in &plan {
                println!("  {}  {}", format!("{:8}", invocation.stage).green(), invocation);
            }
        }
    }

    Ok(())
}

/// Show resolved configuration
fn show_config(config: &Config, build: &BuildConfiguration, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        OutputFormat::Plain => {
            print!(
                "{}",
                toml::to_string_pretty(config).context("Failed to render configuration")?
            );
        }
        OutputFormat::Table => {
            let modules: Vec<&str> = build.modules().iter().map(|m| m.as_str()).collect();
            println!("{}: {}", "Modules".cyan(), modules.join(", "));
            println!("{}: {}", "Executable".cyan(), build.executable());
            println!("{}: {}", "Directory".cyan(), config.build.working_dir);

            let compiler = &config.toolchain.compiler;
            match which::which(compiler) {
                Ok(path) => println!("{}: {} ({})", "Compiler".cyan(), compiler, path.display()),
                Err(_) => println!(
                    "{}: {} ({})",
                    "Compiler".cyan(),
                    compiler,
                    "not found".yellow()
                ),
            }
            if config.toolchain.linker.is_some() {
                println!("{}: {}", "Linker".cyan(), config.toolchain.linker());
            }
            match config.timeout() {
                Some(timeout) => println!("{}: {}s", "Timeout".cyan(), timeout.as_secs()),
                None => println!("{}: none", "Timeout".cyan()),
            }

            let files = find_config_files();
            if !files.is_empty() {
                println!("{}:", "Config Files".cyan());
                for file in &files {
                    println!("  - {}", file.display());
                }
            }
        }
    }

    Ok(())
}

/// Print an error and pick the exit code
fn report_error(err: &anyhow::Error) -> ExitCode {
    let Some(build_err) = err.downcast_ref::<BuildError>() else {
        eprintln!("{}: {:#}", "error".red().bold(), err);
        return ExitCode::from(exit_codes::CONFIG);
    };

    // What the program printed before failing is still its output
    if let BuildError::Execution { stdout, .. } = build_err {
        if let Err(e) = write_stdout(stdout) {
            tracing::warn!("{:#}", e);
        }
    }

    let info = ErrorInfo::from(build_err);
    if let Ok(json) = serde_json::to_string(&info) {
        tracing::debug!("{}", json);
    }

    eprintln!("{}: {}", "error".red().bold(), build_err);
    if let Some(signal) = build_err.signal() {
        eprintln!("killed by signal {}", signal);
    }
    if let Some(diagnostics) = build_err.diagnostics() {
        eprintln!("{}", diagnostics.trim_end());
    }
    if let Some(suggestion) = info.suggestion {
        eprintln!("{}: {}", "hint".yellow().bold(), suggestion);
    }

    ExitCode::from(build_err.exit_code())
}
