//! CLI command definitions using clap
//!
//! Defines all CLI subcommands and their arguments.

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::Overrides;

/// Compile a set of C modules, link them and run the result.
///
/// With no command, runs the whole pipeline and prints the program's
/// output. Stage banners and diagnostics go to stderr.
#[derive(Parser, Debug)]
#[command(name = "buildrun")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub build: BuildArgs,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Don't print stage banners
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file path (overrides default XDG paths)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Flags selecting what to build, applied over the loaded configuration
#[derive(Args, Debug, Default)]
pub struct BuildArgs {
    /// Modules to compile, in order (comma-separated)
    #[arg(short, long, global = true, value_delimiter = ',')]
    pub modules: Option<Vec<String>>,

    /// Name of the executable to link
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    /// Compiler driver used to compile and link
    #[arg(long, global = true, env = "BUILDRUN_COMPILER")]
    pub compiler: Option<String>,

    /// Directory holding the sources
    #[arg(short = 'C', long = "dir", global = true)]
    pub working_dir: Option<String>,

    /// Per-stage timeout in seconds (0 for no timeout)
    #[arg(short, long, global = true)]
    pub timeout: Option<u64>,
}

impl BuildArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            modules: self.modules.clone(),
            executable: self.output.clone(),
            compiler: self.compiler.clone(),
            working_dir: self.working_dir.clone(),
            timeout: self.timeout,
        }
    }
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile, link and run the program (default)
    Run,

    /// Compile the modules into object files
    Compile,

    /// Link existing object files into the executable
    Link,

    /// Run an already-built executable
    Exec,

    /// Show the commands `run` would execute
    Plan(FormatArgs),

    /// Remove object files and the executable
    Clean,

    /// Show resolved configuration
    Config(FormatArgs),
}

/// Arguments for subcommands with selectable output
#[derive(Args, Debug)]
pub struct FormatArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Output format options
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    Table,
    /// JSON output
    Json,
    /// Plain text (one command per line)
    Plain,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_no_command() {
        let cli = Cli::parse_from(["buildrun"]);
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
        assert!(!cli.quiet);
        assert!(cli.build.modules.is_none());
    }

    #[test]
    fn test_cli_parse_modules_and_output() {
        let cli = Cli::parse_from([
            "buildrun",
            "--modules",
            "flexpart_helpers,multi_rddep_w",
            "--output",
            "ddep2bin",
        ]);
        assert_eq!(
            cli.build.modules,
            Some(vec![
                "flexpart_helpers".to_string(),
                "multi_rddep_w".to_string()
            ])
        );
        assert_eq!(cli.build.output, Some("ddep2bin".to_string()));
    }

    #[test]
    fn test_cli_parse_run() {
        let cli = Cli::parse_from(["buildrun", "run"]);
        assert!(matches!(cli.command, Some(Commands::Run)));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "buildrun",
            "compile",
            "-m",
            "a,b",
            "-C",
            "/tmp/project",
            "--compiler",
            "clang",
            "-t",
            "60",
        ]);
        assert!(matches!(cli.command, Some(Commands::Compile)));
        assert_eq!(cli.build.modules, Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(cli.build.working_dir, Some("/tmp/project".to_string()));
        assert_eq!(cli.build.compiler, Some("clang".to_string()));
        assert_eq!(cli.build.timeout, Some(60));
    }

    #[test]
    fn test_cli_parse_plan_json() {
        let cli = Cli::parse_from(["buildrun", "plan", "-f", "json"]);
        if let Some(Commands::Plan(args)) = cli.command {
            assert!(matches!(args.format, OutputFormat::Json));
        } else {
            panic!("Expected Plan command");
        }
    }

    #[test]
    fn test_cli_parse_config_default_format() {
        let cli = Cli::parse_from(["buildrun", "config"]);
        if let Some(Commands::Config(args)) = cli.command {
            assert!(matches!(args.format, OutputFormat::Table));
        } else {
            panic!("Expected Config command");
        }
    }

    #[test]
    fn test_cli_parse_stage_commands() {
        assert!(matches!(
            Cli::parse_from(["buildrun", "link"]).command,
            Some(Commands::Link)
        ));
        assert!(matches!(
            Cli::parse_from(["buildrun", "exec"]).command,
            Some(Commands::Exec)
        ));
        assert!(matches!(
            Cli::parse_from(["buildrun", "clean"]).command,
            Some(Commands::Clean)
        ));
    }

    #[test]
    fn test_cli_verbose_and_quiet_flags() {
        let cli = Cli::parse_from(["buildrun", "-v", "-q", "run"]);
        assert!(cli.verbose);
        assert!(cli.quiet);
    }

    #[test]
    fn test_cli_config_flag() {
        let cli = Cli::parse_from(["buildrun", "-c", "/path/to/config.toml", "plan"]);
        assert_eq!(cli.config, Some("/path/to/config.toml".to_string()));
    }

    #[test]
    fn test_overrides_from_args() {
        let cli = Cli::parse_from(["buildrun", "--modules", "a", "--output", "prog"]);
        let overrides = cli.build.overrides();
        assert_eq!(overrides.modules, Some(vec!["a".to_string()]));
        assert_eq!(overrides.executable, Some("prog".to_string()));
        assert!(overrides.working_dir.is_none());
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        assert!(Cli::try_parse_from(["buildrun", "plan", "-f", "yaml"]).is_err());
    }

    #[test]
    fn test_cli_verify() {
        // Verify CLI structure is valid
        Cli::command().debug_assert();
    }
}
