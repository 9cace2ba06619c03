// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines global options and the exec subcommand.

use clap::{Args, Parser, Subcommand, ValueEnum};
use hatch::output::OutputMode;
use hatch::runtime::RuntimeType;

#[derive(Parser)]
#[command(name = "hatch")]
#[command(about = "Run commands inside running Docker and Podman containers")]
#[command(version)]
pub struct Cli {
    /// Show protocol-level debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Format of hatch's own messages
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Normal)]
    pub output: OutputFormat,

    /// Daemon socket path (overrides config and detection)
    #[arg(long, global = true)]
    pub socket: Option<String>,

    /// Runtime type (docker or podman)
    #[arg(long, global = true)]
    pub runtime: Option<RuntimeType>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a command in a running container
    Exec(ExecArgs),
}

#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Keep stdin attached
    #[arg(short, long)]
    pub interactive: bool,

    /// Allocate a pseudo-TTY
    #[arg(short, long)]
    pub tty: bool,

    /// Start the command in the background
    #[arg(short, long)]
    pub detach: bool,

    /// Username or UID to run as
    #[arg(short, long)]
    pub user: Option<String>,

    /// Working directory inside the container
    #[arg(short, long)]
    pub workdir: Option<String>,

    /// Set environment variables (KEY=VALUE)
    #[arg(short, long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Give extended privileges to the command
    #[arg(long)]
    pub privileged: bool,

    /// Do not attach stdout
    #[arg(long)]
    pub no_stdout: bool,

    /// Do not attach stderr
    #[arg(long)]
    pub no_stderr: bool,

    /// Container name or ID
    pub container: String,

    /// Command to run, with its arguments
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Normal,
    Quiet,
    Json,
}

impl From<OutputFormat> for OutputMode {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Normal => OutputMode::Normal,
            OutputFormat::Quiet => OutputMode::Quiet,
            OutputFormat::Json => OutputMode::Json,
        }
    }
}
