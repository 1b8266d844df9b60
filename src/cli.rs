use clap::{Args, Parser, Subcommand, ValueEnum};

/// SQL Lineage Analyzer - ask an LLM which tables a repository's SQL scripts read and write
#[derive(Parser, Debug)]
#[command(name = "sql-lineage-analyzer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands
}

impl Cli {
    /// Repository arguments of whichever command was given.
    pub fn repo_args_mut(&mut self) -> &mut RepoArgs {
        match &mut self.command {
            Commands::List { repo, .. } | Commands::Analyze { repo, .. } => repo
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List SQL scripts available in a repository
    List {
        #[command(flatten)]
        repo: RepoArgs,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        output_format: Format,

        /// Disable colored output
        #[arg(long)]
        no_color: bool
    },
    /// Pick a script and classify its source tables, destination tables and business logic
    Analyze {
        #[command(flatten)]
        repo: RepoArgs,

        #[command(flatten)]
        llm: LlmArgs,

        /// Analyze this script instead of prompting for a selection
        #[arg(long)]
        file: Option<String>,

        /// How generation failures are shown
        #[arg(long, value_enum)]
        error_policy: Option<Policy>,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        output_format: Format,

        /// Show the prompts that would be sent to the LLM without calling it
        #[arg(long)]
        dry_run: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool
    }
}

/// Repository reference and listing strategy
#[derive(Args, Debug, Clone)]
pub struct RepoArgs {
    /// Repository URL (https://github.com/owner/repo) or owner/repo
    #[arg(short, long, env = "REPO_URL")]
    pub repo: Option<String>,

    /// Personal access token for the repository. Prefer GITHUB_TOKEN or the
    /// masked prompt: a value given here shows up in the process list and
    /// shell history
    #[arg(short, long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// How scripts are listed and fetched
    #[arg(long, value_enum, default_value = "api")]
    pub transport: Transport,

    /// Directory inside the repository to list (api transport)
    #[arg(long)]
    pub path: Option<String>,

    /// Hosting API root (api transport)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Directory the repository is cloned into (clone transport)
    #[arg(long)]
    pub workdir: Option<std::path::PathBuf>,

    /// Embed the token in the clone URL instead of sending it as a header
    #[arg(long)]
    pub embed_token: bool
}

/// Generation-service settings
#[derive(Args, Debug, Clone)]
pub struct LlmArgs {
    /// LLM provider to use
    #[arg(short, long, value_enum)]
    pub provider: Option<Provider>,

    /// API key for the LLM provider
    #[arg(short, long, env = "LLM_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model name
    #[arg(short, long)]
    pub model: Option<String>,

    /// Provider endpoint root
    #[arg(long)]
    pub base_url: Option<String>,

    /// Sampling temperature
    #[arg(long)]
    pub temperature: Option<f32>
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    /// Query the hosting provider's contents API
    Api,
    /// Clone the repository and scan the working copy
    Clone
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Provider {
    Groq,
    #[value(name = "openai")]
    OpenAI,
    Anthropic,
    Ollama
}

impl Provider {
    /// Get default model for provider
    pub fn default_model(&self) -> &str {
        match self {
            Self::Groq => "llama-3.1-8b-instant",
            Self::OpenAI => "gpt-4",
            Self::Anthropic => "claude-sonnet-4-20250514",
            Self::Ollama => "llama3.2"
        }
    }

    /// Get default endpoint root for provider
    pub fn default_base_url(&self) -> &str {
        match self {
            Self::Groq => "https://api.groq.com/openai/v1",
            Self::OpenAI => "https://api.openai.com/v1",
            Self::Anthropic => "https://api.anthropic.com/v1",
            Self::Ollama => "http://localhost:11434"
        }
    }

    /// Parse a provider name from configuration
    pub fn from_name(name: &str) -> Option<Self> {
        Self::from_str(name, true).ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Policy {
    /// Any failure empties the table fields and reports the error as business logic
    Collapse,
    /// Each field reports its own failure
    PerCategory
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
    Yaml
}
