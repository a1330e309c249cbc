//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use pageguide_bridge::BridgeGateway;
use pageguide_core::{
    ContextResolver, GuidanceResolver, GuidanceSession, LiveAssist, PageContext, StaticContext,
};
use pageguide_shared::{
    AppConfig, GuidanceOptions, init_config, load_config, load_config_from, username_from_email,
};
use tracing::info;

use crate::browse;
use crate::console::{self, Console};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// pageguide: in-context Panviva guidance for Salesforce pages.
#[derive(Parser)]
#[command(
    name = "pageguide",
    version,
    about = "Resolve Panviva guidance and quick answers for the page you are on.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.pageguide/pageguide.toml).
    #[arg(long, global = true, env = "PAGEGUIDE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Email of the Panviva user (overrides [user].email).
    #[arg(long, global = true, env = "PAGEGUIDE_EMAIL")]
    pub email: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Where the user is, as the host page would report it.
#[derive(Args, Clone, Debug, Default)]
pub(crate) struct ContextArgs {
    /// Page name from the page reference (e.g. CaseOverview).
    #[arg(long)]
    pub page_name: Option<String>,

    /// Object API name from the page reference (e.g. Account).
    #[arg(long)]
    pub object_api_name: Option<String>,

    /// Full page location, used when no page attributes are given.
    #[arg(long)]
    pub location: Option<String>,
}

impl From<&ContextArgs> for PageContext {
    fn from(args: &ContextArgs) -> Self {
        let mut context = PageContext::default();
        if let Some(name) = &args.page_name {
            context = context.with_page_name(name.as_str());
        }
        if let Some(api) = &args.object_api_name {
            context = context.with_object_api_name(api.as_str());
        }
        if let Some(location) = &args.location {
            context = context.with_location(location.as_str());
        }
        context
    }
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Resolve the overview and its linked quick answers.
    Resolve {
        #[command(flatten)]
        context: ContextArgs,

        /// Print the snapshot as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Interactive session: navigate guidance and follow page changes.
    Browse {
        #[command(flatten)]
        context: ContextArgs,
    },

    /// Show the top quick answer for the page, without linked answers.
    Quick {
        #[command(flatten)]
        context: ContextArgs,
    },

    /// Search Panviva documents (and mirror the search in the live window).
    Search {
        /// Search term.
        query: String,

        /// Maximum number of document results.
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Raise context-sensitive help in the live Panviva window.
    HelpMe {
        #[command(flatten)]
        context: ContextArgs,
    },

    /// Open a Panviva document in the live window.
    OpenDocument {
        /// Panviva document id.
        id: String,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "pageguide=warn",
        1 => "pageguide=info",
        2 => "pageguide=debug",
        _ => "pageguide=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    if let Command::Config { action } = &cli.command {
        return match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(&cli).await,
        };
    }

    let config = resolve_config(&cli)?;
    let runtime = Runtime::connect(&cli, config).await?;

    let outcome = match &cli.command {
        Command::Resolve { context, json } => cmd_resolve(&runtime, context, *json).await,
        Command::Browse { context } => browse::run(&runtime, context.into()).await,
        Command::Quick { context } => cmd_quick(&runtime, context).await,
        Command::Search { query, limit } => cmd_search(&runtime, query, *limit).await,
        Command::HelpMe { context } => cmd_help_me(&runtime, context).await,
        Command::OpenDocument { id } => cmd_open_document(&runtime, id).await,
        Command::Config { .. } => Ok(()),
    };

    runtime.close().await;
    outcome
}

fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// Runtime wiring
// ---------------------------------------------------------------------------

/// Everything a command needs: the bridge, the console, and the options.
pub(crate) struct Runtime {
    bridge: Arc<BridgeGateway>,
    pub console: Arc<Console>,
    pub options: GuidanceOptions,
    pub username: Option<String>,
}

impl Runtime {
    async fn connect(cli: &Cli, config: AppConfig) -> Result<Self> {
        let console = Arc::new(Console::new());
        let bridge = console
            .spinning("Starting Panviva bridge...", BridgeGateway::spawn(&config.bridge))
            .await?;

        let email = cli.email.clone().or(config.user.email.clone());
        let username = email.as_deref().and_then(username_from_email);
        info!(username = username.as_deref().unwrap_or("-"), "runtime ready");

        Ok(Self {
            bridge: Arc::new(bridge),
            console,
            options: GuidanceOptions::from(&config),
            username,
        })
    }

    pub(crate) fn resolver(&self) -> GuidanceResolver {
        GuidanceResolver::new(self.bridge.clone(), self.console.clone(), &self.options)
    }

    pub(crate) fn session(&self, context: Arc<StaticContext>) -> GuidanceSession {
        GuidanceSession::new(Arc::new(self.resolver()), context)
    }

    pub(crate) fn assist(&self) -> LiveAssist {
        LiveAssist::new(
            self.bridge.clone(),
            self.bridge.clone(),
            self.console.clone(),
            &self.options,
        )
    }

    pub(crate) fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Shut the bridge down once nothing else holds it.
    async fn close(self) {
        match Arc::try_unwrap(self.bridge) {
            Ok(bridge) => {
                if let Err(e) = bridge.shutdown().await {
                    tracing::warn!(error = %e, "bridge shutdown failed");
                }
            }
            Err(_) => tracing::debug!("bridge still shared, leaving it to drop"),
        }
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_resolve(runtime: &Runtime, args: &ContextArgs, json: bool) -> Result<()> {
    let context = PageContext::from(args);
    let resolver = runtime.resolver();
    let snapshot = runtime
        .console
        .spinning("Resolving guidance...", resolver.resolve(&context))
        .await;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        console::print_snapshot(&snapshot);
    }
    Ok(())
}

async fn cmd_quick(runtime: &Runtime, args: &ContextArgs) -> Result<()> {
    let context = PageContext::from(args);
    let scope = ContextResolver::new(&runtime.options.scope_prefix, &runtime.options.location_marker)
        .resolve_scope(&context);
    let assist = runtime.assist();
    let answer = runtime
        .console
        .spinning("Looking up quick answers...", assist.quick_answer(scope.as_ref()))
        .await;

    if let Some(answer) = answer {
        console::print_quick_answer(&answer);
    }
    Ok(())
}

async fn cmd_search(runtime: &Runtime, query: &str, limit: Option<u32>) -> Result<()> {
    if query.trim().is_empty() {
        return Err(eyre!("search query must not be empty"));
    }
    let assist = runtime.assist();
    runtime
        .console
        .spinning("Searching live window...", assist.live_search(runtime.username(), query))
        .await;
    let documents = runtime
        .console
        .spinning("Searching documents...", assist.document_search(query, limit))
        .await;

    console::print_documents(&documents);
    Ok(())
}

async fn cmd_help_me(runtime: &Runtime, args: &ContextArgs) -> Result<()> {
    let context = PageContext::from(args);
    let assist = runtime.assist();
    runtime
        .console
        .spinning("Asking for help...", assist.help_me(runtime.username(), &context))
        .await;
    Ok(())
}

async fn cmd_open_document(runtime: &Runtime, id: &str) -> Result<()> {
    let assist = runtime.assist();
    runtime
        .console
        .spinning("Opening document...", assist.open_document(runtime.username(), id))
        .await;
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(cli: &Cli) -> Result<()> {
    let config = resolve_config(cli)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
