use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use comfy_table::{Attribute, Cell, Table};
use linear_mcp::capabilities::register_all;
use linear_mcp::config::{find_config_file, user_config_path, Config, LogFormat};
use linear_mcp::mcp::{GetPromptResponse, McpServer, ReadResourceResponse};
use linear_mcp::registry::{
    Arguments, CapabilityRegistry, PromptArguments, PromptDescriptor, ResourceDescriptor, Role,
    ToolDescriptor, ToolResult,
};
use linear_mcp::tracker::{IssueTracker, LinearClient, MockTracker};
use serde_json::Value;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Linear MCP - Expose a Linear workspace to AI assistants over the Model Context Protocol
#[derive(Parser, Debug)]
#[command(name = "linear-mcp")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "hongkongkiwi")]
#[command(about = "MCP server for Linear issues, teams, projects and labels", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Serve built-in sample data instead of calling the Linear API
    #[arg(long, global = true)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
}

impl OutputFormat {
    fn resolve(self) -> Self {
        match self {
            OutputFormat::Auto if std::io::stdout().is_terminal() => OutputFormat::Table,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the MCP server (stdio by default)
    Serve {
        /// Serve streamable HTTP at /mcp instead of stdio
        #[arg(long)]
        http: bool,

        /// HTTP bind address (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// HTTP port (overrides server.port)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// List registered tools
    Tools,

    /// List registered prompts
    Prompts,

    /// List resources and resource templates
    Resources,

    /// Call a tool
    Call {
        /// Tool name (e.g., linear_get_issue)
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(long, short)]
        args: Option<String>,
    },

    /// Read a resource by URI
    Read {
        /// Resource URI (e.g., linear://issues/ENG-123)
        uri: String,

        /// Extra handler arguments as a JSON object
        #[arg(long, short)]
        args: Option<String>,
    },

    /// Render a prompt
    Prompt {
        /// Prompt name (e.g., triage-issue)
        name: String,

        /// Prompt argument as key=value (repeatable)
        #[arg(long = "arg", short = 'a', value_parser = parse_key_val)]
        args: Vec<(String, String)>,
    },

    /// Send a raw MCP request to the dispatcher and print the JSON response
    Rpc {
        /// Method name (e.g., tools/list, resources/read)
        method: String,

        /// Request params as a JSON object
        #[arg(long, short)]
        params: Option<String>,
    },

    /// Show or create the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the effective configuration (API key redacted)
    Show,

    /// Write a default configuration file
    Init {
        /// Destination (default: the per-user config file)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{}'", s)),
    }
}

/// Parse an optional JSON object flag
fn parse_object(raw: Option<&str>, flag: &str) -> Result<Option<Arguments>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match serde_json::from_str::<Value>(raw).with_context(|| format!("--{} is not valid JSON", flag))? {
        Value::Object(map) => Ok(Some(map)),
        _ => bail!("--{} must be a JSON object", flag),
    }
}

fn init_logging(cli: &Cli, config: &Config) {
    let default_directive = if cli.quiet {
        "error".to_string()
    } else {
        match cli.verbose {
            0 => config.logging.level.clone(),
            1 => "linear_mcp=debug,info".to_string(),
            _ => "linear_mcp=trace,debug".to_string(),
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&default_directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries the stdio transport, so logs go to stderr
    let json = config.logging.format == LogFormat::Json;
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

fn build_tracker(cli: &Cli, config: &Config) -> Result<Arc<dyn IssueTracker>> {
    if cli.mock {
        tracing::info!("Using built-in sample data");
        return Ok(Arc::new(MockTracker::with_fixtures()));
    }

    let client = LinearClient::with_endpoint(
        config.linear.api_key.clone(),
        config.linear.api_url.clone(),
        config.timeout(),
    )
    .context("Failed to create Linear client")?
    .with_retry_config(config.retry_config());

    if !client.has_api_key() {
        tracing::warn!("No Linear API key configured; set LINEAR_API_KEY to enable tool calls");
    }
    Ok(Arc::new(client))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Completions { shell }) = &cli.command {
        let mut command = Cli::command();
        clap_complete::generate(*shell, &mut command, "linear-mcp", &mut std::io::stdout());
        return Ok(());
    }

    let config_path = find_config_file(cli.config.as_deref());
    let config = Config::load(config_path.as_deref()).context("Failed to load configuration")?;

    init_logging(&cli, &config);
    if let Some(path) = &config_path {
        tracing::debug!("Using config file: {}", path.display());
    }

    if let Some(Commands::Config { command }) = &cli.command {
        return run_config_command(command, &config, config_path.as_deref());
    }

    let registry = Arc::new(CapabilityRegistry::new());
    register_all(&registry, build_tracker(&cli, &config)?)?;
    let server = McpServer::new(registry.clone(), config.server.name.clone());
    let format = cli.output.resolve();

    match cli.command {
        None => server.run_stdio().await?,

        Some(Commands::Serve { http, host, port }) => {
            if http {
                let mut server_config = config.server.clone();
                if let Some(host) = host {
                    server_config.host = host;
                }
                if let Some(port) = port {
                    server_config.port = port;
                }
                let addr = Config {
                    server: server_config,
                    ..config.clone()
                }
                .socket_addr()?;

                let shutdown = CancellationToken::new();
                let signal_token = shutdown.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        tracing::info!("Received Ctrl-C, shutting down");
                        signal_token.cancel();
                    }
                });

                server.run_http(addr, shutdown).await?;
            } else {
                server.run_stdio().await?;
            }
        }

        Some(Commands::Tools) => output_tools(&registry.get_all_tools(), format)?,

        Some(Commands::Prompts) => output_prompts(&registry.get_all_prompts(), format)?,

        Some(Commands::Resources) => {
            let mut resources = registry.get_all_resources();
            resources.extend(registry.get_resource_templates());
            output_resources(&resources, format)?;
        }

        Some(Commands::Call { tool, args }) => {
            let args = parse_object(args.as_deref(), "args")?;
            let result = server.dispatcher().call_tool(&tool, args).await;
            output_tool_result(&result, format)?;
            if result.is_error {
                std::process::exit(1);
            }
        }

        Some(Commands::Read { uri, args }) => {
            let args = parse_object(args.as_deref(), "args")?;
            let response = server.dispatcher().read_resource(&uri, args).await;
            output_read(&response, format)?;
        }

        Some(Commands::Prompt { name, args }) => {
            let args: PromptArguments = args.into_iter().collect();
            let response = server.dispatcher().get_prompt(&name, Some(args));
            output_prompt(&response, format)?;
        }

        Some(Commands::Rpc { method, params }) => {
            let params = parse_object(params.as_deref(), "params")?
                .map(Value::Object)
                .unwrap_or(Value::Null);
            let response = server.dispatcher().handle(&method, params).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }

        Some(Commands::Config { .. }) | Some(Commands::Completions { .. }) => {}
    }

    Ok(())
}

fn run_config_command(
    command: &ConfigCommands,
    config: &Config,
    loaded_from: Option<&std::path::Path>,
) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            match loaded_from {
                Some(path) => println!("# Loaded from {}", path.display()),
                None => println!("# No config file found; showing defaults and environment"),
            }
            print!("{}", config.to_toml()?);
        }
        ConfigCommands::Init { path, force } => {
            let path = match path.clone().or_else(user_config_path) {
                Some(path) => path,
                None => bail!("Could not determine a config directory; pass --path"),
            };
            if path.exists() && !force {
                bail!(
                    "{} already exists; use --force to overwrite",
                    path.display()
                );
            }
            Config::default().save(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }
    }
    Ok(())
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(header);
    table
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let kept: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}

fn output_tools(tools: &[ToolDescriptor], format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(tools)?);
        return Ok(());
    }

    let mut table = new_table(vec!["Tool", "Description", "Required"]);
    for tool in tools {
        let required = tool.input_schema["required"]
            .as_array()
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(&tool.name).add_attribute(Attribute::Bold),
            Cell::new(truncate(tool.description.as_deref().unwrap_or_default(), 60)),
            Cell::new(required),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn output_prompts(prompts: &[PromptDescriptor], format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(prompts)?);
        return Ok(());
    }

    let mut table = new_table(vec!["Prompt", "Description", "Arguments"]);
    for prompt in prompts {
        let arguments = prompt
            .arguments
            .iter()
            .map(|a| {
                if a.required {
                    format!("{}*", a.name)
                } else {
                    a.name.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            Cell::new(&prompt.name).add_attribute(Attribute::Bold),
            Cell::new(truncate(prompt.description.as_deref().unwrap_or_default(), 60)),
            Cell::new(arguments),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn output_resources(resources: &[ResourceDescriptor], format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(resources)?);
        return Ok(());
    }

    let mut table = new_table(vec!["URI", "Name", "Kind", "MIME type"]);
    for resource in resources {
        let kind = if resource.is_template() {
            "template"
        } else {
            "resource"
        };
        table.add_row(vec![
            Cell::new(resource.key.as_str()).add_attribute(Attribute::Bold),
            Cell::new(&resource.name),
            Cell::new(kind),
            Cell::new(resource.mime_type.as_deref().unwrap_or_default()),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn output_tool_result(result: &ToolResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
        _ if result.is_error => eprintln!("Error: {}", result.joined_text()),
        _ => println!("{}", result.joined_text()),
    }
    Ok(())
}

fn output_read(response: &ReadResourceResponse, format: OutputFormat) -> Result<()> {
    if response.is_error {
        bail!(
            "{}",
            response
                .error_message
                .as_deref()
                .unwrap_or("Failed to read resource")
        );
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(response)?),
        _ => {
            for content in &response.contents {
                match (content.text(), content.blob()) {
                    (Some(text), _) => println!("{}", text),
                    (None, Some(blob)) => println!("<{} bytes of base64 data>", blob.len()),
                    (None, None) => {}
                }
            }
        }
    }
    Ok(())
}

fn output_prompt(response: &GetPromptResponse, format: OutputFormat) -> Result<()> {
    if response.is_error {
        bail!(
            "{}",
            response
                .error_message
                .as_deref()
                .unwrap_or("Failed to render prompt")
        );
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(response)?),
        _ => {
            for message in &response.messages {
                let role = match message.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                };
                println!("[{}]", role);
                println!("{}\n", message.content.as_text().unwrap_or_default());
            }
        }
    }
    Ok(())
}
