use crate::analysis::{Orchestrator, RunError};
use crate::config::Config;
use crate::relay::RelayServer;
use crate::{log_debug, render, ui};
use anyhow::{Context, Result, anyhow};
use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand, crate_version};
use colored::Colorize;
use std::io::Read;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

const LOG_FILE: &str = "triad-debug.log";

/// CLI structure defining the available commands and global arguments
#[derive(Parser)]
#[command(
    author,
    version = crate_version!(),
    about = "triad: three expert perspectives and one recommendation",
    long_about = "triad sends a problem statement to three AI personas (security, design, efficiency) in parallel, then synthesizes their analyses into a single recommendation. It also runs the relay that keeps the model API key server-side.",
    disable_version_flag = true,
    styles = get_styles(),
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(
        short = 'l',
        long = "log",
        global = true,
        help = "Log debug messages to a file"
    )]
    pub log: bool,

    #[arg(
        long = "log-file",
        global = true,
        help = "Specify a custom log file path"
    )]
    pub log_file: Option<String>,

    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        help = "Suppress non-essential output"
    )]
    pub quiet: bool,

    #[arg(
        short = 'v',
        long = "version",
        global = true,
        help = "Display the version"
    )]
    pub version: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a problem from three perspectives and synthesize a recommendation
    #[command(
        about = "Analyze a problem statement",
        long_about = "Analyze a problem statement with the security, design and efficiency personas, then synthesize a recommendation. The problem is read from the argument, from --file, or from stdin."
    )]
    Analyze {
        #[arg(help = "Problem statement (use '-' or omit to read stdin)")]
        problem: Option<String>,

        #[arg(short, long, help = "Read the problem statement from a file")]
        file: Option<PathBuf>,

        #[arg(long, help = "Relay base URL for this run")]
        relay_url: Option<String>,

        #[arg(long, help = "Maximum attempts per model call for this run")]
        max_attempts: Option<u32>,

        #[arg(long, help = "Initial backoff delay in milliseconds for this run")]
        base_delay_ms: Option<u64>,

        #[arg(long, help = "Write the report as markdown to this path")]
        markdown: Option<PathBuf>,

        #[arg(long, help = "Write the report as HTML to this path")]
        html: Option<PathBuf>,
    },

    /// Run the relay server
    #[command(
        about = "Start the model relay",
        long_about = "Start the HTTP relay that forwards model requests upstream with the server-held API key, behind rate limiting and security headers."
    )]
    Serve {
        #[arg(long, help = "Listen address (e.g., '127.0.0.1', '0.0.0.0')")]
        listen_address: Option<String>,

        #[arg(short, long, help = "Port to listen on")]
        port: Option<u16>,

        #[arg(long, help = "Directory of static files to serve")]
        static_dir: Option<PathBuf>,
    },

    /// Show or update the configuration
    #[command(about = "Configure triad settings")]
    Config {
        #[arg(long, help = "Set the relay base URL")]
        relay_url: Option<String>,

        #[arg(long, help = "Set maximum attempts per model call")]
        max_attempts: Option<u32>,

        #[arg(long, help = "Set the initial backoff delay in milliseconds")]
        base_delay_ms: Option<u64>,

        #[arg(long, help = "Set the maximum problem statement length")]
        max_input_chars: Option<usize>,

        #[arg(short, long, help = "Print the current configuration")]
        print: bool,
    },
}

/// Define custom styles for Clap
fn get_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Magenta.on_default().bold())
        .usage(AnsiColor::Cyan.on_default().bold())
        .literal(AnsiColor::Green.on_default().bold())
        .placeholder(AnsiColor::Yellow.on_default())
        .valid(AnsiColor::Blue.on_default().bold())
        .invalid(AnsiColor::Red.on_default().bold())
        .error(AnsiColor::Red.on_default().bold())
}

/// Parse the command-line arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Main function to parse arguments and handle the command
pub async fn main() -> Result<()> {
    let cli = parse_args();

    if cli.version {
        ui::print_version(crate_version!());
        return Ok(());
    }

    if cli.log {
        crate::logger::enable_logging();
        let log_file = cli.log_file.as_deref().unwrap_or(LOG_FILE);
        crate::logger::set_log_file(log_file)?;
    } else {
        crate::logger::disable_logging();
    }

    if cli.quiet {
        ui::set_quiet_mode(true);
    }

    if let Some(command) = cli.command {
        handle_command(command).await
    } else {
        let _ = Cli::parse_from(["triad", "--help"]);
        Ok(())
    }
}

/// Handle the command based on parsed arguments
pub async fn handle_command(command: Commands) -> Result<()> {
    let mut config = Config::load()?;
    crate::logger::set_verbose_logging(config.verbose_logging);

    match command {
        Commands::Analyze {
            problem,
            file,
            relay_url,
            max_attempts,
            base_delay_ms,
            markdown,
            html,
        } => {
            // per-run overrides are applied in memory only
            config.update(relay_url, max_attempts, base_delay_ms, None)?;
            let problem = read_problem(problem, file)?;
            handle_analyze(&config, &problem, markdown, html).await
        }
        Commands::Serve {
            listen_address,
            port,
            static_dir,
        } => {
            if let Some(address) = listen_address {
                config.relay.listen_address = address;
            }
            if let Some(port) = port {
                config.relay.port = port;
            }
            if static_dir.is_some() {
                config.relay.static_dir = static_dir;
            }
            handle_serve(&config).await
        }
        Commands::Config {
            relay_url,
            max_attempts,
            base_delay_ms,
            max_input_chars,
            print,
        } => handle_config(
            &mut config,
            relay_url,
            max_attempts,
            base_delay_ms,
            max_input_chars,
            print,
        ),
    }
}

/// Problem text from the argument, a file, or stdin
fn read_problem(problem: Option<String>, file: Option<PathBuf>) -> Result<String> {
    match (problem, file) {
        (Some(_), Some(_)) => Err(anyhow!("Pass the problem either inline or with --file, not both")),
        (Some(text), None) if text != "-" => Ok(text),
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read problem file {}", path.display())),
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read problem from stdin")?;
            Ok(text)
        }
    }
}

/// Handle the `Analyze` command
async fn handle_analyze(
    config: &Config,
    problem: &str,
    markdown: Option<PathBuf>,
    html: Option<PathBuf>,
) -> Result<()> {
    log_debug!(
        "Handling 'analyze' against {} ({} chars)",
        config.client.relay_url,
        problem.chars().count()
    );

    let orchestrator = Orchestrator::from_config(&config.client)?;

    // validation failures are reported before any spinner appears
    orchestrator.validate(problem)?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let presenter = ui::TerminalPresenter::new();
    let report = match orchestrator.run(problem, &presenter, &cancel).await {
        Ok(report) => report,
        Err(RunError::Cancelled) => {
            ui::print_warning("Analysis cancelled.");
            return Ok(());
        }
        Err(error) => return Err(error.into()),
    };

    if let Some(path) = markdown {
        std::fs::write(&path, render::report_markdown(&report))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        ui::print_info(&format!("Markdown report written to {}", path.display()));
    }
    if let Some(path) = html {
        std::fs::write(&path, render::report_html(&report))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        ui::print_info(&format!("HTML report written to {}", path.display()));
    }

    let failures = report.personas.failures() + usize::from(report.synthesis.is_err());
    if failures > 0 {
        ui::print_warning(&format!(
            "{failures} of 4 model calls failed; see the inline errors above."
        ));
    } else {
        ui::print_success(&format!(
            "Analysis complete in {:.1}s",
            report.elapsed.as_secs_f64()
        ));
    }
    Ok(())
}

/// Handle the `Serve` command
async fn handle_serve(config: &Config) -> Result<()> {
    let server = RelayServer::bind(&config.relay).await?;
    let address = server.local_addr()?;
    ui::print_info(&format!(
        "Relay listening on http://{address}{}",
        config.relay.route
    ));

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal.cancel();
        }
    });

    server.run(shutdown).await
}

/// Handle the `Config` command
fn handle_config(
    config: &mut Config,
    relay_url: Option<String>,
    max_attempts: Option<u32>,
    base_delay_ms: Option<u64>,
    max_input_chars: Option<usize>,
    print: bool,
) -> Result<()> {
    let changed = relay_url.is_some()
        || max_attempts.is_some()
        || base_delay_ms.is_some()
        || max_input_chars.is_some();

    if changed {
        config.update(relay_url, max_attempts, base_delay_ms, max_input_chars)?;
        config.save()?;
        ui::print_success("Configuration updated.");
    }

    if print || !changed {
        print_configuration(config);
    }
    Ok(())
}

fn print_configuration(config: &Config) {
    let client = &config.client;
    let relay = &config.relay;
    println!("{}", "Client".bright_magenta().bold());
    println!("  relay url        {}", client.relay_url.bright_cyan());
    println!("  endpoint path    {}", client.endpoint_path);
    println!("  max attempts     {}", client.max_attempts);
    println!("  base delay       {} ms", client.base_delay_ms);
    if let Some(cap) = client.max_delay_ms {
        println!("  max delay        {cap} ms");
    }
    println!("  jitter           {}", client.jitter);
    println!("  request timeout  {} s", client.request_timeout_secs);
    println!("  max input chars  {}", client.max_input_chars);
    println!("{}", "Relay".bright_magenta().bold());
    println!(
        "  listen           {}:{}",
        relay.listen_address, relay.port
    );
    println!("  route            {}", relay.route);
    println!("  upstream         {}", relay.upstream_base);
    println!("  model            {}", relay.model);
    println!("  api key env      {}", relay.api_key_env);
    println!(
        "  rate limit       {} req / {} s",
        relay.rate_limit_requests, relay.rate_limit_window_secs
    );
    println!("  cors             {}", relay.cors);
}
