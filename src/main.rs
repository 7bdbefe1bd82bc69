use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::Colorize;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use podlatest::config::DEFAULT_NAME;
use podlatest::dispatch;
use podlatest::sensor::NOT_FOUND;
use podlatest::{
    CommandSink, ConfigStore, Credentials, DEFAULT_SCAN_INTERVAL, EntryConfig, EntrySetup,
    EpisodeAttributes, EpisodeResolver, Integration, JsonFileStore, PodcastIndexClient,
    ReqwestClient, SearchAndPlay, SensorState, TrackedId, TrackedTerms, load_secrets,
};

// Emoji with fallback for terminals without Unicode support
static MICROPHONE: Emoji<'_, '_> = Emoji("🎙️  ", "");
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[~] ");
static HEADPHONES: Emoji<'_, '_> = Emoji("🎧 ", "[i] ");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "[+] ");
static FAILURE: Emoji<'_, '_> = Emoji("❌ ", "[!] ");

/// Entry id used for the single entry the CLI runs
const CLI_ENTRY: &str = "cli";

/// Track the latest episode of podcasts via the Podcast Index API
#[derive(Parser, Debug)]
#[command(name = "podlatest")]
#[command(about = "Track the latest episode of podcasts via the Podcast Index API")]
#[command(version)]
struct Args {
    /// YAML secrets file with podcast_index_api_key and podcast_index_api_secret
    #[arg(long, global = true)]
    secrets: Option<PathBuf>,

    /// Podcast Index API key
    #[arg(long, env = "PODCAST_INDEX_API_KEY", global = true, hide_env_values = true)]
    api_key: Option<String>,

    /// Podcast Index API secret
    #[arg(long, env = "PODCAST_INDEX_API_SECRET", global = true, hide_env_values = true)]
    api_secret: Option<String>,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the latest episode for a search term or feed ID
    Latest {
        term: String,

        /// Print the attribute bundle as JSON
        #[arg(long)]
        json: bool,
    },

    /// Verify the API connection and write an entry config file
    Init {
        #[arg(long)]
        config: PathBuf,

        #[arg(long, default_value = DEFAULT_NAME)]
        name: String,

        /// Comma-separated search terms and feed IDs
        #[arg(long)]
        terms: String,
    },

    /// Poll every tracked identifier and print state changes until Ctrl-C
    Watch {
        #[arg(long)]
        config: PathBuf,

        /// Seconds between two polls of the same identifier
        #[arg(long, default_value_t = DEFAULT_SCAN_INTERVAL.as_secs())]
        interval: u64,
    },

    /// Play the latest episode with a local player
    Play {
        term: String,

        /// Player program receiving the audio URL
        #[arg(long, default_value = "mpv")]
        player: String,

        /// Flag prefix the player takes for a volume percentage
        #[arg(long, default_value = "--volume=")]
        volume_flag: String,

        /// Volume percentage (0-100)
        #[arg(long)]
        volume: Option<f64>,
    },

    /// Track one more search term or feed ID
    Add {
        term: String,

        #[arg(long)]
        config: PathBuf,
    },

    /// Stop tracking a search term or feed ID
    Remove {
        term: String,

        #[arg(long)]
        config: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "podlatest=debug"
    } else {
        "podlatest=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Flags and environment win over the secrets file
fn credentials(args: &Args) -> Result<Option<Credentials>> {
    let from_args = Credentials::from_parts(args.api_key.clone(), args.api_secret.clone());
    if let Some(credentials) = from_args {
        return Ok(Some(credentials));
    }

    match &args.secrets {
        Some(path) => load_secrets(path)
            .with_context(|| format!("Failed to load secrets from {}", path.display())),
        None => Ok(None),
    }
}

fn require_credentials(args: &Args) -> Result<Credentials> {
    match credentials(args)? {
        Some(credentials) => Ok(credentials),
        None => bail!(
            "Podcast Index API credentials not found; pass --api-key/--api-secret, \
             set PODCAST_INDEX_API_KEY/PODCAST_INDEX_API_SECRET or use --secrets"
        ),
    }
}

fn spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

fn api_client(credentials: Credentials) -> Result<Arc<PodcastIndexClient<ReqwestClient>>> {
    let http = ReqwestClient::new().context("Failed to build HTTP client")?;
    Ok(Arc::new(PodcastIndexClient::new(http, credentials)))
}

fn close(client: Arc<PodcastIndexClient<ReqwestClient>>) {
    if let Ok(client) = Arc::try_unwrap(client) {
        client.close();
    }
}

fn print_state(state: &SensorState) {
    let value = if state.attributes.is_some() {
        state.value.bold().green()
    } else {
        state.value.yellow()
    };
    let marker = if state.available { &SUCCESS } else { &FAILURE };

    println!("{marker}{} {} {}", state.name.bold(), "•".dimmed(), value);
    if let Some(attributes) = &state.attributes {
        print_attributes(attributes);
    }
}

fn print_attributes(attributes: &EpisodeAttributes) {
    let field = |label: &str, value: &str| {
        if !value.is_empty() {
            println!("    {} {}", format!("{label}:").dimmed(), value);
        }
    };

    field("Podcast", &attributes.podcast_title);
    field("Published", attributes.publish_date.as_deref().unwrap_or(""));
    field("Duration", attributes.duration.as_deref().unwrap_or(""));
    if let Some(hours) = attributes.hours_since_publish {
        field("Age", &format!("{hours} hours"));
    }
    field("Audio", &attributes.audio_url);
}

async fn latest(args: &Args, term: &str, json: bool) -> Result<()> {
    let client = api_client(require_credentials(args)?)?;
    let resolver = EpisodeResolver::new(Arc::clone(&client), TrackedId::parse(term));

    let bar = spinner(format!("{SEARCH}Resolving {}", term.cyan()));
    let episode = resolver.latest_episode().await;
    bar.finish_and_clear();
    drop(resolver);
    close(client);

    let episode = episode.with_context(|| format!("Failed to resolve '{term}'"))?;
    let Some(episode) = episode else {
        if json {
            println!("null");
        } else {
            println!("{FAILURE}{}", NOT_FOUND.yellow());
        }
        return Ok(());
    };

    let attributes = EpisodeAttributes::from_episode(&episode, term, Utc::now());
    if json {
        println!("{}", serde_json::to_string_pretty(&attributes)?);
    } else {
        println!("{HEADPHONES}{}", episode.title.bold().green());
        print_attributes(&attributes);
    }
    Ok(())
}

async fn init(args: &Args, config: &Path, name: &str, terms: &str) -> Result<()> {
    let terms = TrackedTerms::parse_list(terms).context("Invalid list of search terms")?;
    let client = api_client(require_credentials(args)?)?;

    let bar = spinner(format!("{SEARCH}Checking Podcast Index API connection"));
    let connected = client.test_connection().await;
    bar.finish_and_clear();
    close(client);
    connected.context("Failed to connect to the Podcast Index API")?;

    JsonFileStore::new(config)
        .save(&EntryConfig::new(name, &terms))
        .context("Failed to write entry config")?;

    println!(
        "{SUCCESS}{} tracking {} in {}",
        name.bold().green(),
        terms.to_list_string().cyan(),
        config.display().to_string().cyan()
    );
    Ok(())
}

/// Start the config file's entry the same way a host would
async fn start_entry(
    args: &Args,
    config: &Path,
    interval: Duration,
) -> Result<Integration<ReqwestClient>> {
    let integration = Integration::new(Arc::new(CommandSink::new("mpv")));
    let setup = EntrySetup {
        credentials: credentials(args)?,
        http: ReqwestClient::new().context("Failed to build HTTP client")?,
        store: Box::new(JsonFileStore::new(config)),
        scan_interval: interval,
    };

    let bar = spinner(format!("{SEARCH}Fetching latest episodes"));
    let started = integration.setup_entry(CLI_ENTRY, setup).await;
    bar.finish_and_clear();
    started.with_context(|| format!("Failed to start entry from {}", config.display()))?;

    Ok(integration)
}

async fn watch(args: &Args, config: &Path, interval: u64) -> Result<()> {
    let integration = start_entry(args, config, Duration::from_secs(interval)).await?;
    let entry = integration
        .entry(CLI_ENTRY)
        .context("Entry stopped during startup")?;

    println!(
        "{MICROPHONE}{} {}\n",
        entry.name().bold().magenta(),
        format!("- polling every {}s, Ctrl-C to stop", entry.interval().as_secs()).dimmed()
    );
    for state in entry.sensor_states(Utc::now()).await {
        print_state(&state);
    }

    let mut printers = Vec::new();
    for term in entry.polled_terms().await {
        let Some(mut rx) = entry.subscribe(&term).await else {
            continue;
        };
        let name = entry.name().to_string();
        printers.push(tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let snapshot = rx.borrow_and_update().clone();
                print_state(&SensorState::render(&name, &term, &snapshot, Utc::now()));
            }
        }));
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    for printer in printers {
        printer.abort();
    }
    integration.unload_entry(CLI_ENTRY).await;
    Ok(())
}

async fn play(
    args: &Args,
    term: &str,
    player: &str,
    volume_flag: &str,
    volume: Option<f64>,
) -> Result<()> {
    let client = api_client(require_credentials(args)?)?;
    let sink = CommandSink::new(player).with_volume_flag(volume_flag);

    println!("{HEADPHONES}Playing latest episode for {} with {}", term.cyan(), player.bold());
    dispatch::search_and_play(
        &client,
        &sink,
        SearchAndPlay {
            sink_id: Some(player.to_string()),
            search_term: Some(term.to_string()),
            volume,
        },
    )
    .await;

    close(client);
    Ok(())
}

async fn change_terms(args: &Args, config: &Path, term: &str, add: bool) -> Result<()> {
    let integration = start_entry(args, config, DEFAULT_SCAN_INTERVAL).await?;
    let entry = integration
        .entry(CLI_ENTRY)
        .context("Entry stopped during startup")?;

    let result = if add {
        entry.add_search_term(term).await
    } else {
        entry.remove_search_term(term).await
    };
    integration.unload_entry(CLI_ENTRY).await;

    let verb = if add { "add" } else { "remove" };
    result.with_context(|| format!("Failed to {verb} '{term}'"))?;

    println!(
        "{SUCCESS}{} now tracks {}",
        entry.name().bold().green(),
        entry.terms().to_list_string().cyan()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    match &args.command {
        Command::Latest { term, json } => latest(&args, term, *json).await,
        Command::Init {
            config,
            name,
            terms,
        } => init(&args, config, name, terms).await,
        Command::Watch { config, interval } => watch(&args, config, *interval).await,
        Command::Play {
            term,
            player,
            volume_flag,
            volume,
        } => play(&args, term, player, volume_flag, *volume).await,
        Command::Add { term, config } => change_terms(&args, config, term, true).await,
        Command::Remove { term, config } => change_terms(&args, config, term, false).await,
    }
}
