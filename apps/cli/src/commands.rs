//! CLI command definitions, routing, and tracing setup.

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use expertdesk_core::{CriteriaPatch, EmploymentType, ExpertsState, Facet, Notifier, Page};
use expertdesk_fetcher::HttpFetcher;
use expertdesk_shared::{AppConfig, ExpertId, ExpertView, FetchConfig, init_config, load_config};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// ExpertDesk: browse the expert network.
#[derive(Parser)]
#[command(
    name = "expertdesk",
    version,
    about = "List, filter, and inspect experts from the operations backend.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Backend base URL (overrides the config file).
    #[arg(long, env = "EXPERTDESK_BASE_URL", global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// List experts matching the given filters.
    List {
        #[command(flatten)]
        filters: FilterArgs,

        /// Page to show (1-based).
        #[arg(long, default_value = "1")]
        page: usize,

        /// Rows per page (defaults to the configured page size).
        #[arg(long)]
        per_page: Option<usize>,

        /// Print the page as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show one expert with career history and projects.
    Show {
        /// Expert ID.
        id: ExpertId,

        /// Print the expert as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the industries and locations available as filters.
    Facets {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Filter flags for `list`.
#[derive(Args, Debug, Default)]
pub(crate) struct FilterArgs {
    /// Case-insensitive match on name or email.
    #[arg(short, long)]
    pub search: Option<String>,

    /// Employment status: current, former, or all.
    #[arg(short, long)]
    pub employment: Option<EmploymentType>,

    /// Case-insensitive match on any past or current title.
    #[arg(long)]
    pub title: Option<String>,

    /// Case-insensitive match on any past or current company.
    #[arg(long)]
    pub company: Option<String>,

    /// Exact industry (or "all").
    #[arg(long)]
    pub industry: Option<String>,

    /// Exact country of residence (or "all").
    #[arg(long)]
    pub location: Option<String>,

    /// Only experts with at least one completed call.
    #[arg(long)]
    pub completed_call: bool,

    /// Only experts attached to at least one project.
    #[arg(long)]
    pub published: bool,
}

impl FilterArgs {
    /// Convert flags into a criteria patch, falling back to the configured employment type.
    fn into_patch(self, default_employment: EmploymentType) -> CriteriaPatch {
        CriteriaPatch {
            search_query: self.search,
            employment_type: Some(self.employment.unwrap_or(default_employment)),
            expert_title: self.title,
            companies: self.company,
            industry: self.industry.map(Facet::from),
            location: self.location.map(Facet::from),
            completed_call: Some(self.completed_call),
            published: Some(self.published),
        }
    }
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

/// Initialize tracing based on CLI flags. Logs go to stderr so listings stay pipeable.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "expertdesk=warn",
        1 => "expertdesk=info",
        2 => "expertdesk=debug",
        _ => "expertdesk=trace",
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
    let base_url = cli.base_url;
    match cli.command {
        Command::List {
            filters,
            page,
            per_page,
            json,
        } => cmd_list(base_url.as_deref(), filters, page, per_page, json).await,
        Command::Show { id, json } => cmd_show(base_url.as_deref(), id, json).await,
        Command::Facets { json } => cmd_facets(base_url.as_deref(), json).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(base_url.as_deref()).await,
        },
    }
}

type CliState = ExpertsState<HttpFetcher, CliNotifier>;

/// Resolve config (file, env, flags) and load a fresh snapshot.
async fn load_state(config: &AppConfig, base_url: Option<&str>) -> Result<CliState> {
    let mut config = config.clone();
    if let Some(url) = base_url {
        config.api.base_url = url.to_string();
    }
    let fetch_config = FetchConfig::try_from(&config)?;
    let fetcher = HttpFetcher::new(&fetch_config)?;

    info!(base_url = %fetch_config.base_url, "loading experts");

    let mut state = ExpertsState::new(fetcher, CliNotifier::new("Loading experts"));
    state
        .refresh()
        .await
        .wrap_err("Failed to load experts data")?;
    Ok(state)
}

async fn cmd_list(
    base_url: Option<&str>,
    filters: FilterArgs,
    page: usize,
    per_page: Option<usize>,
    json: bool,
) -> Result<()> {
    let config = load_config()?;
    let default_employment: EmploymentType = config.view.employment.parse()?;
    let per_page = per_page.unwrap_or(config.view.page_size);

    let mut state = load_state(&config, base_url).await?;
    state.set_criteria(filters.into_patch(default_employment));

    let page = state.page(page, per_page);
    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
    } else {
        print_page(&page);
    }
    Ok(())
}

async fn cmd_show(base_url: Option<&str>, id: ExpertId, json: bool) -> Result<()> {
    let config = load_config()?;
    let mut state = load_state(&config, base_url).await?;

    if !state.select(Some(id)) {
        return Err(eyre!("no expert with ID {id}"));
    }
    let expert = state
        .selected()
        .ok_or_else(|| eyre!("no expert with ID {id}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(expert)?);
    } else {
        print_expert(expert);
    }
    Ok(())
}

async fn cmd_facets(base_url: Option<&str>, json: bool) -> Result<()> {
    let config = load_config()?;
    let state = load_state(&config, base_url).await?;
    let facets = state.facets();

    if json {
        println!("{}", serde_json::to_string_pretty(&facets)?);
        return Ok(());
    }

    println!("Industries:");
    for industry in &facets.industries {
        println!("  {industry}");
    }
    println!("Locations:");
    for location in &facets.locations {
        println!("  {location}");
    }
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(base_url: Option<&str>) -> Result<()> {
    let mut config: AppConfig = load_config()?;
    if let Some(url) = base_url {
        config.api.base_url = url.to_string();
    }
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_page(page: &Page<&ExpertView>) {
    if page.items.is_empty() {
        println!("No experts match the current filters.");
        return;
    }

    println!(
        "{:>5}  {:<24} {:<36} {:<16} {:<14} {:<8} {:>8}",
        "ID", "NAME", "POSITION", "INDUSTRY", "LOCATION", "STATUS", "PROJECTS"
    );
    for expert in &page.items {
        let position = expert
            .headline()
            .map(|c| format!("{} @ {}", c.title, c.company_name))
            .unwrap_or_else(|| "-".into());
        let status = if expert.is_former { "former" } else { "current" };
        println!(
            "{:>5}  {:<24} {:<36} {:<16} {:<14} {:<8} {:>8}",
            expert.id,
            truncate(&expert.full_name, 24),
            truncate(&position, 36),
            truncate(&expert.industry, 16),
            truncate(&expert.country_of_residence, 14),
            status,
            expert.projects.len(),
        );
    }
    println!();
    println!(
        "  Page {}/{} ({} experts)",
        page.page,
        page.total_pages.max(1),
        page.total_items
    );
}

fn print_expert(expert: &ExpertView) {
    let status = if expert.is_former { "Former" } else { "Current" };

    println!();
    println!("  {} (#{})", expert.full_name, expert.id);
    println!("  Status:   {status}");
    println!("  Industry: {}", expert.industry);
    println!("  Location: {}", expert.country_of_residence);
    println!("  Email:    {}", expert.email);
    if let Some(phone) = &expert.phone {
        println!("  Phone:    {phone}");
    }
    if let Some(linkedin) = &expert.linkedin {
        println!("  LinkedIn: {linkedin}");
    }
    println!("  Cost:     {}", expert.expert_cost);
    if let Some(notes) = &expert.notes {
        println!("  Notes:    {notes}");
    }

    println!();
    println!("  Career:");
    if expert.career.is_empty() {
        println!("    (none on record)");
    }
    for entry in &expert.career {
        println!(
            "    {}, {} ({})",
            entry.title, entry.company_name, entry.date_range
        );
    }

    println!();
    println!("  Projects:");
    if expert.projects.is_empty() {
        println!("    (none)");
    }
    for project in &expert.projects {
        println!("    #{} {}", project.id, project.name);
    }
    println!();
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut out: String = value.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

// ---------------------------------------------------------------------------
// CLI notifier
// ---------------------------------------------------------------------------

/// Notifier that shows an indicatif spinner while the state is loading.
///
/// Failures are not printed here: the command returns them and color-eyre
/// reports them once.
struct CliNotifier {
    spinner: ProgressBar,
}

impl CliNotifier {
    fn new(message: &str) -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        Self::with_spinner(spinner, message)
    }

    fn with_spinner(spinner: ProgressBar, message: &str) -> Self {
        spinner.set_message(message.to_string());
        Self { spinner }
    }
}

impl Notifier for CliNotifier {
    fn error(&self, message: &str) {
        self.spinner.finish_and_clear();
        debug!(error = %message, "refresh failed");
    }

    fn loading(&self, loading: bool) {
        if loading {
            self.spinner
                .enable_steady_tick(std::time::Duration::from_millis(80));
        } else {
            self.spinner.finish_and_clear();
        }
    }
}
