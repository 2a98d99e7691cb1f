use profile_scraper_lib::{export, logger};
use profile_scraper_lib::{
    collect, Extractor, GeminiSummarizer, NoopSummarizer, Overrides, PageSession, RunConfig,
    SearchEngine, SessionStore, Summarizer,
};

use chrono::Local;
use clap::Parser;
use log::{error, info, warn};
use std::error::Error;
use std::path::PathBuf;

/// Collects employee profiles of a company from LinkedIn into CSV and JSON.
#[derive(Parser, Debug)]
#[command(name = "profile_scraper", version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, default_value = "scraper.toml")]
    config: PathBuf,

    /// Company to look up (overrides the config file)
    #[arg(long)]
    company: Option<String>,

    /// Skill or location keyword to filter people by
    #[arg(short, long)]
    query: Option<String>,

    /// Number of profiles to scrape, 1 to 100
    #[arg(short = 'n', long)]
    count: Option<u32>,

    #[arg(long)]
    cookie_file: Option<PathBuf>,

    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Skip the pauses between page visits
    #[arg(long)]
    no_delay: bool,

    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            company: self.company.clone(),
            search_query: self.query.clone(),
            profile_count: self.count,
            cookie_file: self.cookie_file.clone(),
            output_dir: self.output_dir.clone(),
            no_delay: self.no_delay,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logger::init(cli.verbose);
    info!("Starting Profile Scraper...");

    // 1. Configuration
    let config = match RunConfig::load(&cli.config, &cli.overrides()) {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };
    info!(
        "Scraping for the following details - Company: {}, Number: {}, Search Query: {}",
        config.company, config.profile_count, config.search_query
    );

    // 2. Session: saved cookies or a fresh login
    let mut session = PageSession::new(&config.base_url, config.delays.clone())?;
    let store = SessionStore::new(&config.cookie_file);
    match store.load() {
        Some(cookies) => {
            info!("Loading cookies...");
            session.restore(&cookies);
        }
        None => {
            info!("No usable cookie file. Logging in with credentials...");
            session.login(&config.email, &config.password)?;
            store.save(&session.cookies())?;
        }
    }

    // 3. Company people list, filtered by keyword
    SearchEngine::new().open_people(&mut session, &config.company, &config.search_query)?;

    // 4. Profile links
    let links = collect(config.profile_count as usize, &mut session, &config.delays);
    if links.is_empty() {
        warn!("No profiles found for '{}' at {}", config.search_query, config.company);
        return Ok(());
    }
    info!("Collected {} profile links", links.len());

    // 5. Profiles
    let summarizer: Box<dyn Summarizer> = if config.api_key.is_empty() {
        warn!("No GEMINI_API_KEY configured, competency will be left empty");
        Box::new(NoopSummarizer)
    } else {
        Box::new(GeminiSummarizer::new(&config.api_key, &config.model)?)
    };
    let extractor = Extractor::new(config.delays.clone());
    let outcome = extractor.scrape_all(&links, &mut session, summarizer.as_ref());

    // 6. Export whatever was completed
    if outcome.profiles.is_empty() {
        warn!("No profiles were scraped, nothing to export");
    } else {
        let stem = export::export_stem(&config.company, &config.search_query, Local::now());
        export::write_batch(&outcome.profiles, &config.output_dir, &stem)?;
    }

    info!(
        "Scraping completed. {} exported, {} skipped. Please review your files.",
        outcome.profiles.len(),
        outcome.skipped.len()
    );
    if let Some(e) = outcome.aborted {
        return Err(e.into());
    }
    Ok(())
}
