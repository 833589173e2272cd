use campuscal::cache::{CacheStore, FileStore};
use campuscal::config::Settings;
use campuscal::conversion::EventNormalizer;
use campuscal::fetch::{FetchPipeline, HttpTransport};
use campuscal::filter::{FilterSettings, apply_filters, filter_option_events, search_events};
use campuscal::ics::{event_to_ics, export_file_name};
use campuscal::logging::get_recent_logs;
use campuscal::service::{CalendarService, LoadSource};
use campuscal::utils::{events_for_date, unique_subjects, unique_types, week_dates};
use campuscal::{CampuscalError, DomainEvent, Result};
use chrono::{Local, NaiveDate, Utc};
use clap::{ArgAction, Parser, Subcommand};
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use std::fs;
use std::path::PathBuf;

const TRACE_LINES: usize = 20;

#[derive(Parser)]
#[command(name = "campuscal")]
#[command(about = "Read your university timetable feed from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Timetable feed URL (overrides the saved setting)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Second feed merged into the first one
    #[arg(long, global = true)]
    secondary: Option<String>,

    /// Only show sessions for this group number
    #[arg(long, global = true)]
    group: Option<u32>,

    /// Print the recent fetch attempts afterwards
    #[arg(long, global = true)]
    trace: bool,

    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Sessions of one day (default: today)
    Day {
        /// YYYY-MM-DD
        date: Option<NaiveDate>,

        /// Include sessions hidden by your filters
        #[arg(long)]
        show_hidden: bool,
    },
    /// Sessions of the week containing a date (default: this week)
    Week {
        /// YYYY-MM-DD
        date: Option<NaiveDate>,

        /// Include sessions hidden by your filters
        #[arg(long)]
        show_hidden: bool,
    },
    /// Subjects and their session counts
    Subjects,
    /// Course types and their session counts
    Types,
    /// Search titles, rooms, staff and notes
    Search {
        query: String,

        /// Include sessions hidden by your filters
        #[arg(long)]
        show_hidden: bool,
    },
    /// Write one session to an .ics file
    Export {
        id: String,

        /// Output file (default: named after the subject)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = run(&cli).await;

    if cli.trace {
        eprintln!();
        for line in get_recent_logs(TRACE_LINES).into_iter().rev() {
            eprintln!("{}", line);
        }
    }

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let config = ConfigBuilder::new()
        .add_filter_allow_str("campuscal")
        .build();

    // A logger can only be set once; a second init is harmless
    let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto);
}

fn load_settings(cli: &Cli) -> Settings {
    let mut settings = Settings::load().unwrap_or_else(|e| {
        log::warn!("Ignoring unreadable settings file: {}", e);
        Settings::default()
    });

    if let Some(url) = &cli.url {
        settings.ics_url = url.clone();
    }
    if let Some(url) = &cli.secondary {
        settings.secondary_ics_url = Some(url.clone());
    }
    if cli.group.is_some() {
        settings.group_number = cli.group;
    }
    settings
}

async fn run(cli: &Cli) -> Result<()> {
    let settings = load_settings(cli);

    let pipeline = FetchPipeline::new(
        HttpTransport::new(),
        settings.strategies(),
        EventNormalizer::default(),
    );
    let cache = CacheStore::new(FileStore::new(FileStore::default_dir()));
    let service = CalendarService::new(pipeline, cache);

    let loaded = service
        .load(&settings.ics_url, settings.secondary_url())
        .await?;

    if let LoadSource::Cache { cached_at } = loaded.source {
        eprintln!(
            "Offline: showing the timetable saved on {}",
            cached_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        );
    }

    let filters = settings.filter_settings();
    let today = Local::now().date_naive();

    match &cli.command {
        Commands::Day { date, show_hidden } => {
            let events = listed(&loaded.events, &filters, *show_hidden);
            print_day(date.unwrap_or(today), &events);
        }
        Commands::Week { date, show_hidden } => {
            let events = listed(&loaded.events, &filters, *show_hidden);
            for day in week_dates(date.unwrap_or(today)) {
                print_day(day, &events);
            }
        }
        Commands::Subjects => {
            for subject in unique_subjects(&filter_option_events(&loaded.events, &filters)) {
                let hidden = filters.hidden_subjects.contains(&subject.name);
                println!(
                    "{:>4}  {}  {}{}",
                    subject.count,
                    subject.color,
                    subject.name,
                    if hidden { "  (hidden)" } else { "" }
                );
            }
        }
        Commands::Types => {
            for summary in unique_types(&filter_option_events(&loaded.events, &filters)) {
                let hidden = filters.hidden_types.contains(&summary.event_type);
                println!(
                    "{:>4}  {:<7} {}{}",
                    summary.count,
                    summary.event_type,
                    summary.label,
                    if hidden { "  (hidden)" } else { "" }
                );
            }
        }
        Commands::Search { query, show_hidden } => {
            let events = listed(&loaded.events, &filters, *show_hidden);
            let hits = search_events(&events, query);
            if hits.is_empty() {
                println!("No session matches \"{}\"", query);
            }
            for event in hits {
                println!(
                    "{}  {}",
                    event.start.with_timezone(&Local).format("%a %d/%m"),
                    event_line(event)
                );
            }
        }
        Commands::Export { id, output } => {
            let event = loaded
                .events
                .iter()
                .find(|e| &e.id == id)
                .ok_or_else(|| CampuscalError::EventNotFound(id.clone()))?;

            let path = output
                .clone()
                .unwrap_or_else(|| PathBuf::from(export_file_name(event)));
            fs::write(&path, event_to_ics(event, Utc::now()))?;
            println!("Saved {}", path.display());
        }
    }

    Ok(())
}

fn listed(events: &[DomainEvent], filters: &FilterSettings, show_hidden: bool) -> Vec<DomainEvent> {
    if show_hidden {
        events.to_vec()
    } else {
        apply_filters(events, filters).visible
    }
}

fn print_day(date: NaiveDate, events: &[DomainEvent]) {
    println!("{}", date.format("%A %d %B %Y"));
    let day = events_for_date(events, date);
    if day.is_empty() {
        println!("  no sessions");
    }
    for event in day {
        println!("  {}", event_line(event));
    }
}

fn event_line(event: &DomainEvent) -> String {
    let mut line = format!(
        "{}-{}  {:<7} {}",
        event.start_time(),
        event.end_time(),
        event.type_label,
        event.subject_name
    );
    if let Some(room) = &event.room {
        line.push_str(&format!("  [{}]", room));
    }
    if !event.staff.is_empty() {
        line.push_str(&format!("  {}", event.staff.join(", ")));
    }
    if event.is_secondary {
        line.push_str("  *");
    }
    line
}
