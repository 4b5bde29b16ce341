//! Command-line driver for the flight search page logic

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use flight_finder::app::AirportField;
use flight_finder::logging::init_logging;
use flight_finder::page::{ids, verify_document};
use flight_finder::search::SelectionOutcome;
use flight_finder::{
    render, AirportIndex, Config, FlightApp, FlightClient, MemoryPage, Page, SearchParams,
    SearchRequest, TravelClass,
};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::time::Interval;
use tracing::{debug, error, info};

#[derive(Parser)]
#[command(name = "flight-finder")]
#[command(about = "Drive the flight search page logic from the terminal")]
struct Cli {
    /// Origin serving /api/airports and /search-flights
    #[arg(long, env = "FLIGHT_FINDER_BASE_URL", global = true)]
    base_url: Option<String>,
    /// Directory for JSON log files
    #[arg(long, env = "FLIGHT_FINDER_LOG_DIR", global = true)]
    log_dir: Option<PathBuf>,
    /// Log filter when RUST_LOG is unset (e.g. "debug")
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the backend is reachable
    Health,
    /// Show autocomplete suggestions for a query
    Airports {
        query: String,
    },
    /// Run a single one-way search and print the rendered results
    Search {
        /// Departure airport code
        #[arg(short, long)]
        from: String,
        /// Arrival airport code
        #[arg(short, long)]
        to: String,
        /// Departure date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,
        /// Return date (YYYY-MM-DD), passed through to the backend
        #[arg(short, long)]
        return_date: Option<String>,
        #[arg(long, default_value = "1")]
        adults: u32,
        /// Cabin class (economy, premium-economy, business, first)
        #[arg(long, default_value = "economy")]
        class: String,
    },
    /// Verify an HTML page against the element ID contract
    CheckPage {
        file: PathBuf,
    },
    /// Read page events from stdin and print the regions they change
    Session {
        /// Seed the page from this HTML document
        #[arg(long)]
        page: Option<PathBuf>,
        /// Carousel slides when no page document is given
        #[arg(long, default_value = "3")]
        slides: usize,
    },
}

/// One line of a `session` script
#[derive(Debug, PartialEq)]
enum SessionCommand {
    Trip(String),
    Type(AirportField, String),
    Pick(AirportField, String),
    Click(Option<String>),
    Set(String, String),
    Submit,
    Select(usize),
    Clear,
    Tick,
    Show(String),
    Quit,
}

fn parse_field(field: &str) -> Result<AirportField> {
    match field.to_lowercase().as_str() {
        "departure" | "from" => Ok(AirportField::Departure),
        "arrival" | "to" => Ok(AirportField::Arrival),
        _ => bail!("unknown airport field '{}'", field),
    }
}

fn parse_command(line: &str) -> Result<Option<SessionCommand>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let command = match name {
        "trip" => SessionCommand::Trip(rest.to_string()),
        "type" | "pick" => {
            let (field, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            let field = parse_field(field)?;
            if name == "type" {
                SessionCommand::Type(field, value.trim().to_string())
            } else {
                SessionCommand::Pick(field, value.trim().to_string())
            }
        }
        "click" => SessionCommand::Click(Some(rest.to_string()).filter(|t| !t.is_empty())),
        "set" => {
            let Some((id, value)) = rest.split_once(char::is_whitespace) else {
                // `set returnDate` with no value clears the field
                return Ok(Some(SessionCommand::Set(rest.to_string(), String::new())));
            };
            SessionCommand::Set(id.to_string(), value.trim().to_string())
        }
        "submit" | "search-return" => SessionCommand::Submit,
        "select" => SessionCommand::Select(
            rest.parse()
                .with_context(|| format!("select expects an offer index, got '{}'", rest))?,
        ),
        "clear" => SessionCommand::Clear,
        "tick" => SessionCommand::Tick,
        "show" => SessionCommand::Show(rest.to_string()),
        "quit" | "exit" => SessionCommand::Quit,
        other => bail!("unknown command '{}'", other),
    };
    Ok(Some(command))
}

fn print_region(out: &mut impl Write, page: &MemoryPage, id: &str) -> io::Result<()> {
    if page.is_hidden(id) {
        writeln!(out, "[{}] (hidden)", id)
    } else {
        writeln!(out, "[{}]\n{}", id, page.html(id))
    }
}

async fn run_session(client: FlightClient, page: Option<PathBuf>, slides: usize) -> Result<()> {
    let page = match page {
        Some(path) => {
            let html = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            MemoryPage::from_document(&html)?
        }
        None => MemoryPage::new(slides),
    };
    let slide_count = page.slide_count();
    let mut app = FlightApp::start(page, client, slide_count).await;
    let ticker = app.carousel_ticker();

    let stdin = BufReader::new(tokio::io::stdin());
    let mut out = io::stdout();
    session_loop(&mut app, stdin, &mut out, ticker).await
}

/// Apply stdin events as they arrive, advancing the carousel on `ticker` in between.
async fn session_loop<R, W>(
    app: &mut FlightApp<MemoryPage>,
    input: R,
    out: &mut W,
    mut ticker: Interval,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => line,
                None => break,
            },
            _ = ticker.tick() => {
                if let Some(change) = app.on_carousel_tick() {
                    debug!(hide = change.hide, show = change.show, "Carousel advanced");
                }
                continue;
            }
        };

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                writeln!(out, "error: {}", e)?;
                continue;
            }
        };
        if !apply_command(app, command, out).await? {
            break;
        }
        out.flush()?;
    }
    Ok(())
}

/// Returns `false` once the session should end.
async fn apply_command<W: Write>(
    app: &mut FlightApp<MemoryPage>,
    command: SessionCommand,
    out: &mut W,
) -> Result<bool> {
    match command {
        SessionCommand::Trip(value) => {
            app.on_trip_type_change(&value);
            print_region(out, app.page(), ids::RETURN_FIELD)?;
        }
        SessionCommand::Type(field, text) => {
            app.on_input(field, &text);
            let dropdown = match field {
                AirportField::Departure => ids::DEPARTURE_DROPDOWN,
                AirportField::Arrival => ids::ARRIVAL_DROPDOWN,
            };
            print_region(out, app.page(), dropdown)?;
        }
        SessionCommand::Pick(field, code) => app.on_airport_select(field, &code),
        SessionCommand::Click(target) => app.on_document_click(target.as_deref()),
        SessionCommand::Set(id, value) => app.page_mut().set_value(&id, &value),
        SessionCommand::Submit => {
            match app.on_submit().await {
                Some(count) => writeln!(out, "{} flights", count)?,
                None => writeln!(out, "search failed")?,
            }
            print_region(out, app.page(), ids::FLIGHT_RESULTS)?;
        }
        SessionCommand::Select(index) => match app.on_select_flight(index) {
            Ok(outcome) => {
                if let SelectionOutcome::RoundTripComplete { total, .. } = outcome {
                    writeln!(out, "total ${}", render::format_total(total))?;
                }
                print_region(out, app.page(), ids::SELECTED_FLIGHTS)?;
                print_region(out, app.page(), ids::FLIGHT_RESULTS)?;
            }
            Err(e) => writeln!(out, "error: {}", e)?,
        },
        SessionCommand::Clear => app.on_clear_itinerary(),
        SessionCommand::Tick => match app.on_carousel_tick() {
            Some(change) => writeln!(out, "slide {} -> {}", change.hide, change.show)?,
            None => writeln!(out, "no slides")?,
        },
        SessionCommand::Show(id) => print_region(out, app.page(), &id)?,
        SessionCommand::Quit => return Ok(false),
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    if let Some(log_dir) = cli.log_dir {
        config.log_dir = Some(log_dir);
    }
    if let Some(log_level) = cli.log_level {
        config.log_level = log_level;
    }
    config.validate()?;

    if let Err(e) = init_logging(&config) {
        eprintln!("Failed to initialize logging: {}", e);
        // Continue without logging rather than failing
    }

    let client = FlightClient::new(config)?;

    match cli.command {
        Commands::Health => {
            let health = client.health().await?;
            println!("{}: {}", health.status, health.message);
        }
        Commands::Airports { query } => {
            let index = AirportIndex::load(&client).await;
            for airport in index.search(&query) {
                println!("{}  {} ({}) - {}", airport.code, airport.city, airport.country, airport.name);
            }
        }
        Commands::Search {
            from,
            to,
            date,
            return_date,
            adults,
            class,
        } => {
            let params = SearchParams {
                departure_id: from.trim().to_uppercase(),
                arrival_id: to.trim().to_uppercase(),
                outbound_date: date,
                return_date,
                adults,
                travel_class: class.parse::<TravelClass>()?,
            };
            info!(params = %params, "Searching from the command line");

            match client.search_flights(&SearchRequest::one_way(&params)).await {
                Ok(flights) => {
                    println!("{}", render::flight_results(&flights, Default::default()));
                    eprintln!("Found {} flights", flights.len());
                }
                Err(e) => {
                    error!(error = %e, "Search failed");
                    eprintln!("Error searching for flights: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::CheckPage { file } => {
            let html = fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let report = verify_document(&html)?;
            println!("{}: all {} elements present, {} slides", file.display(), ids::REQUIRED.len(), report.slide_count);
        }
        Commands::Session { page, slides } => run_session(client, page, slides).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn session_app() -> FlightApp<MemoryPage> {
        let client = FlightClient::new(Config::default()).unwrap();
        FlightApp::new(MemoryPage::new(3), client, 3)
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from([
            "flight-finder",
            "search",
            "--from", "YYZ",
            "--to", "LAX",
            "--date", "2025-12-20",
        ]);

        assert!(cli.is_ok());

        if let Ok(Cli { command: Commands::Search { from, to, date, adults, class, .. }, .. }) = cli {
            assert_eq!(from, "YYZ");
            assert_eq!(to, "LAX");
            assert_eq!(date, "2025-12-20");
            assert_eq!(adults, 1);
            assert_eq!(class, "economy");
        }
    }

    #[test]
    fn test_parse_session_commands() {
        assert_eq!(parse_command("  ").unwrap(), None);
        assert_eq!(parse_command("# comment").unwrap(), None);
        assert_eq!(
            parse_command("type departure new york").unwrap(),
            Some(SessionCommand::Type(AirportField::Departure, "new york".to_string()))
        );
        assert_eq!(
            parse_command("pick to LAX").unwrap(),
            Some(SessionCommand::Pick(AirportField::Arrival, "LAX".to_string()))
        );
        assert_eq!(
            parse_command("set departureDate 2025-12-20").unwrap(),
            Some(SessionCommand::Set("departureDate".to_string(), "2025-12-20".to_string()))
        );
        assert_eq!(
            parse_command("set returnDate").unwrap(),
            Some(SessionCommand::Set("returnDate".to_string(), String::new()))
        );
        assert_eq!(parse_command("click").unwrap(), Some(SessionCommand::Click(None)));
        assert_eq!(parse_command("select 2").unwrap(), Some(SessionCommand::Select(2)));
        assert_eq!(parse_command("search-return").unwrap(), Some(SessionCommand::Submit));
        assert!(parse_command("select two").is_err());
        assert!(parse_command("type sideways JFK").is_err());
        assert!(parse_command("launch").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_session_advances_carousel_on_timer() {
        let mut app = session_app();
        let ticker = app.carousel_ticker();
        // Keep the writer alive so the session waits on input instead of ending
        let (_input, reader) = tokio::io::duplex(64);
        let mut out = Vec::new();

        let finished = tokio::time::timeout(
            Duration::from_millis(5500),
            session_loop(&mut app, BufReader::new(reader), &mut out, ticker),
        )
        .await;

        assert!(finished.is_err());
        assert_eq!(app.page().visible_slide(), Some(1));
        assert!(out.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_runs_script_until_quit() {
        let mut app = session_app();
        let ticker = app.carousel_ticker();
        let script: &[u8] = b"tick\ntrip 2\nbogus\nquit\ntick\n";
        let mut out = Vec::new();

        session_loop(&mut app, script, &mut out, ticker).await.unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("slide 0 -> 1"));
        assert!(out.contains("[returnField] (hidden)"));
        assert!(out.contains("error: unknown command 'bogus'"));
        assert_eq!(app.page().visible_slide(), Some(1));
    }
}
