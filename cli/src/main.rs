//! `mapreg`: command-line client for the map registration backend.
//!
//! Talks to the same endpoints as the browser page through a `reqwest`
//! implementation of the registration `Backend`. Results go to stdout as
//! JSON or tab-separated lines; progress and errors go to stderr.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use registration::actions::build_overlay_request;
use registration::api::{ApiError, Backend, ExportRequest, MapEntry, OverlayRequest};
use registration::catalog::{card_title, filter_by_name, meta_line, sort_newest_first};
use registration::coords::{CoordinateStore, HydrationInput};
use registration::error::RegistrationError;
use registration::geometry::Size;

mod backend;

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;

use backend::HttpBackend;

#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("http client setup failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid session cookie: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    #[error("cannot read {path}: {source}")]
    ReadPoints { path: String, source: std::io::Error },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("points file has {terrain} terrain and {image} image pairs; both need the same count, between 1 and {max}")]
    PairCount { terrain: usize, image: usize, max: usize },
    #[error("points file has unusable pairs: {0}")]
    BadPairs(String),
}

#[derive(Parser, Debug)]
#[command(name = "mapreg", about = "Map registration backend CLI")]
struct Cli {
    #[arg(long, env = "MAPREG_BASE_URL", default_value = "http://127.0.0.1:5000")]
    base_url: String,

    /// Raw `Cookie` header value of a logged-in session, e.g. `session=...`.
    #[arg(long, env = "MAPREG_SESSION_COOKIE")]
    session_cookie: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the signed-in user.
    Whoami,
    /// List saved maps, newest first.
    ListMaps {
        /// Case-insensitive substring of the map name.
        #[arg(long)]
        filter: Option<String>,
        /// Print the full entries as JSON instead of one line per map.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Export the map database on the server.
    ExportDatabase {
        #[arg(long, default_value_t = false)]
        no_original: bool,
        #[arg(long, default_value_t = false)]
        no_overwrite: bool,
    },
    /// Compute a registration from a points file.
    Compute {
        /// JSON file with `lat_lon_pairs` and `image_pairs`.
        #[arg(long)]
        points: PathBuf,
        /// Natural width of the map image in pixels.
        #[arg(long)]
        width: u32,
        /// Natural height of the map image in pixels.
        #[arg(long)]
        height: u32,
        /// Print the request body instead of sending it.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    if let Command::Compute { points, width, height, dry_run: true } = &cli.command {
        let request = overlay_request_from_file(points, *width, *height)?;
        return print_json(&request);
    }

    let backend = HttpBackend::new(&cli.base_url, cli.session_cookie.as_deref())?;
    match cli.command {
        Command::Whoami => {
            let user = backend.current_user().await?;
            print_json(&user)
        }
        Command::ListMaps { filter, json } => run_list_maps(&backend, filter.as_deref(), json).await,
        Command::ExportDatabase { no_original, no_overwrite } => {
            let request = export_request(no_original, no_overwrite);
            eprintln!("exporting (include original: {}, overwrite: {})", request.include_original, request.overwrite);
            let result = backend.export_database(&request).await?;
            print_json(&result)
        }
        Command::Compute { points, width, height, .. } => {
            let request = overlay_request_from_file(&points, width, height)?;
            eprintln!("computing registration from {} point pairs", request.image_coords.len());
            let response = backend.overlay_coordinates(&request).await?;
            print_json(&response)
        }
    }
}

async fn run_list_maps(backend: &HttpBackend, filter: Option<&str>, json: bool) -> Result<(), CliError> {
    let mut maps = backend.list_maps().await?;
    sort_newest_first(&mut maps);
    let visible = filter_by_name(&maps, filter.unwrap_or_default());
    eprintln!("{} of {} saved maps", visible.len(), maps.len());
    if json {
        return print_json(&visible);
    }
    for entry in visible {
        println!("{}", map_line(entry));
    }
    Ok(())
}

fn map_line(entry: &MapEntry) -> String {
    let id = entry.map_id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_owned());
    format!("{id}\t{}\t{}", card_title(entry), meta_line(entry))
}

fn export_request(no_original: bool, no_overwrite: bool) -> ExportRequest {
    ExportRequest { include_original: !no_original, overwrite: !no_overwrite }
}

fn overlay_request_from_file(path: &Path, width: u32, height: u32) -> Result<OverlayRequest, CliError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|source| CliError::ReadPoints { path: path.display().to_string(), source })?;
    overlay_request_from_json(&raw, width, height)
}

/// Load the pairs into a coordinate store and build the request from its
/// snapshot, so the CLI validates and rounds exactly like the page does.
fn overlay_request_from_json(raw: &str, width: u32, height: u32) -> Result<OverlayRequest, CliError> {
    let input: HydrationInput = serde_json::from_str(raw)?;
    let pairs = input.lat_lon_pairs.len();
    if pairs == 0 || pairs > registration::consts::MAX_COORDINATE_PAIRS || input.image_pairs.len() != pairs {
        return Err(CliError::PairCount {
            terrain: pairs,
            image: input.image_pairs.len(),
            max: registration::consts::MAX_COORDINATE_PAIRS,
        });
    }

    let mut store = CoordinateStore::new(pairs);
    let report = store.hydrate_coordinates(&input);
    if !report.is_clean() {
        let problems: Vec<String> = report
            .lat_lon_errors
            .iter()
            .map(|(index, err)| format!("terrain #{}: {err}", index + 1))
            .chain(report.image_errors.iter().map(|(index, err)| format!("image #{}: {err}", index + 1)))
            .collect();
        return Err(CliError::BadPairs(problems.join("; ")));
    }

    let overlay = Size::new(f64::from(width), f64::from(height));
    Ok(build_overlay_request(&store.snapshot(), Some(overlay))?)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
