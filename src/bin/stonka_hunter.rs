//! stonka-hunter - count Colorado potato beetles on a leaf photo and advise on spraying

use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDateTime, Timelike};
use clap::{Args, Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;

use stonka_hunter::config::HunterConfig;
use stonka_hunter::detect::{load_detector, resolve_model, BackendRegistry, ColorBackend};
use stonka_hunter::report::build_persisted_record;
use stonka_hunter::storage::{FilesystemReportStore, ReportStore};
use stonka_hunter::weather::{
    resolve_location, Coordinates, Location, OpenMeteoClient, OpenMeteoConfig, WeatherSource,
};
use stonka_hunter::{advise_spray_timing, analyze_image, load_caption_font, load_photo};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE", global = true)]
    ui: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect beetles on a photo and print recommendations.
    Analyze(AnalyzeArgs),
    /// Print spray-timing advice for the current temperature.
    Weather(LocationArgs),
    /// Browse or prune saved detections.
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryAction {
    /// List saved detections, newest first.
    List,
    /// Delete one saved detection by file name.
    Delete { file: String },
}

#[derive(Args, Debug)]
struct LocationArgs {
    /// Fallback city used when no GPS coordinates are given.
    #[arg(long)]
    city: Option<String>,
    /// GPS latitude (requires --lon).
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,
    /// GPS longitude (requires --lat).
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Leaf photograph (jpg or png).
    image: PathBuf,
    #[command(flatten)]
    location: LocationArgs,
    /// Skip the weather lookup.
    #[arg(long)]
    offline: bool,
    /// Save the annotated image to the detection history.
    #[arg(long)]
    save: bool,
    /// Detector backend to use (defaults to the loaded model).
    #[arg(long)]
    backend: Option<String>,
    /// Minimum detector confidence.
    #[arg(long)]
    confidence: Option<f32>,
    /// IoU threshold for duplicate suppression.
    #[arg(long)]
    iou: Option<f32>,
    /// Label keyword identifying the beetle; repeatable, replaces the configured set.
    #[arg(long = "pest-keyword")]
    pest_keywords: Vec<String>,
    /// Print the assessment as JSON instead of text.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let stdout_is_tty = std::io::stdout().is_terminal();
    let ui = ui::Ui::from_args(&cli.ui, std::io::stderr().is_terminal(), !stdout_is_tty);
    let mut cfg = HunterConfig::load()?;

    match cli.command {
        Command::Analyze(args) => analyze(&ui, &mut cfg, args),
        Command::Weather(args) => weather(&ui, &cfg, &args),
        Command::History { action } => history(&ui, &cfg, action),
    }
}

fn location_for(cfg: &HunterConfig, args: &LocationArgs) -> Result<Location> {
    let gps = match (args.lat, args.lon) {
        (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)?),
        _ => None,
    };
    let city = args.city.as_deref().unwrap_or(&cfg.city);
    resolve_location(gps, city)
}

fn fetch_temperature(ui: &ui::Ui, cfg: &HunterConfig, location: &Location) -> Result<Option<f64>> {
    let _stage = ui.stage("Fetch live weather");
    let client = OpenMeteoClient::new(OpenMeteoConfig {
        base_url: cfg.weather.url.clone(),
        timeout: cfg.weather.timeout,
    })?;
    Ok(client.current_temperature(location.coordinates))
}

fn describe_weather(location: &Location, temperature: Option<f64>) -> String {
    match temperature {
        Some(t) => format!("{} | {:.1}°C", location.name, t),
        None => format!("{} | temperature unavailable", location.name),
    }
}

fn weather(ui: &ui::Ui, cfg: &HunterConfig, args: &LocationArgs) -> Result<()> {
    let location = location_for(cfg, args)?;
    let temperature = fetch_temperature(ui, cfg, &location)?;
    ui.section(
        &describe_weather(&location, temperature),
        &[advise_spray_timing(temperature)],
    );
    Ok(())
}

fn analyze(ui: &ui::Ui, cfg: &mut HunterConfig, args: AnalyzeArgs) -> Result<()> {
    if let Some(confidence) = args.confidence {
        cfg.thresholds.confidence = confidence;
    }
    if let Some(iou) = args.iou {
        cfg.thresholds.iou = iou;
    }
    if !args.pest_keywords.is_empty() {
        cfg.pest_keywords = args.pest_keywords.clone();
    }
    cfg.validate()?;
    let keywords = cfg.keywords()?;

    let location = location_for(cfg, &args.location)?;
    let temperature = if args.offline {
        None
    } else {
        fetch_temperature(ui, cfg, &location)?
    };

    let mut registry = {
        let _stage = ui.stage("Load detector");
        let choice = resolve_model(&cfg.model.paths());
        if let Some(notice) = choice.notice() {
            log::warn!("{}", notice);
            ui.warn(&notice);
        }
        let mut registry = BackendRegistry::new();
        registry.register_boxed(load_detector(&choice, &cfg.model.classes())?);
        registry.register(ColorBackend::new());
        if let Some(name) = &args.backend {
            registry.set_default(name)?;
        }
        registry
    };
    let backend_name = registry
        .default_name()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("no detector backend registered"))?;

    let photo = {
        let _stage = ui.stage("Decode photo");
        load_photo(&args.image)?
    };

    let assessment = {
        let _stage = ui.stage("Detect beetles");
        let detector = registry
            .get_mut(&backend_name)
            .ok_or_else(|| anyhow!("backend '{}' not registered", backend_name))?;
        analyze_image(detector, &photo, cfg.thresholds, temperature, &keywords)?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&assessment)?);
    } else {
        ui.section(&describe_weather(&location, temperature), &assessment.messages);
        if !assessment.treatment.is_empty() {
            ui.section("Suggested treatment", &assessment.treatment);
        }
        if assessment.headline.celebrate() {
            println!("\n  *** Big catch! ***");
        }
    }

    if args.save {
        let _stage = ui.stage("Save detection");
        let annotated = assessment.annotate(&photo, &keywords);
        let font = load_caption_font(cfg.font_path.as_deref());
        let record = build_persisted_record(
            &annotated,
            assessment.pest_count(),
            temperature,
            now_to_second(),
            font.as_ref(),
        );
        let mut store = FilesystemReportStore::new(&cfg.history_dir);
        let file_name = store.save(&record)?;
        eprintln!("saved {}", store.path_of(&file_name).display());
    }
    Ok(())
}

fn history(ui: &ui::Ui, cfg: &HunterConfig, action: HistoryAction) -> Result<()> {
    let mut store = FilesystemReportStore::new(&cfg.history_dir);
    match action {
        HistoryAction::List => {
            let entries = store.list()?;
            if entries.is_empty() {
                println!("No detection history available yet.");
                return Ok(());
            }
            let lines: Vec<String> = entries
                .iter()
                .map(|entry| format!("Detection at {}  ({})", entry.label(), entry.file_name))
                .collect();
            ui.section(&format!("Total saved detections: {}", entries.len()), &lines);
        }
        HistoryAction::Delete { file } => {
            store.delete(&file)?;
            println!("Detection deleted: {}", file);
        }
    }
    Ok(())
}

fn now_to_second() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}
