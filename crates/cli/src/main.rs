use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use clap::{Parser, Subcommand};

use facewatch_core::detection::domain::face_locator::FaceLocator;
use facewatch_core::detection::infrastructure::onnx_face_locator::OnnxFaceLocator;
use facewatch_core::detection::infrastructure::whole_frame_locator::WholeFrameLocator;
use facewatch_core::pipeline::analyze_frame_use_case::{AnalyzeFrameUseCase, FaceObservation};
use facewatch_core::pipeline::enroll_faces_use_case::EnrollFacesUseCase;
use facewatch_core::pipeline::infrastructure::threaded_monitor_executor::ThreadedMonitorExecutor;
use facewatch_core::pipeline::monitor_executor::{
    MonitorConfig, MonitorExecutor, MonitorJob, MonitorSummary,
};
use facewatch_core::pipeline::pipeline_logger::LogPipelineLogger;
use facewatch_core::policy::domain::alert_sink::AlertSink;
use facewatch_core::policy::domain::person::{Category, PersonDirectory};
use facewatch_core::policy::domain::recognition_policy::{
    PolicyConfig, RecognitionPolicy, Verdict,
};
use facewatch_core::policy::infrastructure::file_alert_sink::FileAlertSink;
use facewatch_core::policy::infrastructure::json_directory_store::JsonDirectoryStore;
use facewatch_core::policy::infrastructure::log_alert_sink::LogAlertSink;
use facewatch_core::recognition::domain::face_normalizer::FaceNormalizer;
use facewatch_core::recognition::domain::gallery::PersonId;
use facewatch_core::recognition::domain::match_result::MatchResult;
use facewatch_core::recognition::domain::shared_gallery::SharedGallery;
use facewatch_core::recognition::infrastructure::dataset_store::DatasetStore;
use facewatch_core::recognition::infrastructure::mean_abs_diff_matcher::MeanAbsDiffMatcher;
use facewatch_core::shared::constants::{
    MIN_SOURCE_SIDE, RECOMMENDED_PHOTOS_PER_PERSON, YOLO_MODEL_NAME, YOLO_MODEL_URL,
};
use facewatch_core::shared::model_resolver;
use facewatch_core::shared::settings::Settings;
use facewatch_core::video::domain::frame_source::FrameSource;
use facewatch_core::video::infrastructure::ffmpeg_frame_source::FfmpegFrameSource;
use facewatch_core::video::infrastructure::image_file_source::{is_image_file, ImageFileSource};
use facewatch_core::video::infrastructure::image_file_writer::ImageFileWriter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Enroll faces and watch images or video for known people.
#[derive(Parser)]
#[command(name = "facewatch")]
struct Cli {
    /// Directory holding the dataset, person directory and alert log.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Settings file to use instead of the per-user one.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Largest match distance accepted as a known person.
    #[arg(long, global = true)]
    max_distance: Option<f64>,

    /// Seconds between two alerts for the same person.
    #[arg(long, global = true)]
    cooldown: Option<u64>,

    /// Keep alerts out of the console log; they still go to alerts.log.
    #[arg(long, global = true)]
    no_alerts: bool,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, global = true)]
    confidence: Option<f64>,

    /// Ignore detected faces smaller than this many pixels on either side.
    #[arg(long, global = true)]
    min_face_size: Option<u32>,

    /// Inputs are already face crops; skip face detection.
    #[arg(long, global = true)]
    pre_cropped: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add or update a person in the directory.
    Register {
        name: String,
        /// Explicit id; the next free one is used otherwise.
        #[arg(long)]
        id: Option<PersonId>,
        /// flagged or civilian.
        #[arg(long, default_value = "civilian")]
        category: Category,
    },
    /// Save reference faces of a registered person from a photo or folder.
    Enroll { id: PersonId, photos: PathBuf },
    /// Rebuild the gallery from the dataset and report what it holds.
    Train,
    /// Match every face in an image or folder of images.
    Identify { input: PathBuf },
    /// Monitor a video file or stream and raise alerts for flagged people.
    Watch {
        input: PathBuf,
        /// Pace frames like a live camera and drop them while busy.
        #[arg(long)]
        realtime: bool,
        /// Stop after this many frames.
        #[arg(long)]
        max_frames: Option<usize>,
    },
    /// Show registered people and their photo counts.
    List,
    /// Delete a person and their photos.
    Remove { id: PersonId },
    /// Delete every person and photo.
    Clear {
        /// Required; there is no undo.
        #[arg(long)]
        yes: bool,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let settings = load_settings(&cli)?;
    validate(&settings)?;

    match &cli.command {
        Command::Register { name, id, category } => run_register(&settings, name, *id, *category),
        Command::Enroll { id, photos } => run_enroll(&cli, &settings, *id, photos),
        Command::Train => run_train(&settings),
        Command::Identify { input } => run_identify(&cli, &settings, input),
        Command::Watch {
            input,
            realtime,
            max_frames,
        } => run_watch(&cli, &settings, input, *realtime, *max_frames),
        Command::List => run_list(&settings),
        Command::Remove { id } => run_remove(&settings, *id),
        Command::Clear { yes } => run_clear(&settings, *yes),
    }
}

fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load(),
    };
    if let Some(dir) = &cli.data_dir {
        settings.data_dir = dir.clone();
    }
    if let Some(d) = cli.max_distance {
        settings.max_distance = d;
    }
    if let Some(secs) = cli.cooldown {
        settings.alert_cooldown_secs = secs;
    }
    if cli.no_alerts {
        settings.alerts_enabled = false;
    }
    if let Some(c) = cli.confidence {
        settings.detector_confidence = c;
    }
    if let Some(size) = cli.min_face_size {
        settings.min_face_size = size;
    }
    Ok(settings)
}

fn validate(settings: &Settings) -> CliResult<()> {
    if !settings.max_distance.is_finite() || settings.max_distance < 0.0 {
        return Err(format!(
            "Max distance must be a non-negative number, got {}",
            settings.max_distance
        )
        .into());
    }
    if !(0.0..=1.0).contains(&settings.detector_confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            settings.detector_confidence
        )
        .into());
    }
    if settings.canonical_size < MIN_SOURCE_SIDE {
        return Err(format!(
            "Canonical size must be at least {MIN_SOURCE_SIDE} pixels, got {}",
            settings.canonical_size
        )
        .into());
    }
    Ok(())
}

fn run_register(
    settings: &Settings,
    name: &str,
    id: Option<PersonId>,
    category: Category,
) -> CliResult<()> {
    let store = JsonDirectoryStore::new(settings.directory_path());
    let mut directory = store.load()?;
    let id = directory.register(id, name, category);
    store.save(&directory)?;
    println!("Registered {name} as ID {id} ({category})");
    Ok(())
}

fn run_enroll(cli: &Cli, settings: &Settings, id: PersonId, photos: &Path) -> CliResult<()> {
    let directory = JsonDirectoryStore::new(settings.directory_path()).load()?;
    if !directory.contains(id) {
        return Err(format!("No person with ID {id}; register them first").into());
    }

    let mut source = ImageFileSource::new();
    let metadata = source.open(photos)?;
    let store = dataset_store(settings)?;
    let mut enroll = EnrollFacesUseCase::new(
        build_locator(cli, settings)?,
        normalizer(settings)?,
        &store,
        SharedGallery::default(),
    );
    let report = enroll.execute(id, source.frames())?;
    source.close();

    let total = store.photo_counts()?.get(&id).copied().unwrap_or(0);
    println!(
        "Saved {} of {} photos for ID {id} ({total} total)",
        report.saved.len(),
        metadata.total_frames
    );
    if total < RECOMMENDED_PHOTOS_PER_PERSON {
        println!("Tip: {RECOMMENDED_PHOTOS_PER_PERSON} or more photos per person match more reliably");
    }
    Ok(())
}

fn run_train(settings: &Settings) -> CliResult<()> {
    let directory = JsonDirectoryStore::new(settings.directory_path()).load()?;
    let gallery = dataset_store(settings)?.load_gallery()?;
    if gallery.is_empty() {
        println!("Gallery is empty; enroll some photos first");
        return Ok(());
    }
    for (id, count) in gallery.counts_by_person() {
        let name = directory.get(id).map_or("<unregistered>", |p| p.name.as_str());
        println!("ID {id:>4}  {name:<24} {count} faces");
    }
    println!("Gallery ready: {} faces", gallery.len());
    Ok(())
}

fn run_identify(cli: &Cli, settings: &Settings, input: &Path) -> CliResult<()> {
    for line in identify(cli, settings, input)? {
        println!("{line}");
    }
    Ok(())
}

/// One line per face found in `input`, or per image without faces.
fn identify(cli: &Cli, settings: &Settings, input: &Path) -> CliResult<Vec<String>> {
    let directory = JsonDirectoryStore::new(settings.directory_path()).load()?;
    let gallery = SharedGallery::new(dataset_store(settings)?.load_gallery()?);
    let mut analyzer = AnalyzeFrameUseCase::new(
        build_locator(cli, settings)?,
        normalizer(settings)?,
        Box::new(MeanAbsDiffMatcher::new()),
        gallery,
    )?;
    let mut policy = RecognitionPolicy::new(policy_config(settings));

    let mut source = ImageFileSource::new();
    source.open(input)?;
    let mut lines = Vec::new();
    for frame in source.frames() {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("Skipping {e}");
                continue;
            }
        };
        let analysis = analyzer.execute(&frame)?;
        if analysis.observations.is_empty() {
            lines.push(format!("[{}] no faces", analysis.frame_index));
        }
        for obs in &analysis.observations {
            let verdict = policy.evaluate(&obs.result, &directory, Instant::now());
            lines.push(format!(
                "[{}] {} {}",
                analysis.frame_index,
                obs.region,
                describe(&verdict, &obs.result)
            ));
        }
    }
    source.close();
    Ok(lines)
}

fn run_watch(
    cli: &Cli,
    settings: &Settings,
    input: &Path,
    realtime: bool,
    max_frames: Option<usize>,
) -> CliResult<()> {
    let summary = watch(cli, settings, input, realtime, max_frames)?;
    println!(
        "Analyzed {} of {} frames ({} dropped, {} unreadable): {} faces, {} recognized, {} unknown, {} alerts",
        summary.frames_analyzed,
        summary.frames_captured,
        summary.frames_dropped,
        summary.frames_skipped,
        summary.faces,
        summary.stats.recognized,
        summary.stats.unknown,
        summary.stats.alerts
    );
    Ok(())
}

fn watch(
    cli: &Cli,
    settings: &Settings,
    input: &Path,
    realtime: bool,
    max_frames: Option<usize>,
) -> CliResult<MonitorSummary> {
    let directory = JsonDirectoryStore::new(settings.directory_path()).load()?;
    let gallery = SharedGallery::new(dataset_store(settings)?.load_gallery()?);
    if gallery.snapshot().is_empty() {
        log::warn!("Gallery is empty; every face will be reported as unknown");
    }

    let mut source = open_source(input);
    let metadata = source.open(input)?;
    let analyzer = AnalyzeFrameUseCase::new(
        build_locator(cli, settings)?,
        normalizer(settings)?,
        Box::new(MeanAbsDiffMatcher::new()),
        gallery,
    )?;
    let job = MonitorJob {
        source,
        analyzer,
        policy: RecognitionPolicy::new(policy_config(settings)),
        directory: &directory,
        sinks: alert_sinks(settings),
    };
    let config = MonitorConfig {
        drop_when_busy: realtime,
        pace: realtime,
        max_frames,
        on_observation: Some(Box::new(
            |frame: usize, obs: &FaceObservation, verdict: &Verdict| {
                println!("[{frame}] {} {}", obs.region, describe(verdict, &obs.result));
            },
        )),
        ..MonitorConfig::default()
    };

    let mut logger = LogPipelineLogger::default();
    Ok(ThreadedMonitorExecutor::new().execute(job, &metadata, config, &mut logger)?)
}

fn run_list(settings: &Settings) -> CliResult<()> {
    let directory = JsonDirectoryStore::new(settings.directory_path()).load()?;
    let counts = dataset_store(settings)?.photo_counts()?;
    if directory.is_empty() {
        println!("No people registered");
    }
    for person in directory.iter() {
        let photos = counts.get(&person.id).copied().unwrap_or(0);
        println!(
            "ID {:>4}  {:<24} {:<9} {photos} photos",
            person.id,
            person.name,
            person.category.to_string()
        );
    }
    for id in counts.keys().filter(|id| !directory.contains(**id)) {
        println!("ID {id:>4}  <unregistered> has photos on disk");
    }
    Ok(())
}

fn run_remove(settings: &Settings, id: PersonId) -> CliResult<()> {
    let store = JsonDirectoryStore::new(settings.directory_path());
    let mut directory = store.load()?;
    let record = directory.remove(id);
    let had_photos = dataset_store(settings)?.remove_person(id)?;
    if record.is_none() && !had_photos {
        return Err(format!("No person with ID {id}").into());
    }
    store.save(&directory)?;
    match record {
        Some(person) => println!("Removed {} (ID {id})", person.name),
        None => println!("Removed photos of ID {id}"),
    }
    Ok(())
}

fn run_clear(settings: &Settings, yes: bool) -> CliResult<()> {
    if !yes {
        return Err("Refusing to delete every person without --yes".into());
    }
    dataset_store(settings)?.clear()?;
    JsonDirectoryStore::new(settings.directory_path()).save(&PersonDirectory::new())?;
    println!("Cleared all people and photos");
    Ok(())
}

fn describe(verdict: &Verdict, result: &MatchResult) -> String {
    match verdict {
        Verdict::Unknown if result.is_no_match() => "Unknown".to_string(),
        Verdict::Unknown => format!("Unknown (nearest {:.1})", result.distance),
        Verdict::Recognized { person, distance } => {
            format!("{} [{}] {distance:.1}", person.name, person.category)
        }
        Verdict::Alert { person, distance } => {
            format!("ALERT {} [{}] {distance:.1}", person.name, person.category)
        }
    }
}

fn build_locator(cli: &Cli, settings: &Settings) -> CliResult<Box<dyn FaceLocator>> {
    if cli.pre_cropped {
        return Ok(Box::new(WholeFrameLocator::new()));
    }
    log::info!("Resolving model: {YOLO_MODEL_NAME}");
    let model_path = model_resolver::resolve(
        YOLO_MODEL_NAME,
        YOLO_MODEL_URL,
        Some(Box::new(download_progress)),
    )?;
    Ok(Box::new(OnnxFaceLocator::new(
        &model_path,
        settings.detector_confidence,
        settings.min_face_size,
    )?))
}

fn normalizer(settings: &Settings) -> CliResult<FaceNormalizer> {
    Ok(FaceNormalizer::new(settings.canonical_size, settings.canonical_size)?)
}

fn dataset_store(settings: &Settings) -> CliResult<DatasetStore> {
    Ok(DatasetStore::new(
        settings.dataset_dir(),
        normalizer(settings)?,
        Box::new(ImageFileWriter::new()),
    ))
}

fn policy_config(settings: &Settings) -> PolicyConfig {
    PolicyConfig {
        max_distance: settings.max_distance,
        alert_cooldown: settings.alert_cooldown(),
    }
}

/// The alert log always records; `--no-alerts` only silences the console.
fn alert_sinks(settings: &Settings) -> Vec<Box<dyn AlertSink>> {
    let mut sinks: Vec<Box<dyn AlertSink>> =
        vec![Box::new(FileAlertSink::new(settings.alert_log_path()))];
    if settings.alerts_enabled {
        sinks.push(Box::new(LogAlertSink::new()));
    }
    sinks
}

fn open_source(input: &Path) -> Box<dyn FrameSource> {
    if input.is_dir() || is_image_file(input) {
        Box::new(ImageFileSource::new())
    } else {
        Box::new(FfmpegFrameSource::new())
    }
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprintln!("Downloading face detection model... {pct}%");
    } else {
        eprintln!("Downloading face detection model... {downloaded} bytes");
    }
}
