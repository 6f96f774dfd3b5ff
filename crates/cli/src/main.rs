use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use pontoface_core::liveness::domain::video_source::VideoSource;
use pontoface_core::liveness::infrastructure::ffmpeg_video_source::FfmpegVideoSource;
use pontoface_core::liveness::infrastructure::image_sequence_source::ImageSequenceSource;
use pontoface_core::pipeline::attempt_observer::LoggingAttemptObserver;
use pontoface_core::pipeline::check_in_use_case::CheckInUseCase;
use pontoface_core::pipeline::evaluate_liveness_use_case::EvaluateLivenessUseCase;
use pontoface_core::pipeline::recognize_face_use_case::{RecognitionServices, RecognizeFaceUseCase};
use pontoface_core::pipeline::register_face_use_case::RegisterFaceUseCase;
use pontoface_core::recognition::domain::face_matcher::FaceMatcher;
use pontoface_core::recognition::domain::outcome::{Location, RecognitionOutcome};
use pontoface_core::recognition::infrastructure::file_audit_sink::FileAuditSink;
use pontoface_core::recognition::infrastructure::http_face_matcher::HttpFaceMatcher;
use pontoface_core::recognition::infrastructure::jpeg_evidence_encoder::JpegEvidenceEncoder;
use pontoface_core::recognition::infrastructure::json_profile_store::JsonProfileStore;
use pontoface_core::recognition::infrastructure::local_face_matcher::LocalFaceMatcher;
use pontoface_core::recognition::infrastructure::model_slot::{onnx_loader, ModelSlot};
use pontoface_core::shared::image_loader::load_frame;
use pontoface_core::shared::settings::Settings;

const MATCHER_KEY_ENV: &str = "PONTOFACE_MATCHER_KEY";

/// Liveness checks and audited face recognition for attendance terminals.
#[derive(Parser)]
#[command(name = "pontoface")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory for profiles, evidence images and the audit log.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Remote matching endpoint (local matching when unset).
    #[arg(long, global = true)]
    matcher_url: Option<String>,

    /// Minimum similarity for a match (0.0-1.0).
    #[arg(long, global = true)]
    threshold: Option<f64>,

    /// Directory searched for bundled ONNX models.
    #[arg(long, global = true)]
    models_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Score motion across frames of a video file or image directory.
    Liveness {
        /// Video file, or a directory of still frames.
        video: PathBuf,
    },
    /// Attach a face descriptor to a profile.
    Register {
        image: PathBuf,

        #[arg(long)]
        user_id: String,

        /// Create or rename the profile before registering.
        #[arg(long)]
        name: Option<String>,
    },
    /// Recognize the face in an image and write an audit record.
    Recognize {
        image: PathBuf,

        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,
    },
    /// Liveness check followed by recognition of one more frame.
    CheckIn {
        /// Video file, or a directory of still frames.
        video: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    env_logger::init();

    match run().await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

/// Returns whether the requested operation succeeded.
async fn run() -> Result<bool, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = apply_overrides(Settings::load(), &cli);
    settings.validate()?;

    let observer = Arc::new(LoggingAttemptObserver::new());
    let succeeded = match cli.command {
        Command::Liveness { ref video } => {
            let mut source = open_source(video)?;
            let use_case = EvaluateLivenessUseCase::new(settings.liveness.clone(), observer.clone());
            let result = use_case.execute(source.as_mut()).await;
            println!(
                "liveness: {} (score {:.2})",
                if result.passed { "passed" } else { "failed" },
                result.score
            );
            result.passed
        }
        Command::Register {
            ref image,
            ref user_id,
            ref name,
        } => {
            let frame = load_frame(image, 0)?;
            let store = Arc::new(JsonProfileStore::new(profiles_path(&settings)));
            if let Some(name) = name {
                store.upsert_profile(user_id, name).await?;
            }
            let extractor = load_models(&settings).await?;
            let use_case = RegisterFaceUseCase::new(extractor, store, observer.clone());
            let outcome = use_case.execute(&frame, user_id).await;
            match &outcome.error {
                None => println!("registered: {user_id}"),
                Some(error) => println!("registration failed: {error}"),
            }
            outcome.success
        }
        Command::Recognize {
            ref image,
            lat,
            lon,
        } => {
            let frame = load_frame(image, 0)?;
            let location = match (lat, lon) {
                (Some(latitude), Some(longitude)) => Some(Location {
                    latitude,
                    longitude,
                    accuracy: None,
                }),
                _ => None,
            };
            let use_case = RecognizeFaceUseCase::new(
                build_services(&settings).await?,
                settings.recognition.clone(),
                observer.clone(),
            );
            let outcome = use_case.execute(&frame, location).await;
            print_outcome(&outcome);
            outcome.success
        }
        Command::CheckIn { ref video } => {
            let mut source = open_source(video)?;
            let services = build_services(&settings).await?;
            let use_case = CheckInUseCase::new(
                EvaluateLivenessUseCase::new(settings.liveness.clone(), observer.clone()),
                RecognizeFaceUseCase::new(services, settings.recognition.clone(), observer.clone()),
                observer.clone(),
            );
            let outcome = use_case.execute(source.as_mut(), None).await;
            print_outcome(&outcome);
            outcome.success
        }
    };

    observer.summary();
    Ok(succeeded)
}

fn apply_overrides(mut settings: Settings, cli: &Cli) -> Settings {
    if let Some(dir) = &cli.data_dir {
        settings.data_dir = Some(dir.clone());
    }
    if let Some(url) = &cli.matcher_url {
        settings.matcher_url = Some(url.clone());
    }
    if let Some(threshold) = cli.threshold {
        settings.recognition.similarity_threshold = threshold;
    }
    if let Some(dir) = &cli.models_dir {
        settings.models_dir = Some(dir.clone());
    }
    settings
}

fn profiles_path(settings: &Settings) -> PathBuf {
    settings.resolved_data_dir().join("profiles.json")
}

async fn load_models(settings: &Settings) -> Result<Arc<ModelSlot>, Box<dyn std::error::Error>> {
    log::info!("Loading face models");
    let slot = ModelSlot::new();
    slot.spawn_load(onnx_loader(settings.models_dir.clone())).await?;
    if let Some(failure) = slot.load_failure() {
        return Err(format!("Face models unavailable: {failure}").into());
    }
    Ok(slot)
}

async fn build_services(
    settings: &Settings,
) -> Result<RecognitionServices, Box<dyn std::error::Error>> {
    let data_dir = settings.resolved_data_dir();
    let matcher: Arc<dyn FaceMatcher> = match &settings.matcher_url {
        Some(url) => {
            log::info!("Matching against {url}");
            let matcher = HttpFaceMatcher::new(url.clone());
            match std::env::var(MATCHER_KEY_ENV) {
                Ok(key) => Arc::new(matcher.with_api_key(key)),
                Err(_) => Arc::new(matcher),
            }
        }
        None => {
            let store = Arc::new(JsonProfileStore::new(profiles_path(settings)));
            Arc::new(LocalFaceMatcher::new(store))
        }
    };

    Ok(RecognitionServices {
        extractor: load_models(settings).await?,
        matcher,
        audit: Arc::new(FileAuditSink::new(data_dir)),
        encoder: Arc::new(JpegEvidenceEncoder::new(
            settings.recognition.evidence_quality,
        )),
    })
}

fn open_source(path: &Path) -> Result<Box<dyn VideoSource>, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("Input not found: {}", path.display()).into());
    }
    if path.is_dir() {
        let source = ImageSequenceSource::from_dir(path)?;
        log::info!("Reading {} frames from {}", source.remaining(), path.display());
        Ok(Box::new(source))
    } else {
        Ok(Box::new(FfmpegVideoSource::open(path)?))
    }
}

fn print_outcome(outcome: &RecognitionOutcome) {
    match (&outcome.user_id, &outcome.error) {
        (Some(user_id), _) => println!(
            "recognized: {} ({user_id}), confidence {:.1}%",
            outcome.user_name.as_deref().unwrap_or("?"),
            outcome.confidence.unwrap_or_default()
        ),
        (None, error) => println!(
            "not recognized: {}",
            error.as_deref().unwrap_or("unknown error")
        ),
    }
    if let Some(audit_id) = &outcome.audit_id {
        println!("audit record: {audit_id}");
    }
}

