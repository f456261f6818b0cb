use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use rx_reader::config::{
    self, DEFAULT_OLLAMA_URL, DEFAULT_RECOGNITION_TIMEOUT_SECS, DEFAULT_VISION_MODEL,
};
use rx_reader::pipeline::recognition::{
    content_type_for_path, lines_from_scored_text, lines_from_tesseract_tsv, lines_from_text,
    OllamaVisionRecognizer, RecognizedLine,
};
use rx_reader::pipeline::structuring::RuleVocabulary;
use rx_reader::report::{export_text, render_report};
use rx_reader::{
    PrescriptionImage, PrescriptionReader, PrescriptionRecord, PrescriptionStructurer,
    RawRecognitionResult,
};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "rx-reader", version)]
#[command(about = "Structure the text of a photographed prescription")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print the structured record as JSON instead of a report
    #[arg(long, global = true)]
    json: bool,

    /// Also write the extracted text to DIR/prescription.txt (default: Documents)
    #[arg(long, global = true, value_name = "DIR", num_args = 0..=1)]
    export: Option<Option<PathBuf>>,

    /// JSON file extending the built-in rule vocabulary
    #[arg(long, global = true, value_name = "FILE")]
    vocabulary: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Structure plain recognized text, one line per row
    Text {
        file: PathBuf,
        /// Confidence assigned to every line
        #[arg(long, default_value_t = 1.0)]
        confidence: f32,
    },
    /// Structure `confidence<TAB>text` rows
    Lines { file: PathBuf },
    /// Structure Tesseract TSV output
    Tsv { file: PathBuf },
    /// Recognize an image with an Ollama vision model, then structure it
    Image {
        file: PathBuf,
        #[arg(long, default_value = DEFAULT_OLLAMA_URL)]
        ollama_url: String,
        #[arg(long, default_value = DEFAULT_VISION_MODEL)]
        model: String,
        #[arg(long, default_value_t = DEFAULT_RECOGNITION_TIMEOUT_SECS)]
        timeout_secs: u64,
    },
}

fn main() -> ExitCode {
    rx_reader::init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    tracing::debug!("{} v{}", config::APP_NAME, config::APP_VERSION);

    let vocabulary = match &cli.vocabulary {
        Some(path) => config::load_vocabulary(path)?,
        None => RuleVocabulary::default(),
    };
    let structurer = PrescriptionStructurer::new(vocabulary)?;

    let record = match cli.command {
        Commands::Text { file, confidence } => {
            structure_lines(&structurer, lines_from_text(&read_text(&file)?, confidence))
        }
        Commands::Lines { file } => {
            structure_lines(&structurer, lines_from_scored_text(&read_text(&file)?)?)
        }
        Commands::Tsv { file } => {
            structure_lines(&structurer, lines_from_tesseract_tsv(&read_text(&file)?))
        }
        Commands::Image {
            file,
            ollama_url,
            model,
            timeout_secs,
        } => read_image(structurer, &file, &ollama_url, &model, timeout_secs)?,
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print!("{}", render_report(&record));
    }

    if let Some(dir) = cli.export {
        let dir = dir.unwrap_or_else(config::default_export_dir);
        let path = export_text(&record, &dir)?;
        eprintln!("Extracted text saved to {}", path.display());
    }

    Ok(())
}

fn read_text(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    std::fs::read_to_string(path).map_err(|e| format!("Cannot read {}: {e}", path.display()).into())
}

fn structure_lines(structurer: &PrescriptionStructurer, lines: Vec<RecognizedLine>) -> PrescriptionRecord {
    structurer.structure(&RawRecognitionResult::new(Uuid::new_v4(), lines))
}

fn read_image(
    structurer: PrescriptionStructurer,
    path: &Path,
    ollama_url: &str,
    model: &str,
    timeout_secs: u64,
) -> Result<PrescriptionRecord, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path).map_err(|e| format!("Cannot read {}: {e}", path.display()))?;
    let image = PrescriptionImage::new(&content_type_for_path(path), bytes);

    // Built outside the runtime: the blocking HTTP client must not be created in async context
    let recognizer = OllamaVisionRecognizer::new(ollama_url, model, timeout_secs)?;
    let reader = PrescriptionReader::new(Arc::new(recognizer), Arc::new(structurer))
        .with_timeout(Duration::from_secs(timeout_secs));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let record = runtime.block_on(reader.read_async(image))?;
    Ok(record)
}
