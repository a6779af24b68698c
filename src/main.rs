use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use clinic_record_pdf::{
    AssetSource, DirAssets, Error, ExportRequest, InMemoryStore, NoAssets, RenderConfig, export_to_file,
};

/// Export a patient record as a paginated PDF.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON file with `patients`, `complaints` and `archives` arrays
    #[arg(long)]
    records: PathBuf,

    /// Directory holding logo.png / logo.jpg and patient photos
    /// [default: $CLINIC_PDF_ASSETS]
    #[arg(long)]
    assets: Option<PathBuf>,

    /// JSON render configuration (clinic name, colours, margins)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output file or directory [default: the record's attachment filename]
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    record: Record,
}

#[derive(Subcommand, Debug)]
enum Record {
    /// Live complaint with its patient's current details
    Complaint { id: u64 },
    /// Archived complaint snapshot
    Archive { id: u64 },
}

fn run(args: Args) -> Result<PathBuf, Error> {
    let config = match &args.config {
        Some(path) => RenderConfig::load(path)?,
        None => RenderConfig::default(),
    };
    let store = InMemoryStore::from_json_file(&args.records)?;
    let assets: Box<dyn AssetSource> = match args.assets.map(DirAssets::new).or_else(DirAssets::from_env) {
        Some(dir) => {
            log::debug!("assets from {}", dir.root().display());
            Box::new(dir)
        }
        None => Box::new(NoAssets),
    };
    let request = match args.record {
        Record::Complaint { id } => ExportRequest::Complaint(id),
        Record::Archive { id } => ExportRequest::Archive(id),
    };
    export_to_file(&store, assets.as_ref(), &config, request, args.output.as_deref())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(args) {
        Ok(path) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            if e.is_not_found() { ExitCode::from(2) } else { ExitCode::FAILURE }
        }
    }
}
