//! CLI entrypoint: export a dataset's reconstruction to a dense
//! reconstruction scene.
//!
//! Usage:
//!   export_mvs <dataset> [--image-list shots.txt] [--corrections-file corrections.json]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use sfm2mvs::export::export_dataset;
use sfm2mvs::io::DatasetPaths;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "export_mvs",
    version,
    about = "Export a reconstruction to an MVS scene"
)]
struct CliArgs {
    /// Dataset root directory.
    dataset: PathBuf,

    /// Export only the shots listed in this file (one id per line).
    #[arg(long, value_name = "FILE")]
    image_list: Option<PathBuf>,

    /// JSON file with corrections to apply to the exported scene.
    #[arg(long, value_name = "FILE")]
    corrections_file: Option<PathBuf>,
}

fn init_logging() {
    let mut builder = env_logger::Builder::new();
    builder.target(env_logger::Target::Stderr);
    builder.filter_level(log::LevelFilter::Info);
    builder.parse_default_env();
    builder.init();
}

fn main() -> ExitCode {
    init_logging();
    let args = CliArgs::parse();

    let paths = DatasetPaths::new(&args.dataset);
    match export_dataset(
        &paths,
        args.image_list.as_deref(),
        args.corrections_file.as_deref(),
    ) {
        Ok(Some(stats)) => {
            info!(
                "exported {} cameras, {} shots, {} points to {}",
                stats.cameras,
                stats.shots,
                stats.points,
                paths.scene_file().display()
            );
            ExitCode::SUCCESS
        }
        Ok(None) => {
            info!("no reconstruction to export");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("export failed: {err}");
            ExitCode::FAILURE
        }
    }
}
