use clap::Parser;

use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;

use gt2dataset::io::load_particles;
use gt2dataset::{export_particles_csv, load_recording, Args, DirectoryWriter, Session};

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let input = PathBuf::from(&args.input);
    if !input.exists() {
        error!("The specified input does not exist: {}", args.input);
        return ExitCode::FAILURE;
    }

    let mut recording = match load_recording(&input) {
        Ok(recording) => recording,
        Err(e) => {
            error!("Failed to load recording: {}", e);
            return ExitCode::FAILURE;
        }
    };
    args.apply_metadata_overrides(&mut recording.metadata);

    let mut session = Session::new(recording.metadata, args.to_export_config());
    session.start_recording();
    for frame in recording.frames {
        session.append(frame);
    }
    session.stop_recording();

    let validation = session.validate_current_buffer();
    for line in validation.to_string().lines() {
        info!("{}", line);
    }
    if args.validate_only {
        return if validation.is_valid() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    let mut writer = match DirectoryWriter::recreate(&args.output_dir) {
        Ok(writer) => writer.with_progress(true),
        Err(e) => {
            error!("Failed to set up output directory: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut failed = false;

    // Each format is exported independently of the other's outcome
    if args.format.includes_coco() {
        match session.export_coco() {
            Ok(summary) => {
                if let Err(e) = writer.write_all(&summary.artifacts, "COCO") {
                    error!("Failed to write COCO dataset: {}", e);
                    failed = true;
                }
            }
            Err(e) => {
                error!("{}", e);
                failed = true;
            }
        }
    }

    if args.format.includes_yolo() {
        match session.export_yolo() {
            Ok(summary) => {
                if let Err(e) = writer.write_all(&summary.artifacts, "YOLO") {
                    error!("Failed to write YOLO dataset: {}", e);
                    failed = true;
                }
            }
            Err(e) => {
                error!("{}", e);
                failed = true;
            }
        }
    }

    if let Some(particles_path) = &args.particles {
        match load_particles(&PathBuf::from(particles_path)) {
            Ok(particles) => {
                if let Err(e) = writer.write_all(&[export_particles_csv(&particles)], "CSV") {
                    error!("Failed to write particle CSV: {}", e);
                    failed = true;
                }
            }
            Err(e) => {
                error!("Failed to load particles: {}", e);
                failed = true;
            }
        }
    }

    if failed {
        error!("Export finished with errors.");
        ExitCode::FAILURE
    } else {
        info!(
            "Export completed successfully into {}",
            writer.root().display()
        );
        ExitCode::SUCCESS
    }
}
