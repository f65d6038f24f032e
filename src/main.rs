//! pagedeck - reorder, rotate and export pages from PDF and image files.
//!
//! A thin presentation layer over the pagedeck library: arguments resolve
//! to core operations, progress renders to the terminal, artifacts land
//! in the output directory.

mod cli;

use clap::Parser;
use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use std::process;

use crate::cli::Cli;
use pagedeck::cancel::CancellationToken;
use pagedeck::collection::PageCollection;
use pagedeck::config::ExportFormat;
use pagedeck::error::PagedeckError;
use pagedeck::export::{ExportArtifact, Exporter};
use pagedeck::io::{DirectorySaveSink, SaveSink, SourceReader};
use pagedeck::progress::ConsoleProgress;
use pagedeck::store::FileStore;
use pagedeck::validation::Validator;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    init_logging(&cli);

    // Run the application and handle errors
    if let Err(err) = run(cli).await {
        eprintln!("Error: {err}");
        process::exit(err.exit_code());
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        LevelFilter::Error
    } else if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let _ = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}

/// Main application logic.
async fn run(cli: Cli) -> Result<(), PagedeckError> {
    cli.validate()?;

    let inputs = cli.expanded_inputs()?;
    let options = cli.to_options()?;

    // Fail the whole batch up front if any input is unusable.
    let validator = Validator::new();
    let summary = validator.validate_all(&inputs).await?;
    if cli.verbose {
        for result in &summary.results {
            eprintln!(
                "  {} - {} page(s), {} bytes",
                result.path.display(),
                result.page_count,
                result.file_size
            );
        }
    }
    if !cli.quiet {
        println!(
            "Importing {} file(s), {} page(s)",
            summary.results.len(),
            summary.total_pages
        );
    }

    let sink = DirectorySaveSink::new(&cli.output_dir);
    sink.check_writable()?;

    // Import everything into the working document.
    let progress = ConsoleProgress::with_enabled(!cli.quiet);
    let mut store = FileStore::new();
    let mut collection = PageCollection::new();
    let reader = SourceReader::new();
    reader
        .import_files(&inputs, &mut store, &mut collection, &progress)
        .await?;
    progress.finish();

    // Apply selection and rotation.
    match cli.selection()? {
        Some(set) => {
            for index in set.to_indices(collection.len()) {
                collection.select_page(index);
            }
        }
        None => collection.select_all(),
    }
    if let Some(rotation) = cli.rotation()? {
        let selected = collection.selected_indices();
        for index in selected {
            if let Some(page) = collection.page_mut(index) {
                page.set_rotation(rotation);
            }
        }
    }

    // Export.
    let exporter = Exporter::new(options);
    let cancel = CancellationToken::new();
    let progress = ConsoleProgress::with_enabled(!cli.quiet);

    let artifact: ExportArtifact = if let Some(range) = cli.split_range()? {
        exporter
            .split_range(&collection, &store, range, &progress, &cancel)
            .await?
    } else if cli.full {
        exporter
            .export_full_document(&collection, &store, &progress, &cancel)
            .await?
    } else {
        match options.format {
            ExportFormat::SingleDocument => {
                exporter
                    .export_document(&collection, &store, &progress, &cancel)
                    .await?
            }
            ExportFormat::PdfArchive => {
                exporter
                    .export_pdf_archive(&collection, &store, &progress, &cancel)
                    .await?
            }
            ExportFormat::ImageArchive => {
                exporter
                    .export_image_archive(&collection, &store, &progress, &cancel)
                    .await?
            }
        }
    };
    progress.finish();

    let saved = sink.persist(&artifact.bytes, &artifact.suggested_name, artifact.mime)?;
    if !cli.quiet {
        println!("Saved {}", saved.display());
    }

    Ok(())
}
