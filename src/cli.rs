//! CLI argument parsing for pagedeck.
//!
//! This module defines the command-line interface structure using `clap`.
//! The CLI is a thin presentation layer: it resolves arguments into core
//! types and calls the library's public operations, nothing more.

use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

use pagedeck::config::{ExportFormat, ExportOptions, ExportQuality, PageSet, SplitRange};
use pagedeck::error::{PagedeckError, Result};
use pagedeck::utils::collect_paths_for_patterns;

/// Reorder, rotate, delete, split and export pages from PDF and image files.
///
/// pagedeck imports the given files as one working document (one entry per
/// PDF page or image), applies the requested selection and rotation, and
/// exports the result as a combined PDF or a per-page archive.
#[derive(Parser, Debug)]
#[command(name = "pagedeck")]
#[command(version)]
#[command(about = "Reorder, rotate and export pages from PDF and image files", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Input files (PDF, PNG, JPEG, GIF, WebP), in order
    ///
    /// Glob patterns are expanded; files are imported in the order given
    /// and their pages numbered accordingly.
    ///
    /// Examples:
    ///   pagedeck scan.pdf photo.png -o out/
    ///   pagedeck 'chapters/*.pdf' -o out/ --format pdf-archive
    #[arg(required = true, value_name = "FILE")]
    pub inputs: Vec<String>,

    /// Output directory for the exported artifact
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// What to export
    ///
    /// - single-pdf: one combined PDF of the selected pages
    /// - pdf-archive: a ZIP with one single-page PDF per selected page
    /// - image-archive: a ZIP with one PNG per selected page
    #[arg(short, long, value_name = "FORMAT", default_value = "single-pdf")]
    #[arg(value_parser = ["single-pdf", "pdf-archive", "image-archive"])]
    pub format: String,

    /// Raster quality for pages that must be rasterized
    ///
    /// - standard: 3x native size
    /// - high: 4x native size
    /// - maximum: 5x native size
    #[arg(short, long, value_name = "TIER", default_value = "high")]
    #[arg(value_parser = ["standard", "high", "maximum"])]
    pub quality: String,

    /// Pages to select, 1-based over the working document (e.g. "1-3,7")
    ///
    /// Without this option every imported page is selected.
    #[arg(short, long, value_name = "PAGES")]
    pub select: Option<String>,

    /// Rotate the selected pages clockwise by 90, 180 or 270 degrees
    #[arg(long, value_name = "DEGREES")]
    #[arg(value_parser = ["90", "180", "270"])]
    pub rotate: Option<String>,

    /// Export a 1-based page range of the working document as one PDF
    ///
    /// Overrides --format and --select; the range covers the working
    /// document order after import.
    #[arg(long, value_name = "RANGE", conflicts_with_all = ["select", "full"])]
    pub split: Option<String>,

    /// Export every page regardless of selection, with a timestamped name
    #[arg(long, conflicts_with = "select")]
    pub full: bool,

    /// Suppress all non-error output
    #[arg(long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbose output, including per-file validation details
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Convert CLI arguments into validated export options.
    ///
    /// # Errors
    ///
    /// Returns an error if the format or quality strings are invalid.
    pub fn to_options(&self) -> Result<ExportOptions> {
        Ok(ExportOptions {
            format: ExportFormat::from_str(&self.format)?,
            quality: ExportQuality::from_str(&self.quality)?,
        })
    }

    /// The parsed selection, if one was given.
    ///
    /// # Errors
    ///
    /// Returns an error when the selection string does not parse.
    pub fn selection(&self) -> Result<Option<PageSet>> {
        self.select
            .as_deref()
            .map(|s| PageSet::parse(s).map_err(|e| PagedeckError::invalid_config(e.to_string())))
            .transpose()
    }

    /// The parsed split range, if one was given.
    ///
    /// # Errors
    ///
    /// Returns an error when the range string does not parse.
    pub fn split_range(&self) -> Result<Option<SplitRange>> {
        self.split
            .as_deref()
            .map(|s| SplitRange::parse(s).map_err(|e| PagedeckError::invalid_config(e.to_string())))
            .transpose()
    }

    /// The rotation to apply to selected pages, if any.
    ///
    /// # Errors
    ///
    /// Returns an error for degrees that are not a quarter turn.
    pub fn rotation(&self) -> Result<Option<pagedeck::Rotation>> {
        match self.rotate.as_deref() {
            None => Ok(None),
            Some(text) => {
                let degrees: i64 = text
                    .parse()
                    .map_err(|_| PagedeckError::invalid_config("Invalid rotation degrees"))?;
                pagedeck::Rotation::from_degrees(degrees)
                    .map(Some)
                    .ok_or_else(|| {
                        PagedeckError::invalid_config(format!(
                            "Invalid rotation: {degrees}. Must be 90, 180 or 270"
                        ))
                    })
            }
        }
    }

    /// Expand glob patterns and literal paths into the input file list.
    ///
    /// Literal paths pass through untouched (so a missing file surfaces a
    /// clear not-found error later); patterns expand to their matches.
    ///
    /// # Errors
    ///
    /// Returns an error for unparsable glob patterns or when nothing is
    /// left after expansion.
    pub fn expanded_inputs(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();

        for input in &self.inputs {
            if input.contains(['*', '?', '[']) {
                paths.extend(collect_paths_for_patterns([input.as_str()])?);
            } else {
                paths.push(PathBuf::from(input));
            }
        }

        if paths.is_empty() {
            return Err(PagedeckError::invalid_config(
                "No input files after pattern expansion",
            ));
        }
        Ok(paths)
    }

    /// Validate argument combinations that clap cannot express.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation check fails.
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            return Err(PagedeckError::invalid_config("No input files specified"));
        }

        // Parse-once checks so bad values fail before any I/O.
        self.to_options()?;
        self.selection()?;
        self.split_range()?;
        self.rotation()?;
        Ok(())
    }
}
