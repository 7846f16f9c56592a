//! Command-line surface and dispatch
//!
//! clap parses the raw arguments into [`Cli`]; each subcommand is then turned
//! into a [`Command`] variant carrying its own parameter record, and
//! [`Command::run`] hands that record to the matching PDF operation.

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;

use crate::config::{ImageFormat, RasterConfig, TimestampStyle, WatermarkStyle};
use crate::error::{Error, Result};
use crate::pdf::{
    annotate_pdf, merge_pdfs, rasterize_pdf, AnnotateOptions, MergeOptions, PdfiumRasterizer,
    Rasterizer, RasterizeOptions,
};

/// PDF Tools - merge, watermark and rasterize PDF documents
#[derive(Parser, Debug)]
#[command(name = "pdf-tools")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Merge two PDFs
    pdf-tools merge a.pdf b.pdf out.pdf

    # Stamp a half-transparent DRAFT watermark and the current time
    pdf-tools edit in.pdf out.pdf --watermark DRAFT --opacity 50 --timestamp

    # Render every page to PNG at 150 DPI
    pdf-tools split in.pdf pages --format png --resolution 150")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Merge two PDF files into one
    Merge {
        /// First input PDF file
        input1: PathBuf,

        /// Second input PDF file
        input2: PathBuf,

        /// Output PDF file
        output: PathBuf,
    },

    /// Add a watermark and optional timestamp to every page
    Edit {
        /// Input PDF file
        input: PathBuf,

        /// Output PDF file
        output: PathBuf,

        /// Watermark text
        #[arg(long, default_value = "Watermark")]
        watermark: String,

        /// Watermark opacity in percent (0 = invisible, 100 = opaque)
        #[arg(long, default_value_t = 20, allow_negative_numbers = true)]
        opacity: i32,

        /// Watermark font size in points
        #[arg(long = "font_size", visible_alias = "font-size", default_value_t = 12,
              value_parser = clap::value_parser!(u32).range(1..))]
        font_size: u32,

        /// Stamp the current date and time in the top-left corner
        #[arg(long)]
        timestamp: bool,
    },

    /// Render every page to an image file
    Split {
        /// Input PDF file
        input: PathBuf,

        /// Directory for page images (created if missing)
        output_dir: PathBuf,

        /// Image format: jpg, jpeg, gif or png
        #[arg(long, default_value = "jpg")]
        format: String,

        /// Resolution in DPI
        #[arg(long, default_value_t = 300)]
        resolution: u32,
    },
}

impl Cli {
    /// Parse arguments (including the program name) without exiting the process
    pub fn try_parse_args<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args).map_err(usage_error)
    }

    /// The selected command, or `None` when no subcommand was given
    pub fn into_command(self) -> Option<Command> {
        self.command.map(Command::from)
    }
}

/// Parse arguments straight into a [`Command`]
pub fn parse_command<I, T>(args: I) -> Result<Option<Command>>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Ok(Cli::try_parse_args(args)?.into_command())
}

/// Missing required arguments get their own error kind; everything else
/// (help, version, bad values) stays a clap error
fn usage_error(err: clap::Error) -> Error {
    if err.kind() != ErrorKind::MissingRequiredArgument {
        return Error::Usage(err);
    }

    let names = match err.get(ContextKind::InvalidArg) {
        Some(ContextValue::Strings(names)) => names.join(", "),
        Some(ContextValue::String(name)) => name.clone(),
        _ => "unknown".to_string(),
    };
    Error::MissingArgument(names)
}

/// Parameters of the `edit` command
#[derive(Debug, Clone)]
pub struct EditArgs {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub options: AnnotateOptions,
}

/// Parameters of the `split` command, before the format is checked
#[derive(Debug, Clone)]
pub struct SplitArgs {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    pub format: String,
    pub resolution: u32,
}

impl SplitArgs {
    /// Check the format against the allow-list
    pub fn into_options(self) -> Result<RasterizeOptions> {
        let format: ImageFormat = self.format.parse()?;
        Ok(RasterizeOptions {
            input_path: self.input_path,
            output_dir: self.output_dir,
            config: RasterConfig {
                resolution: self.resolution,
                format,
                ..Default::default()
            },
        })
    }
}

/// One fully parsed invocation
#[derive(Debug, Clone)]
pub enum Command {
    Merge(MergeOptions),
    Edit(EditArgs),
    Split(SplitArgs),
}

impl From<Commands> for Command {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Merge { input1, input2, output } => Command::Merge(MergeOptions {
                input_paths: vec![input1, input2],
                output_path: output,
            }),
            Commands::Edit { input, output, watermark, opacity, font_size, timestamp } => Command::Edit(EditArgs {
                input_path: input,
                output_path: output,
                options: AnnotateOptions {
                    watermark: WatermarkStyle {
                        text: watermark,
                        opacity,
                        font_size: font_size as f32,
                        ..Default::default()
                    },
                    timestamp: timestamp.then(TimestampStyle::default),
                },
            }),
            Commands::Split { input, output_dir, format, resolution } => Command::Split(SplitArgs {
                input_path: input,
                output_dir,
                format,
                resolution,
            }),
        }
    }
}

/// What a completed command did
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    Merged { output: PathBuf, pages: usize },
    Edited { output: PathBuf, pages: usize },
    Split { output_dir: PathBuf, pages: usize },
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Merged { output, .. } => write!(f, "Merged PDF saved as: {}", output.display()),
            Report::Edited { output, pages } => {
                write!(f, "Edited PDF saved as: {} ({} pages)", output.display(), pages)
            }
            Report::Split { output_dir, pages } => {
                write!(f, "Saved {} page images to: {}", pages, output_dir.display())
            }
        }
    }
}

impl Command {
    /// Run the command, rasterizing with PDFium
    pub fn run(self) -> Result<Report> {
        self.run_with(PdfiumRasterizer::bind)
    }

    /// Run the command; `rasterizer` is only called for `split`, after its
    /// arguments have been validated
    pub fn run_with<R, F>(self, rasterizer: F) -> Result<Report>
    where
        R: Rasterizer,
        F: FnOnce() -> Result<R>,
    {
        match self {
            Command::Merge(options) => {
                debug!(?options, "dispatching merge");
                let pages = merge_pdfs(&options)?;
                Ok(Report::Merged { output: options.output_path, pages })
            }
            Command::Edit(args) => {
                debug!(?args, "dispatching edit");
                let pages = annotate_pdf(&args.input_path, &args.output_path, &args.options)?;
                Ok(Report::Edited { output: args.output_path, pages })
            }
            Command::Split(args) => {
                debug!(?args, "dispatching split");
                let options = args.into_options()?;
                // Report bad input before PDFium is even looked for
                options.validate()?;
                let pages = rasterize_pdf(&rasterizer()?, &options)?;
                Ok(Report::Split { output_dir: options.output_dir, pages })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Result<Option<Command>> {
        parse_command(std::iter::once("pdf-tools").chain(args.iter().copied()))
    }

    /// Stand-in that must never be reached
    struct Unreachable;

    impl Rasterizer for Unreachable {
        fn rasterize(&self, _: &Path, _: f32, _: &mut crate::pdf::raster::PageSink<'_>) -> Result<usize> {
            panic!("rasterizer should not run")
        }
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_command() {
        assert!(parse(&[]).unwrap().is_none());
    }

    #[test]
    fn test_parse_merge() {
        match parse(&["merge", "a.pdf", "b.pdf", "out.pdf"]).unwrap() {
            Some(Command::Merge(options)) => {
                assert_eq!(options.input_paths, vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")]);
                assert_eq!(options.output_path, PathBuf::from("out.pdf"));
            }
            other => panic!("expected merge, got {other:?}"),
        }
    }

    #[test]
    fn test_merge_missing_output() {
        let result = parse(&["merge", "a.pdf", "b.pdf"]);
        match result {
            Err(Error::MissingArgument(names)) => assert!(names.contains("OUTPUT"), "{names}"),
            other => panic!("expected missing argument, got {other:?}"),
        }
    }

    #[test]
    fn test_edit_defaults() {
        match parse(&["edit", "in.pdf", "out.pdf"]).unwrap() {
            Some(Command::Edit(args)) => {
                assert_eq!(args.options.watermark.text, "Watermark");
                assert_eq!(args.options.watermark.opacity, 20);
                assert_eq!(args.options.watermark.font_size, 12.0);
                assert!(args.options.timestamp.is_none());
            }
            other => panic!("expected edit, got {other:?}"),
        }
    }

    #[test]
    fn test_edit_all_flags() {
        let command = parse(&[
            "edit", "in.pdf", "out.pdf", "--watermark", "DRAFT", "--opacity", "50", "--font_size", "30", "--timestamp",
        ])
        .unwrap();
        match command {
            Some(Command::Edit(args)) => {
                assert_eq!(args.options.watermark.text, "DRAFT");
                assert_eq!(args.options.watermark.opacity, 50);
                assert_eq!(args.options.watermark.font_size, 30.0);
                assert_eq!(args.options.timestamp, Some(TimestampStyle::default()));
            }
            other => panic!("expected edit, got {other:?}"),
        }
    }

    #[test]
    fn test_edit_opacity_passes_through() {
        match parse(&["edit", "in.pdf", "out.pdf", "--opacity", "-10"]).unwrap() {
            Some(Command::Edit(args)) => assert_eq!(args.options.watermark.opacity, -10),
            other => panic!("expected edit, got {other:?}"),
        }
        match parse(&["edit", "in.pdf", "out.pdf", "--opacity", "250"]).unwrap() {
            Some(Command::Edit(args)) => assert_eq!(args.options.watermark.opacity, 250),
            other => panic!("expected edit, got {other:?}"),
        }
    }

    #[test]
    fn test_edit_rejects_bad_font_size() {
        assert!(matches!(parse(&["edit", "in.pdf", "out.pdf", "--font_size", "0"]), Err(Error::Usage(_))));
        assert!(matches!(parse(&["edit", "in.pdf", "out.pdf", "--font_size", "big"]), Err(Error::Usage(_))));
    }

    #[test]
    fn test_split_defaults() {
        match parse(&["split", "in.pdf", "pages"]).unwrap() {
            Some(Command::Split(args)) => {
                assert_eq!(args.format, "jpg");
                assert_eq!(args.resolution, 300);
                let options = args.into_options().unwrap();
                assert_eq!(options.config.format, ImageFormat::Jpg);
                assert_eq!(options.output_dir, PathBuf::from("pages"));
            }
            other => panic!("expected split, got {other:?}"),
        }
    }

    #[test]
    fn test_split_unsupported_format_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let output_dir = temp_dir.path().join("pages");
        let command = Command::Split(SplitArgs {
            input_path: temp_dir.path().join("in.pdf"),
            output_dir: output_dir.clone(),
            format: "bmp".to_string(),
            resolution: 300,
        });

        let result = command.run_with(|| Ok(Unreachable));
        assert!(matches!(result, Err(Error::UnsupportedFormat(ref f)) if f == "bmp"));
        assert!(!output_dir.exists());
    }

    #[test]
    fn test_split_missing_input_checked_before_engine() {
        let temp_dir = TempDir::new().unwrap();
        let output_dir = temp_dir.path().join("pages");
        let command = Command::Split(SplitArgs {
            input_path: temp_dir.path().join("missing.pdf"),
            output_dir: output_dir.clone(),
            format: "png".to_string(),
            resolution: 300,
        });

        let result = command.run_with(|| -> Result<Unreachable> { Err(Error::Engine("no PDFium".to_string())) });
        assert!(matches!(result, Err(Error::DocumentOpen { .. })), "{result:?}");
        assert!(!output_dir.exists());
    }

    #[test]
    fn test_split_zero_resolution_checked_before_engine() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("in.pdf");
        std::fs::write(&input, b"%PDF-1.5").unwrap();
        let command = Command::Split(SplitArgs {
            input_path: input,
            output_dir: temp_dir.path().join("pages"),
            format: "png".to_string(),
            resolution: 0,
        });

        let result = command.run_with(|| -> Result<Unreachable> { Err(Error::Engine("no PDFium".to_string())) });
        assert!(matches!(result, Err(Error::InvalidResolution(0))), "{result:?}");
    }

    #[test]
    fn test_split_format_is_case_insensitive() {
        let args = SplitArgs {
            input_path: PathBuf::from("in.pdf"),
            output_dir: PathBuf::from("pages"),
            format: "PNG".to_string(),
            resolution: 150,
        };
        let options = args.into_options().unwrap();
        assert_eq!(options.config.format, ImageFormat::Png);
        assert_eq!(options.config.resolution, 150);
    }

    #[test]
    fn test_verbose_is_global() {
        let cli = Cli::try_parse_args(["pdf-tools", "split", "in.pdf", "out", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_report_messages() {
        let report = Report::Merged { output: PathBuf::from("out.pdf"), pages: 5 };
        assert_eq!(report.to_string(), "Merged PDF saved as: out.pdf");
        let report = Report::Split { output_dir: PathBuf::from("pages"), pages: 2 };
        assert_eq!(report.to_string(), "Saved 2 page images to: pages");
    }
}
