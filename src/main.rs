use clap::{Parser, Subcommand};
use pixellate::imaging::TransformSettings;
use pixellate::{config, logging, output, pipeline};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info, warn};

/// Per-request overrides. Anything left unset comes from `[defaults]`.
#[derive(clap::Args, Clone, Debug)]
struct ProcessArgs {
    /// Source photo (JPEG, PNG, TIFF or WebP; detected from content)
    input: PathBuf,

    /// Output file [default: <input-stem>-processed.<ext> next to the input]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Side of the square crop, in inches
    #[arg(long, allow_negative_numbers = true)]
    crop_inches: Option<f64>,

    /// Dots per inch used to convert the crop size to pixels
    #[arg(long, allow_negative_numbers = true)]
    dpi: Option<i64>,

    /// Final width in pixels
    #[arg(long, allow_negative_numbers = true)]
    width: Option<i64>,

    /// Final height in pixels
    #[arg(long, allow_negative_numbers = true)]
    height: Option<i64>,

    /// Maximum output size in MB (1 MB = 1,048,576 bytes)
    #[arg(long, allow_negative_numbers = true)]
    max_size_mb: Option<f64>,

    /// Output format: jpg or png
    #[arg(long)]
    format: Option<String>,

    /// Print a JSON report instead of the text summary
    #[arg(long)]
    json: bool,
}

impl ProcessArgs {
    fn apply(&self, defaults: &TransformSettings) -> TransformSettings {
        TransformSettings {
            crop_size_inches: self.crop_inches.unwrap_or(defaults.crop_size_inches),
            dpi: self.dpi.unwrap_or(defaults.dpi),
            target_width_px: self.width.unwrap_or(defaults.target_width_px),
            target_height_px: self.height.unwrap_or(defaults.target_height_px),
            max_file_size_mb: self.max_size_mb.unwrap_or(defaults.max_file_size_mb),
            output_format: self
                .format
                .clone()
                .unwrap_or_else(|| defaults.output_format.clone()),
        }
    }
}

#[derive(Parser)]
#[command(name = "pixellate")]
#[command(about = "Crop, resize and compress a photo to a fixed size and file-size budget")]
#[command(long_about = "\
Crop, resize and compress a photo to a fixed size and file-size budget

The photo goes through four steps:

  1. A centered square of round(crop-inches × dpi) pixels is cut out,
     clamped to the photo's short edge.
  2. The square is resized to exactly width × height (Lanczos3).
  3. JPEG: qualities 95, 90, ... 10 are tried until the file fits.
     PNG: one best-compression pass.
  4. The result is written even if it is over budget, with a warning.

Defaults and allowed ranges come from config.toml in the --config directory.
Run 'pixellate gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Directory containing config.toml
    #[arg(long, default_value = ".", global = true)]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Crop, resize and compress one photo
    Process(ProcessArgs),
    /// Validate config.toml and print the resolved settings
    CheckConfig,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::print_error(err.as_ref());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Process(args) => {
            logging::init(cli.verbose, cli.json_logs);
            let config = config::load_config(&cli.config)?;
            process(&config, &args)?;
        }
        Command::CheckConfig => {
            logging::init(cli.verbose, cli.json_logs);
            println!("==> Checking {}", cli.config.join("config.toml").display());
            let config = config::load_config(&cli.config)?;
            output::print_config_summary(&config);
            println!("==> Config is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Resolve the request, run the pipeline, write the file, report.
fn process(
    config: &config::PixellateConfig,
    args: &ProcessArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let settings = args.apply(&config.defaults);
    config.limits.check(&settings)?;
    let transform = settings
        .resolve()?
        .with_quality_search(config.compression.quality_search());
    debug!(?transform, "resolved request");

    let source = std::fs::read(&args.input)?;
    info!(
        input = %args.input.display(),
        bytes = source.len(),
        "processing"
    );
    let result = pipeline::process(&source, &transform)?;

    for attempt in &result.attempts {
        debug!(quality = ?attempt.quality.map(|q| q.value()), size = attempt.size, "encode attempt");
    }
    if result.size_exceeded {
        warn!(
            size = result.len(),
            max_bytes = transform.max_bytes(),
            "could not meet the size budget; writing the smallest encoding"
        );
    }

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| output::default_output_path(&args.input, result.format));
    std::fs::write(&output_path, &result.bytes)?;
    info!(output = %output_path.display(), bytes = result.len(), "written");

    if args.json {
        let report = output::Report::new(&args.input, &output_path, result, transform.max_bytes());
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::print_process_output(&args.input, &output_path, &result, transform.max_bytes());
    }
    Ok(())
}
