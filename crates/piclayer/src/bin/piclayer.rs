//! `piclayer` CLI: convert between calibration files and world files.

use clap::{Args, Parser, Subcommand, ValueEnum};
use piclayer::calibration::{CalibrationIoError, CalibrationReport, PicLayer};
use piclayer::core::{EastNorth, ImageSize, ProjectionKind};
use std::error::Error;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "piclayer")]
#[command(about = "Convert picture calibrations between .cal property files and GIS world files")]
#[command(version)]
struct Cli {
    /// Raise the log level (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit tracing output as JSON lines.
    #[cfg(feature = "tracing")]
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a world file and write the equivalent calibration file.
    WorldToCal {
        /// World file (.wld, .jgw, .tfw, ...).
        world: PathBuf,
        #[command(flatten)]
        picture: PictureArgs,
        /// Output path; stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Read a calibration file and write the equivalent world file.
    CalToWorld {
        /// Calibration file (.cal).
        cal: PathBuf,
        #[command(flatten)]
        picture: PictureArgs,
        /// Output path; stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the calibration, its world file and its footprint.
    Inspect {
        /// Calibration file (.cal).
        cal: PathBuf,
        #[command(flatten)]
        picture: PictureArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Args)]
struct PictureArgs {
    /// Picture width in pixels.
    #[arg(long)]
    width: u32,

    /// Picture height in pixels.
    #[arg(long)]
    height: u32,

    /// EPSG code of the map projection.
    #[arg(long, default_value = "EPSG:3857")]
    projection: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Human,
    Json,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error("unknown projection code {0:?} (supported: EPSG:3857, EPSG:4326)")]
    UnknownProjection(String),
    #[error("cannot open {}", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("cannot load {}", path.display())]
    Load {
        path: PathBuf,
        source: CalibrationIoError,
    },
    #[error(transparent)]
    Write(#[from] CalibrationIoError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

type CliResult<T> = Result<T, CliError>;

impl PictureArgs {
    fn layer(&self) -> CliResult<PicLayer<ProjectionKind>> {
        let projection = ProjectionKind::from_code(&self.projection)
            .ok_or_else(|| CliError::UnknownProjection(self.projection.clone()))?;
        Ok(PicLayer::with_anchor(
            projection,
            ImageSize::new(self.width, self.height),
            EastNorth::default(),
            1.0,
        ))
    }
}

fn open(path: &Path) -> CliResult<File> {
    File::open(path).map_err(|source| CliError::Open {
        path: path.to_owned(),
        source,
    })
}

fn output(path: Option<&Path>) -> CliResult<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout().lock()),
    })
}

fn load_calibration(path: &Path, picture: &PictureArgs) -> CliResult<PicLayer<ProjectionKind>> {
    let mut layer = picture.layer()?;
    layer
        .read_calibration(open(path)?)
        .map_err(|source| CliError::Load {
            path: path.to_owned(),
            source,
        })?;
    Ok(layer)
}

fn print_human(report: &CalibrationReport, out: &mut dyn Write) -> io::Result<()> {
    let cal = &report.calibration;
    let t = &cal.transform;
    let wf = &report.world_file;
    writeln!(out, "projection     {}", report.projection)?;
    writeln!(
        out,
        "image size     {} x {} px",
        report.image_size.width, report.image_size.height
    )?;
    writeln!(
        out,
        "anchor         {:.3}, {:.3}",
        cal.position.east, cal.position.north
    )?;
    writeln!(out, "initial scale  {} m / 100 px", cal.initial_scale)?;
    writeln!(
        out,
        "transform      [{} {} {}; {} {} {}]",
        t.m00, t.m01, t.m02, t.m10, t.m11, t.m12
    )?;
    writeln!(
        out,
        "world file     sx={} ry={} rx={} sy={} dx={} dy={}",
        wf.sx, wf.ry, wf.rx, wf.sy, wf.dx, wf.dy
    )?;
    for (name, c) in ["upper left", "upper right", "lower right", "lower left"]
        .iter()
        .zip(&report.corners)
    {
        writeln!(out, "{name:<15}{:.3}, {:.3}", c.east, c.north)?;
    }
    match &report.bounding_box {
        Some(b) => writeln!(
            out,
            "bounding box   {:.3}, {:.3} .. {:.3}, {:.3}",
            b.min.east, b.min.north, b.max.east, b.max.north
        ),
        None => writeln!(out, "bounding box   not supported for {}", report.projection),
    }
}

fn run(command: Commands) -> CliResult<()> {
    match command {
        Commands::WorldToCal {
            world,
            picture,
            output: out,
        } => {
            let mut layer = picture.layer()?;
            layer
                .read_world_file(open(&world)?)
                .map_err(|source| CliError::Load {
                    path: world.clone(),
                    source,
                })?;
            log::info!("loaded world file {}", world.display());
            layer.write_calibration(output(out.as_deref())?)?;
        }
        Commands::CalToWorld {
            cal,
            picture,
            output: out,
        } => {
            let layer = load_calibration(&cal, &picture)?;
            log::info!("loaded calibration {}", cal.display());
            layer.write_world_file(output(out.as_deref())?)?;
        }
        Commands::Inspect {
            cal,
            picture,
            format,
        } => {
            let layer = load_calibration(&cal, &picture)?;
            let report = CalibrationReport::from_layer(&layer);
            let mut out = io::stdout().lock();
            match format {
                OutputFormat::Human => print_human(&report, &mut out)?,
                OutputFormat::Json => {
                    serde_json::to_writer_pretty(&mut out, &report)?;
                    writeln!(out)?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(not(feature = "tracing"))]
fn init_logging(cli: &Cli) {
    use piclayer::core::{init_with_level, level_from_verbosity};
    if let Err(err) = init_with_level(level_from_verbosity(cli.verbose)) {
        eprintln!("warning: logger already set: {err}");
    }
}

// RUST_LOG drives the filter; -v is accepted for a uniform command line.
#[cfg(feature = "tracing")]
fn init_logging(cli: &Cli) {
    piclayer::core::init_tracing(cli.log_json);
    log::debug!("verbosity {} ignored under tracing", cli.verbose);
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(err) = run(cli.command) {
        eprintln!("error: {err}");
        let mut source = err.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
