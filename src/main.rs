use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use waveform_render::decode::decode;
use waveform_render::upload::{ConfigFile, Upload};
use waveform_render::waveform::{HexColor, LoudnessMetric};
use waveform_render::{render, RenderOptions, UploadConfig, UploadPipeline};

/// File extensions picked up when walking an ingest directory
const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "flac", "ogg", "m4a", "aac"];

#[derive(Parser, Debug)]
#[command(name = "waveform-render")]
#[command(about = "Render waveform images and store audio uploads", long_about = None)]
struct Args {
    /// Verbose logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// TOML config file (storage_dir and [render] options)
    #[arg(short = 'c', long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the waveform of one audio file to a PNG
    Render {
        /// Input audio file
        input: PathBuf,

        /// Output PNG path
        #[arg(short = 'o', long)]
        output: PathBuf,

        #[command(flatten)]
        overrides: RenderOverrides,
    },

    /// Store audio files and their waveforms in the storage directory
    Ingest {
        /// Audio files or directories (searched recursively)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Storage root (holds audio/ and waveform/)
        #[arg(short = 's', long, env = "STORAGE_DIR")]
        storage_dir: Option<String>,

        /// Worker threads (default: one per CPU)
        #[arg(short = 'j', long)]
        jobs: Option<usize>,

        #[command(flatten)]
        overrides: RenderOverrides,
    },
}

/// Per-field render option overrides
#[derive(ClapArgs, Debug, Default)]
struct RenderOverrides {
    /// Image width in pixels (also the number of loudness buckets)
    #[arg(long)]
    width: Option<u32>,

    /// Image height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Number of buckets drawn (defaults to the width)
    #[arg(long)]
    frames: Option<u32>,

    /// Stroke width used for the quietest buckets
    #[arg(long)]
    max_line_width: Option<f32>,

    /// Background color (#RGB, #RGBA, #RRGGBB or #RRGGBBAA)
    #[arg(long)]
    background: Option<HexColor>,

    /// Line color (#RGB, #RGBA, #RRGGBB or #RRGGBBAA)
    #[arg(long)]
    line: Option<HexColor>,

    /// Bucket loudness metric
    #[arg(long, value_enum)]
    metric: Option<LoudnessMetric>,
}

impl RenderOverrides {
    fn apply(&self, mut options: RenderOptions) -> RenderOptions {
        if let Some(width) = self.width {
            options.width = width;
            if self.frames.is_none() {
                options.frames = width;
            }
        }
        if let Some(height) = self.height {
            options.height = height;
        }
        if let Some(frames) = self.frames {
            options.frames = frames;
        }
        if let Some(max_line_width) = self.max_line_width {
            options.max_line_width = max_line_width;
        }
        if let Some(background) = self.background {
            options.background_color = background;
        }
        if let Some(line) = self.line {
            options.line_color = line;
        }
        if let Some(metric) = self.metric {
            options.metric = metric;
        }
        options
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config_file = match &args.config {
        Some(path) => {
            let path = expand_path(path);
            log::info!("Loading config from {:?}", path);
            ConfigFile::load(&path)?
        }
        None => ConfigFile::default(),
    };

    match args.command {
        Command::Render {
            input,
            output,
            overrides,
        } => {
            let options = overrides.apply(config_file.render);
            render_file(&input, &output, &options)
        }
        Command::Ingest {
            inputs,
            storage_dir,
            jobs,
            overrides,
        } => {
            let storage_dir = match storage_dir {
                Some(dir) => expand_path(&dir),
                None => match config_file.storage_dir {
                    Some(dir) => expand_path(&dir.to_string_lossy()),
                    None => bail!("No storage directory: pass --storage-dir or set STORAGE_DIR"),
                },
            };
            let config = UploadConfig::new(storage_dir)
                .with_render_options(overrides.apply(config_file.render));
            ingest(&inputs, config, jobs)
        }
    }
}

fn render_file(input: &Path, output: &Path, options: &RenderOptions) -> Result<()> {
    log::info!("Rendering waveform for {:?}", input);

    let bytes =
        std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let extension = input.extension().and_then(|e| e.to_str());
    let decoded = decode(&bytes, extension)
        .with_context(|| format!("Failed to decode {}", input.display()))?;

    let samples = decoded.first_channel();
    log::info!(
        "Decoded {} samples ({:.1}s) at {}Hz",
        samples.len(),
        samples.duration_ms() / 1e3,
        samples.sample_rate()
    );

    let image = render(samples.samples(), options)
        .with_context(|| format!("Failed to render waveform for {}", input.display()))?;

    std::fs::write(output, image.as_bytes())
        .with_context(|| format!("Failed to write {}", output.display()))?;

    log::info!(
        "Wrote {}x{} waveform ({} bytes) to {:?}",
        image.width(),
        image.height(),
        image.as_bytes().len(),
        output
    );
    Ok(())
}

fn ingest(inputs: &[PathBuf], config: UploadConfig, jobs: Option<usize>) -> Result<()> {
    let files = collect_audio_files(inputs);
    if files.is_empty() {
        bail!("No audio files found in {:?}", inputs);
    }

    log::info!("Storage directory: {:?}", config.storage_dir);
    let pipeline = UploadPipeline::new(config)?;

    let mut failed = 0usize;
    let mut uploads = Vec::with_capacity(files.len());
    let mut upload_paths = Vec::with_capacity(files.len());
    for path in &files {
        match Upload::from_path(path) {
            Ok(upload) => {
                uploads.push(upload);
                upload_paths.push(path);
            }
            Err(e) => {
                log::warn!("Skipping {:?}: {:#}", path, e);
                failed += 1;
            }
        }
    }

    let mut pool = rayon::ThreadPoolBuilder::new();
    if let Some(jobs) = jobs {
        pool = pool.num_threads(jobs);
    }
    let pool = pool.build().context("Failed to create worker pool")?;

    let results = pool.install(|| pipeline.store_batch(&uploads));

    let mut added = 0usize;
    for (path, result) in upload_paths.iter().zip(results) {
        match result {
            Ok(stored) => {
                if stored.added_wave_audio || stored.added_waveform {
                    added += 1;
                }
                println!("{}\t{}", stored.wave_id, path.display());
            }
            Err(e) => {
                log::error!("Upload rejected for {:?}: {:#}", path, e);
                failed += 1;
            }
        }
    }

    log::info!(
        "Ingest complete: {} file(s), {} new, {} failed",
        files.len(),
        added,
        failed
    );

    if failed > 0 {
        bail!("{} of {} file(s) failed", failed, files.len());
    }
    Ok(())
}

/// Expand directories into the audio files they contain
fn collect_audio_files(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }

        for entry in WalkDir::new(input).sort_by_file_name() {
            match entry {
                Ok(entry) if entry.file_type().is_file() && is_audio_file(entry.path()) => {
                    files.push(entry.into_path());
                }
                Ok(_) => {}
                Err(e) => log::warn!("Error walking {:?}: {}", input, e),
            }
        }
    }
    files
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| AUDIO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}
