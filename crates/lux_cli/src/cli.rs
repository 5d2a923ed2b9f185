use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use log::LevelFilter;
use lux_renderer::{RenderConfig, DEFAULT_TILE_SIZE};

/// Log levels selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "lux")]
#[command(about = "Monte-Carlo path tracer for triangle scenes")]
pub struct Args {
    /// Model file (#MiniLight text format, or .json). Renders the built-in
    /// example scene when omitted.
    pub model: Option<PathBuf>,

    /// Output image; .ppm is written directly, other extensions by encoder
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of passes, overriding the model's iteration count
    #[arg(short, long)]
    pub passes: Option<u32>,

    /// Seed for the random source
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Trace image tiles in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Tile size in pixels for --parallel
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE)]
    pub tile_size: u32,

    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}

impl Args {
    /// Output path: `--output`, else the model name with a `.ppm`
    /// extension, else `example.ppm`.
    pub fn output_path(&self) -> PathBuf {
        if let Some(output) = &self.output {
            return output.clone();
        }
        match &self.model {
            Some(model) => model.with_extension("ppm"),
            None => Path::new("example.ppm").to_path_buf(),
        }
    }

    /// Run parameters, with `default_passes` used unless `--passes` is given.
    pub fn render_config(&self, default_passes: u32) -> RenderConfig {
        RenderConfig {
            passes: self.passes.unwrap_or(default_passes),
            seed: self.seed,
            parallel: self.parallel,
            tile_size: self.tile_size,
        }
    }
}

/// Whether the image is written out after `completed` of `total` passes.
pub fn should_save(completed: u32, total: u32) -> bool {
    completed.is_power_of_two() || completed == total
}
