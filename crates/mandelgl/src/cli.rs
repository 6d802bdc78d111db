use std::path::PathBuf;

use clap::{Parser, Subcommand};
use viewstate::{clamp_super_sampling, Hue, MAX_ITERATIONS};

#[derive(Parser, Debug)]
#[command(
    name = "mandelgl",
    author,
    version,
    about = "Interactive Mandelbrot viewer rendered on the GPU",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Configuration file; defaults to `mandelgl.toml` in the config directory.
    #[arg(long, value_name = "PATH", env = "MANDELGL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the shaders and palette ramps.
    #[arg(long, value_name = "DIR", env = "MANDELGL_ASSETS")]
    pub assets: Option<PathBuf>,

    /// Start with this palette: `fire`, `ice`, `ash`, or `psychedelic`.
    #[arg(long, value_name = "HUE", value_parser = parse_hue)]
    pub hue: Option<Hue>,

    /// Escape-time iteration count (0-200).
    #[arg(long, value_name = "COUNT", value_parser = parse_iterations)]
    pub iterations: Option<u32>,

    /// Render-buffer resolution relative to the window (0.5-3.0).
    #[arg(long, value_name = "FACTOR", value_parser = parse_super_sampling)]
    pub supersample: Option<f64>,

    /// Override the pixel density reported by the window system.
    #[arg(long, value_name = "SCALE", value_parser = parse_density)]
    pub density: Option<f64>,

    /// Initial window size (e.g. `1280x800`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_surface_size)]
    pub size: Option<SurfaceSize>,

    /// Render one frame, write it to PATH as PNG, then exit.
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,

    /// Keep the window hidden; mostly useful with `--export`.
    #[arg(long)]
    pub hidden: bool,

    /// Read commands such as `hue ice` or `goto -0.75 0.1 4000` from stdin.
    #[arg(long)]
    pub console: bool,

    /// Prefer an integrated or software adapter.
    #[arg(long)]
    pub low_power: bool,

    /// Ignore the saved session and start from the configured defaults.
    #[arg(long)]
    pub fresh: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect or discard the session saved on exit.
    State(StateCommand),
    /// Print resolved directories for config, data, captures and assets.
    Where,
}

#[derive(Parser, Debug)]
pub struct StateCommand {
    #[command(subcommand)]
    pub action: StateAction,
}

#[derive(Subcommand, Debug)]
pub enum StateAction {
    /// Print the saved view as TOML.
    Show,
    /// Delete the saved view so the next launch starts fresh.
    Reset,
}

/// Window size in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_hue(value: &str) -> Result<Hue, String> {
    value.parse::<Hue>().map_err(|err| err.to_string())
}

pub fn parse_iterations(value: &str) -> Result<u32, String> {
    let trimmed = value.trim();
    let count: u32 = trimmed
        .parse()
        .map_err(|_| format!("invalid iteration count '{trimmed}'"))?;
    if count > MAX_ITERATIONS {
        return Err(format!(
            "iteration count {count} exceeds the maximum of {MAX_ITERATIONS}"
        ));
    }
    Ok(count)
}

pub fn parse_super_sampling(value: &str) -> Result<f64, String> {
    let trimmed = value.trim();
    let factor: f64 = trimmed
        .parse()
        .map_err(|_| format!("invalid super-sampling factor '{trimmed}'"))?;
    clamp_super_sampling(factor)
        .ok_or_else(|| format!("super-sampling factor {factor} must not exceed 3.0"))
}

pub fn parse_density(value: &str) -> Result<f64, String> {
    let trimmed = value.trim();
    let density: f64 = trimmed
        .parse()
        .map_err(|_| format!("invalid density '{trimmed}'"))?;
    if !density.is_finite() || density <= 0.0 {
        return Err(format!("density {density} must be a positive number"));
    }
    Ok(density)
}

pub fn parse_surface_size(value: &str) -> Result<SurfaceSize, String> {
    let trimmed = value.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| "expected WxH format, e.g. 1280x800".to_string())?;

    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| "invalid width in size specification".to_string())?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| "invalid height in size specification".to_string())?;

    if width == 0 || height == 0 {
        return Err("window dimensions must be greater than zero".to_string());
    }

    Ok(SurfaceSize { width, height })
}
