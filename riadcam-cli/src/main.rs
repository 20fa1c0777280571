// RiadCam command line interface
// Live preview, scene descriptions and snapshots from a local camera

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use riadcam_eye::{CameraConfig, CameraController, Frame, DEFAULT_DESCRIBE_PROMPT};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "riadcam")]
#[command(about = "Camera preview and scene description through a local vision model", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (JSON, TOML or YAML)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Camera device index
    #[arg(long, global = true)]
    device: Option<u32>,

    /// Requested capture width
    #[arg(long, global = true)]
    width: Option<u32>,

    /// Requested capture height
    #[arg(long, global = true)]
    height: Option<u32>,

    /// Preview window title
    #[arg(long, global = true)]
    window_name: Option<String>,

    /// Vision generate endpoint URL
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Vision model name
    #[arg(long, global = true)]
    model: Option<String>,

    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the live camera preview until ESC or Ctrl-C
    Preview,

    /// Describe what the camera sees
    Describe {
        /// Question or instruction for the model
        #[arg(long, short)]
        prompt: Option<String>,

        /// Seconds to wait for the first frame
        #[arg(long, default_value = "10")]
        wait_secs: u64,

        /// Keep the preview window open while waiting for the answer
        #[arg(long)]
        preview: bool,
    },

    /// Save the current frame as a JPEG file
    Snapshot {
        /// Output file
        #[arg(long, short)]
        output: PathBuf,

        /// Seconds to wait for the first frame
        #[arg(long, default_value = "10")]
        wait_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let mut config = load_config(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli);
    config.validate().context("Invalid configuration")?;

    match cli.command {
        Commands::Preview => run_preview(config).await,
        Commands::Describe { prompt, wait_secs, preview } => {
            config.preview = preview;
            let prompt = prompt.unwrap_or_else(|| DEFAULT_DESCRIBE_PROMPT.to_string());
            run_describe(config, &prompt, Duration::from_secs(wait_secs)).await
        }
        Commands::Snapshot { output, wait_secs } => {
            config.preview = false;
            run_snapshot(config, &output, Duration::from_secs(wait_secs)).await
        }
    }
}

/// Explicit file, else `<config dir>/riadcam/config.toml` when present, else
/// defaults; `RIADCAM_*` variables are applied on top.
fn load_config(path: Option<&Path>) -> Result<CameraConfig> {
    let mut config = match path {
        Some(path) => CameraConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => match default_config_path().filter(|p| p.is_file()) {
            Some(path) => {
                info!("Using config {}", path.display());
                CameraConfig::from_file(&path)
                    .with_context(|| format!("Failed to load config from {}", path.display()))?
            }
            None => CameraConfig::default(),
        },
    };
    config.apply_env();
    Ok(config)
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut p| {
        p.push("riadcam");
        p.push("config.toml");
        p
    })
}

fn apply_overrides(config: &mut CameraConfig, cli: &Cli) {
    if let Some(device) = cli.device {
        config.device_index = device;
    }
    if let Some(width) = cli.width {
        config.width = width;
    }
    if let Some(height) = cli.height {
        config.height = height;
    }
    if let Some(name) = &cli.window_name {
        config.window_name = name.clone();
    }
    if let Some(endpoint) = &cli.endpoint {
        config.vision.endpoint = endpoint.clone();
    }
    if let Some(model) = &cli.model {
        config.vision.model = model.clone();
    }
}

fn open_camera(config: CameraConfig) -> Result<CameraController> {
    let index = config.device_index;
    let camera = CameraController::new(config);
    camera
        .try_open()
        .with_context(|| format!("Could not open camera {}", index))?;
    Ok(camera)
}

async fn wait_for_frame(camera: &CameraController, wait: Duration) -> Result<Frame> {
    let deadline = Instant::now() + wait;
    loop {
        if let Some(frame) = camera.get_frame() {
            return Ok(frame);
        }
        if Instant::now() >= deadline {
            bail!("No frame from camera within {}s", wait.as_secs());
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

async fn run_preview(mut config: CameraConfig) -> Result<()> {
    config.preview = true;
    let camera = open_camera(config)?;
    info!("Preview running, press ESC in the window or Ctrl-C to quit");

    let mut tick = tokio::time::interval(Duration::from_millis(100));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            _ = tick.tick() => {
                if !camera.is_preview_running() {
                    break;
                }
            }
        }
    }

    camera.close();
    let stats = camera.stats();
    info!("Captured {} frames ({} failed reads)", stats.frames, stats.read_failures);
    Ok(())
}

async fn run_describe(config: CameraConfig, prompt: &str, wait: Duration) -> Result<()> {
    let camera = open_camera(config)?;
    let result = async {
        wait_for_frame(&camera, wait).await?;
        Ok::<_, anyhow::Error>(camera.describe_current_view(prompt).await)
    }
    .await;
    camera.close();

    println!("{}", result?);
    Ok(())
}

async fn run_snapshot(config: CameraConfig, output: &Path, wait: Duration) -> Result<()> {
    let camera = open_camera(config)?;
    let frame = wait_for_frame(&camera, wait).await;
    camera.close();
    let frame = frame?;

    let jpeg = frame.encode_jpeg().context("Failed to encode frame")?;
    if output.extension().map_or(true, |ext| ext != "jpg" && ext != "jpeg") {
        warn!("Writing JPEG data to {}", output.display());
    }
    std::fs::write(output, &jpeg)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!(
        "Saved {}x{} frame to {} ({} bytes)",
        frame.width,
        frame.height,
        output.display(),
        jpeg.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_cli_parses_describe() {
        let cli = Cli::parse_from(["riadcam", "describe", "--prompt", "what?", "--wait-secs", "3"]);
        match cli.command {
            Commands::Describe { prompt, wait_secs, preview } => {
                assert_eq!(prompt.as_deref(), Some("what?"));
                assert_eq!(wait_secs, 3);
                assert!(!preview);
            }
            _ => panic!("Expected describe"),
        }
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "riadcam",
            "snapshot",
            "-o",
            "out.jpg",
            "--device",
            "2",
            "--width",
            "640",
            "--height",
            "480",
            "--model",
            "llava:13b",
        ]);
        let mut config = CameraConfig::default();
        apply_overrides(&mut config, &cli);
        assert_eq!(config.device_index, 2);
        assert_eq!((config.width, config.height), (640, 480));
        assert_eq!(config.vision.model, "llava:13b");
        assert_eq!(config.window_name, "RiadCam");
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "device_index = 3\nwindow_name = \"Bench\"").unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.device_index, 3);
        assert_eq!(config.window_name, "Bench");
    }

    #[test]
    fn test_load_config_missing_file_fails() {
        assert!(load_config(Some(Path::new("/nonexistent/riadcam.toml"))).is_err());
    }
}
