use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_FPS: u32 = 60;
const MIN_FPS: u32 = 10;
const MAX_FPS: u32 = 240;
const APP_DIR: &str = "mind-chill";
pub const DATA_DIR_ENV: &str = "MIND_CHILL_DATA_DIR";
pub const LOG_ENV: &str = "MIND_CHILL_LOG";
pub const LOG_FILE: &str = "mind-chill.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig
{
    pub fps: u32,
    pub data_dir: PathBuf,
}

impl HubConfig
{
    pub fn from_args(args: &[String]) -> Result<Self, String>
    {
        Self::from_args_with_env(args, |key| std::env::var_os(key))
    }

    /// Same as [`HubConfig::from_args`] with the environment supplied by
    /// `env`.
    pub fn from_args_with_env(
        args: &[String],
        env: impl Fn(&str) -> Option<OsString>,
    ) -> Result<Self, String>
    {
        let mut fps: Option<u32> = None;
        let mut data_dir: Option<PathBuf> = None;
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            if arg == "--fps" {
                let value = iter
                    .next()
                    .ok_or_else(|| "Expected value after --fps".to_string())?;
                fps = Some(parse_fps(value)?);
            } else if let Some(rest) = arg.strip_prefix("--fps=") {
                fps = Some(parse_fps(rest)?);
            } else if arg == "--data-dir" {
                let value = iter
                    .next()
                    .ok_or_else(|| "Expected value after --data-dir".to_string())?;
                data_dir = Some(PathBuf::from(value));
            } else if let Some(rest) = arg.strip_prefix("--data-dir=") {
                data_dir = Some(PathBuf::from(rest));
            } else {
                return Err(format!("Unknown option '{arg}'"));
            }
        }

        Ok(Self {
            fps: fps.unwrap_or(DEFAULT_FPS).clamp(MIN_FPS, MAX_FPS),
            data_dir: data_dir.unwrap_or_else(|| default_data_dir(&env)),
        })
    }

    pub fn frame_interval(&self) -> Duration
    {
        Duration::from_secs_f64(1.0 / self.fps.max(1) as f64)
    }

    pub fn log_path(&self) -> PathBuf
    {
        self.data_dir.join(LOG_FILE)
    }
}

impl Default for HubConfig
{
    fn default() -> Self
    {
        Self {
            fps: DEFAULT_FPS,
            data_dir: PathBuf::from("."),
        }
    }
}

fn parse_fps(value: &str) -> Result<u32, String>
{
    let parsed = value
        .parse::<u32>()
        .map_err(|_| "FPS must be a whole number".to_string())?;
    if parsed == 0 {
        return Err("FPS must be positive".to_string());
    }
    Ok(parsed)
}

fn default_data_dir(env: &impl Fn(&str) -> Option<OsString>) -> PathBuf
{
    if let Some(explicit) = env(DATA_DIR_ENV) {
        return PathBuf::from(explicit);
    }
    env("XDG_DATA_HOME")
        .map(PathBuf::from)
        .or_else(|| {
            env("HOME").map(|home| {
                let mut path = PathBuf::from(home);
                path.push(".local");
                path.push("share");
                path
            })
        })
        .map(|base| base.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
}
