use crate::config::GizmoConfigOverrides;
use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "config/gizmo.json";

/// Arguments of `gizmo_replay <script.json> [--config <path>] [--snap <size|off>] [--capacity <n>]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayArgs {
    pub script: PathBuf,
    pub config: Option<PathBuf>,
    snap: Option<SnapFlag>,
    capacity: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SnapFlag {
    Off,
    Size(f32),
}

impl ReplayArgs {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut script = None;
        let mut config = None;
        let mut snap = None;
        let mut capacity = None;
        let mut iter = args.into_iter();
        let _ = iter.next(); // skip program name if present
        while let Some(raw) = iter.next() {
            let arg = raw.as_ref();
            let Some(key) = arg.strip_prefix("--") else {
                if script.replace(PathBuf::from(arg)).is_some() {
                    bail!("Unexpected argument '{arg}'. Only one script path is accepted.");
                }
                continue;
            };
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{arg}'"))?.as_ref().to_string();
            match key {
                "config" => config = Some(PathBuf::from(value)),
                "snap" => snap = Some(parse_snap_flag(&value)?),
                "capacity" => {
                    let parsed =
                        value.parse::<usize>().with_context(|| format!("Invalid capacity '{value}'"))?;
                    if parsed == 0 {
                        bail!("Invalid capacity '0'. History needs room for at least one record.");
                    }
                    capacity = Some(parsed);
                }
                _ => bail!("Unknown flag '{arg}'. Supported flags: --config, --snap, --capacity."),
            }
        }
        let script = script.ok_or_else(|| anyhow!("Missing script path. Usage: gizmo_replay <script.json>"))?;
        Ok(Self { script, config, snap, capacity })
    }

    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    pub fn config_overrides(&self) -> GizmoConfigOverrides {
        let (snap_enabled, snap_size) = match self.snap {
            Some(SnapFlag::Off) => (Some(false), None),
            Some(SnapFlag::Size(size)) => (Some(true), Some(size)),
            None => (None, None),
        };
        GizmoConfigOverrides { snap_enabled, snap_size, history_capacity: self.capacity }
    }
}

fn parse_snap_flag(value: &str) -> Result<SnapFlag> {
    match value.to_ascii_lowercase().as_str() {
        "off" | "false" | "0" => Ok(SnapFlag::Off),
        other => {
            let size = other.parse::<f32>().with_context(|| format!("Invalid snap size '{value}'"))?;
            if !(size > 0.0) || !size.is_finite() {
                bail!("Invalid snap size '{value}'. Use a positive number or 'off'.");
            }
            Ok(SnapFlag::Size(size))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_script_and_flags() {
        let args = ["gizmo_replay", "drag.json", "--snap", "0.25", "--capacity", "8"];
        let parsed = ReplayArgs::parse(args).expect("parse replay args");
        assert_eq!(parsed.script, PathBuf::from("drag.json"));
        let overrides = parsed.config_overrides();
        assert_eq!(overrides.snap_enabled, Some(true));
        assert_eq!(overrides.snap_size, Some(0.25));
        assert_eq!(overrides.history_capacity, Some(8));
        assert_eq!(parsed.config_path(), PathBuf::from(DEFAULT_CONFIG_PATH));
    }

    #[test]
    fn snap_off_disables_without_touching_size() {
        let parsed = ReplayArgs::parse(["gizmo_replay", "--snap", "off", "s.json"]).expect("parse");
        let overrides = parsed.config_overrides();
        assert_eq!(overrides.snap_enabled, Some(false));
        assert_eq!(overrides.snap_size, None);
    }

    #[test]
    fn latest_flag_wins() {
        let args = ["gizmo_replay", "s.json", "--capacity", "4", "--capacity", "16", "--config", "a.json"];
        let parsed = ReplayArgs::parse(args).expect("parse");
        assert_eq!(parsed.config_overrides().history_capacity, Some(16));
        assert_eq!(parsed.config_path(), PathBuf::from("a.json"));
    }

    #[test]
    fn missing_script_errors() {
        let err = ReplayArgs::parse(["gizmo_replay", "--snap", "1"]).unwrap_err();
        assert!(err.to_string().contains("Missing script"), "missing script should error");
    }

    #[test]
    fn rejects_zero_capacity_and_bad_snap() {
        assert!(ReplayArgs::parse(["gizmo_replay", "s.json", "--capacity", "0"]).is_err());
        assert!(ReplayArgs::parse(["gizmo_replay", "s.json", "--snap", "-1"]).is_err());
        assert!(ReplayArgs::parse(["gizmo_replay", "s.json", "--capacity"]).is_err());
    }

    #[test]
    fn rejects_unknown_flags() {
        let err = ReplayArgs::parse(["gizmo_replay", "s.json", "--foo", "bar"]).unwrap_err();
        assert!(err.to_string().contains("Unknown flag"), "unknown flags should error");
    }
}
