use crate::config::AppConfigOverrides;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "part_sandbox", version, about = "Headless driver for the 2D part sandbox")]
pub struct Cli {
    /// Config file (JSON). Missing or invalid files fall back to defaults.
    #[arg(long, value_name = "PATH", default_value = "config/app.json")]
    pub config: PathBuf,

    /// Viewport width in pixels.
    #[arg(long)]
    pub width: Option<u32>,

    /// Viewport height in pixels.
    #[arg(long)]
    pub height: Option<u32>,

    /// Directory holding importable part modules.
    #[arg(long, value_name = "PATH")]
    pub parts_dir: Option<PathBuf>,

    /// Directory the scene blob is written to.
    #[arg(long, value_name = "PATH")]
    pub scene_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List registered and importable parts.
    Parts,
    /// Print the records of the saved scene.
    Show,
    /// Build a small demo scene and save it.
    Demo,
    /// Load the saved scene, run it headless and report where parts ended up.
    Simulate {
        #[arg(long, default_value_t = 120)]
        steps: u32,
        #[arg(long, default_value_t = 1.0 / 60.0)]
        dt: f32,
        /// Save the scene again after stepping.
        #[arg(long)]
        save: bool,
    },
}

impl Cli {
    pub fn config_overrides(&self) -> AppConfigOverrides {
        AppConfigOverrides {
            width: self.width,
            height: self.height,
            parts_dir: self.parts_dir.clone(),
            scene_dir: self.scene_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_overrides_and_subcommand() {
        let cli = Cli::try_parse_from(["part_sandbox", "--width", "1600", "--parts-dir", "mods", "demo"])
            .expect("parse cli");
        assert_eq!(cli.command, Command::Demo);
        let overrides = cli.config_overrides();
        assert_eq!(overrides.width, Some(1600));
        assert_eq!(overrides.parts_dir, Some(PathBuf::from("mods")));
        assert_eq!(overrides.applied_fields(), vec!["width", "parts_dir"]);
    }

    #[test]
    fn simulate_has_defaults() {
        let cli = Cli::try_parse_from(["part_sandbox", "simulate", "--steps", "10"]).expect("parse cli");
        match cli.command {
            Command::Simulate { steps, dt, save } => {
                assert_eq!(steps, 10);
                assert!((dt - 1.0 / 60.0).abs() < 1e-6);
                assert!(!save);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_flags() {
        assert!(Cli::try_parse_from(["part_sandbox", "--foo", "bar", "parts"]).is_err());
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["part_sandbox"]).is_err());
    }
}
