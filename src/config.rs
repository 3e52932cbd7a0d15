use crate::waveform::{Rgb, WaveStyle};
use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Runtime configuration. Everything is optional on disk; a missing file or
/// missing key falls back to the defaults below.
#[derive(Debug, Clone)]
pub struct Config {
    pub wave_style: WaveStyle,
    pub default_rate: f64,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigImport {
    waveform: Option<WaveformImport>,
    playback: Option<PlaybackImport>,
}

#[derive(Debug, Deserialize)]
struct WaveformImport {
    envelope_fill: Option<String>,
    progress_fill: Option<String>,
    flatten: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PlaybackImport {
    rate: Option<f64>,
}

impl Config {
    /// Reads `<config dir>/lyricus/config.toml` when present.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        match path {
            Some(p) if p.exists() => Self::load_from_file(p),
            _ => Ok(Config::default()),
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file_str = std::fs::read_to_string(path.as_ref())?;
        let import = toml::from_str::<ConfigImport>(&file_str)?;
        Self::try_from(&import)
    }

    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("lyricus").join("config.toml"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            wave_style: WaveStyle::default(),
            default_rate: 1.0,
        }
    }
}

impl TryFrom<&ConfigImport> for Config {
    type Error = anyhow::Error;

    fn try_from(import: &ConfigImport) -> Result<Self> {
        let mut config = Config::default();

        if let Some(wf) = &import.waveform {
            if let Some(fill) = &wf.envelope_fill {
                config.wave_style.envelope_fill = Rgb::parse(fill)?;
            }
            if let Some(fill) = &wf.progress_fill {
                config.wave_style.progress_fill = Rgb::parse(fill)?;
            }
            if let Some(flatten) = wf.flatten {
                config.wave_style.flatten = flatten.clamp(0.0, 1.0);
            }
        }

        if let Some(playback) = &import.playback {
            if let Some(rate) = playback.rate {
                config.default_rate = rate;
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let import = toml::from_str::<ConfigImport>("").unwrap();
        let config = Config::try_from(&import).unwrap();
        assert_eq!(config.wave_style.envelope_fill, Rgb(0x00, 0x33, 0x99));
        assert_eq!(config.default_rate, 1.0);
    }

    #[test]
    fn partial_overrides_apply() {
        let doc = r##"
            [waveform]
            progress_fill = "#f00"
            flatten = 2.0

            [playback]
            rate = 1.25
        "##;
        let import = toml::from_str::<ConfigImport>(doc).unwrap();
        let config = Config::try_from(&import).unwrap();

        assert_eq!(config.wave_style.progress_fill, Rgb(0xff, 0x00, 0x00));
        assert_eq!(config.wave_style.envelope_fill, Rgb(0x00, 0x33, 0x99));
        assert_eq!(config.wave_style.flatten, 1.0);
        assert_eq!(config.default_rate, 1.25);
    }

    #[test]
    fn bad_colour_is_an_error() {
        let doc = "[waveform]\nenvelope_fill = \"oops\"\n";
        let import = toml::from_str::<ConfigImport>(doc).unwrap();
        assert!(Config::try_from(&import).is_err());
    }
}
