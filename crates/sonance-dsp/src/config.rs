//! Configuration types for STFT effects

use serde::{Deserialize, Serialize};
use sonance_core::{SonanceError, SonanceResult};

use crate::eq::SpectralEditConfig;
use crate::transform::{MAX_TRANSFORM_SIZE, MIN_TRANSFORM_SIZE};
use crate::window::{DEFAULT_GAUSSIAN_SIGMA, Window, WindowKind};

/// Frame layout of an STFT effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StftConfig {
    /// FFT size, also the window length (power of two)
    pub transform_size: usize,

    /// Frames between consecutive analysis frames
    pub hop_size: usize,

    /// Analysis and synthesis window
    pub window: WindowKind,

    /// Only read for `WindowKind::Gaussian`
    pub gaussian_sigma: f64,
}

impl Default for StftConfig {
    fn default() -> Self {
        Self {
            transform_size: 1024,
            hop_size: 256,
            window: WindowKind::Hann,
            gaussian_sigma: DEFAULT_GAUSSIAN_SIGMA,
        }
    }
}

impl StftConfig {
    /// Short frames for interactive use
    pub fn low_latency() -> Self {
        Self {
            transform_size: 512,
            hop_size: 128,
            ..Default::default()
        }
    }

    /// Long frames for finer frequency resolution
    pub fn quality() -> Self {
        Self {
            transform_size: 4096,
            hop_size: 1024,
            ..Default::default()
        }
    }

    pub fn with_transform_size(mut self, size: usize) -> Self {
        self.transform_size = size;
        self
    }

    pub fn with_hop_size(mut self, hop: usize) -> Self {
        self.hop_size = hop;
        self
    }

    pub fn with_window(mut self, window: WindowKind) -> Self {
        self.window = window;
        self
    }

    pub fn with_gaussian_sigma(mut self, sigma: f64) -> Self {
        self.gaussian_sigma = sigma;
        self
    }

    /// Check sizes. Window coverage is checked when the engine is built.
    pub fn validate(&self) -> SonanceResult<()> {
        let size = self.transform_size;
        if !(MIN_TRANSFORM_SIZE..=MAX_TRANSFORM_SIZE).contains(&size) || !size.is_power_of_two() {
            return Err(SonanceError::invalid(format!(
                "transform size must be a power of two in {MIN_TRANSFORM_SIZE}..={MAX_TRANSFORM_SIZE}, got {size}"
            )));
        }
        if self.hop_size == 0 || self.hop_size > size {
            return Err(SonanceError::invalid(format!(
                "hop size must be in 1..={size}, got {}",
                self.hop_size
            )));
        }
        Ok(())
    }

    /// Window described by this config
    pub fn window(&self) -> SonanceResult<Window> {
        match self.window {
            WindowKind::Gaussian => Window::gaussian(self.transform_size, self.gaussian_sigma),
            kind => Window::new(kind, self.transform_size),
        }
    }

    pub fn from_json(json: &str) -> SonanceResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SonanceError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> SonanceResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| SonanceError::Serialization(e.to_string()))
    }
}

/// Saved equalizer: frame layout plus frequency ranges
///
/// An open upper bound is written as `"inf"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EqualizerPreset {
    pub name: String,
    #[serde(default)]
    pub stft: StftConfig,
    #[serde(default)]
    pub ranges: SpectralEditConfig,
}

impl EqualizerPreset {
    pub fn new(name: impl Into<String>, stft: StftConfig, ranges: SpectralEditConfig) -> Self {
        Self {
            name: name.into(),
            stft,
            ranges,
        }
    }

    pub fn from_json(json: &str) -> SonanceResult<Self> {
        let preset: Self =
            serde_json::from_str(json).map_err(|e| SonanceError::Serialization(e.to_string()))?;
        preset.stft.validate()?;
        Ok(preset)
    }

    pub fn to_json(&self) -> SonanceResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| SonanceError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eq::FrequencyRange;

    #[test]
    fn test_presets_validate() {
        assert!(StftConfig::default().validate().is_ok());
        assert!(StftConfig::low_latency().validate().is_ok());
        assert!(StftConfig::quality().validate().is_ok());
    }

    #[test]
    fn test_invalid_sizes() {
        assert!(StftConfig::default().with_transform_size(1000).validate().is_err());
        assert!(StftConfig::default().with_hop_size(0).validate().is_err());
        assert!(StftConfig::default().with_hop_size(2048).validate().is_err());
    }

    #[test]
    fn test_gaussian_window_uses_sigma() {
        let config = StftConfig::default()
            .with_transform_size(64)
            .with_window(WindowKind::Gaussian)
            .with_gaussian_sigma(0.25);
        let window = config.window().unwrap();
        assert_eq!(window.kind(), WindowKind::Gaussian);
        assert_eq!(window.sigma(), 0.25);
        assert_eq!(window.size(), 64);
    }

    #[test]
    fn test_json_defaults_missing_fields() {
        let config = StftConfig::from_json(r#"{ "hop_size": 512 }"#).unwrap();
        assert_eq!(config.transform_size, 1024);
        assert_eq!(config.hop_size, 512);
        assert_eq!(config.window, WindowKind::Hann);

        assert!(StftConfig::from_json(r#"{ "hop_size": 0 }"#).is_err());
        assert!(matches!(
            StftConfig::from_json("not json"),
            Err(SonanceError::Serialization(_))
        ));
    }

    #[test]
    fn test_preset_json() {
        let json = r#"{
            "name": "rumble cut",
            "stft": { "transform_size": 2048, "hop_size": 512, "window": "Welch" },
            "ranges": [ { "f1": 0.0, "f2": 80.0, "gain": 0.0 } ]
        }"#;
        let preset = EqualizerPreset::from_json(json).unwrap();
        assert_eq!(preset.name, "rumble cut");
        assert_eq!(preset.stft.window, WindowKind::Welch);
        assert_eq!(preset.ranges.len(), 1);

        let again = EqualizerPreset::from_json(&preset.to_json().unwrap()).unwrap();
        assert_eq!(again, preset);
    }

    #[test]
    fn test_preset_json_open_upper_bound() {
        let ranges = SpectralEditConfig::from_ranges(vec![
            FrequencyRange::new(0.0, 300.0, 0.0).unwrap(),
            FrequencyRange::new(4000.0, f64::INFINITY, 0.0).unwrap(),
        ])
        .unwrap();
        let preset = EqualizerPreset::new("band pass", StftConfig::default(), ranges);

        let json = preset.to_json().unwrap();
        assert!(json.contains(r#""f2": "inf""#), "{json}");
        assert!(!json.contains("null"));

        let again = EqualizerPreset::from_json(&json).unwrap();
        assert_eq!(again, preset);
        assert_eq!(again.ranges.ranges()[1].f2, f64::INFINITY);

        let typo = r#"{ "name": "x", "ranges": [ { "f1": 0.0, "f2": "infinite", "gain": 0.0 } ] }"#;
        assert!(EqualizerPreset::from_json(typo).is_err());
    }

    #[test]
    fn test_preset_rejects_negative_frequency() {
        let json = r#"{ "name": "bad", "ranges": [ { "f1": -5.0, "f2": 80.0, "gain": 0.0 } ] }"#;
        assert!(matches!(
            EqualizerPreset::from_json(json),
            Err(SonanceError::Serialization(_))
        ));
    }
}
