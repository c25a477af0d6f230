use crate::error::{PointerError, Result};
use crate::geo::Observer;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// HardwareConfig
// ---------------------------------------------------------------------------

/// Pin assignments for the Raspberry Pi backend. BCM numbering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareConfig {
    #[serde(default = "default_coil_pins")]
    pub coil_pins: [u8; 4],
    #[serde(default = "default_button_pin")]
    pub button_pin: u8,
    #[serde(default)]
    pub ring_spi_bus: u8,
}

fn default_coil_pins() -> [u8; 4] {
    [4, 17, 27, 22]
}

fn default_button_pin() -> u8 {
    23
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            coil_pins: default_coil_pins(),
            button_pin: default_button_pin(),
            ring_spi_bus: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Motor steps in one full turn of the model.
    #[serde(default = "default_revolution")]
    pub revolution: u32,
    #[serde(default = "default_step_delay", alias = "stepDelaySeconds")]
    pub step_delay_seconds: f64,
    #[serde(default = "default_ring_size", alias = "ringSize")]
    pub ring_size: u32,
    #[serde(default = "default_idle", alias = "calibrationIdleSeconds")]
    pub calibration_idle_seconds: f64,
    #[serde(default = "default_poll", alias = "calibrationPollSeconds")]
    pub calibration_poll_seconds: f64,
    /// Steps turned per observed press during actuator calibration.
    #[serde(default = "default_jog_steps")]
    pub calibration_jog_steps: u32,
    #[serde(default = "default_led_intensity")]
    pub led_intensity: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observer: Option<Observer>,
    #[serde(default)]
    pub hardware: HardwareConfig,
}

fn default_version() -> u32 {
    1
}

fn default_revolution() -> u32 {
    2038
}

fn default_step_delay() -> f64 {
    0.01
}

fn default_ring_size() -> u32 {
    24
}

fn default_idle() -> f64 {
    5.0
}

fn default_poll() -> f64 {
    0.1
}

fn default_jog_steps() -> u32 {
    4
}

fn default_led_intensity() -> u8 {
    128
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            revolution: default_revolution(),
            step_delay_seconds: default_step_delay(),
            ring_size: default_ring_size(),
            calibration_idle_seconds: default_idle(),
            calibration_poll_seconds: default_poll(),
            calibration_jog_steps: default_jog_steps(),
            led_intensity: default_led_intensity(),
            observer: None,
            hardware: HardwareConfig::default(),
        }
    }
}

fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

impl Config {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(PointerError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default(root: &Path) -> Result<Self> {
        match Self::load(root) {
            Err(PointerError::NotInitialized) => Ok(Self::default()),
            other => other,
        }
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn step_delay(&self) -> Duration {
        seconds(self.step_delay_seconds)
    }

    pub fn calibration_idle(&self) -> Duration {
        seconds(self.calibration_idle_seconds)
    }

    pub fn calibration_poll(&self) -> Duration {
        seconds(self.calibration_poll_seconds)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut error = |message: String| {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message,
            })
        };

        if self.revolution == 0 {
            error("revolution must be greater than zero".to_string());
        }
        if self.ring_size == 0 {
            error("ring_size must be greater than zero".to_string());
        }
        if !(self.step_delay_seconds >= 0.0 && self.step_delay_seconds.is_finite()) {
            error(format!(
                "step_delay_seconds must be a non-negative number, got {}",
                self.step_delay_seconds
            ));
        }
        if !(self.calibration_idle_seconds > 0.0 && self.calibration_idle_seconds.is_finite()) {
            error(format!(
                "calibration_idle_seconds must be positive, got {}",
                self.calibration_idle_seconds
            ));
        }
        if !(self.calibration_poll_seconds > 0.0 && self.calibration_poll_seconds.is_finite()) {
            error(format!(
                "calibration_poll_seconds must be positive, got {}",
                self.calibration_poll_seconds
            ));
        }
        if let Some(obs) = &self.observer {
            if !obs.is_valid() {
                error(format!(
                    "observer position ({}, {}) is outside lat [-90,90] / lon [-180,180]",
                    obs.lat, obs.lon
                ));
            }
        }

        if self.calibration_poll_seconds >= self.calibration_idle_seconds {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "calibration_poll_seconds ({}) is not shorter than calibration_idle_seconds ({}); \
                     calibration will confirm on the first poll without a press",
                    self.calibration_poll_seconds, self.calibration_idle_seconds
                ),
            });
        }
        if self.revolution % 2 == 1 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "revolution {} is odd; a target exactly opposite the model has no exact half-turn",
                    self.revolution
                ),
            });
        }
        if self.calibration_jog_steps == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "calibration_jog_steps is 0; the model cannot be turned during calibration"
                    .to_string(),
            });
        }

        warnings
    }

    /// Fail on the first error-level warning.
    pub fn check(&self) -> Result<()> {
        match self
            .validate()
            .into_iter()
            .find(|w| w.level == WarnLevel::Error)
        {
            Some(w) => Err(PointerError::InvalidConfig(w.message)),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
