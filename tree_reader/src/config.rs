/*!
Configuration management for the tree reader.

The raw configuration mirrors what the host framework provides: a tree
name, a shot selector, the cycle frequency and one entry per channel with
numeric management codes. [`ReaderConfig::validate`] turns it into checked
[`ChannelSpec`] values; binding against the store happens in the reader.
*/

use crate::error::ReaderError;
use crate::store::Shot;
use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use shared::ElementType;
use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

/// How stored samples become output samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataManagement {
    /// Copy stored samples unchanged
    Raw,
    /// Interpolate linearly at the output sample times
    Interpolate,
    /// Repeat the last stored sample at or before each output sample time
    Hold,
}

impl TryFrom<u8> for DataManagement {
    type Error = u8;

    fn try_from(code: u8) -> std::result::Result<Self, u8> {
        match code {
            0 => Ok(Self::Raw),
            1 => Ok(Self::Interpolate),
            2 => Ok(Self::Hold),
            other => Err(other),
        }
    }
}

/// What to write where no segment covers the output samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoleManagement {
    ZeroFill,
    HoldLast,
}

impl TryFrom<u8> for HoleManagement {
    type Error = u8;

    fn try_from(code: u8) -> std::result::Result<Self, u8> {
        match code {
            0 => Ok(Self::ZeroFill),
            1 => Ok(Self::HoldLast),
            other => Err(other),
        }
    }
}

/// Main reader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Name of the pulse tree to open
    pub tree_name: String,

    /// Shot number, -1 for the latest shot
    pub shot: i64,

    /// Cycle frequency in Hz
    pub frequency: f64,

    /// Expected number of channels, checked against `channels` when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_count: Option<usize>,

    pub channels: Vec<ChannelConfig>,

    /// Optional extra signal carrying the cycle start time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_signal: Option<TimeSignalConfig>,
}

/// Per-channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Node path in the tree
    pub node: String,

    /// Declared element type name, e.g. `"int32"`
    #[serde(rename = "type")]
    pub element_type: String,

    /// Elements produced per cycle
    pub elements: u32,

    /// Bytes per cycle; must equal `elements` times the type width
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte_size: Option<u32>,

    /// 0 = raw copy, 1 = linear interpolation, 2 = hold
    #[serde(default)]
    pub data_management: u8,

    /// 0 = zero fill, 1 = hold last value
    #[serde(default)]
    pub hole_management: u8,
}

/// Cycle time signal configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSignalConfig {
    #[serde(rename = "type")]
    pub element_type: String,
}

/// A channel whose configuration passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSpec {
    pub node: String,
    pub element_type: ElementType,
    pub elements: usize,
    pub data_management: DataManagement,
    pub hole_management: HoleManagement,
}

impl ChannelSpec {
    pub fn byte_size(&self) -> usize {
        self.element_type.byte_size(self.elements)
    }
}

/// Types allowed for the time signal
const TIME_SIGNAL_TYPES: [ElementType; 4] = [
    ElementType::UInt32,
    ElementType::Int32,
    ElementType::UInt64,
    ElementType::Int64,
];

const TREE_NAME_PATTERN: &str = r"^[A-Za-z][A-Za-z0-9_]{0,11}$";

/// Compiled tree name pattern; `None` rejects every name
fn tree_name_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(TREE_NAME_PATTERN).ok()).as_ref()
}

fn is_valid_tree_name(name: &str) -> bool {
    tree_name_pattern().is_some_and(|pattern| pattern.is_match(name))
}

impl ReaderConfig {
    /// Create a configuration with no channels
    pub fn new(tree_name: impl Into<String>, shot: i64, frequency: f64) -> Self {
        Self {
            tree_name: tree_name.into(),
            shot,
            frequency,
            channel_count: None,
            channels: Vec::new(),
            time_signal: None,
        }
    }

    /// Load configuration from a JSON (`.json`) or TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            serde_json::from_str(&content).with_context(|| "Failed to parse config file as JSON")
        } else {
            Self::from_toml_str(&content)
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse config file as TOML")
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize config to TOML")?;

        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    pub fn shot_selector(&self) -> std::result::Result<Shot, ReaderError> {
        Shot::new(self.shot).ok_or(ReaderError::InvalidShot(self.shot))
    }

    /// Check everything that does not need the store
    pub fn validate(&self) -> std::result::Result<Vec<ChannelSpec>, ReaderError> {
        if !is_valid_tree_name(&self.tree_name) {
            return Err(ReaderError::InvalidTreeName(self.tree_name.clone()));
        }
        self.shot_selector()?;
        if !self.frequency.is_finite() || self.frequency <= 0.0 {
            return Err(ReaderError::InvalidFrequency(self.frequency));
        }
        if self.channels.is_empty() {
            return Err(ReaderError::NoChannels);
        }
        if let Some(declared) = self.channel_count {
            if declared != self.channels.len() {
                return Err(ReaderError::ChannelCountMismatch {
                    declared,
                    configured: self.channels.len(),
                });
            }
        }
        self.time_signal_type()?;

        let mut seen = HashSet::new();
        self.channels
            .iter()
            .map(|channel| {
                if !seen.insert(channel.node.as_str()) {
                    return Err(ReaderError::DuplicateChannel(channel.node.clone()));
                }
                channel.validate()
            })
            .collect()
    }

    /// Validated type of the time signal, if one is configured
    pub fn time_signal_type(&self) -> std::result::Result<Option<ElementType>, ReaderError> {
        let Some(time_signal) = &self.time_signal else {
            return Ok(None);
        };

        let element_type = ElementType::from_name(&time_signal.element_type)?;
        if !TIME_SIGNAL_TYPES.contains(&element_type) {
            return Err(ReaderError::InvalidTimeSignalType(element_type));
        }
        Ok(Some(element_type))
    }
}

impl ChannelConfig {
    /// A raw-copy, zero-filled channel
    pub fn new(node: impl Into<String>, element_type: ElementType, elements: u32) -> Self {
        Self {
            node: node.into(),
            element_type: element_type.name().to_string(),
            elements,
            byte_size: None,
            data_management: 0,
            hole_management: 0,
        }
    }

    pub fn with_management(mut self, data_management: u8, hole_management: u8) -> Self {
        self.data_management = data_management;
        self.hole_management = hole_management;
        self
    }

    fn validate(&self) -> std::result::Result<ChannelSpec, ReaderError> {
        let element_type = ElementType::from_name(&self.element_type)?;

        if self.elements == 0 {
            return Err(ReaderError::InvalidElementCount(self.node.clone()));
        }
        let elements = self.elements as usize;

        let expected = element_type.byte_size(elements);
        if let Some(declared) = self.byte_size {
            if declared as usize != expected {
                return Err(ReaderError::ByteSizeMismatch {
                    node: self.node.clone(),
                    declared: declared as usize,
                    expected,
                });
            }
        }

        let data_management = DataManagement::try_from(self.data_management).map_err(|code| {
            ReaderError::InvalidDataManagement {
                node: self.node.clone(),
                code,
            }
        })?;
        let hole_management = HoleManagement::try_from(self.hole_management).map_err(|code| {
            ReaderError::InvalidHoleManagement {
                node: self.node.clone(),
                code,
            }
        })?;

        Ok(ChannelSpec {
            node: self.node.clone(),
            element_type,
            elements,
            data_management,
            hole_management,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn sample_config() -> ReaderConfig {
        let mut config = ReaderConfig::new("pulses", -1, 100.0);
        config.channels.push(ChannelConfig::new("SIG_A", ElementType::Int32, 10));
        config
            .channels
            .push(ChannelConfig::new("SIG_B", ElementType::Float64, 4).with_management(2, 1));
        config
    }

    #[test]
    fn test_config_roundtrip() {
        let original_config = sample_config();

        let temp_file = NamedTempFile::new().unwrap();
        let temp_path = temp_file.path();

        original_config.save_to_file(temp_path).unwrap();
        let loaded_config = ReaderConfig::load_from_file(temp_path).unwrap();

        assert_eq!(format!("{:?}", original_config), format!("{:?}", loaded_config));
    }

    #[test]
    fn test_load_json() {
        let json = r#"{
            "tree_name": "pulses",
            "shot": 12,
            "frequency": 50.0,
            "channels": [{ "node": "SIG", "type": "uint16", "elements": 5, "byte_size": 10 }],
            "time_signal": { "type": "uint64" }
        }"#;
        let temp_file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        std::fs::write(temp_file.path(), json).unwrap();

        let config = ReaderConfig::load_from_file(temp_file.path()).unwrap();
        assert_eq!(config.shot, 12);
        assert_eq!(config.channels[0].byte_size, Some(10));
        assert_eq!(config.time_signal_type().unwrap(), Some(ElementType::UInt64));
    }

    #[test]
    fn test_toml_defaults() {
        let config = ReaderConfig::from_toml_str(
            r#"
            tree_name = "pulses"
            shot = -1
            frequency = 10.0

            [[channels]]
            node = "SIG"
            type = "int8"
            elements = 3
            "#,
        )
        .unwrap();

        let specs = config.validate().unwrap();
        assert_eq!(
            specs,
            vec![ChannelSpec {
                node: "SIG".to_string(),
                element_type: ElementType::Int8,
                elements: 3,
                data_management: DataManagement::Raw,
                hole_management: HoleManagement::ZeroFill,
            }]
        );
        assert_eq!(specs[0].byte_size(), 3);
    }

    #[test]
    fn test_tree_name_pattern() {
        assert!(tree_name_pattern().is_some());
        assert!(is_valid_tree_name("pulses"));
        assert!(is_valid_tree_name("a1_b2_c3_d4x"));
        assert!(!is_valid_tree_name("a1_b2_c3_d4xy"));
        assert!(!is_valid_tree_name("_tree"));
        assert!(!is_valid_tree_name(""));
    }

    #[test]
    fn test_global_validation() {
        let mut config = sample_config();
        config.tree_name = "9bad".to_string();
        assert!(matches!(config.validate(), Err(ReaderError::InvalidTreeName(_))));

        let mut config = sample_config();
        config.tree_name = "much_too_long_name".to_string();
        assert!(matches!(config.validate(), Err(ReaderError::InvalidTreeName(_))));

        let mut config = sample_config();
        config.shot = 0;
        assert!(matches!(config.validate(), Err(ReaderError::InvalidShot(0))));

        let mut config = sample_config();
        config.frequency = 0.0;
        assert!(matches!(config.validate(), Err(ReaderError::InvalidFrequency(_))));

        let mut config = sample_config();
        config.channels.clear();
        assert!(matches!(config.validate(), Err(ReaderError::NoChannels)));

        let mut config = sample_config();
        config.channel_count = Some(3);
        assert!(matches!(
            config.validate(),
            Err(ReaderError::ChannelCountMismatch { declared: 3, configured: 2 })
        ));

        let mut config = sample_config();
        config.channels.push(ChannelConfig::new("SIG_A", ElementType::UInt8, 1));
        assert!(matches!(config.validate(), Err(ReaderError::DuplicateChannel(name)) if name == "SIG_A"));
    }

    #[test]
    fn test_channel_validation() {
        let mut config = sample_config();
        config.channels[0].elements = 0;
        assert!(matches!(config.validate(), Err(ReaderError::InvalidElementCount(_))));

        let mut config = sample_config();
        config.channels[0].byte_size = Some(10);
        assert!(matches!(
            config.validate(),
            Err(ReaderError::ByteSizeMismatch { declared: 10, expected: 40, .. })
        ));

        let mut config = sample_config();
        config.channels[0].element_type = "complex".to_string();
        assert!(matches!(config.validate(), Err(ReaderError::Type(_))));

        let mut config = sample_config();
        config.channels[1].data_management = 3;
        assert!(matches!(
            config.validate(),
            Err(ReaderError::InvalidDataManagement { code: 3, .. })
        ));

        let mut config = sample_config();
        config.channels[1].hole_management = 2;
        assert!(matches!(
            config.validate(),
            Err(ReaderError::InvalidHoleManagement { code: 2, .. })
        ));
    }

    #[test]
    fn test_time_signal_type() {
        let mut config = sample_config();
        config.time_signal = Some(TimeSignalConfig {
            element_type: "float32".to_string(),
        });
        assert!(matches!(
            config.validate(),
            Err(ReaderError::InvalidTimeSignalType(ElementType::Float32))
        ));
    }
}
