use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Role a colour plays inside a concept palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwatchRole {
    Primary,
    Secondary,
    Accent,
}

impl SwatchRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwatchRole::Primary => "Primary",
            SwatchRole::Secondary => "Secondary",
            SwatchRole::Accent => "Accent",
        }
    }
}

impl fmt::Display for SwatchRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SwatchRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" => Ok(SwatchRole::Primary),
            "secondary" => Ok(SwatchRole::Secondary),
            "accent" => Ok(SwatchRole::Accent),
            other => Err(anyhow!("unknown swatch role: {other}")),
        }
    }
}

impl Serialize for SwatchRole {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SwatchRole {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorSwatch {
    #[serde(rename = "type")]
    pub role: SwatchRole,
    pub name: String,
    pub hex: String,
}

impl ColorSwatch {
    pub fn new(role: SwatchRole, name: impl Into<String>, hex: impl Into<String>) -> Self {
        Self {
            role,
            name: name.into(),
            hex: hex.into(),
        }
    }
}

/// `#RRGGBB`, hex digits of either case.
pub fn is_valid_hex(hex: &str) -> bool {
    let Some(digits) = hex.strip_prefix('#') else {
        return false;
    };
    digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit())
}

/// A single brand/logo proposal returned by the gateway.
///
/// Field names on the wire follow the response schema the gateway is asked to
/// honour (`conceptName`, `meaning`, `colorPalette`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    #[serde(rename = "conceptName")]
    pub name: String,
    #[serde(rename = "visualDescription")]
    pub visual_description: String,
    #[serde(rename = "meaning")]
    pub rationale: String,
    #[serde(rename = "colorPalette")]
    pub palette: Vec<ColorSwatch>,
}

impl Concept {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("concept name is empty");
        }
        if self.visual_description.trim().is_empty() {
            bail!("concept '{}' has an empty visual description", self.name);
        }
        for swatch in &self.palette {
            if !is_valid_hex(&swatch.hex) {
                bail!(
                    "concept '{}' has invalid hex '{}' for swatch '{}'",
                    self.name,
                    swatch.hex,
                    swatch.name
                );
            }
        }
        Ok(())
    }

    /// File name used when exporting a generated image, e.g. `verdant-brew-logo.png`.
    /// Only ASCII alphanumerics survive; every other run of characters becomes
    /// one `-`, so the name never contains a path separator or `..`.
    pub fn asset_file_name(&self, extension: &str) -> String {
        let slug = self
            .name
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|part| !part.is_empty())
            .map(str::to_ascii_lowercase)
            .collect::<Vec<_>>()
            .join("-");
        let slug = if slug.is_empty() { "concept".to_string() } else { slug };
        format!("{slug}-logo.{extension}")
    }
}
