//! Value types describing how a card looks: colors, theme, size presets and
//! rendering profiles.

use std::{fmt, str::FromStr};

use super::error::DomainError;

pub const DEFAULT_BACKGROUND: HexColor = HexColor::rgb(0xf0, 0xf0, 0xf0);
pub const DEFAULT_TEXT: HexColor = HexColor::rgb(0x33, 0x33, 0x33);
pub const GENERIC_SANS_SERIF: &str = "sans-serif";

/// An opaque sRGB color written as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl HexColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 0xff]
    }
}

impl FromStr for HexColor {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let digits = value
            .strip_prefix('#')
            .filter(|digits| digits.len() == 6 && digits.bytes().all(|b| b.is_ascii_hexdigit()))
            .ok_or_else(|| {
                DomainError::validation(format!("`{value}` is not a #rrggbb hex color"))
            })?;

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|err| DomainError::validation(format!("`{value}`: {err}")))
        };

        Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Process-wide look of themed cards. Resolved once from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub background: HexColor,
    pub text: HexColor,
    pub font_family: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: DEFAULT_BACKGROUND,
            text: DEFAULT_TEXT,
            font_family: GENERIC_SANS_SERIF.to_string(),
        }
    }
}

/// Fixed surface sizes exposed as separate endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Small,
    Medium,
    Large,
    Full,
}

impl Variant {
    pub const ALL: [Variant; 4] = [Variant::Small, Variant::Medium, Variant::Large, Variant::Full];

    pub const fn dimensions(self) -> (u32, u32) {
        match self {
            Variant::Small => (640, 480),
            Variant::Medium => (800, 600),
            Variant::Large => (1024, 768),
            Variant::Full => (1200, 630),
        }
    }

    pub const fn route(self) -> &'static str {
        match self {
            Variant::Small => "/S",
            Variant::Medium => "/M",
            Variant::Large => "/L",
            Variant::Full => "/img",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Variant::Small => "small",
            Variant::Medium => "medium",
            Variant::Large => "large",
            Variant::Full => "full",
        }
    }
}

impl FromStr for Variant {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "s" | "small" => Ok(Variant::Small),
            "m" | "medium" => Ok(Variant::Medium),
            "l" | "large" => Ok(Variant::Large),
            "full" | "default" | "img" => Ok(Variant::Full),
            other => Err(DomainError::validation(format!(
                "unknown variant `{other}` (expected small|medium|large|full)"
            ))),
        }
    }
}

/// How the card is drawn.
///
/// `Themed` follows the configured [`Theme`]. `Plain` is the original bold
/// look: upper-cased text in the default colors, whatever the theme says.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderProfile {
    #[default]
    Themed,
    Plain,
}

impl RenderProfile {
    /// Font size is `floor(width / divisor)`.
    pub const fn font_divisor(self) -> u32 {
        match self {
            RenderProfile::Themed => 11,
            RenderProfile::Plain => 15,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            RenderProfile::Themed => "themed",
            RenderProfile::Plain => "plain",
        }
    }
}

impl FromStr for RenderProfile {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "themed" => Ok(RenderProfile::Themed),
            "plain" => Ok(RenderProfile::Plain),
            other => Err(DomainError::validation(format!(
                "unknown style `{other}` (expected themed|plain)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!("#f0f0f0".parse::<HexColor>(), Ok(DEFAULT_BACKGROUND));
        assert_eq!("#FFD1DC".parse::<HexColor>(), Ok(HexColor::rgb(0xff, 0xd1, 0xdc)));
        assert_eq!(HexColor::rgb(0x1a, 0xbc, 0x9c).to_string(), "#1abc9c");
    }

    #[test]
    fn rejects_malformed_colors() {
        for bad in ["", "#12345", "#1234567", "red", "f0f0f0", "#GGGGGG", "#ff ff0"] {
            assert!(bad.parse::<HexColor>().is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn variants_have_canonical_sizes() {
        let sizes: Vec<_> = Variant::ALL.iter().map(|v| v.dimensions()).collect();
        assert_eq!(sizes, vec![(640, 480), (800, 600), (1024, 768), (1200, 630)]);
        assert_eq!("M".parse::<Variant>(), Ok(Variant::Medium));
        assert!("huge".parse::<Variant>().is_err());
    }

    #[test]
    fn profiles_pick_font_divisors() {
        assert_eq!(RenderProfile::default(), RenderProfile::Themed);
        assert_eq!(RenderProfile::Themed.font_divisor(), 11);
        assert_eq!(RenderProfile::Plain.font_divisor(), 15);
        assert_eq!("PLAIN".parse::<RenderProfile>(), Ok(RenderProfile::Plain));
    }
}
