use crate::error::{Error, Result};

/// A terminal color value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// The terminal's own default color.
    #[default]
    Reset,
    /// Black.
    Black,
    /// Dark grey.
    DarkGrey,
    /// Red.
    Red,
    /// Green.
    Green,
    /// Yellow.
    Yellow,
    /// Blue.
    Blue,
    /// Magenta.
    Magenta,
    /// Cyan.
    Cyan,
    /// Grey.
    Grey,
    /// White.
    White,
    /// RGB color.
    Rgb {
        /// Red channel.
        r: u8,
        /// Green channel.
        g: u8,
        /// Blue channel.
        b: u8,
    },
}

impl Color {
    /// Parse `#RRGGBB` or `RRGGBB`.
    pub fn parse_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(Error::Invalid(format!("hex color: {hex}")));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| Error::Invalid(format!("hex color: {hex}")))
        };
        Ok(Self::Rgb {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }
}

/// Optional per-node color overrides.
///
/// Resolution walks from a node toward the root and takes the first override
/// found for each channel, falling back to the window defaults.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct ColorOverride {
    /// Foreground override.
    pub fg: Option<Color>,
    /// Background override.
    pub bg: Option<Color>,
}

impl ColorOverride {
    /// True if neither channel is overridden.
    pub fn is_empty(&self) -> bool {
        self.fg.is_none() && self.bg.is_none()
    }

    /// Apply this override on top of inherited colors.
    pub fn apply(&self, inherited: Colors) -> Colors {
        Colors {
            fg: self.fg.unwrap_or(inherited.fg),
            bg: self.bg.unwrap_or(inherited.bg),
        }
    }
}

/// A resolved foreground/background pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct Colors {
    /// Foreground color.
    pub fg: Color,
    /// Background color.
    pub bg: Color,
}

impl Colors {
    /// Construct a color pair.
    pub fn new(fg: Color, bg: Color) -> Self {
        Self { fg, bg }
    }

    /// Foreground and background swapped.
    pub fn inverted(self) -> Self {
        Self::new(self.bg, self.fg)
    }
}
