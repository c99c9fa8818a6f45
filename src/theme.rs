// Color themes. Visualizer palettes (neon, aurora, sunset, light) drive the
// canvas; the chrome theme colors borders, text and status indicators and
// follows the visualizer theme's light/dark flavour.

use std::fmt;
use std::str::FromStr;

use ratatui::style::Color;
use serde::{Deserialize, Serialize};

use crate::canvas::Rgba;

/// Named visualizer theme. Persisted by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeName {
    #[default]
    Neon,
    Aurora,
    Sunset,
    Light,
}

impl ThemeName {
    pub const ALL: [ThemeName; 4] = [
        ThemeName::Neon,
        ThemeName::Aurora,
        ThemeName::Sunset,
        ThemeName::Light,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Neon => "neon",
            Self::Aurora => "aurora",
            Self::Sunset => "sunset",
            Self::Light => "light",
        }
    }

    /// Cycle to the next theme.
    pub fn next(self) -> Self {
        match self {
            Self::Neon => Self::Aurora,
            Self::Aurora => Self::Sunset,
            Self::Sunset => Self::Light,
            Self::Light => Self::Neon,
        }
    }

    pub fn palette(self) -> &'static Palette {
        match self {
            Self::Neon => &NEON,
            Self::Aurora => &AURORA,
            Self::Sunset => &SUNSET,
            Self::Light => &LIGHT,
        }
    }
}

impl fmt::Display for ThemeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown visualizer theme: {s}"))
    }
}

/// Colors a visualizer theme supplies to the render algorithms.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    /// Translucent background wash painted before every frame.
    pub background: Rgba,
    /// Two-stop gradient, bottom/inner first.
    pub gradient: [Rgba; 2],
    pub accent: Rgba,
    pub glow: Rgba,
    pub particle: Rgba,
}

pub const NEON: Palette = Palette {
    background: Rgba::rgba(15, 23, 42, 0.65),
    gradient: [Rgba::rgb(0x38, 0xbd, 0xf8), Rgba::rgb(0xc0, 0x84, 0xfc)],
    accent: Rgba::rgb(0xf4, 0x72, 0xb6),
    glow: Rgba::rgba(56, 189, 248, 0.45),
    particle: Rgba::rgb(0x38, 0xbd, 0xf8),
};

pub const AURORA: Palette = Palette {
    background: Rgba::rgba(4, 30, 49, 0.7),
    gradient: [Rgba::rgb(0x22, 0xd3, 0xee), Rgba::rgb(0x34, 0xd3, 0x99)],
    accent: Rgba::rgb(0xfe, 0xf3, 0xc7),
    glow: Rgba::rgba(52, 211, 153, 0.45),
    particle: Rgba::rgb(0x34, 0xd3, 0x99),
};

pub const SUNSET: Palette = Palette {
    background: Rgba::rgba(58, 12, 35, 0.72),
    gradient: [Rgba::rgb(0xf9, 0x73, 0x16), Rgba::rgb(0xfb, 0x71, 0x85)],
    accent: Rgba::rgb(0xfd, 0xe0, 0x47),
    glow: Rgba::rgba(249, 115, 22, 0.45),
    particle: Rgba::rgb(0xfb, 0x71, 0x85),
};

pub const LIGHT: Palette = Palette {
    background: Rgba::rgba(248, 250, 252, 0.92),
    gradient: [Rgba::rgb(0x64, 0x74, 0x8b), Rgba::rgb(0x0e, 0xa5, 0xe9)],
    accent: Rgba::rgb(0x63, 0x66, 0xf1),
    glow: Rgba::rgba(148, 163, 184, 0.4),
    particle: Rgba::rgb(0x47, 0x55, 0x69),
};

/// Named color slots used by the UI chrome (borders, text, status indicators).
#[derive(Debug, Clone)]
pub struct Theme {
    /// Primary accent color (active track, active buttons, highlights).
    pub primary: Color,
    /// Secondary accent / meta line color.
    pub secondary: Color,
    pub text: Color,
    /// Dimmed / inactive text color.
    pub text_dim: Color,
    /// Key hints.
    pub accent: Color,
    /// Background color for the cursor row.
    pub selection_bg: Color,
    pub border: Color,
    pub error: Color,
    pub success: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            primary: Color::Cyan,
            secondary: Color::Magenta,
            text: Color::White,
            text_dim: Color::DarkGray,
            accent: Color::Yellow,
            selection_bg: Color::Rgb(30, 30, 40),
            border: Color::DarkGray,
            error: Color::Red,
            success: Color::Green,
        }
    }

    pub fn light() -> Self {
        Self {
            primary: Color::Blue,
            secondary: Color::Magenta,
            text: Color::Black,
            text_dim: Color::DarkGray,
            accent: Color::Rgb(180, 120, 0),
            selection_bg: Color::Rgb(220, 225, 235),
            border: Color::Rgb(180, 180, 180),
            error: Color::Red,
            success: Color::Rgb(0, 140, 60),
        }
    }

    /// Chrome that matches a visualizer theme.
    pub fn for_visualizer(theme: ThemeName) -> Self {
        match theme {
            ThemeName::Light => Self::light(),
            _ => Self::dark(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}
