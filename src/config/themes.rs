use std::collections::HashMap;

use ratatui::style::Color;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, std::hash::Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ThemeName {
    Dark,
    Light,
    HighContrast,
    /// Any name without a palette; replaced by `Dark` when the config loads.
    #[serde(other)]
    Unknown,
}

impl Default for ThemeName {
    fn default() -> Self {
        ThemeName::Dark
    }
}

/// Colours the grid and popup are drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub accent: Color,
    pub text: Color,
    pub muted: Color,
    pub today: Color,
    pub cursor_bg: Color,
    pub post: Color,
    pub padding: Color,
}

#[derive(Debug, Clone)]
pub struct ThemeRegistry {
    palettes: HashMap<ThemeName, Palette>,
}

impl ThemeRegistry {
    pub fn contains(&self, theme: &ThemeName) -> bool {
        self.palettes.contains_key(theme)
    }

    pub fn palette(&self, theme: &ThemeName) -> Palette {
        self.palettes
            .get(theme)
            .or_else(|| self.palettes.get(&ThemeName::Dark))
            .copied()
            .unwrap_or(DARK)
    }
}

const DARK: Palette = Palette {
    accent: Color::Cyan,
    text: Color::White,
    muted: Color::Gray,
    today: Color::Yellow,
    cursor_bg: Color::Blue,
    post: Color::Green,
    padding: Color::DarkGray,
};

const LIGHT: Palette = Palette {
    accent: Color::Blue,
    text: Color::Black,
    muted: Color::DarkGray,
    today: Color::Magenta,
    cursor_bg: Color::LightCyan,
    post: Color::Rgb(0, 110, 60),
    padding: Color::Gray,
};

const HIGH_CONTRAST: Palette = Palette {
    accent: Color::LightYellow,
    text: Color::White,
    muted: Color::White,
    today: Color::LightRed,
    cursor_bg: Color::LightBlue,
    post: Color::LightGreen,
    padding: Color::Black,
};

impl Default for ThemeRegistry {
    fn default() -> Self {
        let palettes = [
            (ThemeName::Dark, DARK),
            (ThemeName::Light, LIGHT),
            (ThemeName::HighContrast, HIGH_CONTRAST),
        ]
        .into_iter()
        .collect();
        Self { palettes }
    }
}
