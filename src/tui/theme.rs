//! Theme definitions for the TUI.

use ratatui::style::Color;

/// A color theme for the TUI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Theme name
    pub name: &'static str,

    // Base colors
    /// Background color
    pub bg: Color,
    /// Foreground (text) color
    pub fg: Color,

    // Semantic colors
    /// Receive pane text
    pub received: Color,
    /// History entries
    pub sent: Color,
    /// Notice popups for failures
    pub error: Color,
    /// Open-port indicator
    pub connected: Color,

    // UI element colors
    /// Border color
    pub border: Color,
    /// Selection/highlight color
    pub selection: Color,
    /// Inactive element color
    pub inactive: Color,
    /// Accent color for focused borders and titles
    pub accent: Color,
}

impl Theme {
    /// Dark theme (default)
    pub const fn dark() -> Self {
        Self {
            name: "dark",
            bg: Color::Rgb(30, 30, 46),
            fg: Color::Rgb(205, 214, 244),
            received: Color::Rgb(166, 227, 161),
            sent: Color::Rgb(137, 180, 250),
            error: Color::Rgb(243, 139, 168),
            connected: Color::Rgb(166, 227, 161),
            border: Color::Rgb(88, 91, 112),
            selection: Color::Rgb(69, 71, 90),
            inactive: Color::Rgb(108, 112, 134),
            accent: Color::Rgb(203, 166, 247),
        }
    }

    /// Light theme
    pub const fn light() -> Self {
        Self {
            name: "light",
            bg: Color::Rgb(239, 241, 245),
            fg: Color::Rgb(76, 79, 105),
            received: Color::Rgb(64, 160, 43),
            sent: Color::Rgb(30, 102, 245),
            error: Color::Rgb(210, 15, 57),
            connected: Color::Rgb(64, 160, 43),
            border: Color::Rgb(172, 176, 190),
            selection: Color::Rgb(204, 208, 218),
            inactive: Color::Rgb(140, 143, 161),
            accent: Color::Rgb(136, 57, 239),
        }
    }

    /// Get theme by name
    pub fn by_name(name: &str) -> Option<&'static Theme> {
        THEMES.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Theme by name, falling back to dark.
    pub fn named(name: &str) -> Theme {
        Self::by_name(name).cloned().unwrap_or_default()
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

/// Available themes
pub static THEMES: &[Theme] = &[Theme::dark(), Theme::light()];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_by_name() {
        assert!(Theme::by_name("dark").is_some());
        assert!(Theme::by_name("Light").is_some());
        assert!(Theme::by_name("nonexistent").is_none());
    }

    #[test]
    fn test_theme_fallback() {
        assert_eq!(Theme::named("nonexistent").name, "dark");
        assert_eq!(Theme::named("light").name, "light");
    }
}
