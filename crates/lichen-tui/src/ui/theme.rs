use ratatui::style::Color;

pub const BG_APP: Color = Color::Black;
pub const ACCENT_PRIMARY: Color = Color::Cyan;
pub const ACCENT_ERROR: Color = Color::Red;
pub const TEXT_PRIMARY: Color = Color::White;
pub const TEXT_MUTED: Color = Color::DarkGray;
pub const RESOLVED: Color = Color::Green;
pub const FOLLOW_UP: Color = Color::Yellow;
