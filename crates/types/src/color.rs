use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;
use std::hash::{Hash, Hasher};

/// An sRGB color with straight alpha, as reported by computed styles.
#[derive(Debug, Clone, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Eq for Color {}

impl Hash for Color {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.r, self.g, self.b).hash(state);
        self.a.to_bits().hash(state);
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 1.0 };

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a: a.clamp(0.0, 1.0) }
    }

    pub fn transparent() -> Self {
        Self { a: 0.0, ..Color::BLACK }
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0.0
    }

    /// Serializes as the CSS functional notation the host reports,
    /// e.g. `rgb(255, 0, 0)` or `rgba(0, 0, 0, 0.5)`.
    pub fn to_css(&self) -> String {
        if self.a >= 1.0 {
            format!("rgb({}, {}, {})", self.r, self.g, self.b)
        } else {
            format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
        }
    }

    /// Reads back the output of [`Color::to_css`]. Only the `rgb()`/`rgba()`
    /// notation is accepted; named colors and hex belong to the style parser.
    pub fn from_css(s: &str) -> Option<Color> {
        let s = s.trim();
        let (args, has_alpha) = if let Some(rest) = s.strip_prefix("rgba(") {
            (rest.strip_suffix(')')?, true)
        } else {
            (s.strip_prefix("rgb(")?.strip_suffix(')')?, false)
        };
        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        if parts.len() != if has_alpha { 4 } else { 3 } {
            return None;
        }
        let channel = |i: usize| parts[i].parse::<u8>().ok();
        let a = match parts.get(3) {
            Some(alpha) => alpha.parse::<f32>().ok()?,
            None => 1.0,
        };
        Some(Color::rgba(channel(0)?, channel(1)?, channel(2)?, a))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

impl Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_css())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let css = String::deserialize(deserializer)?;
        Color::from_css(&css).ok_or_else(|| de::Error::custom(format!("not an rgb() color: {css}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_serialization() {
        assert_eq!(Color::rgb(255, 0, 0).to_css(), "rgb(255, 0, 0)");
        assert_eq!(Color::rgba(0, 0, 0, 0.5).to_css(), "rgba(0, 0, 0, 0.5)");
        assert!(Color::transparent().is_transparent());
        assert_eq!(Color::default(), Color::BLACK);
    }

    #[test]
    fn reads_back_functional_notation() {
        assert_eq!(Color::from_css("rgba(10, 20, 30, 0.25)"), Some(Color::rgba(10, 20, 30, 0.25)));
        assert_eq!(Color::from_css(" rgb(1,2,3) "), Some(Color::rgb(1, 2, 3)));
        assert_eq!(Color::from_css("rgb(1, 2)"), None);
        assert_eq!(Color::from_css("#fff"), None);
    }

    #[test]
    fn json_uses_css_strings() {
        let json = serde_json::to_string(&Color::rgb(255, 0, 0)).unwrap();
        assert_eq!(json, "\"rgb(255, 0, 0)\"");
        let c: Color = serde_json::from_str("\"rgba(0, 0, 0, 0.5)\"").unwrap();
        assert_eq!(c, Color::rgba(0, 0, 0, 0.5));
    }
}
