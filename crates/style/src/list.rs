//! List marker styles and counter numerals.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ListStyleType {
    #[default]
    Disc,
    Circle,
    Square,
    Decimal,
    DecimalLeadingZero,
    LowerAlpha,
    UpperAlpha,
    LowerRoman,
    UpperRoman,
    None,
}

impl ListStyleType {
    /// Maps a computed `list-style-type`; unknown types fall back to `None`
    /// so no marker is drawn for them.
    pub fn from_css(s: &str) -> Self {
        match s.trim() {
            "disc" => Self::Disc,
            "circle" => Self::Circle,
            "square" => Self::Square,
            "decimal" => Self::Decimal,
            "decimal-leading-zero" => Self::DecimalLeadingZero,
            "lower-alpha" | "lower-latin" => Self::LowerAlpha,
            "upper-alpha" | "upper-latin" => Self::UpperAlpha,
            "lower-roman" => Self::LowerRoman,
            "upper-roman" => Self::UpperRoman,
            _ => Self::None,
        }
    }

    /// Glyph for the unordered marker types.
    pub fn glyph(self) -> Option<&'static str> {
        match self {
            Self::Disc => Some("\u{25CF}"),
            Self::Circle => Some("\u{25EF}"),
            Self::Square => Some("\u{25A0}"),
            _ => None,
        }
    }

    /// Text of an ordered marker for the zero-based item index.
    pub fn ordinal(self, index: usize) -> Option<String> {
        let n = index + 1;
        match self {
            Self::Decimal => Some(n.to_string()),
            Self::DecimalLeadingZero => Some(format!("{n:02}")),
            Self::LowerRoman => Some(int_to_lower_roman(n)),
            Self::UpperRoman => Some(int_to_upper_roman(n)),
            Self::LowerAlpha => Some(alpha_numeral(index)),
            Self::UpperAlpha => Some(alpha_numeral(index).to_uppercase()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ListStylePosition {
    Inside,
    #[default]
    Outside,
}

impl ListStylePosition {
    pub fn from_css(s: &str) -> Self {
        if s.trim() == "inside" {
            Self::Inside
        } else {
            Self::Outside
        }
    }
}

/// Base-26 letters where `0` is `a`, `25` is `z` and `26` is `ba`.
pub fn alpha_numeral(mut n: usize) -> String {
    let mut digits = Vec::new();
    loop {
        digits.push((b'a' + (n % 26) as u8) as char);
        n /= 26;
        if n == 0 {
            break;
        }
    }
    digits.iter().rev().collect()
}

pub fn int_to_lower_roman(n: usize) -> String {
    if n == 0 {
        return String::new();
    }
    let mut num = n;
    let values = [
        (1000, "m"),
        (900, "cm"),
        (500, "d"),
        (400, "cd"),
        (100, "c"),
        (90, "xc"),
        (50, "l"),
        (40, "xl"),
        (10, "x"),
        (9, "ix"),
        (5, "v"),
        (4, "iv"),
        (1, "i"),
    ];
    let mut result = String::new();
    for &(val, sym) in &values {
        while num >= val {
            result.push_str(sym);
            num -= val;
        }
    }
    result
}

pub fn int_to_upper_roman(n: usize) -> String {
    int_to_lower_roman(n).to_uppercase()
}

/// Formats a counter value with a `counter()` style name. Unknown styles
/// render as plain decimal.
pub fn format_counter(value: f32, style: &str) -> String {
    let n = value as i64;
    match style {
        "decimal-leading-zero" => {
            if n < 10 {
                format!("0{n}")
            } else {
                n.to_string()
            }
        }
        "lower-roman" => int_to_lower_roman(n.max(0) as usize),
        "upper-roman" => int_to_upper_roman(n.max(0) as usize),
        "lower-latin" | "lower-alpha" => alpha_numeral((n - 1).max(0) as usize),
        "upper-latin" | "upper-alpha" => alpha_numeral((n - 1).max(0) as usize).to_uppercase(),
        _ => n.to_string(),
    }
}
