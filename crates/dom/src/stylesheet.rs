//! The slice of the CSS object model the font registry needs.

/// A style sheet as exposed by the host. `rules` is `None` when the host
/// refuses access (cross-origin sheets).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleSheet {
    pub href: Option<String>,
    pub rules: Option<Vec<CssRule>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CssRule {
    /// `@import`; the imported sheet when it loaded.
    Import(Option<StyleSheet>),
    /// `@font-face` declarations as `(property, value)` pairs.
    FontFace(Vec<(String, String)>),
    Other,
}

impl StyleSheet {
    pub fn new(href: Option<&str>, rules: Vec<CssRule>) -> Self {
        Self {
            href: href.map(str::to_string),
            rules: Some(rules),
        }
    }

    pub fn inaccessible(href: Option<&str>) -> Self {
        Self {
            href: href.map(str::to_string),
            rules: None,
        }
    }
}

impl CssRule {
    pub fn font_face<I, K, V>(declarations: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        CssRule::FontFace(
            declarations
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
