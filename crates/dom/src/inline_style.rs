use drawdom_style::{DeclarationSink, Separator, split_property};

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub value: String,
    pub important: bool,
}

/// An element's `style` attribute as an ordered declaration list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlineStyle {
    declarations: Vec<Declaration>,
}

impl InlineStyle {
    pub fn parse(css_text: &str) -> Self {
        let mut style = InlineStyle::default();
        for piece in split_property(css_text, Separator::Semicolon) {
            let Some((name, value)) = piece.split_once(':') else {
                continue;
            };
            let name = name.trim().to_ascii_lowercase();
            let mut value = value.trim();
            let mut important = false;
            if let Some(stripped) = value.strip_suffix("!important") {
                value = stripped.trim_end();
                important = true;
            }
            if !name.is_empty() {
                style.set(&name, value, important);
            }
        }
        style
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.value.as_str())
    }

    pub fn is_important(&self, name: &str) -> bool {
        self.declarations
            .iter()
            .any(|d| d.name == name && d.important)
    }

    pub fn set(&mut self, name: &str, value: &str, important: bool) {
        match self.declarations.iter_mut().find(|d| d.name == name) {
            Some(existing) => {
                existing.value = value.to_string();
                existing.important = important;
            }
            None => self.declarations.push(Declaration {
                name: name.to_string(),
                value: value.to_string(),
                important,
            }),
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.declarations.retain(|d| d.name != name);
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter()
    }

    pub fn css_text(&self) -> String {
        self.declarations
            .iter()
            .map(|d| {
                if d.important {
                    format!("{}: {} !important;", d.name, d.value)
                } else {
                    format!("{}: {};", d.name, d.value)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl DeclarationSink for InlineStyle {
    fn set_property(&mut self, name: &str, value: &str, important: bool) {
        self.set(name, value, important);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_serialize() {
        let style = InlineStyle::parse("color: red; background-image: url(a;b.png); width:10px !important");
        assert_eq!(style.get("color"), Some("red"));
        assert_eq!(style.get("background-image"), Some("url(a;b.png)"));
        assert_eq!(style.get("width"), Some("10px"));
        assert!(style.is_important("width"));
        assert_eq!(
            style.css_text(),
            "color: red; background-image: url(a;b.png); width: 10px !important;"
        );
    }

    #[test]
    fn set_replaces_in_place() {
        let mut style = InlineStyle::parse("a: 1; b: 2");
        style.set("a", "3", false);
        style.remove("b");
        assert_eq!(style.css_text(), "a: 3;");
    }
}
