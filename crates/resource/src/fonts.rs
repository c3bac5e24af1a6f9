//! `@font-face` discovery.
//!
//! Builds the table attached to the exported scene so a renderer can embed
//! the fonts the document uses. Only TrueType sources are recorded.

use drawdom_dom::{CssRule, StyleSheet};
use drawdom_style::{Separator, split_property};
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_till, take_until},
    character::complete::{char, multispace0, multispace1},
    combinator::opt,
    sequence::delimited,
};
use std::collections::BTreeMap;

/// `family[|bold][|italic]` → font URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FontFaces(BTreeMap<String, String>);

impl FontFaces {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.0
    }

    fn add(&mut self, sheet: &StyleSheet, families: &str, bold: bool, italic: bool, url: &str) {
        let url = resolve_url(sheet.href.as_deref(), url);
        for name in split_property(families, Separator::Comma) {
            let mut key = unquote(&name).to_string();
            if bold {
                key.push_str("|bold");
            }
            if italic {
                key.push_str("|italic");
            }
            log::trace!("font face {} -> {}", key, url);
            self.0.insert(key, url.clone());
        }
    }
}

/// Collects font faces from the given sheets, following `@import`s.
/// Sheets whose rules cannot be read are skipped.
pub fn collect_font_faces(sheets: &[StyleSheet]) -> FontFaces {
    let mut faces = FontFaces::default();
    for sheet in sheets {
        visit_sheet(sheet, &mut faces);
    }
    faces
}

fn visit_sheet(sheet: &StyleSheet, faces: &mut FontFaces) {
    let Some(rules) = &sheet.rules else {
        log::debug!(
            "skipping inaccessible style sheet {}",
            sheet.href.as_deref().unwrap_or("<inline>")
        );
        return;
    };
    for rule in rules {
        match rule {
            CssRule::Import(Some(imported)) => visit_sheet(imported, faces),
            CssRule::FontFace(decls) => {
                let prop = |name: &str| {
                    decls
                        .iter()
                        .find(|(k, _)| k.eq_ignore_ascii_case(name))
                        .map(|(_, v)| v.trim())
                        .unwrap_or("")
                };
                let Some(url) = find_font_url(prop("src")) else {
                    continue;
                };
                let bold = is_bold(prop("font-weight"));
                let italic = prop("font-style") == "italic";
                faces.add(sheet, prop("font-family"), bold, italic, &url);
            }
            CssRule::Import(None) | CssRule::Other => {}
        }
    }
}

fn is_bold(weight: &str) -> bool {
    if weight.eq_ignore_ascii_case("bold") {
        return true;
    }
    let bytes = weight.as_bytes();
    bytes.len() == 3 && (b'5'..=b'9').contains(&bytes[0]) && &bytes[1..] == b"00"
}

/// First TrueType source of a `src` descriptor.
fn find_font_url(src: &str) -> Option<String> {
    let entries = split_property(src, Separator::Comma);
    entries.iter().find_map(|entry| {
        let (rest, url) = url_token(entry).ok()?;
        let (_, format) = format_hint(rest).ok()?;
        let truetype = format.is_some_and(|f| f.eq_ignore_ascii_case("truetype"));
        (truetype || url.to_ascii_lowercase().ends_with(".ttf")).then(|| url.to_string())
    })
}

fn quoted(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('"'), take_till(|c: char| c == '"'), char('"')),
        delimited(char('\''), take_till(|c: char| c == '\''), char('\'')),
        take_until(")"),
    ))
    .parse(input)
}

fn url_token(input: &str) -> IResult<&str, &str> {
    let (input, _) = (multispace0, tag("url("), multispace0).parse(input)?;
    let (input, url) = quoted(input)?;
    let (input, _) = (multispace0, char(')')).parse(input)?;
    Ok((input, url.trim()))
}

fn format_hint(input: &str) -> IResult<&str, Option<&str>> {
    opt(delimited(
        (multispace1, tag("format("), multispace0),
        quoted,
        (multispace0, char(')')),
    ))
    .parse(input)
}

fn unquote(name: &str) -> &str {
    let name = name.trim();
    for q in ['"', '\''] {
        if let Some(inner) = name.strip_prefix(q).and_then(|n| n.strip_suffix(q)) {
            return inner;
        }
    }
    name
}

/// Resolves `url` against the directory of the sheet's `href` unless it is a
/// data URL, carries a scheme or is root-relative.
fn resolve_url(href: Option<&str>, url: &str) -> String {
    if url.len() >= 5 && url[..5].eq_ignore_ascii_case("data:") {
        return url.to_string();
    }
    let has_scheme = url
        .find("://")
        .is_some_and(|i| i > 0 && !url[..i].contains(['/', ':']));
    if has_scheme || url.starts_with('/') {
        return url.to_string();
    }
    let base = href.unwrap_or("");
    let dir = match base.rfind('/') {
        Some(i) => &base[..=i],
        None => "",
    };
    format!("{}{}", dir, url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(decls: &[(&str, &str)]) -> CssRule {
        CssRule::font_face(decls.iter().copied())
    }

    #[test]
    fn records_truetype_source_with_style_suffixes() {
        let sheet = StyleSheet::new(
            Some("http://x.org/css/site.css"),
            vec![
                face(&[
                    ("font-family", "\"DejaVu Sans\""),
                    ("src", "url(fonts/dv.woff) format('woff'), url(\"fonts/dv.ttf\") format(\"truetype\")"),
                ]),
                face(&[
                    ("font-family", "'DejaVu Sans'"),
                    ("font-weight", "700"),
                    ("font-style", "italic"),
                    ("src", "url(fonts/dv-bi.ttf)"),
                ]),
            ],
        );
        let faces = collect_font_faces(&[sheet]);
        assert_eq!(faces.get("DejaVu Sans"), Some("http://x.org/css/fonts/dv.ttf"));
        assert_eq!(
            faces.get("DejaVu Sans|bold|italic"),
            Some("http://x.org/css/fonts/dv-bi.ttf")
        );
        assert_eq!(faces.len(), 2);
    }

    #[test]
    fn follows_imports_and_skips_inaccessible_sheets() {
        let imported = StyleSheet::new(
            Some("/assets/fonts.css"),
            vec![face(&[("font-family", "Mono"), ("src", "url(mono.ttf)")])],
        );
        let sheets = vec![
            StyleSheet::inaccessible(Some("http://cdn.example/other.css")),
            StyleSheet::new(None, vec![CssRule::Import(Some(imported)), CssRule::Other]),
        ];
        let faces = collect_font_faces(&sheets);
        assert_eq!(faces.get("Mono"), Some("/assets/mono.ttf"));
    }

    #[test]
    fn ignores_faces_without_truetype_source() {
        let sheet = StyleSheet::new(
            None,
            vec![face(&[("font-family", "Web"), ("src", "url(web.woff2) format('woff2')")])],
        );
        assert!(collect_font_faces(&[sheet]).is_empty());
    }

    #[test]
    fn bold_weights() {
        assert!(is_bold("bold"));
        assert!(is_bold("500"));
        assert!(is_bold("900"));
        assert!(!is_bold("400"));
        assert!(!is_bold("normal"));
        assert!(!is_bold("5000"));
    }

    #[test]
    fn absolute_and_data_urls_are_kept() {
        assert_eq!(resolve_url(Some("http://a/b/c.css"), "https://f/x.ttf"), "https://f/x.ttf");
        assert_eq!(resolve_url(Some("http://a/b/c.css"), "/x.ttf"), "/x.ttf");
        assert_eq!(
            resolve_url(Some("http://a/b/c.css"), "data:font/ttf;base64,AAA"),
            "data:font/ttf;base64,AAA"
        );
        assert_eq!(resolve_url(Some("http://a/b/c.css"), "x.ttf"), "http://a/b/x.ttf");
        assert_eq!(resolve_url(None, "x.ttf"), "x.ttf");
    }
}
