use crate::path::Path;
use drawdom_style::PageSize;
use drawdom_types::{Color, Matrix, Rect};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Element {
    Group(Group),
    Path(Path),
    Text(Text),
    Image(Image),
}

/// A run of text positioned by its host box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Text {
    pub content: String,
    pub rect: Rect,
    /// CSS font shorthand: style, variant, weight, size, family.
    pub font: String,
    pub fill: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Image {
    pub src: String,
    pub rect: Rect,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip: Option<Path>,
}

/// Hyperlink annotation covering a box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    pub url: String,
    pub rect: Rect,
}

/// Metadata attached to the root of an export.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInfo {
    pub multi_page: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paper_size: Option<PageSize>,
    /// Font face key (`family[|bold][|italic]`) to font URL.
    pub fonts: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub children: Vec<Element>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<Matrix>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip: Option<Path>,
    pub opacity: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<DocumentInfo>,
    /// Stacking key used while inserting siblings; not part of the output.
    #[serde(skip)]
    pub z_order: Option<f32>,
}

impl Default for Group {
    fn default() -> Self {
        Self {
            children: Vec::new(),
            transform: None,
            clip: None,
            opacity: 1.0,
            link: None,
            document: None,
            z_order: None,
        }
    }
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, element: impl Into<Element>) {
        self.children.push(element.into());
    }

    pub fn insert(&mut self, index: usize, element: impl Into<Element>) {
        let index = index.min(self.children.len());
        self.children.insert(index, element.into());
    }

    /// Every element below this group, depth first, in paint order.
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        for child in &self.children {
            out.push(child);
            if let Element::Group(g) = child {
                out.extend(g.descendants());
            }
        }
        out
    }

    pub fn texts(&self) -> Vec<&Text> {
        self.descendants()
            .into_iter()
            .filter_map(|e| match e {
                Element::Text(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn paths(&self) -> Vec<&Path> {
        self.descendants()
            .into_iter()
            .filter_map(|e| match e {
                Element::Path(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn images(&self) -> Vec<&Image> {
        self.descendants()
            .into_iter()
            .filter_map(|e| match e {
                Element::Image(i) => Some(i),
                _ => None,
            })
            .collect()
    }

    pub fn groups(&self) -> Vec<&Group> {
        self.descendants()
            .into_iter()
            .filter_map(|e| match e {
                Element::Group(g) => Some(g),
                _ => None,
            })
            .collect()
    }

    /// Child groups, for multi-page roots one per page.
    pub fn pages(&self) -> Vec<&Group> {
        self.children
            .iter()
            .filter_map(|e| match e {
                Element::Group(g) => Some(g),
                _ => None,
            })
            .collect()
    }
}

impl From<Group> for Element {
    fn from(g: Group) -> Self {
        Element::Group(g)
    }
}

impl From<Path> for Element {
    fn from(p: Path) -> Self {
        Element::Path(p)
    }
}

impl From<Text> for Element {
    fn from(t: Text) -> Self {
        Element::Text(t)
    }
}

impl From<Image> for Element {
    fn from(i: Image) -> Self {
        Element::Image(i)
    }
}
