//! Computed style snapshots and vendor-prefix aware property access.

use crate::parsers::parse_float;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Host engine family, used to pick a property-name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Vendor {
    Webkit,
    Moz,
    Opera,
    Ms,
    #[default]
    Unknown,
}

impl Vendor {
    pub fn prefix(self) -> Option<&'static str> {
        match self {
            Vendor::Webkit => Some("-webkit-"),
            Vendor::Moz => Some("-moz-"),
            Vendor::Opera => Some("-o-"),
            Vendor::Ms => Some("-ms-"),
            Vendor::Unknown => None,
        }
    }

    /// Engines whose range client rects include degenerate slivers at line
    /// boundaries.
    pub fn reports_sliver_rects(self) -> bool {
        matches!(self, Vendor::Webkit | Vendor::Ms)
    }
}

/// A snapshot of an element's (or pseudo-element's) computed style.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComputedStyle {
    props: BTreeMap<String, String>,
    vendor: Vendor,
}

impl ComputedStyle {
    pub fn new(vendor: Vendor) -> Self {
        Self {
            props: BTreeMap::new(),
            vendor,
        }
    }

    pub fn from_pairs<I, K, V>(vendor: Vendor, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            props: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            vendor,
        }
    }

    pub fn vendor(&self) -> Vendor {
        self.vendor
    }

    pub fn insert(&mut self, prop: impl Into<String>, value: impl Into<String>) {
        self.props.insert(prop.into(), value.into());
    }

    /// The property value, falling back to the vendor-prefixed name. Absent
    /// properties read as the empty string.
    pub fn get(&self, prop: &str) -> &str {
        if let Some(v) = self.props.get(prop) {
            return v;
        }
        if let Some(prefix) = self.vendor.prefix()
            && let Some(v) = self.props.get(&format!("{prefix}{prop}"))
        {
            return v;
        }
        ""
    }

    /// Leading numeric value of a property, `None` for `auto`, `none` or
    /// empty values.
    pub fn number(&self, prop: &str) -> Option<f32> {
        parse_float(self.get(prop))
    }

    /// Pixel value of a property, zero when it is not numeric.
    pub fn px(&self, prop: &str) -> f32 {
        self.number(prop).unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.props.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Serializes every property as `name: value;` declarations, suitable
    /// for an inline style attribute.
    pub fn css_text(&self) -> String {
        self.props
            .iter()
            .map(|(k, v)| format!("{k}: {v};"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Anything that accepts style declarations (an element's inline style).
pub trait DeclarationSink {
    fn set_property(&mut self, name: &str, value: &str, important: bool);
}

/// Sets a property and mirrors it under the host vendor prefix.
pub fn set_property_mirrored<S: DeclarationSink + ?Sized>(
    sink: &mut S,
    vendor: Vendor,
    prop: &str,
    value: &str,
    important: bool,
) {
    sink.set_property(prop, value, important);
    if let Some(prefix) = vendor.prefix() {
        sink.set_property(&format!("{prefix}{prop}"), value, important);
    }
}
