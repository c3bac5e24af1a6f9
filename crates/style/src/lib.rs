//! CSS value handling for the exporter: computed-style access, value
//! parsers, background descriptors, list numerals and paper geometry.
pub mod accessor;
pub mod background;
pub mod content;
pub mod dimension;
pub mod list;
pub mod parsers;

pub use accessor::{ComputedStyle, DeclarationSink, Vendor, set_property_mirrored};
pub use background::{BackgroundImage, BackgroundParser, ColorStop, LinearGradientSpec, StopOffset};
pub use content::{ContentToken, parse_content};
pub use dimension::{Margins, PageSize};
pub use list::{ListStylePosition, ListStyleType};
pub use parsers::{Separator, StyleParseError, parse_color, parse_float, split_property};
