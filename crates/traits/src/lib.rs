//! The seams between the exporter and its environment: the layout host that
//! owns styles and geometry, and the provider that fetches image bytes.
pub mod host;
pub mod resource;

pub use host::{HostError, LayoutHost, PseudoElement, TextRange};
pub use resource::{InMemoryResourceProvider, ResourceError, ResourceProvider, SharedResourceData};
