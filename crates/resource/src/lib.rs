//! Resources an export depends on besides the document itself: decoded
//! image dimensions and the `@font-face` table.
pub mod filesystem;
pub mod fonts;
pub mod images;

pub use drawdom_traits::InMemoryResourceProvider;
pub use filesystem::DirectoryResourceProvider;
pub use fonts::{FontFaces, collect_font_faces};
pub use images::{ImageCache, ImageLoadError, ImageState, decode_data_url, discover_image_urls};
