//! Configuration module

mod site;

pub use site::AboutConfig;
pub use site::HighlightConfig;
pub use site::LinkConfig;
pub use site::OgConfig;
pub use site::SiteConfig;
