//! Helper functions shared by the page renderer and the commands

mod date;
mod url;

pub use date::*;
pub use url::*;
