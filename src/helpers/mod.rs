//! Helper functions shared by the renderer and the generator
//!
//! URL and route construction, date formatting and small text utilities.

mod date;
mod html;
mod url;

pub use date::*;
pub use html::*;
pub use url::*;
