//! Utility functions and helpers.

pub mod charset;
pub mod http;
pub mod url;

pub use self::charset::decode_html;
pub use self::url::{absolute_url, host, resolve};
