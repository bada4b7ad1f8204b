pub mod args;
pub mod client;
pub mod error;
pub mod html;
pub mod logging;
pub mod request;
pub mod response;
pub mod utils;

#[cfg(test)]
mod tests;

// Re-export main types for easy access
pub use args::Args;
pub use client::send_request;
pub use error::{Error, Result};
pub use request::{Body, Method, RequestSpec};
pub use response::{render_response, RenderOptions, ResponseView};
