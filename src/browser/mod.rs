// src/browser/mod.rs
pub mod http;
pub mod session;

pub use http::HttpSession;
pub use session::PageSession;
