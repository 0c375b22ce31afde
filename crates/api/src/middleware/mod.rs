//! API middleware

pub mod client_ip;
pub mod rate_limit;
pub mod security_headers;

pub use client_ip::extract_ip_from_headers;
pub use rate_limit::{RateLimitLayer, rate_limit};
pub use security_headers::security_headers;
