//! HTTP plumbing shared by the GitHub and package-index clients.

pub mod client;
pub mod response;

pub use client::{HttpClient, HttpConfig, HttpError};
pub use response::{parse_json, ResponseError};
