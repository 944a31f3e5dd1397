//! HTTP publisher for mdsite.
//!
//! Serves the contents of a fully built artifact store. Request paths map
//! directly onto store paths; directories serve their `index.html` or a
//! generated listing.

pub mod server;

pub use server::{router, Publisher, PublisherConfig, ServerError};
