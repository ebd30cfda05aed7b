// Keyside Realty - API Core
//
// Backend for the Keyside Realty listings platform: agents publish property
// listings, buyers browse and filter them. Domain logic lives in domains/,
// the HTTP edge in server/.

pub mod common;
pub mod config;
pub mod domains;
pub mod server;

pub use config::*;
