//! Property listings domain: the search query compiler, the address
//! resolution cascade, and the listing model.

pub mod geocode;
pub mod models;
pub mod query;
