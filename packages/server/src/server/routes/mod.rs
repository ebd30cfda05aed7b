// HTTP routes
pub mod health;
pub mod properties;

pub use health::*;
pub use properties::*;
