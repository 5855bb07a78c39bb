pub mod combinations;
pub mod config;
pub mod errors;
pub mod model;
pub mod query;
pub mod vendors;

pub use combinations::*;
pub use config::RuleConfig;
pub use errors::*;
pub use model::*;
pub use query::*;
pub use vendors::vendors_from_routing;
