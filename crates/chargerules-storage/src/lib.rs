pub mod lookup;
pub mod mem;
pub mod metrics;
pub mod snapshot;
pub mod traits;

pub use lookup::ChargeRuleLookup;
pub use mem::InMemoryStore;
pub use traits::*;
