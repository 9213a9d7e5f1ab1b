pub mod queries;
pub mod store;
pub mod types;

pub use queries::*;
pub use store::ReviewStore;
pub use types::*;
