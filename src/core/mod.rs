pub mod error;
pub mod types;
pub mod validation;

pub use error::{PlacementError, Result};
pub use types::*;
pub use validation::{validate_config, validate_domain, validate_inputs};
