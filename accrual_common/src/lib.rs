mod subunits;

pub mod helpers;
pub mod luhn;
pub mod op;
mod secret;

pub use subunits::{to_decimal, to_subunits, SubunitConversionError, Subunits, SUBUNITS_PER_UNIT};
pub use secret::Secret;
