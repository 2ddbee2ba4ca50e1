//! Domain models for medical record intake.

mod field;
mod record;
mod upload;
mod value;

pub use field::*;
pub use record::*;
pub use upload::*;
pub use value::*;
