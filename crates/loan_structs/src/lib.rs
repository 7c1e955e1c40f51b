//! Common structs for loan applications shared across crates.

mod applicant;
mod schema;
mod status;

pub use applicant::*;
pub use schema::*;
pub use status::*;
