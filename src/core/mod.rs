pub mod errors;
pub mod models;

pub use errors::GrabError;
pub use models::{ FieldMapping, FieldRef, ResultRow };
