pub mod errors;

pub use errors::{MasonError, MasonResult};
