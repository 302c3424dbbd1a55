//! Core data models: roles, dispatch requests, container selection

mod request;
mod role;
mod selection;

pub use request::*;
pub use role::*;
pub use selection::*;
