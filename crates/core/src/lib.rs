//! Core business logic for jardin.

pub mod policy;
pub mod representation;
pub mod services;
pub mod upload;

pub use policy::{Access, Caller, Resource, authorize, visibility};
pub use representation::Origin;
pub use services::*;
pub use upload::FileUpload;
