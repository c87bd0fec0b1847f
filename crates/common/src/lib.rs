//! Common utilities and shared types for jardin.
//!
//! This crate provides foundational components used across all jardin crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **Form fields**: Lenient deserializers for multipart text values
//! - **Storage**: Media upload backends (local, Cloudinary) via [`MediaStore`]
//! - **Tokens**: API token keys via [`TokenGenerator`]
//!
//! # Example
//!
//! ```no_run
//! use jardin_common::{Config, TokenGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let key = TokenGenerator::new().generate();
//!     println!("{} issued {}", config.server.url, key);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod form;
pub mod storage;
pub mod token;

pub use config::Config;
pub use error::{AppError, AppResult, FieldErrors};
pub use storage::{
    CloudinaryStorage, LocalStorage, MediaStore, StoredMedia, generate_storage_key,
    media_store_from_config,
};
pub use token::TokenGenerator;
