//! Core library for the `citypage` CLI.
//!
//! This crate defines:
//! - The city index built from the service's site list
//! - Per-city weather documents and path-based lookups into them
//! - Configuration of the feed URLs
//!
//! It is used by `citypage-cli`, but can also be reused by other binaries or services.
//!
//! ```no_run
//! # async fn run() -> Result<(), citypage_core::WeatherError> {
//! use citypage_core::{City, CityIndex};
//!
//! let index = CityIndex::load().await?;
//! if let Some(url) = index.data_url("Ottawa (Kanata - Orléans)") {
//!     let city = City::load(&url).await?;
//!     println!("{:?}", city.get_quantity("currentConditions/temperature"));
//! }
//! # Ok(())
//! # }
//! ```

pub mod city;
pub mod config;
pub mod document;
pub mod error;
pub mod index;
pub mod model;
pub mod source;

pub use city::City;
pub use config::{Config, ConfigError};
pub use document::{Document, Element};
pub use error::WeatherError;
pub use index::CityIndex;
pub use model::{CityRecord, Language};
pub use source::{DocumentSource, HttpSource};
