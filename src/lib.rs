//! Road damage severity classification service.
//!
//! Users register and log in to obtain a bearer token, then upload road
//! photos which are classified as `minor`, `moderate` or `major` damage and
//! recorded in SQLite. The [`dataset`] module backs the `roadscan-dataset`
//! tool used to prepare training images.

pub mod app;
pub mod auth;
pub mod classifier;
pub mod config;
pub mod dataset;
pub mod db;
pub mod error;
pub mod images;
pub mod pages;
pub mod state;
pub mod storage;

pub use app::build_app;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
