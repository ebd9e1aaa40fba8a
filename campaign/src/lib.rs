//! Production runs of eyeball products.
//!
//! A run covers the chips of every exposure in an exposure list. This crate
//! knows where run files live ([`run_store`]), what a run is configured with
//! ([`run_config`]), which chip inputs exist ([`exposures`]), how to split
//! the work into batch jobs ([`scripts`]) and how to index the finished
//! products ([`index_db`]).

pub mod error;
pub mod exposures;
pub mod index_db;
pub mod run_config;
pub mod run_store;
pub mod scripts;

pub use error::{CampaignError, Result};
pub use run_config::{load_run_explist, RunConfig, RunExposure};
pub use run_store::RunStore;
