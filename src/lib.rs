#![deny(warnings, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod analysis;
pub mod app;
pub mod catalog;
pub(crate) mod clients;
pub mod config;
pub mod coverage;
pub mod observability;
pub mod pipeline;
pub mod plan;
pub(crate) mod schema;
pub mod util;
