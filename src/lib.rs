pub mod artifacts;
pub mod config;
pub mod domain;
pub mod ensemble;
pub mod error;
pub mod features;
pub mod logging;
pub mod normalizer;
pub mod output;
pub mod provider;
pub mod scoring;
