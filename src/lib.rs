pub mod charts;
pub mod config;
pub mod dataset;
pub mod discovery;
pub mod errors;
pub mod export;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod stats;
