pub mod brands;
pub mod catalog;
pub mod classify;
pub mod cli;
pub mod config;
pub mod engine;
pub mod fields;
pub mod normalize;
pub mod parser;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod util;
