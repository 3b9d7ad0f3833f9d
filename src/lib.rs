pub mod aggregator;
pub mod app;
pub mod cancel;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod executor;
pub mod output;
pub mod runner;
pub mod utils;

#[cfg(test)]
mod tests;
