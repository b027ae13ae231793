// Library target shared by the `ratingscope` binary, the sample-data
// generator, integration tests and criterion benchmarks.

pub mod config;
pub mod engine;
pub mod game;
pub mod store;
