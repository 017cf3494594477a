pub mod config;
pub mod discovery;
pub mod domain;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod schema;
pub mod writer;
