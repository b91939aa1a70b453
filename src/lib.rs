pub mod cache;
pub mod catalog;
pub mod config;
pub mod demo;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod normalize;
pub mod output;
pub mod raw;
pub mod search;
pub mod store;
