pub mod cleaner;
pub mod config;
pub mod data_loading;
pub mod database;
pub mod dates;
pub mod entity;
pub mod error;
pub mod features;
pub mod normalizer;
pub mod raw;
pub mod retry;
pub mod review;
pub mod stemming;
pub mod store;
pub mod summary;
pub mod tokenization;
pub mod upload;
