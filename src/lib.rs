pub mod api;
pub mod carousel;
pub mod cart;
pub mod comparison;
pub mod config;
pub mod error;
pub mod interpreter;
pub mod models;
pub mod redis;
pub mod search;
pub mod service;
pub mod transport;
