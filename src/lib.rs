//! Trailer lookup service for movies and TV shows.
//!
//! Requests for `/trailer/{mediaType}/{id}` are answered from a tiered cache
//! or, on a miss, by fetching the candidate videos from TMDB and picking the
//! best one with [`trailer::resolve`].

pub mod cache;
pub mod config;
pub mod error;
pub mod proxy;
pub mod service;
pub mod trailer;
pub mod upstream;

pub use error::{Error, Result};
