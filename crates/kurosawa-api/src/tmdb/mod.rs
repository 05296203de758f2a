//! The Movie Database (TMDB) v3 client.

mod client;
mod error;
mod types;

pub use client::TmdbClient;
pub use error::TmdbError;
