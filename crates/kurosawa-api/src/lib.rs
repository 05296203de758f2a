//! External movie-database clients.
//!
//! The [`traits::MovieSearchProvider`] trait is the service-agnostic
//! surface the rest of the workspace consumes; [`tmdb`] implements it
//! against The Movie Database v3 API.

pub mod tmdb;
pub mod traits;
