//! HTTP API handlers

pub mod health;
pub mod movies;

pub use health::health_routes;
pub use movies::movie_routes;
