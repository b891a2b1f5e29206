pub mod config;
pub mod error;
pub mod monte_carlo;
