pub mod config;
pub mod error;
pub mod lp_planner;
pub mod policy;
pub mod program;
pub mod snapshot;
pub mod solver;

#[cfg(test)]
mod tests;
