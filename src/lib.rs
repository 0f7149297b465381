pub mod api;
pub mod citation;
pub mod config;
pub mod discovery;
pub mod frameworks;
pub mod segment;
pub mod state;
pub mod types;
pub mod ui;
pub mod util;

#[cfg(test)]
mod test_support;
