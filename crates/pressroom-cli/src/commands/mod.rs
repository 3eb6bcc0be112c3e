pub mod brew;
pub mod clips;
pub mod config;
pub mod settings;
