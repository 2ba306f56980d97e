pub mod config;
pub mod domain_search;
pub mod installer;
pub mod plugin;
pub mod screen;
pub mod signup_steps;
pub mod trigger;
