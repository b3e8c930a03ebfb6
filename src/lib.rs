pub mod configuration;
pub mod dal;
pub mod domain;
pub mod selectors;
pub mod services;
