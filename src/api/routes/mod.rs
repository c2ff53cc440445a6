pub mod cycle;
pub mod endpoints;
pub mod health;
pub mod settings;
pub mod status;
