pub mod guidance;
pub mod models;
