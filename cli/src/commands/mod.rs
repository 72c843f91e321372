pub mod config;
pub mod inspect;
pub mod models;
pub mod predict;
pub mod serve;
