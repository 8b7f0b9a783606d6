pub mod app;
pub mod cli;
pub mod config;
mod components;
mod views;
