pub mod auth;
pub mod config;
pub mod demo;
pub mod domain;
pub mod dto;
pub mod errors;
pub mod hal;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod service;
pub mod startup;

use crate::{auth::UserDirectory, hal::JokeModelAssembler, service::JokeService};

/// AppState holds shared resources for the web server.
pub struct AppState {
    pub service: JokeService,
    pub assembler: JokeModelAssembler,
    pub users: UserDirectory,
    /// Whether the `/jotd` demo routes are mounted.
    pub demo: bool,
}
