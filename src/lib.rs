//! Library crate for gacha-tally, exposing modules for the binary and integration tests.

pub mod cli;
pub mod clock;
pub mod config;
pub mod dao;
pub mod discord;
pub mod dto;
pub mod error;
pub mod export;
pub mod model;
pub mod routes;
pub mod services;
pub mod state;
