//! Trip planner: per-user trip lists kept in a local key-value store, with a
//! small web front end for adding, editing and summarising trips.

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
