//! student-records - student record management over a uniqueness-checked CRUD API
//!
//! - `store`: persistent record store with unique indexes on registration number and email
//! - `http_server`: JSON API under `/api/students`
//! - `config`, `logging`, `cli`: the process shell around them

pub mod cli;
pub mod config;
pub mod http_server;
pub mod logging;
pub mod model;
pub mod store;
