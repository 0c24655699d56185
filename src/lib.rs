pub mod auth;
pub mod cli;
pub mod db;
pub mod entity;
pub mod error;
pub mod migration;
pub mod server;
pub mod web;
