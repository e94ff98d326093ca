//! Common library for the social feed application
//!
//! This crate provides the infrastructure shared by the services: database
//! connectivity, error types, the mail job queue, blob storage and access
//! token handling.

pub mod database;
pub mod error;
pub mod jwt;
pub mod mail;
pub mod queue;
pub mod storage;
