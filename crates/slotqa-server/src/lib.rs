//! REST API for the slot QA tracker
//!
//! The library half holds everything except the socket loop, so the route
//! table, configuration and handlers are usable from tests.

pub mod api;
pub mod config;
pub mod response;
pub mod router;
