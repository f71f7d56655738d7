//! Terminal client for the Ayurvati recommendation service.

pub mod bus;
pub mod chat;
pub mod config;
pub mod entity;
pub mod error;
pub mod history;
pub mod identity;
pub mod interface;
pub mod session;
pub mod transport;
