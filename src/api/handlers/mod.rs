//! API handlers for Portero.
//!
//! Route handlers grouped by surface: the auth flows, user management, the
//! WhatsApp relay and the service endpoints (banner and health).

pub mod auth;
pub mod error;
pub mod health;
pub mod root;
pub mod users;
pub mod whatsapp;
