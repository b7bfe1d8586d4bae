//! Odoo record source
//!
//! JSON-RPC client implementing [`RecordSource`](crate::adapters::traits::RecordSource).

pub mod client;
pub mod models;

pub use client::OdooClient;
