//! Client for the externally-managed event catalog. The core reads event
//! id, title and price; everything else about events lives upstream.

pub mod client;

pub use client::{CatalogClient, CatalogError, EventSummary, NewEvent};
