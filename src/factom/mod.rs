//! Factom ledger integration
//!
//! This module provides the client and types for reading directory blocks, entry blocks and
//! entries from a factomd node.

/// JSON-RPC client for the factomd v2 API
mod client;
/// The ledger access trait the synchronizer is written against
mod source;
/// Type definitions for ledger data structures
mod types;

pub use client::FactomClient;
pub use source::LedgerSource;
pub use types::*;
