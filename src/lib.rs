//! pegnetd
//!
//! Follows the factom ledger, grades the oracle price records written at every height and stores
//! the result. The synchronizer in [`node`] drives everything; [`factom`] talks to factomd and
//! [`pegnet`] holds the domain pieces.

pub mod config;
pub mod factom;
pub mod node;
pub mod pegnet;
pub mod utils;
