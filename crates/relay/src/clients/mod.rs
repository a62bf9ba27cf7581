//! Collaborators of the relay path
//!
//! - [`device`] - device transport trait and the HTTP bridge client
//! - [`blob`] - blob storage trait, in-memory and HTTP implementations

pub mod blob;
pub mod device;
