//! Idempotent reconciliation of a schema model against declared intent.
//!
//! [`Reconciler`] wraps any [`schemata_core::SchemaModel`] and exposes
//! create-if-absent, replace, drop-if-present and named foreign-key
//! operations, so callers never branch on whether something already exists.

mod reconciler;

pub use reconciler::Reconciler;
