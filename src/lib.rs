/// Deterministic one-way derivation of storage keys and account numbers.
pub mod identity;

/// Money amounts, printed and persisted with the currency prefix.
pub mod money;

/// Account record, its ledger, and the rules deciding which operations are
/// accepted. Records change only by applying ledger entries.
pub mod account;

/// Operator-facing operation names and the account commands built from them.
pub mod command;

/// Key-value storage of account records, plus file backed and in memory
/// implementations.
pub mod store;

/// Runs account operations and persists every accepted one before returning.
pub mod engine;

/// Command-line configuration.
pub mod config;

/// Interactive session shell. Lives in the library so integration tests can
/// script it.
pub mod bin_utils;
