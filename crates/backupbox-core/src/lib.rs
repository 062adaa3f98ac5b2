//! BackupBox Core - Domain types, ports and configuration
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `FolderConfig`, `RemoteMetadata`, `SyncResult`, the
//!   background `Command`/`Event` protocol
//! - **Port definitions** - Traits for adapters: `IRemoteStore`, `IDirectory`
//! - **Configuration** - YAML configuration with validation and a builder
//!
//! # Architecture
//!
//! The domain module contains pure data and invariants with no I/O.
//! Ports define trait interfaces that adapter crates implement
//! (`backupbox-remote` for the HTTP store, `backupbox-sync` for the local
//! filesystem).

pub mod config;
pub mod domain;
pub mod ports;
