//! BackupBox IPC - D-Bus bridge
//!
//! The daemon exports one object on the session bus; every command of the
//! background protocol is a method call and every event is broadcast as the
//! `Event` signal carrying the event's JSON form.
//!
//! # Interface
//! - `org.backupbox.Daemon.Scheduler` at `/org/backupbox/Daemon`

pub mod client;
pub mod service;

/// D-Bus well-known name of the daemon
pub const DBUS_NAME: &str = "org.backupbox.Daemon";

/// D-Bus object path of the daemon
pub const DBUS_PATH: &str = "/org/backupbox/Daemon";

/// D-Bus interface name of the scheduler object
pub const DBUS_INTERFACE: &str = "org.backupbox.Daemon.Scheduler";
