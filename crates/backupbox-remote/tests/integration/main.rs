//! Integration tests for backupbox-remote
//!
//! Uses wiremock to simulate the remote object store and verifies the
//! metadata and upload requests end to end, including a full folder sync
//! through the engine.

mod common;

mod test_metadata;
mod test_sync_end_to_end;
mod test_upload;
