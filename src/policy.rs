//! Backend selection and failure handling, as one pure decision procedure.
//!
//! Every facade accessor asks the same two questions: which backend goes
//! first, and what happens when the remote side fails. Both answers depend
//! only on the mode flag and the kind of operation, so they live here rather
//! than being repeated per resource.
//!
//! | Mode | Operation | First backend | On remote failure |
//! |------|-----------|---------------|-------------------|
//! | `local` | read, news/prompt write | local | n/a |
//! | `api` | read | remote | absorb, serve local |
//! | `api` | news/prompt write | remote | absorb, apply locally |
//! | any | sheet write | remote | surface the error |
//!
//! Two invariants follow: `RemoteOnlyWrite` never routes to [`Backend::Local`],
//! and only `RemoteOnlyWrite` ever gets [`Recovery::Surface`].

use crate::models::DataMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Local,
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Fetch of any resource.
    Read,
    /// Write with a local equivalent (news updates, prompt saves).
    MirroredWrite,
    /// Write with no safe local merge (remote sheet saves).
    RemoteOnlyWrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Serve or apply the operation locally and report success.
    UseLocal,
    /// Hand the error to the caller.
    Surface,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackPolicy;

impl FallbackPolicy {
    /// Which backend an operation starts on.
    pub fn route(&self, mode: DataMode, op: Operation) -> Backend {
        match (mode, op) {
            // Remote-only writes are explicit user actions; the mode does not veto them.
            (_, Operation::RemoteOnlyWrite) => Backend::Remote,
            (DataMode::Local, _) => Backend::Local,
            (DataMode::Api, _) => Backend::Remote,
        }
    }

    /// What to do once the remote attempt has failed.
    pub fn on_remote_failure(&self, op: Operation) -> Recovery {
        match op {
            Operation::Read | Operation::MirroredWrite => Recovery::UseLocal,
            Operation::RemoteOnlyWrite => Recovery::Surface,
        }
    }
}
