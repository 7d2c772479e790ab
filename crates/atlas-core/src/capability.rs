//! Opaque authorization checks
//!
//! Authentication lives in the host; Atlas only asks whether an action is allowed.

/// An action performed against a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Read,
    Write,
    Delete,
    Restore,
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Delete => "delete",
            Self::Restore => "restore",
        }
    }
}

/// Capability check supplied by the host's auth layer
pub trait Capability: Send + Sync {
    fn allows(&self, action: Action, table: &str) -> bool;
}

/// Grants everything
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Capability for AllowAll {
    fn allows(&self, _action: Action, _table: &str) -> bool {
        true
    }
}

/// Grants [`Action::Read`] only
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOnly;

impl Capability for ReadOnly {
    fn allows(&self, action: Action, _table: &str) -> bool {
        action == Action::Read
    }
}

impl<F> Capability for F
where
    F: Fn(Action, &str) -> bool + Send + Sync,
{
    fn allows(&self, action: Action, table: &str) -> bool {
        self(action, table)
    }
}
