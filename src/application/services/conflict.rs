//! Identity conflict resolution
//!
//! Decides what happens when a newly completed object collides on key with
//! a live, different object.

use crate::domain::DomainObject;

/// Caller policy for same-key redefinitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OverridePolicy {
    /// Newer sources may replace older definitions
    pub allow_override: bool,
    /// Keep every same-key definition side by side (no conflict at all)
    pub retain_duplicates: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Drop the existing object and store the incoming one
    Replace,
    /// Keep the existing object silently
    KeepExisting,
    /// Keep the existing object and report a duplicate definition
    Duplicate,
    /// Store the incoming object next to the existing one
    Retain,
}

/// Resolve a collision between two different objects sharing a key.
///
/// With overriding enabled the incoming object wins only when it carries a
/// date strictly later than the existing one, or the existing one has none.
pub fn resolve(policy: OverridePolicy, existing: &DomainObject, incoming: &DomainObject) -> Resolution {
    if policy.retain_duplicates {
        return Resolution::Retain;
    }
    if !policy.allow_override {
        return Resolution::Duplicate;
    }
    match (incoming.source_date(), existing.source_date()) {
        (Some(new), Some(old)) if new > old => Resolution::Replace,
        (Some(_), None) => Resolution::Replace,
        _ => Resolution::KeepExisting,
    }
}
