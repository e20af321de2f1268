//! Change records emitted by [`Property::set`](super::Property::set).

use serde::Serialize;

/// Kind of change carried by an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// The stored value was replaced by a different one.
    Update,
}

/// Borrowed change record, alive only for one notification fan-out.
///
/// Serializes as `{"name": .., "type": "update", "old": .., "value": ..}`.
#[derive(Debug, Serialize)]
pub struct ChangeEvent<'a, T> {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub old: &'a T,
    pub value: &'a T,
}

impl<'a, T> ChangeEvent<'a, T> {
    pub fn update(name: &'static str, old: &'a T, value: &'a T) -> Self {
        Self {
            name,
            kind: ChangeKind::Update,
            old,
            value,
        }
    }

    /// Owned copy of this event for deferred delivery.
    pub fn to_pending(&self) -> PendingChange<T>
    where
        T: Clone,
    {
        PendingChange {
            name: self.name,
            kind: self.kind,
            old: self.old.clone(),
            value: self.value.clone(),
        }
    }
}

/// Owned change record, same wire shape as [`ChangeEvent`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingChange<T> {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub old: T,
    pub value: T,
}
