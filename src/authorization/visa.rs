/// Answers yes/no questions about one set of permissions.
///
/// Aggregates only ever see this trait. The predicate carries the business
/// rule; the visa supplies the permissions it is evaluated against.
pub trait Visa<P>: Send + Sync {
    fn determine_if(&self, predicate: &dyn Fn(&P) -> bool) -> bool;
}

/// A visa closed over a fixed permission value.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotVisa<P> {
    permissions: P,
}

impl<P> SnapshotVisa<P> {
    pub fn new(permissions: P) -> Self {
        SnapshotVisa { permissions }
    }
}

impl<P: Send + Sync> Visa<P> for SnapshotVisa<P> {
    fn determine_if(&self, predicate: &dyn Fn(&P) -> bool) -> bool {
        predicate(&self.permissions)
    }
}
