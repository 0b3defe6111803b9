// ============================================================================
// Write Batch - Atomic unit of conditional mutations
// ============================================================================
//
// A batch carries an optional precondition on a single key and an ordered
// list of mutations. Backends apply it all-or-nothing: when the
// precondition does not hold, no mutation is applied.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    KeyAbsent(String),
    KeyPresent(String),
}

impl Precondition {
    pub fn key(&self) -> &str {
        match self {
            Precondition::KeyAbsent(key) | Precondition::KeyPresent(key) => key,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Put { key: String, value: Vec<u8> },
    Delete { key: String },
    SetAdd { set: String, member: String },
    SetRemove { set: String, member: String },
}

impl Mutation {
    /// The key this mutation writes to.
    pub fn target(&self) -> &str {
        match self {
            Mutation::Put { key, .. } | Mutation::Delete { key } => key,
            Mutation::SetAdd { set, .. } | Mutation::SetRemove { set, .. } => set,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Applied,
    PreconditionFailed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    precondition: Option<Precondition>,
    mutations: Vec<Mutation>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require_absent(mut self, key: impl Into<String>) -> Self {
        self.precondition = Some(Precondition::KeyAbsent(key.into()));
        self
    }

    pub fn require_present(mut self, key: impl Into<String>) -> Self {
        self.precondition = Some(Precondition::KeyPresent(key.into()));
        self
    }

    pub fn put(&mut self, key: impl Into<String>, value: Vec<u8>) -> &mut Self {
        self.mutations.push(Mutation::Put { key: key.into(), value });
        self
    }

    pub fn delete(&mut self, key: impl Into<String>) -> &mut Self {
        self.mutations.push(Mutation::Delete { key: key.into() });
        self
    }

    pub fn set_add(&mut self, set: impl Into<String>, member: impl Into<String>) -> &mut Self {
        self.mutations.push(Mutation::SetAdd {
            set: set.into(),
            member: member.into(),
        });
        self
    }

    pub fn set_remove(&mut self, set: impl Into<String>, member: impl Into<String>) -> &mut Self {
        self.mutations.push(Mutation::SetRemove {
            set: set.into(),
            member: member.into(),
        });
        self
    }

    pub fn precondition(&self) -> Option<&Precondition> {
        self.precondition.as_ref()
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_keeps_mutation_order() {
        let mut batch = WriteBatch::new().require_absent("order:1");
        batch
            .put("order:1", b"{}".to_vec())
            .set_add("orders", "order:1");

        assert_eq!(
            batch.precondition(),
            Some(&Precondition::KeyAbsent("order:1".to_string()))
        );
        assert_eq!(batch.mutations().len(), 2);
        assert_eq!(batch.mutations()[0].target(), "order:1");
        assert_eq!(batch.mutations()[1].target(), "orders");
    }

    #[test]
    fn test_new_batch_is_empty_and_unconditional() {
        let batch = WriteBatch::new();
        assert!(batch.is_empty());
        assert!(batch.precondition().is_none());
    }

    #[test]
    fn test_last_precondition_wins() {
        let batch = WriteBatch::new()
            .require_absent("order:1")
            .require_present("order:2");
        assert_eq!(batch.precondition().map(|p| p.key()), Some("order:2"));
    }
}
