//! Admin identity gate.
//! Every inbound command passes through here before any handler runs.

use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

use crate::observability::metrics;

/// Fixed refusal sent to senders outside the admin set.
pub const REFUSAL: &str = "❌ Unauthorized access. You are not an admin.";

/// Error parsing the admin identity list.
#[derive(Debug, Error)]
pub enum AdminSetError {
    #[error("expected a JSON array of identities: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON array of identities")]
    NotArray,

    #[error("unsupported identity entry: {0}")]
    Entry(Value),
}

/// Frozen set of operator identities allowed to issue commands.
#[derive(Debug, Clone, Default)]
pub struct AdminSet {
    ids: Arc<HashSet<String>>,
}

impl AdminSet {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: Arc::new(ids.into_iter().map(Into::into).collect()),
        }
    }

    /// Parse a JSON array such as `["12345", 67890]`.
    ///
    /// Integer entries are accepted and stored in their decimal form, since
    /// chat platforms hand out numeric user ids.
    pub fn from_json(raw: &str) -> Result<Self, AdminSetError> {
        let value: Value = serde_json::from_str(raw)?;
        let Value::Array(entries) = value else {
            return Err(AdminSetError::NotArray);
        };

        let mut ids = HashSet::with_capacity(entries.len());
        for entry in entries {
            match entry {
                Value::String(s) => {
                    ids.insert(s);
                }
                Value::Number(n) if n.is_i64() || n.is_u64() => {
                    ids.insert(n.to_string());
                }
                other => return Err(AdminSetError::Entry(other)),
            }
        }
        Ok(Self { ids: Arc::new(ids) })
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.ids.contains(identity)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Binary admin check. Fails closed.
#[derive(Debug, Clone)]
pub struct AuthorizationGate {
    admins: AdminSet,
}

impl AuthorizationGate {
    pub fn new(admins: AdminSet) -> Self {
        Self { admins }
    }

    /// Returns true only for identities present in the admin set.
    pub fn verify(&self, identity: &str) -> bool {
        let allowed = self.admins.contains(identity);
        if !allowed {
            metrics::record_denied();
            tracing::warn!(identity = %identity, "Refusing command from non-admin");
        }
        allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_admin() {
        let gate = AuthorizationGate::new(AdminSet::new(["111", "222"]));
        assert!(gate.verify("111"));
        assert!(gate.verify("222"));
        assert!(!gate.verify("333"));
    }

    #[test]
    fn test_fails_closed() {
        let gate = AuthorizationGate::new(AdminSet::default());
        assert!(!gate.verify("111"));
        assert!(!gate.verify(""));

        // no wildcard semantics
        let gate = AuthorizationGate::new(AdminSet::new(["111"]));
        assert!(!gate.verify("*"));
        assert!(!gate.verify(" 111"));
    }

    #[test]
    fn test_from_json_mixed_entries() {
        let set = AdminSet::from_json(r#"["111", 222]"#).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("111"));
        assert!(set.contains("222"));
    }

    #[test]
    fn test_from_json_rejects_bad_shapes() {
        assert!(matches!(
            AdminSet::from_json(r#"{"a":1}"#),
            Err(AdminSetError::NotArray)
        ));
        assert!(matches!(
            AdminSet::from_json(r#"[1.5]"#),
            Err(AdminSetError::Entry(_))
        ));
        assert!(matches!(
            AdminSet::from_json("nope"),
            Err(AdminSetError::Json(_))
        ));
    }
}
