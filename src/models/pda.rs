//! Program-derived address metadata

use serde::Serialize;
use serde_json::Value;

/// A PDA-backed account and the seeds it is derived from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PdaDescriptor {
    /// Name of the account holding the PDA
    pub name: String,
    /// Derivation seeds, in order
    pub seeds: Vec<Seed>,
}

/// One seed of a PDA derivation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Seed {
    /// Seed kind: `const`, `account` or `arg`
    pub kind: String,
    /// Constant value; absent for account and argument seeds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Referenced account or argument path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Seed {
    /// Name of the account this seed reads, for `account` seeds.
    ///
    /// Nested paths such as `owner.key` resolve to their first segment.
    pub fn referenced_account(&self) -> Option<&str> {
        if self.kind != "account" {
            return None;
        }
        self.path
            .as_deref()
            .and_then(|path| path.split('.').next())
            .filter(|name| !name.is_empty())
    }
}
