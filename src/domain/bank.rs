use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BankId(pub u32);

impl fmt::Display for BankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A lender from the external bank catalog. Read-only to this engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    pub id: BankId,
    pub name: String,
    /// Secondary display name, when the catalog carries one.
    pub name_en: Option<String>,
    pub code: String,
    pub active: bool,
}

impl Bank {
    pub fn new(id: u32, code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: BankId(id),
            name: name.into(),
            name_en: None,
            code: code.into(),
            active: true,
        }
    }
}
