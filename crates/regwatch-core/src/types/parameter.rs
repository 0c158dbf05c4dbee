//! Compliance parameters: licenses, permits, certificates and the like.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Fixed category enumeration for compliance parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ParameterCategory {
    License,
    Certificate,
    Permit,
    Insurance,
    Contract,
    Approval,
}

impl ParameterCategory {
    pub const ALL: [ParameterCategory; 6] = [
        Self::License,
        Self::Certificate,
        Self::Permit,
        Self::Insurance,
        Self::Contract,
        Self::Approval,
    ];

    /// Case-insensitive parse. `None` for anything outside the enumeration.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(raw))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::License => "License",
            Self::Certificate => "Certificate",
            Self::Permit => "Permit",
            Self::Insurance => "Insurance",
            Self::Contract => "Contract",
            Self::Approval => "Approval",
        }
    }
}

impl std::fmt::Display for ParameterCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tracked statutory parameter owned by one unit. Read-only to the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComplianceParameter {
    pub id: String,
    pub unit_id: String,
    /// Raw category as stored. May be outside [`ParameterCategory`].
    pub category: String,
    pub description: String,
    pub issue_date: NaiveDate,
    pub expiry_date: NaiveDate,
}

impl ComplianceParameter {
    pub fn category_kind(&self) -> Option<ParameterCategory> {
        ParameterCategory::parse(&self.category)
    }

    /// Signed whole days from `today` until expiry (negative once expired).
    pub fn days_until_expiry(&self, today: NaiveDate) -> i64 {
        (self.expiry_date - today).num_days()
    }

    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date < today
    }
}
