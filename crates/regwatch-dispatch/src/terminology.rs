//! Category terminology used in notification copy.

use regwatch_core::types::ParameterCategory;

/// Wording for one parameter category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Terminology {
    pub title: &'static str,
    /// Verb phrase completing "Please ... the <title>".
    pub action: &'static str,
    pub description: &'static str,
}

pub const GENERIC: Terminology = Terminology {
    title: "Parameter",
    action: "review",
    description: "This compliance parameter needs attention before it lapses.",
};

const LICENSE: Terminology = Terminology {
    title: "License",
    action: "renew",
    description: "Operating on an expired license can lead to penalties or suspension of operations.",
};

const CERTIFICATE: Terminology = Terminology {
    title: "Certificate",
    action: "renew",
    description: "A valid certificate is required to demonstrate continued compliance with quality and safety standards.",
};

const PERMIT: Terminology = Terminology {
    title: "Permit",
    action: "renew",
    description: "Activities covered by an expired permit may no longer be carried out lawfully.",
};

const INSURANCE: Terminology = Terminology {
    title: "Insurance Policy",
    action: "renew",
    description: "A lapsed policy leaves the unit exposed to uncovered losses and liabilities.",
};

const CONTRACT: Terminology = Terminology {
    title: "Contract",
    action: "review and renew",
    description: "Services and obligations under an expired contract are no longer enforceable.",
};

const APPROVAL: Terminology = Terminology {
    title: "Approval",
    action: "re-apply for",
    description: "Regulatory approval must be current for the approved activity to continue.",
};

pub fn for_category(category: ParameterCategory) -> &'static Terminology {
    match category {
        ParameterCategory::License => &LICENSE,
        ParameterCategory::Certificate => &CERTIFICATE,
        ParameterCategory::Permit => &PERMIT,
        ParameterCategory::Insurance => &INSURANCE,
        ParameterCategory::Contract => &CONTRACT,
        ParameterCategory::Approval => &APPROVAL,
    }
}

/// Look up by raw stored category. Unknown or empty categories get [`GENERIC`].
pub fn lookup(raw_category: &str) -> &'static Terminology {
    ParameterCategory::parse(raw_category)
        .map(for_category)
        .unwrap_or(&GENERIC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_category_has_terminology() {
        for category in ParameterCategory::ALL {
            let term = for_category(category);
            assert!(!term.title.is_empty());
            assert!(!term.action.is_empty());
            assert_ne!(term, &GENERIC);
        }
    }

    #[test]
    fn test_unknown_category_falls_back() {
        assert_eq!(lookup("Lease"), &GENERIC);
        assert_eq!(lookup(""), &GENERIC);
        assert_eq!(lookup("insurance").title, "Insurance Policy");
    }
}
