//! Spending-category registry
//!
//! Categories are a fixed, validated set rather than free strings so the
//! classifier output and the statistics grouping can never drift apart.
//! "미분류" (uncategorized) is a reserved sentinel: it is what statistics
//! call the NULL-category bucket and it can never be the target of a
//! keyword mapping.

use crate::error::{Error, Result};

/// Sentinel shown for transactions no mapping matches. Stored as NULL.
pub const UNCATEGORIZED: &str = "미분류";

/// The known category set, in display order.
pub const KNOWN_CATEGORIES: &[&str] = &[
    "식비",
    "교통비",
    "주거생활비",
    "미용비",
    "건강관리비",
    "사회생활비",
    "문화생활비",
    "뚜이",
];

/// Check whether a category is in the known set (the sentinel is not).
pub fn is_known(category: &str) -> bool {
    KNOWN_CATEGORIES.contains(&category)
}

/// Validate a category for use in a mapping or a manual assignment.
///
/// Rejects unknown categories and the reserved "미분류" sentinel.
pub fn validate(category: &str) -> Result<()> {
    if category == UNCATEGORIZED {
        return Err(Error::Validation(format!(
            "'{}' is reserved and cannot be assigned",
            UNCATEGORIZED
        )));
    }
    if !is_known(category) {
        return Err(Error::Validation(format!(
            "Unknown category: {}",
            category
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_categories() {
        assert!(is_known("식비"));
        assert!(is_known("교통비"));
        assert!(!is_known("미분류"));
        assert!(!is_known("도박"));
    }

    #[test]
    fn test_validate_rejects_sentinel() {
        assert!(validate("식비").is_ok());
        assert!(validate(UNCATEGORIZED).is_err());
        assert!(validate("").is_err());
    }
}
