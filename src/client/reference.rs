//! Funding reference generation.

use chrono::Utc;
use rand::Rng;
use rand::distributions::Alphanumeric;

const REFERENCE_PREFIX: &str = "wallet_funding";
const SUFFIX_LEN: usize = 9;

/// Where a funding attempt was started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundingEntry {
    /// Authenticated dashboard widget
    Dashboard,
    /// Redirect completion page
    Redirect,
}

/// A fresh reference for one funding attempt.
///
/// Dashboard references carry a random suffix so two attempts in the same
/// millisecond never collide.
#[must_use]
pub fn generate_reference(entry: FundingEntry) -> String {
    let millis = Utc::now().timestamp_millis();
    match entry {
        FundingEntry::Dashboard => {
            let suffix: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(SUFFIX_LEN)
                .map(|b| char::from(b).to_ascii_lowercase())
                .collect();
            format!("{}_{}_{}", REFERENCE_PREFIX, millis, suffix)
        }
        FundingEntry::Redirect => format!("{}_{}", REFERENCE_PREFIX, millis),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_reference_shape() {
        let reference = generate_reference(FundingEntry::Dashboard);
        let parts: Vec<&str> = reference.split('_').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "wallet");
        assert_eq!(parts[1], "funding");
        assert!(parts[2].parse::<i64>().is_ok());
        assert_eq!(parts[3].len(), SUFFIX_LEN);
        assert!(parts[3].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_redirect_reference_has_no_suffix() {
        let reference = generate_reference(FundingEntry::Redirect);
        let millis = reference
            .strip_prefix("wallet_funding_")
            .expect("prefix present");
        assert!(millis.parse::<i64>().is_ok());
    }

    #[test]
    fn test_dashboard_references_are_unique() {
        let a = generate_reference(FundingEntry::Dashboard);
        let b = generate_reference(FundingEntry::Dashboard);
        assert_ne!(a, b);
        assert!(a.len() <= 100);
    }
}
