//! Where rejection reasons come from.

use std::{fs, path::Path};

use rand::seq::IndexedRandom;

use crate::infra::error::InfraError;

/// Supplies the next reason to show.
pub trait ReasonSource: Send + Sync {
    fn next_reason(&self) -> String;
}

/// Picks uniformly from a fixed, non-empty list.
#[derive(Debug, Clone)]
pub struct RandomReasons {
    reasons: Vec<String>,
}

impl RandomReasons {
    pub fn new(reasons: Vec<String>) -> Result<Self, InfraError> {
        if reasons.is_empty() {
            return Err(InfraError::reasons("reason list is empty"));
        }
        Ok(Self { reasons })
    }

    /// Load a JSON array of strings.
    pub fn from_file(path: &Path) -> Result<Self, InfraError> {
        let raw = fs::read_to_string(path).map_err(|err| {
            InfraError::reasons(format!("failed to read `{}`: {err}", path.display()))
        })?;
        let reasons: Vec<String> = serde_json::from_str(&raw).map_err(|err| {
            InfraError::reasons(format!("`{}` is not a JSON string array: {err}", path.display()))
        })?;
        Self::new(reasons)
    }

    pub fn len(&self) -> usize {
        self.reasons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }
}

impl ReasonSource for RandomReasons {
    fn next_reason(&self) -> String {
        self.reasons
            .choose(&mut rand::rng())
            .cloned()
            .unwrap_or_default()
    }
}

/// Always returns the same reason.
#[derive(Debug, Clone)]
pub struct FixedReason(String);

impl FixedReason {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

impl ReasonSource for FixedReason {
    fn next_reason(&self) -> String {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_is_rejected() {
        assert!(RandomReasons::new(Vec::new()).is_err());
    }

    #[test]
    fn picks_from_the_list() {
        let reasons = vec!["no".to_string(), "nope".to_string(), "not today".to_string()];
        let source = RandomReasons::new(reasons.clone()).expect("non-empty");
        for _ in 0..32 {
            assert!(reasons.contains(&source.next_reason()));
        }
    }

    #[test]
    fn loads_json_array_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("reasons.json");
        fs::write(&path, r#"["I’d rather not."]"#).expect("write");

        let source = RandomReasons::from_file(&path).expect("load");
        assert_eq!(source.len(), 1);
        assert_eq!(source.next_reason(), "I\u{2019}d rather not.");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("reasons.json");
        fs::write(&path, r#"{"reason": "no"}"#).expect("write");

        let err = RandomReasons::from_file(&path).expect_err("not an array");
        assert!(matches!(err, InfraError::Reasons { .. }));
    }

    #[test]
    fn fixed_reason_repeats() {
        let source = FixedReason::new("Because.");
        assert_eq!(source.next_reason(), "Because.");
        assert_eq!(source.next_reason(), "Because.");
    }
}
