use serde::{Deserialize, Serialize};

use crate::contract::ValidationError;

/// Storage tier of a managed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableClass {
    Standard,
    StandardInfrequentAccess,
}

impl TableClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "STANDARD",
            Self::StandardInfrequentAccess => "STANDARD_INFREQUENT_ACCESS",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "STANDARD" => Some(Self::Standard),
            "STANDARD_INFREQUENT_ACCESS" => Some(Self::StandardInfrequentAccess),
            _ => None,
        }
    }
}

impl std::fmt::Display for TableClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalizes a free-text recommendation into a [`TableClass`].
///
/// The last whitespace-delimited token is upper-cased and a trailing `_IA`
/// is expanded to `_INFREQUENT_ACCESS`, so `"Candidate for Standard_IA"`
/// becomes `STANDARD_INFREQUENT_ACCESS`. Any value outside the two-token
/// domain is a validation failure. Idempotent on already-normalized input.
pub fn normalize_recommendation(raw: &str) -> Result<TableClass, ValidationError> {
    let Some(last_token) = raw.split_whitespace().last() else {
        return Err(ValidationError::new("Recommendation text is empty"));
    };

    let mut token = last_token.to_ascii_uppercase();
    if let Some(prefix) = token.strip_suffix("_IA") {
        token = format!("{prefix}_INFREQUENT_ACCESS");
    }

    TableClass::from_token(&token).ok_or_else(|| {
        ValidationError::new(format!(
            "Unrecognized recommendation '{raw}' (normalized to '{token}')"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_standard_ia_suffix_to_infrequent_access() {
        let class = normalize_recommendation("Candidate for Standard_IA")
            .expect("recommendation should normalize");

        assert_eq!(class, TableClass::StandardInfrequentAccess);
        assert_eq!(class.as_str(), "STANDARD_INFREQUENT_ACCESS");
    }

    #[test]
    fn maps_standard_candidate() {
        let class = normalize_recommendation("Candidate for Standard")
            .expect("recommendation should normalize");

        assert_eq!(class, TableClass::Standard);
    }

    #[test]
    fn is_idempotent_on_normalized_tokens() {
        for class in [TableClass::Standard, TableClass::StandardInfrequentAccess] {
            let renormalized = normalize_recommendation(class.as_str())
                .expect("normalized token should renormalize");
            assert_eq!(renormalized, class);
        }
    }

    #[test]
    fn accepts_lowercase_input() {
        let class =
            normalize_recommendation("standard_ia").expect("recommendation should normalize");

        assert_eq!(class, TableClass::StandardInfrequentAccess);
    }

    #[test]
    fn rejects_unmapped_recommendation() {
        let error = normalize_recommendation("Candidate for Glacier")
            .expect_err("unknown tier should fail");

        assert!(error.message().contains("GLACIER"));
    }

    #[test]
    fn rejects_empty_recommendation() {
        let error = normalize_recommendation("   ").expect_err("empty text should fail");

        assert_eq!(error.message(), "Recommendation text is empty");
    }
}
