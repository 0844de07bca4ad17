//! Decoded NVP responses and the acknowledgement protocol.

use std::collections::BTreeMap;

use crate::consts;

/// A decoded `key=value&...` response. Duplicate keys collapse
/// last-write-wins, matching request-side map semantics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NvpResponse(BTreeMap<String, String>);

impl NvpResponse {
    pub(crate) fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self(pairs.into_iter().collect())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn ack(&self) -> Option<&str> {
        self.get(consts::ACK)
    }

    /// True only for the literal `ACK=Success`. Any other value, or a
    /// missing `ACK`, is non-success.
    pub fn is_success(&self) -> bool {
        self.ack() == Some(consts::SUCCESS)
    }

    /// Conventional long-form error message (`L_LONGMESSAGE0`).
    pub fn long_message(&self) -> Option<&str> {
        self.get(consts::LONG_MESSAGE)
    }

    pub fn token(&self) -> Option<&str> {
        self.get(consts::TOKEN)
    }

    /// Narrows a successful response down to one field. The full response
    /// comes back untouched when the acknowledgement is non-success, absent,
    /// or the expected field is missing despite a success acknowledgement.
    pub fn narrow(self, name: &str) -> Outcome<String> {
        if self.is_success() {
            if let Some(value) = self.get(name) {
                return Outcome::Success(value.to_owned());
            }
        }
        Outcome::Other(self)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

/// Classification of an operation's result.
///
/// `Other` is an expected outcome path, not an error: callers inspect the
/// raw response for `ACK`, error codes and `L_LONGMESSAGE0`.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    Other(NvpResponse),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn success(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Other(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(pairs: &[(&str, &str)]) -> NvpResponse {
        NvpResponse::from_pairs(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
        )
    }

    #[test]
    fn narrow_extracts_value_on_success() {
        let outcome = response(&[("ACK", "Success"), ("TRANSACTIONID", "T1")]).narrow("TRANSACTIONID");
        assert_eq!(outcome.success().as_deref(), Some("T1"));
    }

    #[test]
    fn narrow_returns_full_response_on_failure_ack() {
        let raw = response(&[("ACK", "Failure"), ("L_LONGMESSAGE0", "declined")]);
        match raw.clone().narrow("TRANSACTIONID") {
            Outcome::Other(got) => {
                assert_eq!(got, raw);
                assert_eq!(got.long_message(), Some("declined"));
            }
            Outcome::Success(_) => panic!("failure ack must not narrow"),
        }
    }

    #[test]
    fn narrow_returns_full_response_when_ack_is_absent() {
        let raw = response(&[("TRANSACTIONID", "T1")]);
        assert!(!raw.is_success());
        assert!(matches!(raw.narrow("TRANSACTIONID"), Outcome::Other(_)));
    }

    #[test]
    fn success_ack_without_target_field_is_ambiguous() {
        let raw = response(&[("ACK", "Success")]);
        assert!(matches!(raw.narrow("TRANSACTIONID"), Outcome::Other(_)));
    }

    #[test]
    fn success_with_warning_is_not_success() {
        let raw = response(&[("ACK", "SuccessWithWarning")]);
        assert!(!raw.is_success());
    }
}
