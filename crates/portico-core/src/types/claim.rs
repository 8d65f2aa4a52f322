//! Claims and ordered claim sets.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Well-known claim type names.
pub mod claim_types {
    /// Subject: the account identifier.
    pub const SUBJECT: &str = "sub";
    /// Account email.
    pub const EMAIL: &str = "email";
    /// Unique token identifier.
    pub const TOKEN_ID: &str = "jti";
    /// Not-before time in epoch seconds.
    pub const NOT_BEFORE: &str = "nbf";
    /// Issued-at time in epoch seconds.
    pub const ISSUED_AT: &str = "iat";
    /// Role membership, one claim per role.
    pub const ROLE: &str = "role";
    /// Token issuer.
    pub const ISSUER: &str = "iss";
    /// Token audience.
    pub const AUDIENCE: &str = "aud";
    /// Expiration time in epoch seconds.
    pub const EXPIRATION: &str = "exp";
}

/// How a claim value is encoded in the signed payload.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClaimValueKind {
    /// Encoded as a JSON string.
    #[default]
    String,
    /// Encoded as a JSON integer.
    Integer,
}

/// A single (type, value) assertion about an account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Claim {
    #[serde(rename = "type")]
    claim_type: String,
    value: String,
    #[serde(skip)]
    kind: ClaimValueKind,
}

impl Claim {
    /// Creates a string-valued claim.
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
            kind: ClaimValueKind::String,
        }
    }

    /// Creates an integer-valued claim.
    pub fn integer(claim_type: impl Into<String>, value: i64) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.to_string(),
            kind: ClaimValueKind::Integer,
        }
    }

    #[inline]
    pub fn claim_type(&self) -> &str {
        &self.claim_type
    }

    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[inline]
    pub fn kind(&self) -> ClaimValueKind {
        self.kind
    }

    /// Returns the JSON value placed in a token payload.
    ///
    /// Integer claims whose text does not parse fall back to a string.
    pub fn to_json_value(&self) -> Value {
        match self.kind {
            ClaimValueKind::Integer => self
                .value
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(self.value.clone())),
            ClaimValueKind::String => Value::String(self.value.clone()),
        }
    }

    /// Builds a claim from a JSON payload value.
    ///
    /// Returns `None` for arrays, objects and nulls.
    pub fn from_json_value(claim_type: &str, value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(Self::new(claim_type, text.as_str())),
            Value::Number(number) => match number.as_i64() {
                Some(integer) => Some(Self::integer(claim_type, integer)),
                None => Some(Self::new(claim_type, number.to_string())),
            },
            Value::Bool(flag) => Some(Self::new(claim_type, flag.to_string())),
            _ => None,
        }
    }
}

/// An ordered collection of claims. Duplicate types are allowed.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimSet(Vec<Claim>);

impl ClaimSet {
    /// Creates an empty claim set.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, claim: Claim) {
        self.0.push(claim);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Claim> {
        self.0.iter()
    }

    /// Returns the first claim of the given type.
    pub fn first(&self, claim_type: &str) -> Option<&Claim> {
        self.0.iter().find(|claim| claim.claim_type == claim_type)
    }

    /// Returns every value of the given type, in order.
    pub fn values_of<'a>(&'a self, claim_type: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |claim| claim.claim_type == claim_type)
            .map(|claim| claim.value.as_str())
    }

    pub fn into_vec(self) -> Vec<Claim> {
        self.0
    }
}

impl From<Vec<Claim>> for ClaimSet {
    fn from(claims: Vec<Claim>) -> Self {
        Self(claims)
    }
}

impl FromIterator<Claim> for ClaimSet {
    fn from_iter<I: IntoIterator<Item = Claim>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Claim> for ClaimSet {
    fn extend<I: IntoIterator<Item = Claim>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for ClaimSet {
    type IntoIter = std::vec::IntoIter<Claim>;
    type Item = Claim;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ClaimSet {
    type IntoIter = std::slice::Iter<'a, Claim>;
    type Item = &'a Claim;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn claim_serializes_as_type_and_value() {
        let claim = Claim::integer(claim_types::ISSUED_AT, 1_700_000_000);
        let value = serde_json::to_value(&claim).unwrap();
        assert_eq!(value, json!({ "type": "iat", "value": "1700000000" }));
    }

    #[test]
    fn integer_claims_become_json_numbers() {
        assert_eq!(Claim::integer("iat", 42).to_json_value(), json!(42));
        assert_eq!(Claim::new("iat", "42").to_json_value(), json!("42"));
    }

    #[test]
    fn claim_set_keeps_order_and_duplicates() {
        let claims: ClaimSet = vec![
            Claim::new(claim_types::ROLE, "admin"),
            Claim::new(claim_types::EMAIL, "a@x.io"),
            Claim::new(claim_types::ROLE, "billing"),
        ]
        .into();

        assert_eq!(claims.len(), 3);
        let roles: Vec<_> = claims.values_of(claim_types::ROLE).collect();
        assert_eq!(roles, ["admin", "billing"]);
        assert_eq!(claims.first(claim_types::EMAIL).unwrap().value(), "a@x.io");
    }

    #[test]
    fn claim_from_json_value() {
        let claim = Claim::from_json_value("exp", &json!(1_700_000_000)).unwrap();
        assert_eq!(claim.kind(), ClaimValueKind::Integer);
        assert!(Claim::from_json_value("aud", &json!(["a", "b"])).is_none());
    }
}
