use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ClaimsError;

pub const CLAIM_SUBJECT: &str = "sub";
pub const CLAIM_EMAIL: &str = "email";
pub const CLAIM_USERNAME: &str = "unique_name";
pub const CLAIM_TOKEN_ID: &str = "jti";
pub const CLAIM_ISSUER: &str = "iss";
pub const CLAIM_AUDIENCE: &str = "aud";
pub const CLAIM_EXPIRY: &str = "exp";
pub const CLAIM_ISSUED_AT: &str = "iat";
pub const CLAIM_ROLE: &str = "role";

/// Claim names owned by the token format; custom attributes and roles may not reuse them.
pub const RESERVED_CLAIMS: &[&str] = &[
    CLAIM_SUBJECT,
    CLAIM_EMAIL,
    CLAIM_USERNAME,
    CLAIM_TOKEN_ID,
    CLAIM_ISSUER,
    CLAIM_AUDIENCE,
    CLAIM_EXPIRY,
    CLAIM_ISSUED_AT,
    CLAIM_ROLE,
];

pub fn is_reserved(name: &str) -> bool {
    RESERVED_CLAIMS.contains(&name)
}

/// Verified identity carried by an access token.
///
/// Roles keep their first-seen order and never repeat. Custom attributes are
/// written into issued tokens but are not recovered by validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityClaims {
    subject: String,
    email: String,
    username: String,
    roles: Vec<String>,
    attributes: BTreeMap<String, String>,
}

impl IdentityClaims {
    pub fn builder(subject: impl Into<String>) -> IdentityClaimsBuilder {
        IdentityClaimsBuilder::new(subject)
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Convenience helper for role checks.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|value| value == role)
    }

    /// Rebuild an identity from claims that already passed signature checks.
    pub(crate) fn from_verified<I>(subject: String, email: String, username: String, roles: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut collected = Vec::new();
        for role in roles {
            push_unique(&mut collected, role);
        }
        Self {
            subject,
            email,
            username,
            roles: collected,
            attributes: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IdentityClaimsBuilder {
    subject: String,
    email: String,
    username: String,
    roles: Vec<String>,
    attributes: BTreeMap<String, String>,
}

impl IdentityClaimsBuilder {
    fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            email: String::new(),
            username: String::new(),
            roles: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        push_unique(&mut self.roles, role.into());
        self
    }

    pub fn roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for role in roles {
            push_unique(&mut self.roles, role.into());
        }
        self
    }

    /// Later values for the same key replace earlier ones.
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Result<IdentityClaims, ClaimsError> {
        if self.subject.trim().is_empty() {
            return Err(ClaimsError::EmptySubject);
        }
        if let Some(role) = self.roles.iter().find(|role| is_reserved(role)) {
            return Err(ClaimsError::ReservedName(role.clone()));
        }
        if let Some(key) = self.attributes.keys().find(|key| is_reserved(key)) {
            return Err(ClaimsError::ReservedName(key.clone()));
        }

        Ok(IdentityClaims {
            subject: self.subject,
            email: self.email,
            username: self.username,
            roles: self.roles,
            attributes: self.attributes,
        })
    }
}

fn push_unique(roles: &mut Vec<String>, role: String) {
    if !roles.iter().any(|existing| *existing == role) {
        roles.push(role);
    }
}

/// A single role is written as a bare string, several as an array.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum RoleRepr {
    Single(String),
    Many(Vec<String>),
}

impl RoleRepr {
    fn from_roles(roles: &[String]) -> Option<Self> {
        match roles {
            [] => None,
            [single] => Some(RoleRepr::Single(single.clone())),
            many => Some(RoleRepr::Many(many.to_vec())),
        }
    }

    pub(crate) fn into_vec(self) -> Vec<String> {
        match self {
            RoleRepr::Single(role) => vec![role],
            RoleRepr::Many(roles) => roles,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum AudienceRepr {
    Single(String),
    Many(Vec<String>),
}

impl AudienceRepr {
    pub(crate) fn contains(&self, audience: &str) -> bool {
        match self {
            AudienceRepr::Single(value) => value == audience,
            AudienceRepr::Many(values) => values.iter().any(|value| value == audience),
        }
    }
}

/// Claim set written into the token payload.
#[derive(Debug, Serialize)]
pub(crate) struct PayloadClaims<'a> {
    sub: &'a str,
    email: &'a str,
    unique_name: &'a str,
    jti: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<RoleRepr>,
    #[serde(flatten)]
    attributes: &'a BTreeMap<String, String>,
    iss: &'a str,
    aud: &'a str,
    exp: i64,
    iat: i64,
}

impl<'a> PayloadClaims<'a> {
    pub(crate) fn new(
        claims: &'a IdentityClaims,
        token_id: String,
        issuer: &'a str,
        audience: &'a str,
        issued_at: i64,
        expires_at: i64,
    ) -> Self {
        Self {
            sub: &claims.subject,
            email: &claims.email,
            unique_name: &claims.username,
            jti: token_id,
            role: RoleRepr::from_roles(&claims.roles),
            attributes: &claims.attributes,
            iss: issuer,
            aud: audience,
            exp: expires_at,
            iat: issued_at,
        }
    }
}

/// Claim set read back from a verified payload. Every field is optional so the
/// validator can report exactly which check failed.
#[derive(Debug, Deserialize)]
pub(crate) struct PayloadRepr {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub unique_name: Option<String>,
    #[serde(default)]
    pub jti: Option<String>,
    #[serde(default)]
    pub role: Option<RoleRepr>,
    #[serde(default)]
    pub iss: Option<String>,
    #[serde(default)]
    pub aud: Option<AudienceRepr>,
    #[serde(default)]
    pub exp: Option<i64>,
}
