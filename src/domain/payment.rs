use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use url::Url;

/// A Nostr Wallet Connect URL authorizing spends from the payer's wallet.
///
/// Treated as an opaque secret: no `Display`, and `Debug` redacts. It must
/// never reach a log line or an API response.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletCredential(String);

#[derive(Error, Debug, PartialEq)]
pub enum CredentialError {
    #[error("not a valid URL")]
    InvalidUrl,
    #[error("expected the nostr+walletconnect scheme")]
    WrongScheme,
    #[error("missing the secret query parameter")]
    MissingSecret,
    #[error("secret must be 64 hex characters")]
    MalformedSecret,
}

impl WalletCredential {
    /// Validates the connection URL shape: `nostr+walletconnect` scheme and a
    /// `secret` query parameter of 64 hex characters, any case.
    pub fn parse(raw: &str) -> std::result::Result<Self, CredentialError> {
        let url = Url::parse(raw).map_err(|_| CredentialError::InvalidUrl)?;
        if url.scheme() != "nostr+walletconnect" {
            return Err(CredentialError::WrongScheme);
        }
        let secret = url
            .query_pairs()
            .find(|(key, _)| key == "secret")
            .map(|(_, value)| value.into_owned())
            .ok_or(CredentialError::MissingSecret)?;
        if secret.len() != 64 || !secret.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CredentialError::MalformedSecret);
        }
        Ok(Self(raw.to_string()))
    }

    /// The raw connection URL, for handing to the payment client only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for WalletCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WalletCredential([redacted])")
    }
}

/// A lightning address, `name@domain`, resolvable through LNURL-pay.
#[derive(Debug, Clone, PartialEq)]
pub struct LightningAddress {
    pub name: String,
    pub domain: String,
}

#[derive(Error, Debug, PartialEq)]
pub enum AddressError {
    #[error("lightning address must look like name@domain")]
    MissingSeparator,
    #[error("lightning address has an empty name or domain")]
    EmptyPart,
}

impl LightningAddress {
    pub fn parse(raw: &str) -> std::result::Result<Self, AddressError> {
        let (name, domain) = raw.split_once('@').ok_or(AddressError::MissingSeparator)?;
        if name.is_empty() || domain.is_empty() {
            return Err(AddressError::EmptyPart);
        }
        Ok(Self {
            name: name.to_string(),
            domain: domain.to_string(),
        })
    }

    /// LNURL-pay metadata endpoint for this address.
    pub fn lnurlp_endpoint(&self) -> String {
        format!("https://{}/.well-known/lnurlp/{}", self.domain, self.name)
    }
}

/// One payment attempt handed to the payment client.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub credential: WalletCredential,
    pub recipient: String,
    pub amount_sats: u64,
    pub comment: Option<String>,
    pub payer_data: Option<serde_json::Value>,
}

/// Proof of a settled payment.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentProof {
    pub preimage: String,
}

/// A classified payment failure.
///
/// Always a counted business outcome, never an engine fault. The reason shown
/// to users comes from [`PaymentFailure::reason`] and nowhere else.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentFailure {
    /// The payment was attempted and rejected (bad credential, unresolvable
    /// address, route failure, insufficient balance, ...).
    Rejected {
        code: Option<String>,
        message: Option<String>,
    },
    /// The attempt exceeded the client-side deadline.
    Timeout,
    /// The payment transport could not be reached at all.
    Transport(String),
}

impl PaymentFailure {
    /// Human-readable reason: structured code and message first, then a plain
    /// message, then a bare code, else "Unknown".
    pub fn reason(&self) -> String {
        match self {
            PaymentFailure::Rejected {
                code: Some(code),
                message: Some(message),
            } => format!("{}: {}", code, message),
            PaymentFailure::Rejected {
                code: None,
                message: Some(message),
            } => message.clone(),
            PaymentFailure::Rejected {
                code: Some(code),
                message: None,
            } => code.clone(),
            PaymentFailure::Rejected {
                code: None,
                message: None,
            } => "Unknown".to_string(),
            PaymentFailure::Timeout => "payment attempt timed out".to_string(),
            PaymentFailure::Transport(detail) => detail.clone(),
        }
    }
}
