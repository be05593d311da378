use crate::domain::payment::{
    LightningAddress, PaymentFailure, PaymentProof, PaymentRequest,
};
use crate::domain::ports::PaymentClient;
use crate::error::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Payment client backed by a Nostr Wallet Connect bridge service.
///
/// The bridge owns relays, invoice fetching and the actual payment transport;
/// this client makes exactly one bounded HTTP call per attempt and classifies
/// whatever comes back. Recipient validation goes straight to the address's
/// LNURL-pay metadata endpoint.
pub struct NwcBridgeClient {
    http: reqwest::Client,
    pay_endpoint: Url,
}

#[derive(Deserialize)]
struct PayResponse {
    preimage: String,
}

/// The bridge's error body; both fields are optional on the wire.
#[derive(Deserialize)]
struct BridgeError {
    code: Option<String>,
    message: Option<String>,
}

/// LNURL-pay metadata; amounts are millisatoshis.
#[derive(Deserialize)]
struct PayParams {
    callback: String,
    #[serde(rename = "minSendable")]
    min_sendable: u64,
    #[serde(rename = "maxSendable")]
    max_sendable: u64,
}

impl NwcBridgeClient {
    pub fn new(bridge_url: Url, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let pay_endpoint = bridge_url.join("v1/payments")?;
        Ok(Self { http, pay_endpoint })
    }

    fn classify(err: reqwest::Error) -> PaymentFailure {
        if err.is_timeout() {
            PaymentFailure::Timeout
        } else {
            PaymentFailure::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl PaymentClient for NwcBridgeClient {
    async fn pay(
        &self,
        request: &PaymentRequest,
    ) -> std::result::Result<PaymentProof, PaymentFailure> {
        let body = serde_json::json!({
            "credential": request.credential.expose(),
            "recipient": request.recipient,
            "amount_sats": request.amount_sats,
            "comment": request.comment,
            "payer_data": request.payer_data,
        });

        let response = self
            .http
            .post(self.pay_endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(Self::classify)?;

        if response.status().is_success() {
            let payload: PayResponse = response.json().await.map_err(Self::classify)?;
            Ok(PaymentProof {
                preimage: payload.preimage,
            })
        } else {
            let (code, message) = match response.json::<BridgeError>().await {
                Ok(body) => (body.code, body.message),
                Err(_) => (None, None),
            };
            Err(PaymentFailure::Rejected { code, message })
        }
    }

    async fn validate_recipient(
        &self,
        address: &str,
        amount_sats: u64,
    ) -> std::result::Result<(), PaymentFailure> {
        let address = LightningAddress::parse(address).map_err(|err| {
            PaymentFailure::Rejected {
                code: None,
                message: Some(err.to_string()),
            }
        })?;

        let response = self
            .http
            .get(address.lnurlp_endpoint())
            .send()
            .await
            .map_err(Self::classify)?;
        if !response.status().is_success() {
            return Err(PaymentFailure::Rejected {
                code: None,
                message: Some(format!(
                    "lightning address does not resolve (HTTP {})",
                    response.status().as_u16()
                )),
            });
        }

        let params: PayParams = response.json().await.map_err(Self::classify)?;
        if params.callback.is_empty() {
            return Err(PaymentFailure::Rejected {
                code: None,
                message: Some("lightning address metadata has no callback".to_string()),
            });
        }

        let msats = amount_sats.saturating_mul(1000);
        if msats < params.min_sendable || msats > params.max_sendable {
            return Err(PaymentFailure::Rejected {
                code: None,
                message: Some(format!(
                    "amount {} sats is outside the recipient's receivable range ({}-{} msats)",
                    amount_sats, params.min_sendable, params.max_sendable
                )),
            });
        }

        Ok(())
    }
}
