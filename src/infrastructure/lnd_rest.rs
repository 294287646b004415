use crate::config::NodeSettings;
use crate::domain::amount::Sat;
use crate::domain::channel::{Channel, ChannelId};
use crate::domain::invoice::{Invoice, WalletBalance};
use crate::domain::payout::{Bolt11, FailureReason, PaymentStatus, PaymentUpdate};
use crate::domain::ports::{LedgerNode, PaymentUpdates};
use crate::error::{PayoutError, Result};
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Deserializer};
use std::fs;

const MACAROON_HEADER: &str = "Grpc-Metadata-macaroon";

/// REST gateway to an LND node.
///
/// Authenticates every request with the admin macaroon, hex-encoded into
/// the `Grpc-Metadata-macaroon` header, over TLS pinned to the node's
/// own certificate. Integer status and failure-reason codes from the
/// router stream are decoded into the closed domain enums here, at the
/// boundary, and nowhere else.
pub struct LndRestNode {
    client: reqwest::Client,
    base_url: String,
    macaroon_hex: String,
}

impl LndRestNode {
    /// Loads the TLS certificate and macaroon from the configured paths
    /// and builds the HTTP client. Unreadable credentials are
    /// configuration errors, fatal at startup.
    pub fn from_settings(settings: &NodeSettings) -> Result<Self> {
        let cert = fs::read(&settings.tls_cert_path).map_err(|e| {
            PayoutError::Configuration(format!(
                "cannot read TLS certificate {}: {e}",
                settings.tls_cert_path.display()
            ))
        })?;
        let cert = reqwest::Certificate::from_pem(&cert)
            .map_err(|e| PayoutError::Configuration(format!("invalid TLS certificate: {e}")))?;

        let macaroon = fs::read(&settings.macaroon_path).map_err(|e| {
            PayoutError::Configuration(format!(
                "cannot read macaroon {}: {e}",
                settings.macaroon_path.display()
            ))
        })?;

        let client = reqwest::Client::builder()
            .add_root_certificate(cert)
            .build()
            .map_err(|e| PayoutError::Configuration(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: settings.rest_url.trim_end_matches('/').to_string(),
            macaroon_hex: hex::encode(macaroon),
        })
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}{path}", self.base_url))
            .header(MACAROON_HEADER, &self.macaroon_hex)
    }
}

#[async_trait]
impl LedgerNode for LndRestNode {
    async fn wallet_balance(&self) -> Result<WalletBalance> {
        let response: RestWalletBalance = self
            .get("/v1/balance/blockchain")
            .send()
            .await
            .map_err(upstream)?
            .error_for_status()
            .map_err(upstream)?
            .json()
            .await
            .map_err(upstream)?;

        Ok(WalletBalance {
            total: Sat(response.total_balance),
        })
    }

    async fn list_invoices(&self, start_unix: i64, end_unix: i64) -> Result<Vec<Invoice>> {
        let response: RestListInvoices = self
            .get("/v1/invoices")
            .query(&[
                ("creation_date_start", start_unix.to_string()),
                ("creation_date_end", end_unix.to_string()),
            ])
            .send()
            .await
            .map_err(upstream)?
            .error_for_status()
            .map_err(upstream)?
            .json()
            .await
            .map_err(upstream)?;

        Ok(response
            .invoices
            .into_iter()
            .map(|invoice| Invoice {
                amount_paid: Sat(invoice.amt_paid_sat),
                creation_time: invoice.creation_date,
                settled: invoice.settled,
                hash: invoice.r_hash,
            })
            .collect())
    }

    async fn active_channels(&self) -> Result<Vec<Channel>> {
        let response: RestListChannels = self
            .get("/v1/channels")
            .query(&[("active_only", "true")])
            .send()
            .await
            .map_err(upstream)?
            .error_for_status()
            .map_err(upstream)?
            .json()
            .await
            .map_err(upstream)?;

        Ok(response
            .channels
            .into_iter()
            .map(|channel| Channel {
                id: ChannelId(channel.chan_id),
                capacity: Sat(channel.capacity),
                local_balance: Sat(channel.local_balance),
                active: channel.active,
            })
            .collect())
    }

    async fn send_payment(
        &self,
        invoice: &Bolt11,
        timeout_secs: u64,
        outgoing_channel: ChannelId,
    ) -> Result<PaymentUpdates> {
        let response = self
            .client
            .post(format!("{}/v2/router/send", self.base_url))
            .header(MACAROON_HEADER, &self.macaroon_hex)
            .json(&serde_json::json!({
                "payment_request": invoice.0,
                "timeout_seconds": timeout_secs,
                "outgoing_chan_id": outgoing_channel.0.to_string(),
            }))
            .send()
            .await
            .map_err(upstream)?
            .error_for_status()
            .map_err(upstream)?;

        // The REST gateway streams one JSON object per line; split the
        // byte stream on newlines and decode each line separately.
        let mut buffer: Vec<u8> = Vec::new();
        let updates = response
            .bytes_stream()
            .map(move |chunk| -> Result<Vec<PaymentUpdate>> {
                let chunk = chunk.map_err(upstream)?;
                buffer.extend_from_slice(&chunk);

                let mut decoded = Vec::new();
                while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                    let mut line: Vec<u8> = buffer.drain(..=pos).collect();
                    line.pop();
                    if line.last() == Some(&b'\r') {
                        line.pop();
                    }
                    if line.is_empty() {
                        continue;
                    }
                    decoded.push(decode_update(&line)?);
                }
                Ok(decoded)
            })
            .flat_map(|result| match result {
                Ok(updates) => {
                    futures::stream::iter(updates.into_iter().map(Ok).collect::<Vec<_>>())
                }
                Err(e) => futures::stream::iter(vec![Err(e)]),
            });

        Ok(updates.boxed())
    }
}

fn upstream(e: reqwest::Error) -> PayoutError {
    PayoutError::UpstreamQuery(e.to_string())
}

// LND's REST gateway encodes 64-bit integers as JSON strings.
fn string_u64<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    value.parse().map_err(serde::de::Error::custom)
}

fn string_i64<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    value.parse().map_err(serde::de::Error::custom)
}

#[derive(Deserialize)]
struct RestWalletBalance {
    #[serde(default, deserialize_with = "string_u64")]
    total_balance: u64,
}

#[derive(Deserialize)]
struct RestListInvoices {
    #[serde(default)]
    invoices: Vec<RestInvoice>,
}

#[derive(Deserialize)]
struct RestInvoice {
    #[serde(default, deserialize_with = "string_u64")]
    amt_paid_sat: u64,
    #[serde(default, deserialize_with = "string_i64")]
    creation_date: i64,
    #[serde(default)]
    settled: bool,
    #[serde(default)]
    r_hash: String,
}

#[derive(Deserialize)]
struct RestListChannels {
    #[serde(default)]
    channels: Vec<RestChannel>,
}

#[derive(Deserialize)]
struct RestChannel {
    #[serde(default, deserialize_with = "string_u64")]
    chan_id: u64,
    #[serde(default, deserialize_with = "string_u64")]
    capacity: u64,
    #[serde(default, deserialize_with = "string_u64")]
    local_balance: u64,
    #[serde(default)]
    active: bool,
}

#[derive(Deserialize)]
struct StreamEnvelope {
    result: Option<RestPayment>,
    error: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct RestPayment {
    #[serde(default)]
    status: String,
    #[serde(default)]
    failure_reason: String,
    #[serde(default, deserialize_with = "string_u64")]
    value_sat: u64,
}

fn decode_update(line: &[u8]) -> Result<PaymentUpdate> {
    let envelope: StreamEnvelope = serde_json::from_slice(line)
        .map_err(|e| PayoutError::UpstreamQuery(format!("malformed payment update: {e}")))?;

    if let Some(error) = envelope.error {
        return Err(PayoutError::UpstreamQuery(format!(
            "send stream error: {error}"
        )));
    }

    let payment = envelope
        .result
        .ok_or_else(|| PayoutError::UpstreamQuery("payment update missing result".into()))?;

    Ok(PaymentUpdate {
        status: decode_status(&payment.status),
        failure_reason: decode_failure_reason(&payment.failure_reason),
        value: Sat(payment.value_sat),
    })
}

fn decode_status(status: &str) -> PaymentStatus {
    match status {
        "IN_FLIGHT" => PaymentStatus::InFlight,
        "SUCCEEDED" => PaymentStatus::Succeeded,
        "FAILED" => PaymentStatus::Failed,
        _ => PaymentStatus::Unknown,
    }
}

fn decode_failure_reason(reason: &str) -> FailureReason {
    match reason {
        "FAILURE_REASON_TIMEOUT" => FailureReason::Timeout,
        "FAILURE_REASON_NO_ROUTE" => FailureReason::NoRoute,
        "FAILURE_REASON_ERROR" => FailureReason::Error,
        "FAILURE_REASON_INCORRECT_PAYMENT_DETAILS" => FailureReason::IncorrectPaymentDetails,
        "FAILURE_REASON_INSUFFICIENT_BALANCE" => FailureReason::InsufficientBalance,
        _ => FailureReason::None,
    }
}
