use crate::domain::amount::Sat;
use crate::domain::payout::Bolt11;
use crate::domain::ports::{InvoiceIssuer, IssueError};
use crate::error::{PayoutError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// LNURL-pay invoice issuer over HTTP.
///
/// Resolves the static payment link on every issuance (the service's
/// parameters can change between calls), validates the requested amount
/// against the advertised sendable bounds, then asks the callback for a
/// fresh bolt11. A "Request throttled" response surfaces as
/// `IssueError::Throttled` so the orchestrator can apply its single
/// retry.
pub struct LnurlPayIssuer {
    client: reqwest::Client,
    endpoint: String,
}

impl LnurlPayIssuer {
    pub fn new(link: &str) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: resolve_link(link)?,
        })
    }
}

/// Accepts a direct LNURL-pay endpoint URL or a lightning address
/// (`user@host`, resolved to `/.well-known/lnurlp/user`).
fn resolve_link(link: &str) -> Result<String> {
    let link = link.trim();

    if link.starts_with("https://") || link.starts_with("http://") {
        return Ok(link.to_string());
    }

    if let Some((user, host)) = link.split_once('@')
        && !user.is_empty()
        && !host.is_empty()
    {
        return Ok(format!("https://{host}/.well-known/lnurlp/{user}"));
    }

    Err(PayoutError::Configuration(format!(
        "LNURL_LINK must be an lnurlp URL or lightning address, got: {link}"
    )))
}

#[derive(Deserialize)]
struct PayParams {
    callback: String,
    #[serde(rename = "minSendable")]
    min_sendable: u64,
    #[serde(rename = "maxSendable")]
    max_sendable: u64,
    #[serde(default)]
    tag: String,
}

#[derive(Deserialize)]
struct CallbackResponse {
    pr: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

const THROTTLED_MARKER: &str = "Request throttled";

#[async_trait]
impl InvoiceIssuer for LnurlPayIssuer {
    async fn issue(&self, amount: Sat) -> std::result::Result<Bolt11, IssueError> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(transport)?;
        if !response.status().is_success() {
            return Err(IssueError::Rejected(format!(
                "lnurl service returned {}",
                response.status()
            )));
        }
        let params: PayParams = response
            .json()
            .await
            .map_err(|e| IssueError::Rejected(format!("invalid lnurl-pay response: {e}")))?;

        if params.tag != "payRequest" {
            return Err(IssueError::Rejected(
                "link is not an lnurl-pay endpoint".into(),
            ));
        }

        let amount_msat = amount.msat();
        if amount_msat < params.min_sendable || amount_msat > params.max_sendable {
            return Err(IssueError::AmountOutOfRange {
                amount_msat,
                min_msat: params.min_sendable,
                max_msat: params.max_sendable,
            });
        }

        debug!(%amount, callback = %params.callback, "requesting invoice");
        let response = self
            .client
            .get(&params.callback)
            .query(&[("amount", amount_msat.to_string())])
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        let body = response.text().await.map_err(transport)?;
        if !status.is_success() {
            if body.contains(THROTTLED_MARKER) {
                return Err(IssueError::Throttled);
            }
            return Err(IssueError::Rejected(format!(
                "callback returned {status}: {body}"
            )));
        }

        let callback: CallbackResponse = serde_json::from_str(&body)
            .map_err(|e| IssueError::Rejected(format!("invalid callback response: {e}")))?;

        if callback.status.as_deref() == Some("ERROR") {
            let reason = callback.reason.unwrap_or_else(|| "unspecified".into());
            if reason.contains(THROTTLED_MARKER) {
                return Err(IssueError::Throttled);
            }
            return Err(IssueError::Rejected(reason));
        }

        callback
            .pr
            .map(Bolt11)
            .ok_or_else(|| IssueError::Rejected("callback response missing invoice".into()))
    }
}

fn transport(e: reqwest::Error) -> IssueError {
    IssueError::Transport(e.to_string())
}
