use crate::domain::amount::Sat;
use crate::error::{PayoutError, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Payout behavior and node credentials, read from the environment
/// (optionally seeded from a `.env` file by `main`). Validated once at
/// startup, before any prompt or network call.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Upper bound for a single payout chunk, in satoshis.
    pub max_payment_amount: Sat,
    /// Minimum local-balance ratio a channel must exceed to be eligible.
    pub preferred_local_balance_ratio: f64,
    /// Per-attempt send timeout handed to the node.
    pub timeout_secs: u64,
    /// Send attempts per channel before moving to the next one.
    pub max_retries: u32,
    /// Static payment link the invoice issuer resolves.
    pub lnurl_link: String,
    pub node: NodeSettings,
}

#[derive(Debug, Clone)]
pub struct NodeSettings {
    pub rest_url: String,
    pub tls_cert_path: PathBuf,
    pub macaroon_path: PathBuf,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let max_payment_amount = Sat(parse_required("MAXIMUM_PAYMENT_AMOUNT")?);
        if max_payment_amount.is_zero() {
            return Err(PayoutError::Configuration(
                "MAXIMUM_PAYMENT_AMOUNT must be positive".into(),
            ));
        }

        let preferred_local_balance_ratio = parse_or("PREFERRED_LOCAL_BALANCE_RATIO", 0.0)?;
        if !(0.0..1.0).contains(&preferred_local_balance_ratio) {
            return Err(PayoutError::Configuration(
                "PREFERRED_LOCAL_BALANCE_RATIO must be in [0, 1)".into(),
            ));
        }

        Ok(Self {
            max_payment_amount,
            preferred_local_balance_ratio,
            timeout_secs: parse_or("TIMEOUT_SEC", 60)?,
            max_retries: parse_or("MAX_RETRIES", 3)?,
            lnurl_link: required("LNURL_LINK")?,
            node: NodeSettings {
                rest_url: env::var("LND_REST_URL")
                    .unwrap_or_else(|_| "https://localhost:8080".into()),
                tls_cert_path: expand_home(required("TLS_CERT_PATH")?),
                macaroon_path: expand_home(required("MACAROON_PATH")?),
            },
        })
    }
}

fn required(key: &str) -> Result<String> {
    env::var(key).map_err(|_| PayoutError::Configuration(format!("{key} is not set")))
}

fn parse_required<T: FromStr>(key: &str) -> Result<T> {
    parse(key, required(key)?)
}

fn parse_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(value) => parse(key, value),
        Err(_) => Ok(default),
    }
}

fn parse<T: FromStr>(key: &str, value: String) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| PayoutError::Configuration(format!("{key} has an invalid value: {value}")))
}

/// Expands a leading `~/` against `$HOME`, matching how the credential
/// paths are usually written in `.env` files.
fn expand_home(path: String) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Ok(home) = env::var("HOME")
    {
        return PathBuf::from(home).join(rest);
    }
    PathBuf::from(path)
}
