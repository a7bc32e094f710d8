//! Single-request client against the external accrual service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, warn};

const ORDERS_PATH: &str = "/api/orders/";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(1);
/// Applied when a 429 carries no parseable Retry-After header.
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

const STATUS_REGISTERED: &str = "REGISTERED";
const STATUS_PROCESSING: &str = "PROCESSING";
const STATUS_INVALID: &str = "INVALID";
const STATUS_PROCESSED: &str = "PROCESSED";

/// Classified result of one accrual lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// 200 with status PROCESSED and a non-negative accrual.
    Processed { number: String, accrual: Decimal },
    /// 200 with status REGISTERED or PROCESSING.
    InProgress { number: String },
    /// 200 with status INVALID.
    Invalid { number: String },
    /// 204: the accrual service does not know the order yet.
    NotRegistered { number: String },
    /// 200 whose body failed validation; treated like `NotRegistered`.
    Malformed { number: String },
    /// 429; all workers must stay silent for `retry_after`.
    RateLimited { retry_after: Duration },
    /// 500 or a transport failure; the order stays claimed until redrawn.
    RemoteError,
    /// Any other status code.
    Unexpected { code: u16 },
}

#[async_trait]
pub trait Lookup: Send + Sync {
    async fn lookup(&self, number: &str) -> Outcome;
}

pub struct AccrualClient {
    http: reqwest::Client,
    orders_url: String,
}

impl AccrualClient {
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            orders_url: format!("{}{ORDERS_PATH}", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl Lookup for AccrualClient {
    async fn lookup(&self, number: &str) -> Outcome {
        let url = format!("{}{number}", self.orders_url);
        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, order = number, "failed to request accrual service");
                return Outcome::RemoteError;
            }
        };

        match response.status() {
            StatusCode::OK => {
                let reply = match response.json::<AccrualReply>().await {
                    Ok(reply) => reply,
                    Err(err) => {
                        warn!(error = %err, order = number, "unreadable accrual response body");
                        return Outcome::Malformed {
                            number: number.to_owned(),
                        };
                    }
                };
                match reply.validate(number) {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        warn!(error = %err, order = number, "invalid accrual response data");
                        Outcome::Malformed {
                            number: number.to_owned(),
                        }
                    }
                }
            }
            StatusCode::NO_CONTENT => Outcome::NotRegistered {
                number: number.to_owned(),
            },
            StatusCode::TOO_MANY_REQUESTS => Outcome::RateLimited {
                retry_after: parse_retry_after(response.headers()),
            },
            StatusCode::INTERNAL_SERVER_ERROR => {
                warn!(order = number, "accrual service internal error");
                Outcome::RemoteError
            }
            code => {
                error!(code = code.as_u16(), order = number, "unexpected accrual status code");
                Outcome::Unexpected {
                    code: code.as_u16(),
                }
            }
        }
    }
}

fn parse_retry_after(headers: &HeaderMap) -> Duration {
    let raw = headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    match raw.parse::<u64>() {
        Ok(seconds) => Duration::from_secs(seconds),
        Err(err) => {
            warn!(value = raw, error = %err, "failed to parse retry-after header");
            DEFAULT_RETRY_AFTER
        }
    }
}

#[derive(Debug, Error, PartialEq)]
enum ReplyError {
    #[error("order number does not match the request")]
    MismatchedNumber,
    #[error("negative accrual")]
    NegativeAccrual,
    #[error("unknown order status: {0}")]
    UnknownStatus(String),
}

/// Wire shape of a 200 response.
#[derive(Debug, Deserialize)]
struct AccrualReply {
    #[serde(rename = "order")]
    number: String,
    status: String,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    accrual: Option<Decimal>,
}

impl AccrualReply {
    fn validate(self, sent_number: &str) -> Result<Outcome, ReplyError> {
        if self.number != sent_number {
            return Err(ReplyError::MismatchedNumber);
        }

        match self.status.as_str() {
            STATUS_REGISTERED | STATUS_PROCESSING => Ok(Outcome::InProgress {
                number: self.number,
            }),
            STATUS_INVALID => Ok(Outcome::Invalid {
                number: self.number,
            }),
            STATUS_PROCESSED => {
                let accrual = self.accrual.unwrap_or(Decimal::ZERO);
                if accrual < Decimal::ZERO {
                    return Err(ReplyError::NegativeAccrual);
                }
                Ok(Outcome::Processed {
                    number: self.number,
                    accrual,
                })
            }
            other => Err(ReplyError::UnknownStatus(other.to_owned())),
        }
    }
}
