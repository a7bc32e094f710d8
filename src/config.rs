//! Process configuration. Precedence: command-line flag, then environment
//! variable, then built-in default. Natural-number settings reject zero at
//! startup.

use std::time::Duration;

use clap::Parser;

use crate::accrual::PipelineConfig;

const DEFAULT_JWT_SECRET: &str = "insecure-dev-secret-change-me";

#[derive(Debug, Parser)]
#[command(name = "bonusd", about = "Loyalty-points accrual service", version)]
pub struct Config {
    /// HTTP listen address.
    #[arg(short = 'a', long = "address", env = "RUN_ADDRESS", default_value = ":8080")]
    pub run_address: String,

    /// PostgreSQL DSN of the ledger.
    #[arg(short = 'd', long = "database", env = "DATABASE_URI")]
    pub database_uri: String,

    /// Base URL of the external accrual service.
    #[arg(short = 'r', long = "accrual", env = "ACCRUAL_SYSTEM_ADDRESS")]
    pub accrual_address: String,

    /// Token-signing key.
    #[arg(
        short = 's',
        long = "secret",
        env = "JWT_SECRET",
        default_value = DEFAULT_JWT_SECRET,
        hide_env_values = true
    )]
    pub jwt_secret: String,

    /// Accrual worker count.
    #[arg(
        long = "rl",
        env = "ACCRUAL_RATE_LIMIT",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub rate_limit: u64,

    /// Seconds between polls of the orders table.
    #[arg(
        long = "pi",
        env = "ACCRUAL_DB_POLL_INTERVAL",
        default_value_t = 1,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub poll_interval: u64,

    /// Minimum seconds between processing attempts on one order.
    #[arg(
        long = "pd",
        env = "ACCRUAL_PROCESS_DELAY",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub process_delay: u64,

    /// How many "not registered" responses an order survives before it is
    /// rejected as INVALID.
    #[arg(
        long = "rc",
        env = "ACCRUAL_NOT_REGISTER_RETRY_COUNT",
        default_value_t = 3,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub retry_count: u64,
}

impl Config {
    /// The usual `:8080` shorthand binds every interface.
    pub fn bind_address(&self) -> String {
        if self.run_address.starts_with(':') {
            format!("0.0.0.0{}", self.run_address)
        } else {
            self.run_address.clone()
        }
    }

    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            accrual_address: self.accrual_address.clone(),
            rate_limit: self.rate_limit as usize,
            poll_interval: Duration::from_secs(self.poll_interval),
            process_delay: Duration::from_secs(self.process_delay),
            retry_count: self.retry_count as u32,
        }
    }
}
