use anyhow::Result;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;

use crate::services::payment_link::PaymentConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    pub catalog_base_url: String,
    pub artifact_dir: String,
    pub dispatch_timeout_secs: u64,
    pub smtp: SmtpConfig,
    pub payment: PaymentConfig,
}

/// Outbound mail relay settings. Credentials come from the environment,
/// never from source.
#[derive(Debug, Deserialize, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok(); // Load .env file if present

        Ok(Config {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            database_url: env::var("DATABASE_URL")?,
            catalog_base_url: env::var("CATALOG_BASE_URL")?,
            artifact_dir: env::var("ARTIFACT_DIR").unwrap_or_else(|_| "./tmp/tickets".to_string()),
            dispatch_timeout_secs: env::var("DISPATCH_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,
            smtp: SmtpConfig {
                host: env::var("SMTP_HOST")?,
                port: env::var("SMTP_PORT")
                    .unwrap_or_else(|_| "587".to_string())
                    .parse()?,
                username: env::var("SMTP_USERNAME")?,
                password: env::var("SMTP_PASSWORD")?,
                from_email: env::var("SMTP_FROM_EMAIL")?,
                from_name: env::var("SMTP_FROM_NAME")?,
            },
            payment: PaymentConfig {
                payee_vpa: env::var("PAYEE_VPA")?,
                payee_name: env::var("PAYEE_NAME")?,
                currency: env::var("CURRENCY").unwrap_or_else(|_| "INR".to_string()),
            },
        })
    }
}
