use crate::catalog::CatalogClient;
use crate::config::Config;
use crate::ledger::Ledger;
use anyhow::{Context, Result};
use std::time::Duration;

pub struct ValidationReport {
    pub environment: bool,
    pub database: bool,
    pub catalog: bool,
    pub artifacts: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.environment && self.database && self.catalog && self.artifacts
    }

    pub fn print(&self) {
        println!("\n=== Startup Validation Report ===");
        println!("Environment Variables: {}", status(self.environment));
        println!("Database Connectivity: {}", status(self.database));
        println!("Event Catalog:         {}", status(self.catalog));
        println!("Artifact Directory:    {}", status(self.artifacts));

        if !self.errors.is_empty() {
            println!("\nErrors:");
            for error in &self.errors {
                println!("  ❌ {}", error);
            }
        }

        println!("\nOverall Status: {}", if self.is_valid() { "✅ PASS" } else { "❌ FAIL" });
        println!("=================================\n");
    }
}

fn status(ok: bool) -> &'static str {
    if ok { "✅ OK" } else { "❌ FAIL" }
}

pub async fn validate_environment(
    config: &Config,
    ledger: &dyn Ledger,
    catalog: &CatalogClient,
) -> Result<ValidationReport> {
    let mut report = ValidationReport {
        environment: true,
        database: true,
        catalog: true,
        artifacts: true,
        errors: Vec::new(),
    };

    if let Err(e) = validate_env_vars(config) {
        report.environment = false;
        report.errors.push(format!("Environment: {}", e));
    }

    if let Err(e) = ledger.ping().await {
        report.database = false;
        report.errors.push(format!("Database: {}", e));
    }

    if let Err(e) = validate_catalog(catalog).await {
        report.catalog = false;
        report.errors.push(format!("Catalog: {}", e));
    }

    if let Err(e) = validate_artifact_dir(&config.artifact_dir).await {
        report.artifacts = false;
        report.errors.push(format!("Artifacts: {}", e));
    }

    Ok(report)
}

fn validate_env_vars(config: &Config) -> Result<()> {
    if config.database_url.is_empty() {
        anyhow::bail!("DATABASE_URL is empty");
    }
    if config.catalog_base_url.is_empty() {
        anyhow::bail!("CATALOG_BASE_URL is empty");
    }
    if config.smtp.host.is_empty() {
        anyhow::bail!("SMTP_HOST is empty");
    }
    if !config.payment.payee_vpa.contains('@') {
        anyhow::bail!("PAYEE_VPA must be a virtual payment address (name@bank)");
    }
    if config.server_port == 0 {
        anyhow::bail!("SERVER_PORT must be greater than 0");
    }

    url::Url::parse(&config.catalog_base_url).context("CATALOG_BASE_URL is not a valid URL")?;

    Ok(())
}

async fn validate_catalog(catalog: &CatalogClient) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    // any HTTP response counts as reachable; the catalog root may well 404
    client
        .get(catalog.base_url())
        .send()
        .await
        .context("Failed to connect to event catalog")?;

    Ok(())
}

async fn validate_artifact_dir(dir: &str) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .context("Failed to create artifact directory")?;

    let probe = std::path::Path::new(dir).join(".write-probe");
    tokio::fs::write(&probe, b"ok")
        .await
        .context("Artifact directory is not writable")?;
    tokio::fs::remove_file(&probe).await.ok();

    Ok(())
}
