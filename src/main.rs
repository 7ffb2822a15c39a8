use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fhir::{Encoding, Patient};
use ums_core::config::{
    encoding_from_env_value, flag_from_env_value, server_base_url_from_env_value,
};
use ums_core::constants::{
    ENV_FHIR_SERVER_URL, ENV_MRN_CODE_SYSTEM, ENV_PUBLISH_ENCODING, ENV_SSN_CODE_SYSTEM,
    ENV_USE_CREATE_FOR_UPDATE,
};
use ums_core::{CodeSystems, FhirPatientService, PublishConfig, UserDto};

#[derive(Parser)]
#[command(name = "ums-run")]
#[command(about = "Publish user records to a FHIR registry as Patient resources")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the Patient resource for a user and print it without sending it
    Render {
        /// Path to a user JSON document
        user_file: PathBuf,
        /// Print XML instead of the configured encoding
        #[arg(long)]
        xml: bool,
    },
    /// Publish a user as a new Patient
    Publish {
        /// Path to a user JSON document
        user_file: PathBuf,
    },
    /// Publish changes to an existing user
    Update {
        /// Path to a user JSON document
        user_file: PathBuf,
    },
}

/// Main entry point for the publisher.
///
/// Configuration is read from the environment once, before any user is processed.
///
/// # Environment Variables
/// - `UMS_FHIR_SERVER_URL`: base URL of the FHIR registry (required)
/// - `UMS_MRN_CODE_SYSTEM`: code system URI for medical record numbers (required)
/// - `UMS_SSN_CODE_SYSTEM`: code system URI for social security numbers (required)
/// - `UMS_FHIR_PUBLISH_ENCODING`: `json` or `xml` (default: json)
/// - `UMS_FHIR_PUBLISH_USE_CREATE_FOR_UPDATE`: send updates as creates (default: false)
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("ums=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let cfg = Arc::new(config_from_env()?);
    let service = FhirPatientService::with_http_transport(cfg.clone())?;

    match cli.command {
        Commands::Render { user_file, xml } => {
            let user = read_user(&user_file)?;
            let patient = service.create_patient(&user)?;
            let encoding = if xml { Encoding::Xml } else { cfg.encoding() };
            let text = match encoding {
                Encoding::Json => Patient::render_json_pretty(&patient)?,
                Encoding::Xml => Patient::render_xml_pretty(&patient)?,
            };
            println!("{text}");
        }
        Commands::Publish { user_file } => {
            let user = read_user(&user_file)?;
            let outcome = service.publish(&user).await?;
            tracing::info!(
                "++ Published user {} (status {}, location {})",
                user.id,
                outcome.status,
                outcome.location.as_deref().unwrap_or("-")
            );
        }
        Commands::Update { user_file } => {
            let user = read_user(&user_file)?;
            let outcome = service.update_publish(&user).await?;
            tracing::info!(
                "++ Updated user {} (status {}, location {})",
                user.id,
                outcome.status,
                outcome.location.as_deref().unwrap_or("-")
            );
        }
    }

    Ok(())
}

fn config_from_env() -> anyhow::Result<PublishConfig> {
    let code_systems = CodeSystems::new(
        std::env::var(ENV_MRN_CODE_SYSTEM).unwrap_or_default(),
        std::env::var(ENV_SSN_CODE_SYSTEM).unwrap_or_default(),
    )?;
    let encoding = encoding_from_env_value(std::env::var(ENV_PUBLISH_ENCODING).ok());
    let use_create_for_update = flag_from_env_value(
        ENV_USE_CREATE_FOR_UPDATE,
        std::env::var(ENV_USE_CREATE_FOR_UPDATE).ok(),
    )?;
    let server_base_url = server_base_url_from_env_value(
        ENV_FHIR_SERVER_URL,
        std::env::var(ENV_FHIR_SERVER_URL).ok(),
    )?;

    Ok(PublishConfig::new(
        code_systems,
        encoding,
        use_create_for_update,
        server_base_url,
    )?)
}

fn read_user(path: &Path) -> anyhow::Result<UserDto> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}
