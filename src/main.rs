//! CLI entry point for api-devices, a client for the API-devices REST service.
//!
//! Builds an authenticated session from a fixed bearer token or from
//! OAuth2 client credentials, runs one subcommand and prints the decoded
//! response as pretty JSON on stdout. Logs go to stderr (`RUST_LOG`).
//!
//! Exit codes:
//! - 0: success
//! - 1: runtime error (auth failure, API error, invalid parameters, etc.)
//! - 2: argument validation error (clap handles this automatically)

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use api_devices::auth::{AuthConfig, DEFAULT_GRANT_TYPE, TokenCache};
use api_devices::client::ApiClient;
use api_devices::error::Result;
use api_devices::query::{DeviceFilters, FilterByOperator, Order};
use api_devices::schema::Schema;
use api_devices::v1::DevicesV1Api;
use api_devices::v2::DevicesV2Api;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Base URL of the API-devices service.
    #[arg(long, env = "API_DEVICES_URL")]
    url: String,

    #[command(flatten)]
    auth: AuthArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Credentials. A fixed `--token` wins over client credentials.
#[derive(clap::Args)]
struct AuthArgs {
    /// Bearer token to send as-is. Prefer the API_DEVICES_TOKEN
    /// environment variable to keep it out of shell history.
    #[arg(long, env = "API_DEVICES_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// OAuth2 token endpoint.
    #[arg(long, env = "AUTH0_URL")]
    auth_url: Option<String>,

    /// OAuth2 client id.
    #[arg(long, env = "AUTH0_CLIENT_ID")]
    client_id: Option<String>,

    /// OAuth2 client secret. Prefer setting via the AUTH0_CLIENT_SECRET
    /// environment variable.
    #[arg(long, env = "AUTH0_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// Audience the token is requested for.
    #[arg(long, env = "AUTH0_AUDIENCE")]
    audience: Option<String>,

    /// OAuth2 grant type.
    #[arg(long, env = "AUTH0_GRANT_TYPE", default_value = DEFAULT_GRANT_TYPE)]
    grant_type: String,
}

/// Listing options shared by `devices` and `device-status`.
#[derive(clap::Args)]
struct ListArgs {
    /// Filter as `field:value`; repeat for several.
    #[arg(long = "filter", value_parser = parse_filter)]
    filters: Vec<(String, String)>,

    /// How several filters combine.
    #[arg(long, value_enum)]
    operator: Option<OperatorArg>,

    /// Page size.
    #[arg(long)]
    limit: Option<u32>,

    /// Cursor from a previous page.
    #[arg(long)]
    after: Option<String>,

    /// Sort expression: `+field` ascending, `-field` descending.
    #[arg(long, value_parser = parse_sort, allow_hyphen_values = true)]
    sort: Option<(Order, String)>,
}

impl ListArgs {
    fn apply<Q: DeviceFilters>(&self, query: Q) -> Q {
        let (order, field) = match &self.sort {
            Some((order, field)) => (Some(*order), Some(field.as_str())),
            None => (None, None),
        };
        query
            .filter_by(self.filters.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .filter_by_operator(self.operator.map(FilterByOperator::from))
            .limit(self.limit)
            .after(self.after.as_deref())
            .order_by(order, field)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OperatorArg {
    And,
    Or,
}

impl From<OperatorArg> for FilterByOperator {
    fn from(value: OperatorArg) -> Self {
        match value {
            OperatorArg::And => FilterByOperator::And,
            OperatorArg::Or => FilterByOperator::Or,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List a customer's devices (v2).
    Devices {
        customer_id: String,
        #[command(flatten)]
        list: ListArgs,
        /// Only devices assigned to this employee.
        #[arg(long)]
        assigned_to: Option<String>,
    },
    /// List a customer's device health status (v1).
    DeviceStatus {
        customer_id: String,
        #[command(flatten)]
        list: ListArgs,
    },
    /// Read or change a device assignment.
    Assignment {
        customer_id: String,
        device_id: String,
        #[command(subcommand)]
        action: AssignmentAction,
    },
    /// Read or provision an MDM enrollment.
    Mdm {
        customer_id: String,
        #[command(subcommand)]
        action: MdmAction,
    },
    /// Show agent download links.
    DownloadLink { customer_id: String },
    /// Ask employees to claim their devices.
    RequestAssignments {
        customer_id: String,
        #[arg(required = true)]
        employee_ids: Vec<String>,
    },
}

#[derive(Subcommand)]
enum AssignmentAction {
    /// Show the current assignment.
    Get,
    /// Assign the device.
    Set {
        #[arg(long)]
        assigned_to: String,
        #[arg(long)]
        assigned_by: String,
    },
    /// Remove the assignment.
    Delete,
}

#[derive(Subcommand)]
enum MdmAction {
    /// Show the enrollment for an MDM vendor.
    Get { name: String },
    /// Provision an MDM vendor.
    Create { name: String },
}

fn parse_filter(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once(':') {
        Some((field, value)) if !field.is_empty() => Ok((field.to_string(), value.to_string())),
        _ => Err(format!("expected field:value, got {raw:?}")),
    }
}

fn parse_sort(raw: &str) -> std::result::Result<(Order, String), String> {
    let (order, field) = match raw.strip_prefix('-') {
        Some(field) => (Order::Descending, field),
        None => (Order::Ascending, raw.strip_prefix('+').unwrap_or(raw)),
    };
    if field.is_empty() {
        return Err("sort field must not be empty".to_string());
    }
    Ok((order, field.to_string()))
}

fn build_client(url: &str, auth: &AuthArgs) -> Result<ApiClient> {
    if let Some(token) = auth.token.as_deref() {
        return ApiClient::new(url, Some(token));
    }
    match (&auth.auth_url, &auth.client_id, &auth.client_secret, &auth.audience) {
        (Some(auth_url), Some(client_id), Some(secret), Some(audience)) => {
            let mut config = AuthConfig::new(auth_url, client_id, secret, audience);
            config.grant_type = auth.grant_type.clone();
            ApiClient::with_token_cache(url, Arc::new(TokenCache::new(config)))
        }
        // Reported as a missing token.
        _ => ApiClient::new(url, None),
    }
}

fn print_json<T: Schema>(record: &T) -> Result<()> {
    let value = record.dump()?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let client = build_client(&cli.url, &cli.auth)?;
    let v2 = DevicesV2Api::from_client(client.clone());

    match cli.command {
        Commands::Devices {
            customer_id,
            list,
            assigned_to,
        } => {
            let query = list
                .apply(v2.devices(&customer_id)?)
                .assigned_to(assigned_to.as_deref());
            print_json(&query.all().await?)
        }
        Commands::DeviceStatus { customer_id, list } => {
            let v1 = DevicesV1Api::from_client(client);
            let query = list.apply(v1.get_devices(&customer_id)?);
            print_json(&query.all().await?)
        }
        Commands::Assignment {
            customer_id,
            device_id,
            action,
        } => {
            let assignment = v2.device(&customer_id, &device_id)?.assignment();
            match action {
                AssignmentAction::Get => print_json(&assignment.get().await?),
                AssignmentAction::Set {
                    assigned_to,
                    assigned_by,
                } => {
                    assignment.create(&assigned_to, &assigned_by).await?;
                    println!("assigned {} to {assigned_to}", assignment.host_identifier());
                    Ok(())
                }
                AssignmentAction::Delete => {
                    assignment.delete().await?;
                    println!("unassigned {}", assignment.host_identifier());
                    Ok(())
                }
            }
        }
        Commands::Mdm {
            customer_id,
            action,
        } => {
            let mdm = v2.mdm(&customer_id)?;
            match action {
                MdmAction::Get { name } => print_json(&mdm.get(&name).await?),
                MdmAction::Create { name } => print_json(&mdm.create(&name).await?),
            }
        }
        Commands::DownloadLink { customer_id } => {
            print_json(&v2.download_link(&customer_id)?.get().await?)
        }
        Commands::RequestAssignments {
            customer_id,
            employee_ids,
        } => {
            v2.assignments(&customer_id, &employee_ids)?.request().await?;
            println!("requested assignment for {} employee(s)", employee_ids.len());
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
