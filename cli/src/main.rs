use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde_json::{Value, json};
use swimclass::config::{ClientConfig, ConfigError};
use swimclass::identity::{FirebaseIdentity, IdentityError, IdentityProvider};
use swimclass::net::api::{ApiError, RestBackend};
use swimclass::net::types::{FALLBACK_DISPLAY_NAME, UserRecord, UserRole};
use swimclass::state::auth::{AuthContext, AuthState, Resolution};
use swimclass::util::money::CurrencyFormat;
use swimclass::util::route_guard::{GuardEvent, RouteGuard};
use swimclass::util::schedule::format_schedule_str;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("sign-in did not resolve to an application user ({0})")]
    Unresolved(&'static str),
    #[error("could not parse amount `{0}`")]
    InvalidAmount(String),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "swimclass", about = "Swim class client: sign-in, route gating and display formatting")]
struct Cli {
    #[arg(long, env = "SWIMCLASS_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and resolve the application user.
    Whoami(Credentials),
    /// Register an account, then resolve (and provision) its user record.
    Register {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(long)]
        name: Option<String>,
    },
    /// Show what the route guard decides for a path.
    Route {
        path: String,
        #[arg(long, default_value_t = false)]
        signed_in: bool,
    },
    /// Format a schedule given as JSON text.
    Schedule { json: String },
    Price(PriceCommand),
}

#[derive(Args, Debug)]
struct Credentials {
    #[arg(long, env = "SWIMCLASS_EMAIL")]
    email: String,
    #[arg(long, env = "SWIMCLASS_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args, Debug)]
struct PriceCommand {
    #[command(subcommand)]
    command: PriceSubcommand,
}

#[derive(Subcommand, Debug)]
enum PriceSubcommand {
    /// Format an amount in minor units; omit for zero.
    Format {
        #[arg(allow_negative_numbers = true)]
        minor: Option<i64>,
    },
    /// Format an amount in major units.
    Major {
        #[arg(allow_negative_numbers = true)]
        amount: f64,
    },
    /// Parse displayed text back to minor units.
    Parse { text: String },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url.trim_end_matches('/').to_owned();
    }

    match cli.command {
        Command::Whoami(credentials) => run_sign_in(&config, &credentials, None, false).await,
        Command::Register { credentials, name } => run_sign_in(&config, &credentials, name.as_deref(), true).await,
        Command::Route { path, signed_in } => run_route(&config, path, signed_in),
        Command::Schedule { json } => print_json(&serde_json::to_value(format_schedule_str(&json))?),
        Command::Price(price) => run_price(&config.currency, price),
    }
}

async fn run_sign_in(
    config: &ClientConfig,
    credentials: &Credentials,
    display_name: Option<&str>,
    register: bool,
) -> Result<(), CliError> {
    let identity = Arc::new(FirebaseIdentity::new(config.require_identity()?, config.timeouts)?);
    let session = if register {
        identity.sign_up(&credentials.email, &credentials.password, display_name).await?
    } else {
        identity.sign_in_with_password(&credentials.email, &credentials.password).await?
    };
    tracing::info!(uid = %session.uid, "identity session established");

    let backend = Arc::new(RestBackend::new(&config.api_url, identity.clone(), config.timeouts)?);
    let auth = AuthContext::new(identity.clone(), backend);
    match auth.handle_session_change(identity.current_session()).await {
        Resolution::Authenticated(user) => print_json(&serde_json::to_value(user)?),
        Resolution::SignedOut => Err(CliError::Unresolved("no session")),
        Resolution::ForcedSignOut => Err(CliError::Unresolved("backend rejected the session")),
        Resolution::Superseded => Err(CliError::Unresolved("superseded")),
    }
}

fn run_route(config: &ClientConfig, path: String, signed_in: bool) -> Result<(), CliError> {
    let mut guard = RouteGuard::new(config.public_routes.clone(), path);
    let user = signed_in.then(|| UserRecord {
        id: "cli".to_owned(),
        email: String::new(),
        name: FALLBACK_DISPLAY_NAME.to_owned(),
        profile_image: None,
        user_type: UserRole::User,
        description: None,
    });
    let outcome = guard.dispatch(GuardEvent::AuthChanged(AuthState { user, loading: false }));
    print_json(&json!({
        "path": guard.path(),
        "class": format!("{:?}", guard.route_class()),
        "view": format!("{:?}", outcome.view),
    }))
}

fn run_price(currency: &CurrencyFormat, price: PriceCommand) -> Result<(), CliError> {
    match price.command {
        PriceSubcommand::Format { minor } => println!("{}", currency.format_display_price(minor)),
        PriceSubcommand::Major { amount } => println!("{}", currency.format_major(Some(amount))),
        PriceSubcommand::Parse { text } => {
            let minor = currency.parse_display_amount(&text).ok_or(CliError::InvalidAmount(text))?;
            println!("{minor}");
        }
    }
    Ok(())
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
