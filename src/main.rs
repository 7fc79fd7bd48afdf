use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shop_probe::{
    client::ShopClient,
    config::{ProbeConfig, parse_base_url},
    dto::{
        auth::LoginRequest,
        sync::{CartEntry, FavoriteEntry, SyncPayload},
    },
    error::ProbeError,
    probes::{Probe, SmokePlan, smoke},
    proxy, schema, verification,
};

#[derive(Parser)]
#[command(name = "shop-probe")]
#[command(author, version, about = "Manual probes for the shop backend")]
struct Cli {
    /// Backend root, e.g. http://127.0.0.1:3004 (overrides API_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Per-request timeout in seconds (overrides PROBE_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// GET /api/health
    Health,
    /// POST /api/auth/login and decode the returned token
    Login {
        #[arg(short, long)]
        login_input: Option<String>,

        #[arg(short, long)]
        password: Option<String>,
    },
    /// GET /api/orders/user/{id}
    Orders {
        user_id: String,

        /// Check every returned record against the assumed order schema
        #[arg(long)]
        check_schema: bool,
    },
    /// Read or push favorites/cart state
    Sync {
        #[command(subcommand)]
        action: SyncAction,
    },
    /// Run health, login, orders and sync-get one after another
    Smoke {
        #[arg(long)]
        user_id: Option<String>,

        #[arg(long)]
        check_schema: bool,
    },
    /// Print the assumed order schema, optionally checking a JSON file against it
    Schema {
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Show how a missing or malformed verification result is read
    VerifyDemo,
    /// Forward /api/* from the dev port to the backend
    Proxy {
        #[arg(long)]
        port: Option<u16>,

        #[arg(long)]
        upstream: Option<String>,
    },
}

#[derive(Subcommand)]
enum SyncAction {
    /// GET /api/users/{id}/sync
    Get { user_id: String },
    /// POST /api/users/{id}/sync
    Push {
        user_id: String,

        /// Favorite as ID:NAME (repeatable)
        #[arg(long = "favorite")]
        favorites: Vec<FavoriteEntry>,

        /// Cart line as ID:QTY (repeatable)
        #[arg(long = "cart")]
        cart: Vec<CartEntry>,

        /// Version to send; defaults to the server's current version + 1
        #[arg(long)]
        version: Option<i64>,

        /// Read the payload from a JSON file instead of flags
        #[arg(long, conflicts_with_all = ["favorites", "cart"])]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,shop_probe=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = ProbeConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url)?;
    }
    if let Some(secs) = cli.timeout {
        config = config.with_timeout_secs(secs);
    }

    let probe = match cli.command {
        Commands::Health => Probe::Health,
        Commands::Login {
            login_input,
            password,
        } => Probe::Login(credentials(&config, login_input, password)?),
        Commands::Orders {
            user_id,
            check_schema,
        } => Probe::Orders {
            user_id,
            check_schema,
        },
        Commands::Sync { action } => match action {
            SyncAction::Get { user_id } => Probe::SyncGet { user_id },
            SyncAction::Push {
                user_id,
                favorites,
                cart,
                version,
                file,
            } => {
                let payload = match file {
                    Some(path) => read_json::<SyncPayload>(&path)?,
                    None => SyncPayload {
                        favorites,
                        cart,
                        version: 0,
                    },
                };
                // an explicit flag wins over the file's version
                let version = version.or_else(|| (payload.version > 0).then_some(payload.version));
                Probe::SyncPush {
                    user_id,
                    payload,
                    version,
                }
            }
        },
        Commands::Smoke {
            user_id,
            check_schema,
        } => return run_smoke(&config, user_id, check_schema).await,
        Commands::Schema { file } => return check_schema_file(file),
        Commands::VerifyDemo => {
            verify_demo();
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Proxy { port, upstream } => {
            if let Some(port) = port {
                config.proxy_port = port;
            }
            if let Some(upstream) = upstream {
                config.proxy_upstream = parse_base_url(&upstream)?;
            }
            proxy::serve(&config).await?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    let client = ShopClient::from_config(&config)?;
    match probe.run(&client).await {
        Ok(run) => {
            println!("{run}");
            Ok(if run.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Err(err) => {
            print_failure(probe.name(), &err);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn credentials(
    config: &ProbeConfig,
    login_input: Option<String>,
    password: Option<String>,
) -> anyhow::Result<LoginRequest> {
    let login_input = login_input
        .or_else(|| config.login_input.clone())
        .context("no login input: pass --login-input or set LOGIN_INPUT")?;
    let password = password
        .or_else(|| config.login_password.clone())
        .context("no password: pass --password or set LOGIN_PASSWORD")?;
    Ok(LoginRequest::new(login_input, password))
}

async fn run_smoke(
    config: &ProbeConfig,
    user_id: Option<String>,
    check_schema: bool,
) -> anyhow::Result<ExitCode> {
    let login = match (&config.login_input, &config.login_password) {
        (Some(input), Some(password)) => Some(LoginRequest::new(input, password)),
        _ => None,
    };
    let plan = SmokePlan {
        login,
        user_id,
        check_schema,
    };

    let client = ShopClient::from_config(config)?;
    let steps = smoke(&client, &plan).await;
    for step in &steps {
        println!("{step}");
    }
    let failed = steps.iter().filter(|step| !step.passed()).count();
    println!("{} step(s), {failed} failed", steps.len());

    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn check_schema_file(file: Option<PathBuf>) -> anyhow::Result<ExitCode> {
    print!("{}", schema::print_assumptions());
    let Some(path) = file else {
        return Ok(ExitCode::SUCCESS);
    };

    let value = read_json::<serde_json::Value>(&path)?;
    let records = match value {
        serde_json::Value::Array(items) => items,
        other => vec![other],
    };

    let mut errors = 0;
    for (index, record) in records.iter().enumerate() {
        let findings = schema::check_order(record);
        if findings.is_empty() {
            println!("[{index}] ok");
        }
        for finding in findings {
            let level = if finding.is_warning() {
                "warn"
            } else {
                errors += 1;
                "error"
            };
            println!("[{index}] {level}: {finding}");
        }
    }

    Ok(if errors == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn verify_demo() {
    for case in verification::demo_cases() {
        let input = case
            .input
            .as_ref()
            .map(|value| value.to_string())
            .unwrap_or_else(|| "<absent>".to_string());
        println!(
            "{:<24} {:<24} success = {}",
            case.label,
            input,
            verification::is_success(case.input.as_ref())
        );
    }
}

fn print_failure(probe: &str, err: &ProbeError) {
    match err {
        ProbeError::Timeout => println!("[{probe}] timed out"),
        ProbeError::Connect(reason) => println!("[{probe}] connection failed: {reason}"),
        other => println!("[{probe}] failed: {other}"),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}
