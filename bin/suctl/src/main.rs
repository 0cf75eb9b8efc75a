//! ---
//! su_section: "05-networking-external-interfaces"
//! su_subsection: "binary"
//! su_type: "source"
//! su_scope: "code"
//! su_description: "Terminal console for the student union management system."
//! su_version: "v0.1.0"
//! su_owner: "tbd"
//! ---
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use su_api::{ApiError, ListQuery};
use su_security::{menu, Navigation, Redirect};

mod context;
mod views;

use context::AppContext;

/// Redirect chains longer than this are treated as a loop.
const MAX_REDIRECTS: usize = 4;

#[derive(Debug, Parser)]
#[command(author, version, about = "Student union management console", long_about = None)]
struct Cli {
    /// Configuration file, tried before the default locations. SU_CONFIG still wins.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print session metrics in Prometheus text format after the command.
    #[arg(long, global = true)]
    print_metrics: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Sign in and persist the session token.
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "SU_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and forget the session token.
    Logout,
    /// Show the signed-in user, roles and effective permissions.
    Whoami {
        #[arg(long)]
        json: bool,
    },
    /// Show the navigation menu for the current session.
    Menu,
    /// Open a page such as /students or /logs.
    Open(OpenArgs),
}

#[derive(Debug, Args)]
struct OpenArgs {
    /// Location to open.
    path: String,
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    size: Option<u32>,
    /// Listing filter as key=value, repeatable.
    #[arg(long = "filter", value_name = "KEY=VALUE", value_parser = parse_filter)]
    filters: Vec<(String, String)>,
}

impl OpenArgs {
    fn query(&self) -> ListQuery {
        ListQuery {
            page: self.page,
            size: self.size,
            filters: self.filters.clone(),
            ..ListQuery::default()
        }
    }
}

fn parse_filter(raw: &str) -> Result<(String, String)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected KEY=VALUE, got {raw}"))?;
    if key.trim().is_empty() {
        bail!("filter key must not be empty");
    }
    Ok((key.trim().to_owned(), value.to_owned()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut candidates = Vec::new();
    if let Some(path) = &cli.config {
        candidates.push(path.clone());
    }
    candidates.push(PathBuf::from("su-console.toml"));
    candidates.push(PathBuf::from("configs/su-console.toml"));
    let loaded = su_common::AppConfig::load_with_source(&candidates)?;
    su_common::init_tracing("suctl", &loaded.config.logging)?;
    if let Some(source) = &loaded.source {
        tracing::debug!(config = %source.display(), "configuration loaded");
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let ctx = AppContext::build(&loaded.config)?;
    let result = runtime.block_on(run(&ctx, cli.command));
    if cli.print_metrics {
        eprint!("{}", ctx.metrics_text()?);
    }
    result
}

async fn run(ctx: &AppContext, command: Commands) -> Result<()> {
    ctx.store.bootstrap().await;
    match command {
        Commands::Login { username, password } => {
            let identity = ctx.store.login(&username, &password).await?;
            let roles: Vec<&str> = identity.roles.iter().map(|r| r.display_name()).collect();
            println!("Signed in as {} ({})", identity.username, roles.join(", "));
        }
        Commands::Logout => {
            ctx.store.logout();
            println!("Signed out");
        }
        Commands::Whoami { json } => views::whoami(ctx, json)?,
        Commands::Menu => views::print_menu(&menu(&ctx.session.snapshot())),
        Commands::Open(args) => open(ctx, &args).await?,
    }
    Ok(())
}

async fn open(ctx: &AppContext, args: &OpenArgs) -> Result<()> {
    let mut location = args.path.clone();
    for _ in 0..MAX_REDIRECTS {
        match ctx.guard.navigate(&location) {
            Navigation::Render(route) => {
                return match views::render(ctx, route, &args.query()).await {
                    Err(err) if ended_session(&err) => Ok(()),
                    other => other,
                };
            }
            Navigation::Redirected(Redirect::Alias { path }) => location = path,
            Navigation::Redirected(_) => return Ok(()),
            Navigation::Loading => {
                println!("Loading…");
                return Ok(());
            }
            Navigation::NotFound => bail!("no page at {location}"),
        }
    }
    bail!("too many redirects while opening {}", args.path)
}

/// A 401 while rendering has already been reported as a login redirect.
fn ended_session(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::Unauthorized { .. })
    )
}
