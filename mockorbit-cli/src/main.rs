//! Mock Orbit CLI - inspect and drive the persisted session from the command line
//!
//! Every invocation behaves like an application start: the session is restored from the
//! session file, the command runs, and the result is written back.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mockorbit_core::{
    init_logging, log_operation_error, log_operation_start, log_operation_success, AuthResponse,
    Identity, MockOrbitConfig,
};
use mockorbit_session::{
    FileStore, GuardDecision, MemoryNavigator, RouteGuard, SessionController, SessionShell,
    StoreKeys,
};
use std::path::PathBuf;
use tracing::{debug, info};

type Shell = SessionShell<FileStore, MemoryNavigator>;

#[derive(Parser)]
#[command(name = "mockorbit")]
#[command(about = "Session and role controller for Mock Orbit")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the persisted session
    Status,

    /// Store the result of a successful sign-in
    Login {
        /// Credential issued by the authentication service
        #[arg(short, long, required_unless_present = "response")]
        token: Option<String>,

        /// Identity record as JSON, or @path to a file holding it
        #[arg(short, long, conflicts_with = "response", required_unless_present = "response")]
        identity: Option<String>,

        /// Full login response ({"token": ..., "user": ...}) as JSON, or @path
        #[arg(short, long, conflicts_with = "token")]
        response: Option<String>,
    },

    /// Sign out and clear the session file
    Logout,

    /// Toggle between the interviewer and interviewee role
    SwitchRole,

    /// Show what the route guard does for a path
    Route {
        /// Application path, e.g. /dashboard/interviewer
        path: String,
    },

    /// List the navigation entries for the signed-in account
    Menu,

    /// Print the Authorization header value for API requests
    AuthHeader,

    /// Manage the configuration file
    Config {
        /// Write a default configuration file
        #[arg(long)]
        init: bool,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // The config file may not exist yet when managing it
    let config = match cli.command {
        Commands::Config { .. } => MockOrbitConfig::default(),
        _ => MockOrbitConfig::load(cli.config.as_deref())
            .context("Failed to load configuration")?,
    };

    let logging_config = if cli.verbose {
        config.logging.clone().verbose()
    } else {
        config.logging.clone()
    };
    init_logging(&logging_config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    debug!("Starting Mock Orbit CLI v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Status => handle_status(&config, cli.json),
        Commands::Login {
            token,
            identity,
            response,
        } => handle_login(&config, token, identity, response, cli.json),
        Commands::Logout => handle_logout(&config),
        Commands::SwitchRole => handle_switch_role(&config, cli.json),
        Commands::Route { path } => handle_route(&config, &path, cli.json),
        Commands::Menu => handle_menu(&config, cli.json),
        Commands::AuthHeader => handle_auth_header(&config),
        Commands::Config { init, force } => handle_config(cli.config, init, force),
    }
}

/// Construct the controller over the configured session file and start the shell at `path`
fn start_shell(config: &MockOrbitConfig, path: &str) -> Result<Shell> {
    let store = FileStore::from_config(&config.storage).with_context(|| {
        format!(
            "Failed to open session store at {}",
            config.storage.session_file().display()
        )
    })?;
    let controller = SessionController::with_keys(store, StoreKeys::from(&config.storage));

    let mut shell = SessionShell::new(
        controller,
        RouteGuard::new(config.routes.clone()),
        MemoryNavigator::new(path),
    );
    shell.start();
    Ok(shell)
}

fn read_json_arg(arg: &str) -> Result<String> {
    match arg.strip_prefix('@') {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))
        }
        None => Ok(arg.to_string()),
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn handle_status(config: &MockOrbitConfig, json: bool) -> Result<()> {
    let shell = start_shell(config, &config.routes.landing_path)?;
    let controller = shell.controller();

    if json {
        return print_json(&serde_json::json!({
            "state": controller.lifecycle_state(),
            "identity": controller.identity(),
            "active_role": controller.active_role(),
            "can_switch_role": controller.can_switch_role(),
        }));
    }

    println!("State: {}", controller.lifecycle_state());
    if let Some(identity) = controller.identity() {
        println!("User: {} <{}> [{}]", identity.name, identity.email, identity.initials());
        let roles: Vec<String> = identity.granted_roles.iter().map(|r| r.to_string()).collect();
        println!("Roles: {}", roles.join(", "));
        if let Some(role) = controller.active_role() {
            println!("Active role: {}", role);
        }
        println!("Can switch role: {}", controller.can_switch_role());
    }
    Ok(())
}

fn handle_login(
    config: &MockOrbitConfig,
    token: Option<String>,
    identity: Option<String>,
    response: Option<String>,
    json: bool,
) -> Result<()> {
    log_operation_start!("login");

    let (credential, identity) = match (token, identity, response) {
        (_, _, Some(response)) => {
            let response: AuthResponse = serde_json::from_str(&read_json_arg(&response)?)
                .context("Login response is not valid JSON")?;
            response.into_parts()
        }
        (Some(token), Some(identity), None) => {
            let identity: Identity = serde_json::from_str(&read_json_arg(&identity)?)
                .context("Identity record is not valid JSON")?;
            (token, identity)
        }
        _ => bail!("Either --response or both --token and --identity are required"),
    };

    if credential.trim().is_empty() {
        let error = anyhow::anyhow!("Credential must not be empty");
        log_operation_error!("login", error);
        return Err(error);
    }

    let mut shell = start_shell(config, &config.routes.login_path)?;
    shell.login(credential, identity);
    log_operation_success!("login", path = shell.current_path());

    let controller = shell.controller();
    if json {
        return print_json(&serde_json::json!({
            "active_role": controller.active_role(),
            "can_switch_role": controller.can_switch_role(),
            "landing": shell.current_path(),
        }));
    }

    if let (Some(identity), Some(role)) = (controller.identity(), controller.active_role()) {
        println!("Signed in as {} ({})", identity.name, role);
    }
    println!("Continue at {}", shell.current_path());
    Ok(())
}

fn handle_logout(config: &MockOrbitConfig) -> Result<()> {
    let mut shell = start_shell(config, &config.routes.landing_path)?;
    let was_signed_in = shell.controller().is_authenticated();
    shell.logout();

    if was_signed_in {
        info!("Session cleared");
        println!("Signed out");
    } else {
        println!("Not signed in");
    }
    Ok(())
}

fn handle_switch_role(config: &MockOrbitConfig, json: bool) -> Result<()> {
    let mut shell = start_shell(config, &config.routes.landing_path)?;
    let Some(current) = shell.active_role() else {
        bail!("Not signed in");
    };

    // Act as if the user pressed the switch on their dashboard
    shell.navigate(&config.routes.dashboard_for(current));
    shell.switch_role();

    let active = shell.active_role();
    if json {
        return print_json(&serde_json::json!({
            "active_role": active,
            "changed": active != Some(current),
            "landing": shell.current_path(),
        }));
    }

    match active {
        Some(role) if role != current => {
            println!("Active role: {}", role);
            println!("Continue at {}", shell.current_path());
        }
        _ => println!("Role unchanged: account holds a single role"),
    }
    Ok(())
}

fn handle_route(config: &MockOrbitConfig, path: &str, json: bool) -> Result<()> {
    let shell = start_shell(config, &config.routes.landing_path)?;
    let controller = shell.controller();
    let decision = RouteGuard::new(config.routes.clone()).decide(
        controller.lifecycle_state(),
        controller.active_role(),
        path,
    );

    if json {
        return print_json(&decision);
    }

    match decision {
        GuardDecision::Defer => println!("defer"),
        GuardDecision::Allow => println!("allow"),
        GuardDecision::Redirect { to, reason } => println!("redirect -> {} ({})", to, reason),
    }
    Ok(())
}

fn handle_menu(config: &MockOrbitConfig, json: bool) -> Result<()> {
    let shell = start_shell(config, &config.routes.landing_path)?;
    let menu = shell.menu();

    if json {
        return print_json(&menu);
    }

    if menu.is_empty() {
        println!("Not signed in");
    }
    for item in menu {
        println!("{:<24} {}", item.label, item.href);
    }
    Ok(())
}

fn handle_auth_header(config: &MockOrbitConfig) -> Result<()> {
    let shell = start_shell(config, &config.routes.landing_path)?;
    match shell.controller().authorization_header() {
        Some(header) => {
            println!("{}", header);
            Ok(())
        }
        None => bail!("Not signed in"),
    }
}

fn handle_config(path: Option<PathBuf>, init: bool, force: bool) -> Result<()> {
    let path = path
        .or_else(MockOrbitConfig::default_path)
        .context("Could not determine a configuration directory")?;

    if !init {
        println!("{}", path.display());
        return Ok(());
    }

    if path.exists() && !force {
        bail!(
            "{} already exists, pass --force to overwrite",
            path.display()
        );
    }

    MockOrbitConfig::default().save_to_file(&path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}
