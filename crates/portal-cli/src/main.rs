mod cmd;
mod output;
mod root;
mod terminal;

use clap::{Parser, Subcommand};
use cmd::{
    account::{LoginSubcommand, SignupArgs},
    appointments::AppointmentArgs,
    config::ConfigSubcommand,
    directory::{FilterArgs, NewDoctorArgs},
    Ctx,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "medportal",
    about = "Browse the MedPortal doctor directory and manage appointments",
    version,
    propagate_version = true
)]
struct Cli {
    /// Directory holding .medportal/ (default: search upward, then $HOME)
    #[arg(long, global = true, env = "MEDPORTAL_ROOT")]
    root: Option<PathBuf>,

    /// Backend base URL, overriding api_base_url from the config file
    #[arg(long, global = true, env = "MEDPORTAL_API_URL")]
    api_url: Option<String>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Answer yes to confirmation prompts
    #[arg(long, global = true, short = 'y')]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login {
        #[command(subcommand)]
        subcommand: LoginSubcommand,
    },

    /// Create a patient account
    Signup(SignupArgs),

    /// End the session
    Logout,

    /// Show the current role and its navigation
    Session,

    /// Follow a navigation item by id (e.g. loginBtn, logoutLink)
    Nav { id: String },

    /// List doctors, optionally filtered
    Doctors(FilterArgs),

    /// Add a doctor (admin)
    AddDoctor(NewDoctorArgs),

    /// Delete a doctor (admin)
    DeleteDoctor { id: String },

    /// Start booking with a doctor (patient)
    Book { id: String },

    /// Show appointments for the signed-in doctor or patient
    Appointments(AppointmentArgs),

    /// Inspect and validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let ctx = Ctx {
        root: root::resolve_root(cli.root.as_deref()),
        api_url: cli.api_url,
        json: cli.json,
        yes: cli.yes,
    };

    let result = match cli.command {
        Commands::Login { subcommand } => cmd::account::login(&ctx, subcommand),
        Commands::Signup(args) => cmd::account::signup(&ctx, args),
        Commands::Logout => cmd::session::logout(&ctx),
        Commands::Session => cmd::session::show(&ctx),
        Commands::Nav { id } => cmd::session::nav(&ctx, &id),
        Commands::Doctors(filter) => cmd::directory::list(&ctx, filter),
        Commands::AddDoctor(args) => cmd::directory::add(&ctx, args),
        Commands::DeleteDoctor { id } => cmd::directory::delete(&ctx, &id),
        Commands::Book { id } => cmd::directory::book(&ctx, &id),
        Commands::Appointments(args) => cmd::appointments::run(&ctx, args),
        Commands::Config { subcommand } => cmd::config::run(&ctx, subcommand),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
