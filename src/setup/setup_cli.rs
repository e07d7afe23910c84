use clap::{Parser, Subcommand};
use blogbase_backend::config::Config;
use blogbase_backend::models::db_operations::users_db_operations;
use blogbase_backend::models::Role;
use blogbase_backend::setup::db_setup;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "setup_cli", author, version, about = "A CLI for initial application setup.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the .env configuration file.
    #[arg(long, required = true, value_name = "FILE")]
    env_file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
    Writer {
        #[command(subcommand)]
        action: WriterAction,
    },
}

#[derive(Subcommand, Debug)]
enum DbAction {
    /// Creates the schema and seeds the Reader and Writer roles.
    Setup,
}

#[derive(Subcommand, Debug)]
enum WriterAction {
    /// Creates an account holding both the Reader and Writer roles.
    Create {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    List,
}

fn main() {
    let cli = Cli::parse();

    let config = Config::from_env(&cli.env_file)
        .expect("FATAL: Failed to load or parse configuration.");

    match &cli.command {
        Commands::Db { action } => match action {
            DbAction::Setup => setup_database(&config),
        },
        Commands::Writer { action } => match action {
            WriterAction::Create { email, password } => create_writer(&config, email, password),
            WriterAction::List => list_writers(&config),
        },
    }
}

fn open_existing(config: &Config) -> Option<Connection> {
    let db_path = config.database_file();
    if !db_path.exists() {
        eprintln!("❌ Error: Database not found at '{}'. Please run `setup_cli db setup` first.", db_path.display());
        return None;
    }
    match Connection::open(&db_path) {
        Ok(conn) => Some(conn),
        Err(e) => {
            eprintln!("❌ Error opening database: {}", e);
            None
        }
    }
}

fn setup_database(config: &Config) {
    let db_path = config.database_file();
    println!("\nSetting up database at '{}'...", db_path.display());

    if let Some(parent_dir) = db_path.parent() {
        fs::create_dir_all(parent_dir).expect("Could not create database directory.");
    }

    let mut conn = Connection::open(&db_path).expect("Could not create database file.");
    match db_setup::setup_database(&mut conn) {
        Ok(_) => println!("✅ Database setup completed successfully. Roles: Reader, Writer."),
        Err(e) => eprintln!("❌ Error setting up database: {}", e),
    }
}

fn create_writer(config: &Config, email: &str, password: &str) {
    let mut conn = match open_existing(config) {
        Some(conn) => conn,
        None => return,
    };

    let result = (|| -> rusqlite::Result<()> {
        let tx = conn.transaction()?;
        let identity = users_db_operations::create_user(&tx, email, password, config.password_hash_cost)?;
        users_db_operations::add_user_to_role(&tx, identity.id, Role::Reader)?;
        users_db_operations::add_user_to_role(&tx, identity.id, Role::Writer)?;
        tx.commit()
    })();

    match result {
        Ok(_) => println!("✅ Writer '{}' created successfully.", email.trim()),
        Err(e) => eprintln!("❌ Error creating writer: {}. It might be because the email already exists.", e),
    }
}

fn list_writers(config: &Config) {
    let conn = match open_existing(config) {
        Some(conn) => conn,
        None => return,
    };

    println!("Listing Writers:");
    match users_db_operations::read_emails_with_role(&conn, Role::Writer) {
        Ok(emails) => {
            for email in emails {
                println!("- {}", email);
            }
        }
        Err(e) => eprintln!("❌ Error fetching writers: {}", e),
    }
}
