use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use norseus_admin::authz::Permission;
use norseus_admin::db::{self, MIGRATOR};
use norseus_admin::events::verify_chain;
use norseus_admin::models::role::PermissionInput;
use norseus_admin::models::staging::StagedPermissions;
use norseus_admin::services::bootstrap::{seed_facility, SeedRequest, StaffSeed};
use norseus_admin::settings::Settings;
use norseus_admin::stores::RoleStore;

#[derive(Parser, Debug)]
#[command(author, version, about = "norseus admin operator tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new empty migration with the provided name
    MakeMigration { name: String },
    /// Apply pending migrations
    MigrateRun,
    /// Show migration status against the current database
    MigrateStatus,
    /// Create a facility together with its first admin
    Seed {
        #[arg(long)]
        facility: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        password: String,
        /// Also create a plain employee (not admin, no role) with this email
        #[arg(long)]
        staff_email: Option<String>,
        #[arg(long, default_value = "Staff")]
        staff_name: String,
        /// Defaults to the admin password
        #[arg(long)]
        staff_password: Option<String>,
    },
    /// Role maintenance
    Role {
        #[command(subcommand)]
        command: RoleCommands,
    },
    /// Activity log maintenance
    Audit {
        #[command(subcommand)]
        command: AuditCommands,
    },
}

#[derive(Subcommand, Debug)]
enum RoleCommands {
    /// Create a role, e.g. `--perm employees:read --perm employees:create`
    Create {
        #[arg(long)]
        facility: Uuid,
        #[arg(long)]
        name: String,
        #[arg(long = "perm", required = true)]
        permissions: Vec<Permission>,
    },
}

#[derive(Subcommand, Debug)]
enum AuditCommands {
    /// Recompute the activity log hash chain
    Verify,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Try to load env from CWD; when running in Docker the binary CWD may differ,
    // so fall back to the crate-local `.env` using CARGO_MANIFEST_DIR.
    if dotenv().is_err() {
        let crate_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(crate_env);
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::MakeMigration { name } => {
            let path = make_migration_file(&name)?;
            println!("Created migration: {}", path.display());
        }
        Commands::MigrateRun => {
            // connecting applies pending migrations
            db::init().await?;
            println!("Migrations applied");
        }
        Commands::MigrateStatus => {
            let pool = get_pool().await?;
            print_status(&pool).await?;
        }
        Commands::Seed { facility, email, name, password, staff_email, staff_name, staff_password } => {
            let pool = db::init().await?;
            let staff = staff_email.map(|email| StaffSeed {
                email,
                name: staff_name,
                password: staff_password.unwrap_or_else(|| password.clone()),
            });
            let request = SeedRequest {
                facility_name: facility,
                admin_email: email,
                admin_name: name,
                admin_password: password,
                staff,
            };
            let outcome = seed_facility(&pool, &request).await?;
            println!("Facility {} ({})", outcome.facility.name, outcome.facility.id);
            println!("Admin {} ({})", outcome.admin.email, outcome.admin.id);
            if let Some(staff) = outcome.staff {
                println!("Staff {} ({})", staff.email, staff.id);
            }
        }
        Commands::Role { command: RoleCommands::Create { facility, name, permissions } } => {
            let pool = db::init().await?;
            let request = stage_role(&name, facility, &permissions)?;
            let pairs: Vec<Permission> = request.permissions.iter().map(PermissionInput::permission).collect();

            let settings = Settings::from_env()?;
            let role = RoleStore::new(pool, settings.role_name_policy)
                .create_role(request.facility_id, &request.role_name, &pairs)
                .await?;
            println!("Created role {} ({}) with {} permissions", role.name, role.id, role.permissions.len());
        }
        Commands::Audit { command: AuditCommands::Verify } => {
            let pool = db::init().await?;
            match verify_chain(&pool).await? {
                None => println!("Activity log intact"),
                Some(seq) => anyhow::bail!("activity log chain broken at seq {}", seq),
            }
        }
    }

    Ok(())
}

fn stage_role(
    name: &str,
    facility_id: Uuid,
    permissions: &[Permission],
) -> anyhow::Result<norseus_admin::models::role::CreateRoleRequest> {
    let mut staged = StagedPermissions::new();
    for permission in permissions {
        staged
            .add(Some(permission.action), Some(permission.section))
            .with_context(|| format!("cannot stage {}", permission))?;
    }
    Ok(staged.create_payload(name, facility_id)?)
}

fn make_migration_file(name: &str) -> anyhow::Result<PathBuf> {
    let timestamp = Utc::now().format("%Y%m%d%H%M%S");
    let sanitized = sanitize_name(name);
    let filename = format!("{}_{}.sql", timestamp, sanitized);
    let path = Path::new("migrations").join(filename);

    if path.exists() {
        anyhow::bail!("migration already exists: {}", path.display());
    }

    fs::write(&path, "-- Write your migration SQL here\n")
        .with_context(|| format!("failed to create migration at {}", path.display()))?;

    Ok(path)
}

/// Connects without migrating so pending migrations stay visible.
async fn get_pool() -> anyhow::Result<SqlitePool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    SqlitePool::connect(&database_url)
        .await
        .context("failed to connect to database")
}

async fn print_status(pool: &SqlitePool) -> anyhow::Result<()> {
    // If the migrations table doesn't exist, nothing is applied yet
    let has_table = sqlx::query("SELECT name FROM sqlite_master WHERE type='table' AND name='_sqlx_migrations'")
        .fetch_optional(pool)
        .await?
        .is_some();
    let applied_versions: HashSet<i64> = if has_table {
        let rows = sqlx::query("SELECT version FROM _sqlx_migrations WHERE success = 1")
            .fetch_all(pool)
            .await?;
        rows.iter().filter_map(|row| row.try_get::<i64, _>("version").ok()).collect()
    } else {
        HashSet::new()
    };

    println!("{:<8} {:<20} {}", "Status", "Version", "Name");
    for migration in MIGRATOR.iter() {
        let status = if applied_versions.contains(&migration.version) { "applied" } else { "pending" };
        let desc = migration.description.trim();
        let name = if desc.is_empty() { "unknown" } else { desc };
        println!("{:<8} {:<20} {}", status, migration.version, name);
    }

    Ok(())
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '_' => c,
            'A'..='Z' => c.to_ascii_lowercase(),
            _ => '_',
        })
        .collect()
}
