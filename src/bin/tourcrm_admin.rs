//! Operator CLI: applies migrations, creates tenants and mints bearer tokens.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tourcrm::{
    auth::{JwtManager, Role},
    config::{AppConfig, ConfigLoader},
    db,
    repositories::{CreateTenantRequest, TenantRepository},
};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "tourcrm-admin", version, about = "Tour CRM administration")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending database migrations
    Migrate,
    /// Create a tenant and print its id
    CreateTenant {
        #[arg(long)]
        name: String,
    },
    /// Issue a bearer token for a user of an existing tenant
    IssueToken {
        #[arg(long)]
        tenant_id: Uuid,
        /// admin, agent, finance or viewer
        #[arg(long)]
        role: Role,
        /// Defaults to a fresh random id
        #[arg(long)]
        user_id: Option<Uuid>,
        /// Overrides TOURCRM_JWT_EXPIRATION_SECONDS
        #[arg(long)]
        ttl_seconds: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ConfigLoader::new().load().context("loading configuration")?;

    let db = db::init_pool(&config)
        .await
        .context("initializing database connection pool")?;

    match cli.command {
        Command::Migrate => {
            db::run_migrations(&db).await?;
            println!("migrations applied");
        }
        Command::CreateTenant { name } => {
            let tenant = TenantRepository::new(&db)
                .create_tenant(CreateTenantRequest { name })
                .await
                .context("creating tenant")?;
            println!("{}", tenant.id);
        }
        Command::IssueToken {
            tenant_id,
            role,
            user_id,
            ttl_seconds,
        } => {
            let exists = TenantRepository::new(&db)
                .get_tenant_by_id(tenant_id)
                .await
                .context("looking up tenant")?
                .is_some();
            if !exists {
                bail!("tenant {tenant_id} does not exist");
            }

            let token = jwt_manager(&config)?
                .issue(user_id.unwrap_or_else(Uuid::new_v4), tenant_id, role, ttl_seconds)
                .context("issuing token")?;
            println!("{token}");
        }
    }

    Ok(())
}

fn jwt_manager(config: &AppConfig) -> Result<JwtManager> {
    let secret = config
        .jwt_secret
        .as_deref()
        .context("TOURCRM_JWT_SECRET is not set")?;
    Ok(JwtManager::new(secret, config.jwt_expiration_seconds))
}
