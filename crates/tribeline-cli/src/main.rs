mod challenges;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tribeline_core::{AppConfig, UserId};
use tribeline_db::PgStore;
use tribeline_engine::Engine;

use crate::challenges::{
    run_challenge_check, run_challenge_claim, run_challenges_list, ChallengeCommands,
};

#[derive(Debug, Parser)]
#[command(name = "tribeline-cli")]
#[command(about = "Tribeline achievements command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Record a login and print the streak
    Login {
        #[arg(long)]
        user: String,
    },
    /// Inspect and credit challenges
    Challenges {
        #[command(subcommand)]
        command: ChallengeCommands,
    },
    /// Print a user's notifications, newest first
    Notifications {
        #[arg(long)]
        user: String,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("tribeline-cli ready; run with --help for commands");
        return Ok(());
    };

    // The catalog is compiled in; listing it needs no configuration.
    if let Commands::Challenges {
        command: ChallengeCommands::List,
    } = command
    {
        run_challenges_list();
        return Ok(());
    }

    let config = tribeline_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool = connect(&config).await?;

    match command {
        Commands::Db {
            command: DbCommands::Ping,
        } => {
            tribeline_db::health_check(&pool).await?;
            println!("database ok");
        }
        Commands::Db {
            command: DbCommands::Migrate,
        } => {
            let applied = tribeline_db::run_migrations(&pool).await?;
            println!("migrations applied: {applied}");
        }
        Commands::Login { user } => {
            let engine = engine(pool, &config);
            let report = engine.record_login(&UserId::new(user)).await?;
            println!(
                "streak: {} day(s) ({})",
                report.consecutive_login_days,
                serde_json::to_string(&report.update)?
            );
        }
        Commands::Challenges { command } => {
            let engine = engine(pool, &config);
            match command {
                ChallengeCommands::List => run_challenges_list(),
                ChallengeCommands::Check { user, id, notify } => {
                    run_challenge_check(&engine, &UserId::new(user), id, notify).await?;
                }
                ChallengeCommands::Claim { user, id } => {
                    run_challenge_claim(&engine, &UserId::new(user), id).await?;
                }
            }
        }
        Commands::Notifications { user } => {
            let engine = engine(pool, &config);
            let list = engine.list_notifications(&UserId::new(user)).await?;
            if list.is_empty() {
                println!("no notifications");
            }
            for n in &list {
                println!(
                    "{}  {:<10}{}",
                    n.created_at.format("%Y-%m-%d %H:%M"),
                    n.category,
                    n.message
                );
            }
        }
    }

    Ok(())
}

async fn connect(config: &AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = tribeline_db::PoolConfig::from_app_config(config);
    Ok(tribeline_db::connect_pool(&config.database_url, pool_config).await?)
}

fn engine(pool: sqlx::PgPool, config: &AppConfig) -> Engine<PgStore> {
    Engine::new(PgStore::new(pool), config.utc_offset)
}
