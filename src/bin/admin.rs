//! Operator CLI for on-demand billing maintenance.

use clap::{Parser, Subcommand};
use dotenvy::dotenv;

use storehouse::infra::setup::init_app_state;

#[derive(Parser)]
#[command(name = "storehouse-admin")]
#[command(author, version, about = "Storehouse operator tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Re-fetch a user's subscription from the billing provider and update
    /// the local record to match.
    SyncSubscription {
        /// Email address of the user to sync
        email: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let cli = Cli::parse();
    let app_state = init_app_state().await?;

    match cli.command {
        Commands::SyncSubscription { email } => {
            match app_state
                .billing_use_cases
                .sync_subscription_by_email(&email)
                .await
            {
                Ok(report) => {
                    println!("Synced subscription for {}", report.email);
                    println!("  provider subscription: {}", report.provider_subscription_id);
                    println!("  status:                {}", report.status.as_str());
                    println!(
                        "  period end before:     {}",
                        report
                            .previous_period_end
                            .map(|t| t.to_rfc3339())
                            .unwrap_or_else(|| "none".into())
                    );
                    println!(
                        "  period end after:      {}",
                        report
                            .refreshed_period_end
                            .map(|t| t.to_rfc3339())
                            .unwrap_or_else(|| "none".into())
                    );
                }
                Err(err) => {
                    eprintln!("sync failed: {err}");
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
