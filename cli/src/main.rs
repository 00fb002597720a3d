//! LANDREG CLI - Command Line Interface

use clap::{Parser, Subcommand};
use colored::Colorize;
use landreg_cli::{ApiClient, ApiError};
use landreg_core::{KeyedRecord, PropertyRecord};

#[derive(Parser)]
#[command(name = "landreg")]
#[command(about = "LANDREG - Property Registry CLI")]
#[command(version)]
struct Cli {
    /// Node URL
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    node: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Node status
    Status,

    /// Write the demonstration records
    Seed,

    /// Create or replace a record
    Create {
        /// Record key
        key: String,

        #[arg(long = "type")]
        prop_type: String,

        #[arg(long)]
        city: String,

        #[arg(long)]
        state: String,

        /// Area in square feet
        #[arg(long)]
        area: String,

        #[arg(long)]
        owner: String,
    },

    /// Show one record
    Read {
        key: String,
    },

    /// List every record in key order
    List,

    /// Reassign a record to a new owner
    Transfer {
        key: String,

        /// New owner name
        #[arg(short, long)]
        to: String,
    },

    /// Property types held by an owner
    OwnedBy {
        owner: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let api_client = ApiClient::new(&cli.node)?;

    if let Err(e) = run(cli.command, &api_client).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(command: Commands, api_client: &ApiClient) -> Result<(), ApiError> {
    match command {
        Commands::Status => {
            let status = api_client.status().await?;
            println!("{}", "LANDREG Node Status".bold());
            println!("===================");
            println!("Name:          {}", status.name);
            println!("Backend:       {}", status.backend);
            println!("Height:        {}", status.height);
            println!("Records:       {}", status.records);
            println!("Committed Txs: {}", status.committed_transactions);
            println!("Rejected Txs:  {}", status.rejected_transactions);
            println!("Open Cursors:  {}", status.open_cursors);
        }

        Commands::Seed => {
            let seeded = api_client.seed().await?;
            println!("{} Seeded {} records", "✅".green(), seeded);
        }

        Commands::Create {
            key,
            prop_type,
            city,
            state,
            area,
            owner,
        } => {
            let record = PropertyRecord::new(prop_type, city, state, area, owner);
            api_client.create_record(&key, &record).await?;
            println!("{} Record '{}' written", "✅".green(), key);
        }

        Commands::Read { key } => {
            let record = api_client.read_record(&key).await?;
            print_header();
            print_row(&KeyedRecord { key, record });
        }

        Commands::List => {
            let records = api_client.list_records().await?;
            if records.is_empty() {
                println!("No records found.");
            } else {
                print_header();
                for keyed in &records {
                    print_row(keyed);
                }
            }
        }

        Commands::Transfer { key, to } => {
            let keyed = api_client.transfer_owner(&key, &to).await?;
            println!(
                "{} '{}' now owned by {}",
                "✅".green(),
                keyed.key,
                keyed.record.owner.cyan()
            );
        }

        Commands::OwnedBy { owner } => {
            let report = api_client.owned_by(&owner).await?;
            if report.is_empty() {
                println!("{} owns no records.", owner);
            } else {
                println!("Records owned by {}:", owner.cyan());
                for row in report {
                    println!("  - {}", row.prop_type);
                }
            }
        }
    }

    Ok(())
}

fn print_header() {
    println!(
        "{:<10} {:<16} {:<12} {:<6} {:>8} {}",
        "Key".bold(),
        "Type".bold(),
        "City".bold(),
        "State".bold(),
        "Sq.ft".bold(),
        "Owner".bold()
    );
    println!("{:-<10} {:-<16} {:-<12} {:-<6} {:->8} {:-<12}", "", "", "", "", "", "");
}

fn print_row(keyed: &KeyedRecord) {
    let r = &keyed.record;
    println!(
        "{:<10} {:<16} {:<12} {:<6} {:>8} {}",
        keyed.key, r.prop_type, r.city, r.state, r.area, r.owner
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_create() {
        let cli = Cli::try_parse_from([
            "landreg", "create", "PROP9", "--type", "Flat", "--city", "Chennai", "--state", "TN",
            "--area", "1200", "--owner", "Dev",
        ])
        .unwrap();
        assert_eq!(cli.node, "http://127.0.0.1:8080");
        match cli.command {
            Commands::Create { key, prop_type, owner, .. } => {
                assert_eq!(key, "PROP9");
                assert_eq!(prop_type, "Flat");
                assert_eq!(owner, "Dev");
            }
            _ => panic!("expected create"),
        }
    }

    #[test]
    fn test_parse_transfer_and_owned_by() {
        let cli = Cli::try_parse_from(["landreg", "-n", "http://node:9000", "transfer", "PROP0", "--to", "Maya"])
            .unwrap();
        assert_eq!(cli.node, "http://node:9000");
        assert!(matches!(cli.command, Commands::Transfer { ref key, ref to } if key == "PROP0" && to == "Maya"));

        let cli = Cli::try_parse_from(["landreg", "owned-by", "Dev"]).unwrap();
        assert!(matches!(cli.command, Commands::OwnedBy { ref owner } if owner == "Dev"));
    }

    #[test]
    fn test_create_requires_all_fields() {
        assert!(Cli::try_parse_from(["landreg", "create", "PROP9", "--type", "Flat"]).is_err());
    }
}
