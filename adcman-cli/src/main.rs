use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tabled::{Table, Tabled};
use tracing::info;
use tracing_subscriber::EnvFilter;

use adcman_rest::{DeviceClient, DeviceConfig};
use adcman_state::dns::{self, DnsCache, DnsSettings, IpVersion};
use adcman_state::{
    FetchRequest, Passphrase, PartitionDevice, PartitionSpec, PartitionState, ReconcileReport,
    RouteDomainRef, fetch_archive, reconcile_partition,
};

#[derive(Parser)]
#[command(name = "adcman")]
#[command(about = "Idempotent state management for ADC appliances", long_about = None)]
struct Cli {
    /// Device management host, optionally with port
    #[arg(long)]
    host: String,

    /// Management username
    #[arg(long, default_value = "admin")]
    user: String,

    /// Management password (falls back to ADCMAN_PASSWORD)
    #[arg(long)]
    password: Option<String>,

    /// Skip TLS certificate validation
    #[arg(long)]
    insecure: bool,

    /// Connect timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage administrative partitions
    Partition {
        #[command(subcommand)]
        command: PartitionCommands,
    },

    /// Manage device DNS settings
    Dns {
        #[command(subcommand)]
        command: DnsCommands,
    },

    /// Fetch UCS configuration archives
    Ucs {
        #[command(subcommand)]
        command: UcsCommands,
    },
}

#[derive(Subcommand)]
enum PartitionCommands {
    /// Ensure a partition exists with the given settings
    Ensure {
        /// Partition name
        name: String,

        /// Partition description
        #[arg(long)]
        description: Option<String>,

        /// Route domain id or name
        #[arg(long)]
        route_domain: Option<String>,
    },

    /// Remove a partition
    Rm {
        /// Partition name
        name: String,
    },

    /// Show one partition
    Show {
        /// Partition name
        name: String,
    },

    /// List all partitions
    List,
}

#[derive(Subcommand)]
enum DnsCommands {
    /// Ensure DNS entries and settings are present
    Set {
        /// Name server to configure (repeatable)
        #[arg(long = "nameserver")]
        name_servers: Vec<String>,

        /// Search domain to configure (repeatable)
        #[arg(long = "search")]
        search_domains: Vec<String>,

        /// Forwarder to configure (repeatable)
        #[arg(long = "forwarder")]
        forwarders: Vec<String>,

        /// DNS caching: enable or disable
        #[arg(long)]
        cache: Option<String>,

        /// IP version for resolution: 4 or 6
        #[arg(long)]
        ip_version: Option<u8>,

        /// Add to the existing lists instead of replacing them
        #[arg(long)]
        append: bool,
    },

    /// Remove DNS entries
    Rm {
        /// Name server to remove (repeatable)
        #[arg(long = "nameserver")]
        name_servers: Vec<String>,

        /// Search domain to remove (repeatable)
        #[arg(long = "search")]
        search_domains: Vec<String>,

        /// Forwarder to remove (repeatable)
        #[arg(long = "forwarder")]
        forwarders: Vec<String>,
    },
}

#[derive(Subcommand)]
enum UcsCommands {
    /// Fetch an archive from the device to a local file
    Fetch {
        /// Archive name on the device
        name: String,

        /// Local destination path
        dest: PathBuf,

        /// Skip the fetch when the destination already exists
        #[arg(long)]
        no_force: bool,

        /// Preserve an existing destination under a backup path
        #[arg(long)]
        backup: bool,

        /// Do not create the archive on the device when it is missing
        #[arg(long)]
        no_create_on_missing: bool,

        /// Fail when the archive does not exist on the device
        #[arg(long)]
        fail_on_missing: bool,

        /// Environment variable holding the archive encryption passphrase
        #[arg(long)]
        passphrase_env: Option<String>,
    },
}

#[derive(Tabled)]
struct PartitionRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "ROUTE DOMAIN")]
    route_domain: u32,
    #[tabled(rename = "DESCRIPTION")]
    description: String,
}

impl From<PartitionState> for PartitionRow {
    fn from(state: PartitionState) -> Self {
        Self {
            name: state.name,
            route_domain: state.route_domain_id,
            description: state.description.unwrap_or_else(|| "-".to_string()),
        }
    }
}

fn print_report(report: &ReconcileReport) {
    if report.changed {
        println!("changed");
    } else {
        println!("unchanged");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("adcman_state=info".parse()?)
                .add_directive("adcman_rest=info".parse()?)
                .add_directive("adcman_cli=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let password = match cli
        .password
        .clone()
        .or_else(|| std::env::var("ADCMAN_PASSWORD").ok())
    {
        Some(password) => password,
        None => {
            eprintln!("Error: no password given (use --password or ADCMAN_PASSWORD)");
            std::process::exit(1);
        }
    };

    let mut config = DeviceConfig::new(&cli.host, &cli.user, password);
    config.validate_certs = !cli.insecure;
    config.connect_timeout = Duration::from_secs(cli.timeout);

    let client = DeviceClient::connect(config)?;
    info!(host = %cli.host, "Connecting to device");

    match cli.command {
        Commands::Partition { command } => match command {
            PartitionCommands::Ensure {
                name,
                description,
                route_domain,
            } => {
                let mut spec = PartitionSpec::new(name);
                spec.description = description;
                spec.route_domain = route_domain.as_deref().map(RouteDomainRef::parse);

                let report = reconcile_partition(&spec, &client).await?;
                print_report(&report);
            }

            PartitionCommands::Rm { name } => {
                let mut spec = PartitionSpec::new(name);
                spec.present = false;

                let report = reconcile_partition(&spec, &client).await?;
                print_report(&report);
            }

            PartitionCommands::Show { name } => match client.fetch_partition(&name).await? {
                Some(state) => {
                    println!("Name:          {}", state.name);
                    println!("Route domain:  {}", state.route_domain_id);
                    println!(
                        "Description:   {}",
                        state.description.as_deref().unwrap_or("-")
                    );
                }
                None => {
                    eprintln!("Error: partition '{}' does not exist", name);
                    std::process::exit(1);
                }
            },

            PartitionCommands::List => {
                let partitions = client.list_partitions().await?;
                if partitions.is_empty() {
                    println!("No partitions found");
                } else {
                    let rows: Vec<PartitionRow> =
                        partitions.into_iter().map(PartitionRow::from).collect();
                    println!("{}", Table::new(rows));
                }
            }
        },

        Commands::Dns { command } => match command {
            DnsCommands::Set {
                name_servers,
                search_domains,
                forwarders,
                cache,
                ip_version,
                append,
            } => {
                let cache = match cache.as_deref() {
                    Some("enable") => Some(DnsCache::Enable),
                    Some("disable") => Some(DnsCache::Disable),
                    Some(other) => {
                        eprintln!("Error: invalid cache setting '{}'. Use 'enable' or 'disable'.", other);
                        std::process::exit(1);
                    }
                    None => None,
                };
                let ip_version = match ip_version {
                    Some(4) => Some(IpVersion::V4),
                    Some(6) => Some(IpVersion::V6),
                    Some(other) => {
                        eprintln!("Error: invalid IP version '{}'. Use 4 or 6.", other);
                        std::process::exit(1);
                    }
                    None => None,
                };

                let settings = DnsSettings {
                    name_servers,
                    search_domains,
                    forwarders,
                    cache,
                    ip_version,
                    append,
                };
                let report = dns::ensure_present(&settings, &client).await?;
                print_report(&report);
            }

            DnsCommands::Rm {
                name_servers,
                search_domains,
                forwarders,
            } => {
                let settings = DnsSettings {
                    name_servers,
                    search_domains,
                    forwarders,
                    ..DnsSettings::default()
                };
                let report = dns::ensure_absent(&settings, &client).await?;
                print_report(&report);
            }
        },

        Commands::Ucs { command } => match command {
            UcsCommands::Fetch {
                name,
                dest,
                no_force,
                backup,
                no_create_on_missing,
                fail_on_missing,
                passphrase_env,
            } => {
                let passphrase = match passphrase_env {
                    Some(var) => match std::env::var(&var) {
                        Ok(value) => Some(Passphrase::new(value)),
                        Err(_) => {
                            eprintln!("Error: environment variable '{}' is not set", var);
                            std::process::exit(1);
                        }
                    },
                    None => None,
                };

                let mut request = FetchRequest::new(name, dest);
                request.force = !no_force;
                request.backup = backup;
                request.create_on_missing = !no_create_on_missing;
                request.fail_on_missing = fail_on_missing;
                request.passphrase = passphrase;

                let report = fetch_archive(&request, &client).await?;
                if report.changed {
                    println!("changed");
                    if let Some(backup_file) = &report.backup_file {
                        println!("backup: {}", backup_file.display());
                    }
                } else {
                    println!("unchanged");
                }
            }
        },
    }

    Ok(())
}
