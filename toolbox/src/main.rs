use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
#[cfg(feature = "scan")]
use std::time::Instant;
#[cfg(feature = "scan")]
use time::format_description::well_known::Rfc3339;
#[cfg(feature = "scan")]
use time::OffsetDateTime;

mod config;

#[cfg(feature = "scan")]
fn now_rfc3339() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_else(|_| String::new())
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat { Text, Json }

/// Map a config-file format string; anything unrecognised falls back to text.
fn format_from_config(s: &str) -> OutputFormat {
    match s.trim().to_ascii_lowercase().as_str() {
        "json" | "jsonl" => OutputFormat::Json,
        _ => OutputFormat::Text,
    }
}

#[cfg(feature = "creds")]
#[derive(Debug, Subcommand)]
enum CredsCmd {
    /// Look up the plaintext of a SHA-1 hex digest in a wordlist
    Crack {
        /// 40-character lowercase SHA-1 hex digest
        digest: String,
        /// Also try every known salt, prefixed and suffixed
        #[arg(long, default_value_t = false)]
        salts: bool,
        /// Newline-delimited password list (default: ./top-10000-passwords.txt)
        #[arg(long, value_name = "FILE")]
        wordlist: Option<PathBuf>,
        /// Newline-delimited salt list (default: ./known-salts.txt)
        #[arg(long, value_name = "FILE")]
        salt_list: Option<PathBuf>,
        /// Output format: text or json
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// Wordlist stats (total and unique)
    Wordlist {
        file: PathBuf,
    },
}

#[derive(Debug, Parser)]
#[command(name = "toolbox", version, about = "Port prober and offline SHA-1 matcher")]
struct Cli {
    /// Optional config file (YAML). If omitted, loads ./toolbox.yaml if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print version information
    Version,
    /// Probe an inclusive port range on one host, one port at a time
    #[cfg(feature = "scan")]
    Scan {
        /// Target hostname or IPv4 address
        target: String,
        /// Port range: start-end (e.g., 20-80) or a single port
        #[arg(long)]
        ports: port_scan::PortRange,
        /// Print the report with service names instead of the bare port list
        #[arg(long, short, default_value_t = false)]
        verbose: bool,
        /// Connect timeout per port in milliseconds (default 1000)
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Service-name table in /etc/services format (default: built-in table)
        #[arg(long, value_name = "FILE")]
        services: Option<PathBuf>,
        /// Output format: text or json
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// Credentials utilities
    #[cfg(feature = "creds")]
    Creds {
        #[command(subcommand)]
        cmd: CredsCmd,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let loaded_cfg = config::load_config(cli.config.as_deref())?.unwrap_or_default();
    match cli.command {
        Commands::Version => {
            println!("toolbox {} (core {})", env!("CARGO_PKG_VERSION"), toolbox_core::version());
        }
        #[cfg(feature = "creds")]
        Commands::Creds { cmd } => {
            match cmd {
                CredsCmd::Crack { digest, salts, wordlist, salt_list, format } => {
                    let cfg = loaded_cfg.crack.unwrap_or_default();
                    let sources = credentials::DataSources {
                        passwords: wordlist.or(cfg.wordlist).unwrap_or_else(|| credentials::DEFAULT_WORDLIST.into()),
                        salts: salt_list.or(cfg.salts).unwrap_or_else(|| credentials::DEFAULT_SALTS.into()),
                    };
                    let format = format
                        .or_else(|| cfg.format.as_deref().map(format_from_config))
                        .unwrap_or(OutputFormat::Text);
                    let outcome = credentials::crack_sha1_hash(digest.trim(), salts, &sources);
                    match format {
                        OutputFormat::Text => println!("{}", outcome),
                        OutputFormat::Json => {
                            let obj = serde_json::json!({
                                "digest": digest.trim(),
                                "salted": salts,
                                "found": outcome.plaintext().is_some(),
                                "plaintext": outcome.plaintext(),
                            });
                            println!("{}", serde_json::to_string(&obj)?);
                        }
                    }
                }
                CredsCmd::Wordlist { file } => {
                    let s = std::fs::read_to_string(&file)?;
                    let (total, unique) = credentials::wordlist_stats(&s);
                    let obj = serde_json::json!({ "file": file, "total": total, "unique": unique });
                    println!("{}", serde_json::to_string(&obj)?);
                }
            }
        }
        #[cfg(feature = "scan")]
        Commands::Scan { target, ports, verbose, timeout_ms, services, format } => {
            let cfg = loaded_cfg.scan.unwrap_or_default();
            let timeout_ms = timeout_ms
                .or(cfg.timeout_ms)
                .unwrap_or(port_scan::DEFAULT_TIMEOUT.as_millis() as u64);
            let format = format
                .or_else(|| cfg.format.as_deref().map(format_from_config))
                .unwrap_or(OutputFormat::Text);
            let table = match services.or(cfg.services) {
                Some(path) => port_scan::ServiceTable::parse_services(&std::fs::read_to_string(&path)?),
                None => port_scan::ServiceTable::builtin().clone(),
            };
            let opts = port_scan::ScanOptions { timeout: std::time::Duration::from_millis(timeout_ms) };

            let rt = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
            let start = Instant::now();
            let started_at = now_rfc3339();
            let result = rt.block_on(port_scan::scan(&target, ports, &opts));
            let duration_ms = start.elapsed().as_millis();
            let ended_at = now_rfc3339();

            // Probe failures are results, not process errors.
            match (result, format) {
                (Err(e), OutputFormat::Text) => println!("Error: {}", e),
                (Err(e), OutputFormat::Json) => {
                    let obj = serde_json::json!({
                        "target": target,
                        "range": ports.to_string(),
                        "error": format!("Error: {}", e),
                    });
                    println!("{}", serde_json::to_string(&obj)?);
                }
                (Ok(r), OutputFormat::Text) => {
                    if verbose {
                        println!("{}", r.report(&table));
                    } else {
                        println!("{}", port_scan::ScanOutput::Ports(r.open));
                    }
                }
                (Ok(r), OutputFormat::Json) => {
                    let named: Vec<_> = r.open.iter()
                        .map(|&p| serde_json::json!({ "port": p, "service": table.name_or_unknown(p) }))
                        .collect();
                    let mut obj = serde_json::json!({
                        "target": r.target.0,
                        "address": r.address.to_string(),
                        "range": ports.to_string(),
                        "scanned": ports.len(),
                        "open": r.open,
                        "timeout_ms": timeout_ms,
                        "duration_ms": duration_ms,
                        "started_at": started_at,
                        "ended_at": ended_at,
                    });
                    if verbose {
                        obj["services"] = serde_json::Value::Array(named);
                    }
                    println!("{}", serde_json::to_string(&obj)?);
                }
            }
        }
    }
    Ok(())
}
