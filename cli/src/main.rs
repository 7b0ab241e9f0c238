//! ledgerseal: operator CLI for the tamper-evident audit ledger.
//!
//! Usage:
//!   ledgerseal verify --input partition.json
//!   ledgerseal verify --input rows.json --partition org-42 --from 1000 --prior-hash <hex>
//!   ledgerseal canonicalize --input snapshot.json
//!   ledgerseal digest --input snapshot.json
//!   ledgerseal demo --output org-1.json
//!
//! `verify` exits 0 when the chain is valid, 2 when it diverges, 1 on error.

mod config;

use std::{
    io::Read,
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
};

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use ledgerseal_audit::{
    export_partition, verify, verify_from, verify_log, verify_partition, InMemoryEventStore,
};
use ledgerseal_contracts::{
    error::{LedgerError, LedgerResult},
    event::{AuditEvent, PartitionKey, PartitionLog, RawEvent, CHAIN_FORMAT, GENESIS_HASH},
    value::CanonicalValue,
    verify::VerificationResult,
};
use ledgerseal_core::{canonicalize, digest, is_hex_digest, AuditRecorder, EventStore};

use crate::config::LedgerConfig;

// ── CLI definition ────────────────────────────────────────────────────────────

/// ledgerseal: verify and inspect hash-chained audit logs.
#[derive(Parser)]
#[command(
    name = "ledgerseal",
    about = "Tamper-evident audit ledger tooling",
    long_about = "Verifies exported audit partitions, prints canonical forms and digests,\n\
                  and runs a self-contained demo of chain building and tamper detection."
)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Verify an exported partition log or a JSON array of audit events.
    Verify {
        /// File to read, or `-` for stdin.
        #[arg(long)]
        input: String,
        /// Partition to verify when the input holds several.
        #[arg(long)]
        partition: Option<String>,
        /// Absolute index of the first event in the input.
        #[arg(long, default_value_t = 0)]
        from: usize,
        /// Trusted chain hash of the event at `from - 1`.
        #[arg(long)]
        prior_hash: Option<String>,
        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the canonical form of a JSON value.
    Canonicalize {
        #[arg(long)]
        input: String,
    },
    /// Print the SHA-256 digest of the canonical form of a JSON value.
    Digest {
        #[arg(long)]
        input: String,
    },
    /// Build a sample ledger, verify it, and show tamper detection.
    Demo {
        /// Write the first partition's export to this file.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match LedgerConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ledgerseal: {}", e);
            return ExitCode::from(1);
        }
    };

    // Set RUST_LOG to override the configured filter.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let result = match cli.command {
        Command::Verify {
            input,
            partition,
            from,
            prior_hash,
            json,
        } => run_verify(&config, &input, partition, from, prior_hash, json),
        Command::Canonicalize { input } => run_canonicalize(&input).map(|()| ExitCode::SUCCESS),
        Command::Digest { input } => run_digest(&input).map(|()| ExitCode::SUCCESS),
        Command::Demo { output } => run_demo(&config, output.as_deref()).map(|()| ExitCode::SUCCESS),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("ledgerseal: {}", e);
            ExitCode::from(1)
        }
    }
}

// ── Input ─────────────────────────────────────────────────────────────────────

fn read_input(input: &str) -> LedgerResult<String> {
    if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| LedgerError::Io {
                reason: format!("failed to read stdin: {}", e),
            })?;
        return Ok(buf);
    }
    std::fs::read_to_string(input).map_err(|e| LedgerError::Io {
        reason: format!("failed to read '{}': {}", input, e),
    })
}

fn read_json(input: &str) -> LedgerResult<Value> {
    serde_json::from_str(&read_input(input)?).map_err(|e| LedgerError::InvalidInput {
        reason: format!("'{}' is not valid JSON: {}", input, e),
    })
}

/// What a `verify` input file contained.
#[derive(Debug)]
enum VerifyInput {
    Log(PartitionLog),
    Events(Vec<AuditEvent>),
}

fn parse_verify_input(value: Value) -> LedgerResult<VerifyInput> {
    let invalid = |e: serde_json::Error| LedgerError::InvalidInput {
        reason: format!("not a partition log or event array: {}", e),
    };

    if value.is_array() {
        return serde_json::from_value(value).map(VerifyInput::Events).map_err(invalid);
    }

    let log: PartitionLog = serde_json::from_value(value).map_err(invalid)?;
    if log.format != CHAIN_FORMAT {
        return Err(LedgerError::InvalidInput {
            reason: format!(
                "unsupported chain format '{}', expected '{}'",
                log.format, CHAIN_FORMAT
            ),
        });
    }
    Ok(VerifyInput::Log(log))
}

/// Pick the partition to verify out of a plain event array and keep only
/// its events, preserving order.
fn select_partition(
    config: &LedgerConfig,
    events: Vec<AuditEvent>,
    requested: Option<String>,
) -> LedgerResult<(PartitionKey, Vec<AuditEvent>)> {
    let mut seen: Vec<&PartitionKey> = events.iter().map(|e| &e.partition).collect();
    seen.sort();
    seen.dedup();

    let partition = match requested.or_else(|| config.verify.default_partition.clone()) {
        Some(p) => {
            let partition = PartitionKey::new(p);
            if !seen.contains(&&partition) {
                return Err(LedgerError::InvalidInput {
                    reason: format!("input holds no events for partition '{}'", partition),
                });
            }
            partition
        }
        None => match seen.as_slice() {
            [] => PartitionKey::global(),
            [only] => (*only).clone(),
            _ if config.verify.require_single_partition => {
                return Err(LedgerError::InvalidInput {
                    reason: format!(
                        "input spans {} partitions; pass --partition to choose one",
                        seen.len()
                    ),
                })
            }
            [first, ..] => (*first).clone(),
        },
    };

    let events = events
        .into_iter()
        .filter(|e| e.partition == partition)
        .collect();
    Ok((partition, events))
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// What `verify` concluded about one partition.
#[derive(Debug)]
struct VerifyOutcome {
    partition: PartitionKey,
    result: VerificationResult,
    verified: usize,
}

impl VerifyOutcome {
    /// 0 when the chain is valid, 2 when it diverges.
    fn exit_status(&self) -> u8 {
        if self.result.is_valid() {
            0
        } else {
            2
        }
    }
}

fn verify_input(
    config: &LedgerConfig,
    value: Value,
    partition: Option<String>,
    from: usize,
    prior_hash: Option<String>,
) -> LedgerResult<VerifyOutcome> {
    let prior = match (from, prior_hash) {
        (_, Some(hash)) if !is_hex_digest(&hash) => {
            return Err(LedgerError::InvalidInput {
                reason: "--prior-hash must be 64 lowercase hex characters".to_string(),
            })
        }
        (_, Some(hash)) => hash,
        (0, None) => GENESIS_HASH.to_string(),
        (_, None) => {
            return Err(LedgerError::InvalidInput {
                reason: "--prior-hash is required when --from is greater than 0".to_string(),
            })
        }
    };
    let full_pass = from == 0 && prior == GENESIS_HASH;

    let input = parse_verify_input(value)?;
    if let (VerifyInput::Log(log), Some(requested)) = (&input, partition.as_deref()) {
        if log.partition.as_str() != requested {
            return Err(LedgerError::InvalidInput {
                reason: format!(
                    "export holds partition '{}', not '{}'",
                    log.partition, requested
                ),
            });
        }
    }

    let (partition, result, verified) = match input {
        VerifyInput::Log(log) if full_pass => {
            let result = verify_log(&log);
            let verified = match result {
                VerificationResult::Valid => log.events.len(),
                VerificationResult::Invalid { index, .. } => index,
            };
            (log.partition, result, verified)
        }
        // A suffix cannot be checked against the terminal hash of the whole log.
        VerifyInput::Log(log) => {
            let report = verify_from(&log.events, from, &prior);
            (log.partition, report.result, report.verified)
        }
        VerifyInput::Events(events) => {
            let (partition, events) = select_partition(config, events, partition)?;
            debug!(partition = %partition, events = events.len(), "verifying event array");
            if full_pass {
                let store = InMemoryEventStore::new();
                store.import(&partition, events)?;
                let report = verify_partition(&store, &partition, config.verify.batch_size)?;
                (partition, report.result, report.verified)
            } else {
                let report = verify_from(&events, from, &prior);
                (partition, report.result, report.verified)
            }
        }
    };

    Ok(VerifyOutcome {
        partition,
        result,
        verified,
    })
}

fn run_verify(
    config: &LedgerConfig,
    input: &str,
    partition: Option<String>,
    from: usize,
    prior_hash: Option<String>,
    json: bool,
) -> LedgerResult<ExitCode> {
    let outcome = verify_input(config, read_json(input)?, partition, from, prior_hash)?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "partition": outcome.partition,
                "result": outcome.result,
                "verified": outcome.verified,
            })
        );
    } else {
        println!(
            "partition {}: {} ({} events verified)",
            outcome.partition, outcome.result, outcome.verified
        );
    }

    Ok(ExitCode::from(outcome.exit_status()))
}

fn run_canonicalize(input: &str) -> LedgerResult<()> {
    let value = CanonicalValue::try_from(read_json(input)?)?;
    println!("{}", canonicalize(&value)?);
    Ok(())
}

fn run_digest(input: &str) -> LedgerResult<()> {
    let value = CanonicalValue::try_from(read_json(input)?)?;
    println!("{}", digest(canonicalize(&value)?.as_bytes()));
    Ok(())
}

/// The events the demo records into each partition.
fn demo_events(partition: &PartitionKey, count: usize) -> LedgerResult<Vec<RawEvent>> {
    let run_id = format!("{}-close-month", partition);
    (0..count)
        .map(|i| -> LedgerResult<RawEvent> {
            let amount = 1200 + 25 * i as i64;
            let raw = match i % 3 {
                0 => RawEvent::new("u1", "financial", "invoice", "create")
                    .with_new_data(CanonicalValue::from_serialize(&serde_json::json!({
                        "amount": amount,
                        "currency": "EUR",
                        "tenant": "Zoë Müller",
                    }))?),
                1 => RawEvent::new("u1", "financial", "invoice", "update")
                    .with_old_data(CanonicalValue::object([("status", "draft")]))
                    .with_new_data(CanonicalValue::object([("status", "sent")])),
                _ => RawEvent::new("system", "financial", "payment", "post")
                    .with_new_data(CanonicalValue::object([
                        ("amount", CanonicalValue::from(amount)),
                        ("matched", CanonicalValue::from(true)),
                    ])),
            };
            Ok(raw
                .with_entity_id(format!("inv-{}", i / 3 + 1))
                .with_run_id(run_id.clone()))
        })
        .collect()
}

fn run_demo(config: &LedgerConfig, output: Option<&Path>) -> LedgerResult<()> {
    let store = Arc::new(InMemoryEventStore::new());
    let recorder = AuditRecorder::new(store.clone());

    let partitions: Vec<PartitionKey> = config
        .demo
        .partitions
        .iter()
        .map(PartitionKey::new)
        .collect();

    // Interleave partitions so their chains are built concurrently in time.
    let planned: Vec<Vec<RawEvent>> = partitions
        .iter()
        .map(|p| demo_events(p, config.demo.events_per_partition))
        .collect::<LedgerResult<_>>()?;
    for i in 0..config.demo.events_per_partition {
        for (partition, events) in partitions.iter().zip(&planned) {
            recorder.record(partition, &events[i])?;
        }
    }

    println!("Recorded ledger");
    println!("===============");
    for partition in store.partitions()? {
        let report = verify_partition(store.as_ref(), &partition, config.verify.batch_size)?;
        println!(
            "  {:<12} {:>3} events  head {}  {}",
            partition.as_str(),
            report.verified,
            report.checkpoint.chain_hash,
            report.result
        );
    }
    println!();

    let Some(first) = partitions.first() else {
        return Ok(());
    };
    let log = export_partition(store.as_ref(), first)?;

    if let Some(path) = output {
        let text = serde_json::to_string_pretty(&log).map_err(|e| LedgerError::InvalidInput {
            reason: format!("failed to encode export: {}", e),
        })?;
        std::fs::write(path, text).map_err(|e| LedgerError::Io {
            reason: format!("failed to write '{}': {}", path.display(), e),
        })?;
        info!(path = %path.display(), partition = %first, "export written");
        println!("Exported {} to {}", first, path.display());
        println!();
    }

    if log.events.len() < 3 {
        return Ok(());
    }

    println!("Tamper detection on {}", first);
    println!("========================");

    let mut edited = log.events.clone();
    edited[1].new_data = Some(CanonicalValue::object([("status", "void")]));
    println!("  edit newData of event 1   -> {}", verify(&edited));

    let mut deleted = log.events.clone();
    deleted.remove(1);
    println!("  delete event 1            -> {}", verify(&deleted));

    let mut truncated = log.clone();
    truncated.events.pop();
    println!("  drop last event (export)  -> {}", verify_log(&truncated));
    println!();

    Ok(())
}
