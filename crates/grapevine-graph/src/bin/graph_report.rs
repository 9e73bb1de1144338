//! graph-report CLI tool
//!
//! Summarises an invite graph log by inviter.
//!
//! Usage:
//!   graph-report [log_path]          Table of inviters, most invites first
//!   graph-report --json [log_path]   One JSON object per inviter
//!   graph-report --edges [log_path]  Dump every edge as read

use grapevine_graph::{read_log, tally_by_inviter};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Log read when neither an argument nor `GRAPH_LOG_PATH` names one.
const DEFAULT_LOG_PATH: &str = "./invitegraph.jsonl";

enum Mode {
    Table,
    Json,
    Edges,
}

fn print_usage() {
    eprintln!("graph-report - Summarise a Grapevine invite graph log");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  graph-report [log_path]          Table of inviters");
    eprintln!("  graph-report --json [log_path]   One JSON object per inviter");
    eprintln!("  graph-report --edges [log_path]  Dump every edge");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  GRAPH_LOG_PATH  Log to read when no path is given");
    eprintln!("                  (default: {})", DEFAULT_LOG_PATH);
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let mut mode = Mode::Table;
    let mut path = None;

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--json" => mode = Mode::Json,
            "--edges" => mode = Mode::Edges,
            "-h" | "--help" | "help" => {
                print_usage();
                return;
            }
            other if other.starts_with("--") => {
                eprintln!("Unknown flag: {}", other);
                print_usage();
                std::process::exit(1);
            }
            other => path = Some(PathBuf::from(other)),
        }
    }

    let path = path
        .or_else(|| std::env::var("GRAPH_LOG_PATH").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_PATH));

    let edges = match read_log(&path) {
        Ok(edges) => edges,
        Err(e) => {
            eprintln!("Failed to read {:?}: {}", path, e);
            std::process::exit(1);
        }
    };

    match mode {
        Mode::Edges => {
            for edge in &edges {
                println!(
                    "{}  {} ({}) -> {} ({})  {}",
                    edge.timestamp.to_rfc3339(),
                    edge.inviter,
                    edge.inviter_id,
                    edge.invitee,
                    edge.invitee_id,
                    edge.invite_type
                );
            }
        }
        Mode::Json => {
            for tally in tally_by_inviter(&edges) {
                match serde_json::to_string(&tally) {
                    Ok(line) => println!("{}", line),
                    Err(e) => {
                        eprintln!("Failed to encode tally: {}", e);
                        std::process::exit(1);
                    }
                }
            }
        }
        Mode::Table => {
            let tallies = tally_by_inviter(&edges);
            println!("{:<32} {:>8} {:>8} {:>8}", "INVITER", "LINK", "DIRECT", "TOTAL");
            for tally in &tallies {
                println!(
                    "{:<32} {:>8} {:>8} {:>8}",
                    tally.inviter,
                    tally.by_link,
                    tally.direct,
                    tally.total()
                );
            }
            println!();
            println!("{} edges from {} inviters", edges.len(), tallies.len());
        }
    }
}
