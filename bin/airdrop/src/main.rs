//! Merkle airdrop tool.
//!
//! Complete token airdrop workflow:
//! - `generate`: build a tree from a recipients CSV, export the tree and
//!   all per-address proofs as JSON
//! - `serve`: load a generated tree and answer proof queries over HTTP
//!   (`GET /root`, `GET /proof/{address}`)

use std::collections::HashMap;
use std::fs;
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use claimroot::{Bytes32, StandardMerkleTree, StandardTreeData};

/// Leaf schema shared with the claim contract.
const LEAF_ENCODING: [&str; 2] = ["address", "uint256"];

#[derive(Parser)]
#[command(name = "airdrop", about = "Merkle airdrop tree generator and proof server")]
struct Args {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the tree from a recipients CSV and export all proofs
    Generate {
        /// Input CSV with (address, amount) rows, header included
        #[arg(long, default_value = "airdrop.csv")]
        csv: PathBuf,
        /// Tree output file
        #[arg(long, default_value = "airdrop-tree.json")]
        tree: PathBuf,
        /// Proofs output file
        #[arg(long, default_value = "airdrop-proofs.json")]
        proofs: PathBuf,
    },
    /// Serve proofs for a previously generated tree
    Serve {
        /// Tree file written by `generate`
        #[arg(long, default_value = "airdrop-tree.json")]
        tree: PathBuf,
        /// Listen address
        #[arg(long, default_value = "0.0.0.0:8080")]
        addr: String,
    },
}

/// Proof entry handed to claimants.
#[derive(Clone, Serialize)]
struct ProofData {
    address: String,
    amount: String,
    proof: Vec<Bytes32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match Args::parse().cmd {
        Command::Generate { csv, tree, proofs } => generate(&csv, &tree, &proofs),
        Command::Serve { tree, addr } => serve(&tree, &addr).await,
    }
}

/// Builds the tree from the CSV and exports tree + proofs.
fn generate(csv_path: &FsPath, tree_path: &FsPath, proofs_path: &FsPath) -> Result<()> {
    let recipients = load_csv(csv_path)?;
    info!("Loaded {} recipients", recipients.len());

    let encoding = LEAF_ENCODING.iter().map(|s| s.to_string()).collect();
    let tree = StandardMerkleTree::new(recipients, encoding, true)?;
    info!("Merkle root: {}", tree.root());

    fs::write(tree_path, serde_json::to_string_pretty(&tree.dump())?)
        .with_context(|| format!("write {}", tree_path.display()))?;
    info!("Tree saved to {}", tree_path.display());

    let mut proofs = HashMap::new();
    for (i, record) in tree.iter() {
        let entry = proof_entry(&tree, i, record)?;
        proofs.insert(entry.address.to_lowercase(), entry);
    }

    fs::write(proofs_path, serde_json::to_string_pretty(&proofs)?)
        .with_context(|| format!("write {}", proofs_path.display()))?;
    info!("Proofs saved to {}", proofs_path.display());
    Ok(())
}

/// Reads (address, amount) rows; the header row is skipped.
fn load_csv(path: &FsPath) -> Result<Vec<Vec<Value>>> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("open {}", path.display()))?;
    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let address = row.get(0).context("missing address column")?;
        let amount = row.get(1).context("missing amount column")?;
        records.push(vec![json!(address), json!(amount)]);
    }
    Ok(records)
}

fn proof_entry(tree: &StandardMerkleTree, i: usize, record: &[Value]) -> Result<ProofData> {
    let address = record
        .first()
        .and_then(|v| v.as_str())
        .context("record missing address")?
        .to_string();
    let amount = match record.get(1) {
        Some(Value::String(s)) => s.clone(),
        Some(v) => v.to_string(),
        None => anyhow::bail!("record missing amount"),
    };
    let proof = tree.get_proof_by_index(i)?;
    Ok(ProofData {
        address,
        amount,
        proof,
    })
}

/// Shared server state: the loaded tree plus an address index for O(1)
/// lookups.
struct AppState {
    tree: StandardMerkleTree,
    index: HashMap<String, usize>,
}

/// Loads the tree and serves proof queries.
async fn serve(tree_path: &FsPath, addr: &str) -> Result<()> {
    let raw = fs::read_to_string(tree_path)
        .with_context(|| format!("read {}", tree_path.display()))?;
    let data: StandardTreeData = serde_json::from_str(&raw)?;
    let tree = StandardMerkleTree::load(data)?;

    info!("Loaded tree with {} leaves", tree.len());
    info!("Root: {}", tree.root());

    let mut index = HashMap::new();
    for (i, record) in tree.iter() {
        if let Some(address) = record.first().and_then(|v| v.as_str()) {
            index.insert(address.to_lowercase(), i);
        }
    }

    let state = Arc::new(AppState { tree, index });
    let app = Router::new()
        .route("/root", get(root_handler))
        .route("/proof/{address}", get(proof_handler))
        .with_state(state);

    info!("Server listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn root_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "root": state.tree.root() }))
}

async fn proof_handler(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Json<ProofData>, (StatusCode, Json<Value>)> {
    let not_found = || {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "address not found" })),
        )
    };
    let &i = state.index.get(&address.to_lowercase()).ok_or_else(not_found)?;
    let record = state.tree.at(i).ok_or_else(not_found)?;
    let entry = proof_entry(&state.tree, i, record).map_err(|err| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": err.to_string() })),
        )
    })?;
    Ok(Json(entry))
}
