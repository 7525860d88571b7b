// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Polystore CLI
//!
//! The composition root: parses arguments, wires the four reference
//! adapters into a [`Coordinator`], dispatches `write`/`read`/`delete`, and
//! maps the outcome onto a `sysexits.h` exit code (spec §6, §9).

use std::process::ExitCode as ProcessExitCode;
use std::sync::Arc;

use tracing::{error, info};

use polystore::infrastructure::adapters::{FilesystemDocumentAdapter, InMemoryGraphAdapter, InMemoryVectorAdapter, SqliteRelationalAdapter};
use polystore::infrastructure::logging;
use polystore::infrastructure::CoordinatorConfig;
use polystore::{Coordinator, ReadOptions, WriteRequest};
use polystore_bootstrap::{create_signal_handler, parse_cli, Commands, ExitCode};
use polystore_domain::value_objects::DocumentId;

#[tokio::main]
async fn main() -> ProcessExitCode {
    let cli = parse_cli();

    let config = match CoordinatorConfig::load(cli.config.as_deref()).await {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load configuration: {err}");
            return ProcessExitCode::from(ExitCode::from_coordinator_error(&err).as_i32() as u8);
        }
    };

    if logging::init(&config.logging).is_err() {
        eprintln!("tracing subscriber was already initialized, continuing without reinitializing");
    }

    let exit_code = match run(cli.command, config).await {
        Ok(()) => ExitCode::Success,
        Err(err) => {
            error!(%err, "command failed");
            ExitCode::from_coordinator_error(&err)
        }
    };

    ProcessExitCode::from(exit_code.as_i32() as u8)
}

async fn run(command: Commands, config: CoordinatorConfig) -> Result<(), polystore_domain::CoordinatorError> {
    let data_dir = std::env::var("POLYSTORE_DATA_DIR").unwrap_or_else(|_| "./polystore-data".to_string());
    let sqlite_path = std::env::var("POLYSTORE_SQLITE_PATH").unwrap_or_else(|_| "./polystore.db".to_string());

    let relational = Arc::new(
        SqliteRelationalAdapter::connect(&sqlite_path)
            .await
            .map_err(|e| polystore_domain::CoordinatorError::AdapterFailed { kind: e.kind, message: e.message })?,
    );
    let document = Arc::new(FilesystemDocumentAdapter::new(data_dir));
    let vector = Arc::new(InMemoryVectorAdapter::new());
    let graph = Arc::new(InMemoryGraphAdapter::new());

    let coordinator = Coordinator::new(config, relational, document, vector, graph)?;

    let signals = create_signal_handler();
    let wait_for_signal = signals.wait_for_signal(Box::new(|| {
        info!("shutdown signal received");
    }));

    let result = tokio::select! {
        result = dispatch(command, &coordinator) => result,
        _ = wait_for_signal => Ok(()),
    };
    coordinator.shutdown();
    result
}

async fn dispatch(command: Commands, coordinator: &Coordinator) -> Result<(), polystore_domain::CoordinatorError> {
    match command {
        Commands::Write { input, mime_type } => {
            let mime_type = mime_type.unwrap_or_else(|| sniff_mime_type(&input));
            let file = tokio::fs::File::open(&input)
                .await
                .map_err(polystore_domain::CoordinatorError::from)?;
            let original_file_reference = input.display().to_string();
            let metadata = serde_json::json!({});

            let request = WriteRequest::new(original_file_reference, mime_type, metadata).with_payload(file);
            let result = coordinator.write_document(request).await?;

            println!("saga {} finished with status {:?}", result.saga_id, result.status);
            println!("document id: {}", result.document_id);
            if !result.is_success() {
                return Err(polystore_domain::CoordinatorError::SagaRollbackRequired(format!(
                    "write saga ended in {:?}",
                    result.status
                )));
            }
            Ok(())
        }

        Commands::Read { document_id } => {
            let document_id = parse_document_id(&document_id)?;
            match coordinator.read_document(document_id, ReadOptions::default()).await? {
                Some(view) => {
                    println!("document: {}", view.document.document_id);
                    println!("original reference: {}", view.document.original_file_reference);
                    println!("mime type: {}", view.document.mime_type);
                    println!("size bytes: {}", view.document.size_bytes);
                    println!("vectors: {}", view.vectors.len());
                    println!("relations: {}", view.relations.len());
                    println!("cached: {}", view.cached);
                    Ok(())
                }
                None => Err(polystore_domain::CoordinatorError::NotFound(document_id.to_string())),
            }
        }

        Commands::Delete { document_id } => {
            let document_id = parse_document_id(&document_id)?;
            let result = coordinator.delete_document(document_id, polystore::DeleteOptions::default()).await?;
            println!("saga {} finished with status {:?}", result.saga_id, result.status);
            Ok(())
        }
    }
}

fn parse_document_id(raw: &str) -> Result<DocumentId, polystore_domain::CoordinatorError> {
    raw.parse().map_err(|_| polystore_domain::CoordinatorError::InvalidDocument(format!("not a valid document id: {raw}")))
}

/// Sniffs a MIME type from the input path's extension, falling back to a
/// generic binary type when the extension is unknown or absent.
fn sniff_mime_type(input: &std::path::Path) -> String {
    match input.extension().and_then(|ext| ext.to_str()) {
        Some("txt") => "text/plain",
        Some("json") => "application/json",
        Some("html") | Some("htm") => "text/html",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
    .to_string()
}
