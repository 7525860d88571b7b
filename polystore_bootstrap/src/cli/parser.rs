// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Command-line interface structure. Argument parsing happens here;
//! security validation of path-shaped arguments happens in [`super::validator`]
//! after parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "polystore")]
#[command(about = concat!("Polystore saga coordinator v", env!("CARGO_PKG_VERSION")))]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose (debug-level) logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Coordinator configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Write a document through the saga: metadata, payload, vectors, relations
    Write {
        /// Path to the file to ingest as the document payload
        #[arg(short, long)]
        input: PathBuf,

        /// MIME type of the document; sniffed from the extension if omitted
        #[arg(long)]
        mime_type: Option<String>,
    },

    /// Read back a materialized view (document + vectors + relations) by id
    Read {
        /// Document id (ULID)
        document_id: String,
    },

    /// Delete a document and its cross-store references
    Delete {
        /// Document id (ULID)
        document_id: String,
    },
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_write_subcommand() {
        let cli = Cli::parse_from(["polystore", "write", "--input", "/tmp/doc.bin"]);
        match cli.command {
            Commands::Write { input, mime_type } => {
                assert_eq!(input, PathBuf::from("/tmp/doc.bin"));
                assert!(mime_type.is_none());
            }
            other => panic!("expected Write, got {other:?}"),
        }
    }

    #[test]
    fn parses_read_subcommand() {
        let cli = Cli::parse_from(["polystore", "read", "01JAZZX8K1Q8N2F3G4H5J6K7M8"]);
        match cli.command {
            Commands::Read { document_id } => assert_eq!(document_id, "01JAZZX8K1Q8N2F3G4H5J6K7M8"),
            other => panic!("expected Read, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_subcommand() {
        let result = Cli::try_parse_from(["polystore", "frobnicate"]);
        assert!(result.is_err());
    }
}
