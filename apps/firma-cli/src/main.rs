//! Firma command-line front end
//!
//! Places text fields and signatures on a PDF, keeps them in a per-document
//! session, and flattens them into a new PDF on export.

mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use firma_core::ScreenPoint;
use firma_types::{FieldType, SignatureKind};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::{
    parse_date_format, parse_field_type, parse_point, parse_scale, parse_signature_kind, AddField,
};
use config::Config;

#[derive(Parser, Debug)]
#[command(name = "firma")]
#[command(version, about = "Fill and sign PDF documents")]
struct Args {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for sessions and the signature library
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the content hash that keys the document's session
    Hash { pdf: PathBuf },

    /// List pages with their sizes in points
    Pages { pdf: PathBuf },

    /// Add a text field to a page
    AddField {
        pdf: PathBuf,
        /// text, date, fullName, initials, email, phone, company, address, address2, checkbox, radio, x
        #[arg(long = "type", value_parser = parse_field_type)]
        field_type: FieldType,
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Screen position `x,y` in pixels at `--scale`
        #[arg(long, value_parser = parse_point)]
        at: Option<ScreenPoint>,
        /// Replace the seeded text
        #[arg(long)]
        text: Option<String>,
        /// Date format for date fields, by label or pattern
        #[arg(long, value_parser = parse_date_format)]
        date_format: Option<String>,
        #[arg(long, default_value_t = 1.0, value_parser = parse_scale)]
        scale: f64,
    },

    /// Store a PNG or JPEG signature image in the library
    AddSignature {
        #[arg(long)]
        image: PathBuf,
        #[arg(long, default_value = "upload", value_parser = parse_signature_kind)]
        kind: SignatureKind,
    },

    /// Place a library signature on a page
    PlaceSignature {
        pdf: PathBuf,
        #[arg(long)]
        signature: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, value_parser = parse_point)]
        at: Option<ScreenPoint>,
    },

    /// Move a field or signature to a screen position
    Move {
        pdf: PathBuf,
        #[arg(long)]
        id: String,
        #[arg(long, value_parser = parse_point)]
        to: ScreenPoint,
        #[arg(long, default_value_t = 1.0, value_parser = parse_scale)]
        scale: f64,
    },

    /// Print the document's fields as JSON
    Fields { pdf: PathBuf },

    /// Write a flattened copy of the document
    Export {
        pdf: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
        /// Draw all text in Helvetica without fetching fonts
        #[arg(long)]
        offline: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // stdout carries command output, logs go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load(args.config.as_deref())?;
    let state_dir = config.state_dir(args.state_dir.as_deref());

    match args.command {
        Command::Hash { pdf } => commands::hash(&pdf),
        Command::Pages { pdf } => commands::pages(&pdf),
        Command::AddField {
            pdf,
            field_type,
            page,
            at,
            text,
            date_format,
            scale,
        } => commands::add_field(
            &config,
            &state_dir,
            &pdf,
            AddField {
                field_type,
                page,
                at,
                text,
                date_format,
                scale,
            },
        ),
        Command::AddSignature { image, kind } => commands::add_signature(&state_dir, &image, kind),
        Command::PlaceSignature {
            pdf,
            signature,
            page,
            at,
        } => commands::place_signature(&state_dir, &pdf, &signature, page, at),
        Command::Move { pdf, id, to, scale } => {
            commands::move_field(&state_dir, &pdf, &id, to, scale)
        }
        Command::Fields { pdf } => commands::fields(&state_dir, &pdf),
        Command::Export { pdf, out, offline } => {
            commands::export(&config, &state_dir, &pdf, out, offline).await
        }
    }
}
