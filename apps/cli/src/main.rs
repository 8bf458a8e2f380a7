//! Bluvera CLI - Your personal vault for notes, images and PDFs
//!
//! Every command opens the configured vault, performs one operation and
//! prints the result re-read from storage.
//!
//! Usage:
//!   bluvera note add <title> -c <text>   - Create a note
//!   bluvera image add <file>             - Upload an image
//!   bluvera pdf export <id> <file>       - Write a stored PDF back to disk
//!   bluvera search <query>               - Search titles and note content
//!   bluvera status                       - Show config and item counts

use anyhow::{bail, Context, Result};
use bluvera_core::{
    config::default_config_path,
    format_date,
    search::{is_searchable, MIN_QUERY_LEN},
    upload::{decode_data_url, MB},
    Backend, Config, ImageItem, ItemKind, KeyValueStore, Note, NoteDraft, NoteUpdate, PdfItem,
    Record, UploadKind, VaultError, VaultItemType, VaultStore,
};
use clap::{Parser, Subcommand};
use colored::{ColoredString, Colorize};
use dialoguer::Confirm;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

type Vault = VaultStore<Box<dyn KeyValueStore>>;

/// Bluvera - Your personal vault
#[derive(Parser)]
#[command(name = "bluvera")]
#[command(about = "Keep notes, images and PDFs in a local vault", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Config file (default: ~/.config/bluvera/bluvera.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create, edit and delete text notes
    #[command(subcommand)]
    Note(NoteCommand),

    /// Upload, export and delete images
    #[command(subcommand)]
    Image(MediaCommand),

    /// Upload, export and delete PDF documents
    #[command(subcommand)]
    Pdf(MediaCommand),

    /// Search note titles and content, image and PDF titles
    Search {
        /// Search query text
        query: String,
    },

    /// Show current status (config, backend, item counts)
    Status,
}

#[derive(Subcommand)]
enum NoteCommand {
    /// Create a new note
    Add {
        title: String,

        /// Note body
        #[arg(short, long, default_value = "")]
        content: String,
    },

    /// List all notes
    List,

    /// Show one note in full
    Show {
        /// Note id (a unique prefix is enough)
        id: String,
    },

    /// Change the title and/or content of a note
    Edit {
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        content: Option<String>,
    },

    /// Delete a note
    Delete {
        id: String,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum MediaCommand {
    /// Upload a file into the vault
    Add {
        path: PathBuf,

        /// Title (default: file name up to the first dot)
        #[arg(short, long)]
        title: Option<String>,
    },

    /// List stored files
    List,

    /// Write a stored file back to disk
    Export { id: String, output: PathBuf },

    /// Delete a stored file
    Delete {
        id: String,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging (stderr, quiet unless asked)
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("bluvera_cli={}", log_level).parse()?)
                .add_directive(format!("bluvera_core={}", log_level).parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = ensure_config(&config_path)?;
    if let Some(notice) = backend_notice(&config) {
        eprintln!("{}", notice.yellow());
    }
    let mut vault = config.open_store()?;
    tracing::debug!(
        "Opened {} vault at {:?} (namespace {})",
        vault.backend().name(),
        config.vault_path,
        vault.namespace()
    );

    let json = cli.json;
    match cli.command {
        Commands::Note(cmd) => cmd_note(&mut vault, cmd, json),
        Commands::Image(cmd) => cmd_media::<ImageItem>(&mut vault, &config, cmd, json),
        Commands::Pdf(cmd) => cmd_media::<PdfItem>(&mut vault, &config, cmd, json),
        Commands::Search { query } => cmd_search(&vault, &query, json),
        Commands::Status => cmd_status(&vault, &config, &config_path, json),
    }
}

// ============ NOTE COMMANDS ============

fn cmd_note(vault: &mut Vault, cmd: NoteCommand, json: bool) -> Result<()> {
    match cmd {
        NoteCommand::Add { title, content } => {
            let title = require_title(title, ItemKind::Note)?;
            let note = vault.save_note(NoteDraft { title, content })?;
            if json {
                return print_json(&note);
            }
            println!("{}", "✓ Note created".green());
            print_note(&note, false);
        }
        NoteCommand::List => {
            let notes = vault.get_notes();
            if json {
                return print_json(&notes);
            }
            print_header(ItemKind::Note, notes.len());
            if notes.is_empty() {
                println!(
                    "  {}",
                    "No notes yet. Run 'bluvera note add <title>' to create one.".dimmed()
                );
            }
            for note in &notes {
                print_note(note, true);
            }
        }
        NoteCommand::Show { id } => {
            let Some(note) = resolve::<Note>(vault, &id)? else {
                return not_found(ItemKind::Note, &id);
            };
            if json {
                return print_json(&note);
            }
            print_note(&note, false);
        }
        NoteCommand::Edit { id, title, content } => {
            let Some(note) = resolve::<Note>(vault, &id)? else {
                return not_found(ItemKind::Note, &id);
            };
            let title = title
                .map(|t| require_title(t, ItemKind::Note))
                .transpose()?;
            let update = NoteUpdate { title, content };
            if update.is_empty() {
                bail!("Nothing to change: pass --title and/or --content");
            }

            let Some(updated) = vault.update_note(note.id(), update)? else {
                return not_found(ItemKind::Note, &id);
            };
            if json {
                return print_json(&updated);
            }
            println!("{}", "✓ Note updated".green());
            print_note(&updated, false);
        }
        NoteCommand::Delete { id, yes } => {
            let Some(note) = resolve::<Note>(vault, &id)? else {
                return not_found(ItemKind::Note, &id);
            };
            if !confirm_delete(&note, yes)? {
                println!("{}", "Cancelled".dimmed());
                return Ok(());
            }
            if vault.delete_note(note.id())? {
                println!("{} \"{}\" has been deleted", "✓ Note deleted:".green(), note.title());
            }
        }
    }

    Ok(())
}

// ============ IMAGE / PDF COMMANDS ============

/// Collections holding uploaded files.
trait MediaRecord: Record {
    const UPLOAD: UploadKind;

    fn data_url(&self) -> &str;

    fn save(vault: &mut Vault, draft: bluvera_core::MediaDraft) -> bluvera_core::Result<Self>;

    fn max_bytes(config: &Config) -> u64;
}

impl MediaRecord for ImageItem {
    const UPLOAD: UploadKind = UploadKind::Image;

    fn data_url(&self) -> &str {
        &self.data_url
    }

    fn save(vault: &mut Vault, draft: bluvera_core::MediaDraft) -> bluvera_core::Result<Self> {
        vault.save_image(draft)
    }

    fn max_bytes(config: &Config) -> u64 {
        config.upload.max_image_bytes()
    }
}

impl MediaRecord for PdfItem {
    const UPLOAD: UploadKind = UploadKind::Pdf;

    fn data_url(&self) -> &str {
        &self.data_url
    }

    fn save(vault: &mut Vault, draft: bluvera_core::MediaDraft) -> bluvera_core::Result<Self> {
        vault.save_pdf(draft)
    }

    fn max_bytes(config: &Config) -> u64 {
        config.upload.max_pdf_bytes()
    }
}

fn cmd_media<T: MediaRecord>(
    vault: &mut Vault,
    config: &Config,
    cmd: MediaCommand,
    json: bool,
) -> Result<()> {
    match cmd {
        MediaCommand::Add { path, title } => {
            let max_bytes = T::max_bytes(config);
            let upload = match bluvera_core::read_as_data_url(&path, T::UPLOAD, max_bytes) {
                Ok(upload) => upload,
                Err(VaultError::FileTooLarge { .. }) => {
                    println!(
                        "{} Maximum file size is {}MB",
                        "✗ File too large.".red(),
                        max_bytes / MB
                    );
                    return Ok(());
                }
                Err(VaultError::InvalidFileType { mime, accept }) => {
                    println!(
                        "{} Please upload a {} file ({}, got {})",
                        "✗ Invalid file type.".red(),
                        T::KIND,
                        accept,
                        mime
                    );
                    return Ok(());
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("Cannot read {}", path.display()))
                }
            };

            let size = upload.size;
            let draft = upload.into_draft(title);
            let title = require_title(draft.title, T::KIND)?;
            let item = T::save(vault, bluvera_core::MediaDraft { title, ..draft })?;
            if json {
                return print_json(&item);
            }
            println!("{} ({})", "✓ File uploaded".green(), human_size(size));
            print_media(&item);
        }
        MediaCommand::List => {
            let items = vault.get_all::<T>();
            if json {
                return print_json(&items);
            }
            print_header(T::KIND, items.len());
            if items.is_empty() {
                println!(
                    "  {}",
                    format!(
                        "Nothing here yet. Run 'bluvera {} add <file>' to upload one.",
                        T::KIND
                    )
                    .dimmed()
                );
            }
            for item in &items {
                print_media(item);
            }
        }
        MediaCommand::Export { id, output } => {
            let Some(item) = resolve::<T>(vault, &id)? else {
                return not_found(T::KIND, &id);
            };
            let (mime, bytes) = decode_data_url(item.data_url()).with_context(|| {
                format!("Stored {} {} is not a valid data URL", T::KIND, item.id())
            })?;
            write_export(&output, &bytes)?;
            println!(
                "{} {} ({}, {})",
                "✓ Exported to".green(),
                output.display(),
                mime,
                human_size(bytes.len() as u64)
            );
        }
        MediaCommand::Delete { id, yes } => {
            let Some(item) = resolve::<T>(vault, &id)? else {
                return not_found(T::KIND, &id);
            };
            if !confirm_delete(&item, yes)? {
                println!("{}", "Cancelled".dimmed());
                return Ok(());
            }
            if vault.delete::<T>(item.id())? {
                println!(
                    "{} \"{}\" has been deleted",
                    format!("✓ {} deleted:", capitalize(T::KIND.as_str())).green(),
                    item.title()
                );
            }
        }
    }

    Ok(())
}

// ============ SEARCH COMMAND ============

fn cmd_search(vault: &Vault, query: &str, json: bool) -> Result<()> {
    if !is_searchable(query) {
        println!(
            "{}",
            format!("Type at least {} characters to search.", MIN_QUERY_LEN).yellow()
        );
        return Ok(());
    }

    let results = vault.search_items(query);
    if json {
        return print_json(&results);
    }

    if results.is_empty() {
        println!("{}", format!("No results for \"{}\"", query).dimmed());
        return Ok(());
    }

    println!("Found {} items for \"{}\"", results.len().to_string().bold(), query.yellow());
    println!();
    for item in &results {
        println!(
            "{} {}  {}  {}",
            kind_marker(item.kind()),
            item.title().bold(),
            item.kind().as_str().dimmed(),
            short_id(item.id()).dimmed()
        );
        if let VaultItemType::Note(note) = item {
            println!("    {}", snippet(&note.content).dimmed());
        }
    }

    Ok(())
}

// ============ STATUS COMMAND ============

#[derive(Serialize)]
struct StatusReport<'a> {
    config_path: &'a Path,
    vault_path: &'a Path,
    backend: &'static str,
    namespace: &'a str,
    notes: usize,
    images: usize,
    pdfs: usize,
    keys: Vec<String>,
}

fn cmd_status(vault: &Vault, config: &Config, config_path: &Path, json: bool) -> Result<()> {
    let counts = vault.counts();
    let report = StatusReport {
        config_path,
        vault_path: config.vault_dir(),
        backend: vault.backend().name(),
        namespace: vault.namespace(),
        notes: counts.notes,
        images: counts.images,
        pdfs: counts.pdfs,
        keys: vault.backend().keys()?,
    };
    if json {
        return print_json(&report);
    }

    println!("{}", "📊 Bluvera Status".bold().cyan());
    println!();
    println!("Config:    {}", report.config_path.display());
    println!("Vault:     {}", report.vault_path.display());
    println!("Backend:   {}", report.backend);
    println!("Namespace: {}", report.namespace);
    println!("Items:     {}", counts.total().to_string().cyan());
    println!("  - notes:  {}", counts.notes);
    println!("  - images: {}", counts.images);
    println!("  - pdfs:   {}", counts.pdfs);

    Ok(())
}

// ============ HELPER FUNCTIONS ============

/// Load config from `path`, writing a default one first if it does not exist.
fn ensure_config(path: &Path) -> Result<Config> {
    let exists = path.exists();
    let config = Config::load_or_default(path)?;
    if !exists {
        eprintln!("{}", "Creating default configuration...".dimmed());
        config.save(path)?;
    }
    Ok(config)
}

/// Warning shown when the configured backend cannot keep data between runs.
fn backend_notice(config: &Config) -> Option<&'static str> {
    match config.backend {
        Backend::Memory => Some(
            "⚠ backend = \"memory\": changes are lost when this command exits. \
             Set backend = \"sqlite\" in the config file to keep them.",
        ),
        Backend::Sqlite => None,
    }
}

/// Find a record by exact id or unique id prefix.
fn resolve<T: Record>(vault: &Vault, id: &str) -> Result<Option<T>> {
    let id = id.trim();
    if id.is_empty() {
        bail!("An id is required");
    }

    let mut matches: Vec<T> = vault
        .get_all::<T>()
        .into_iter()
        .filter(|record| record.id().starts_with(id))
        .collect();

    if let Some(pos) = matches.iter().position(|record| record.id() == id) {
        return Ok(Some(matches.swap_remove(pos)));
    }
    match matches.len() {
        0 | 1 => Ok(matches.pop()),
        n => bail!(
            "Id prefix '{}' is ambiguous: {} {} match",
            id,
            n,
            T::KIND.collection()
        ),
    }
}

fn require_title(title: String, kind: ItemKind) -> Result<String> {
    if title.trim().is_empty() {
        bail!("Title required: please provide a title for your {}", kind);
    }
    Ok(title)
}

fn confirm_delete<T: Record>(record: &T, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    let confirmed = Confirm::new()
        .with_prompt(format!("Delete {} \"{}\"?", T::KIND, record.title()))
        .default(false)
        .interact()?;
    Ok(confirmed)
}

fn not_found(kind: ItemKind, id: &str) -> Result<()> {
    println!("{}", format!("✗ No {} with id '{}'", kind, id).red());
    Ok(())
}

fn write_export(output: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, bytes).with_context(|| format!("Cannot write {}", output.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_header(kind: ItemKind, count: usize) {
    println!(
        "{} ({})",
        capitalize(kind.collection()).bold().cyan(),
        count
    );
}

fn print_note(note: &Note, brief: bool) {
    println!(
        "{} {}  {}",
        short_id(note.id()).dimmed(),
        note.title().bold(),
        display_date(&note.meta.updated_at).dimmed()
    );
    if brief {
        if !note.content.is_empty() {
            println!("    {}", snippet(&note.content).dimmed());
        }
    } else {
        println!();
        println!("{}", note.content);
    }
}

fn print_media<T: MediaRecord>(item: &T) {
    let mime = item
        .data_url()
        .strip_prefix("data:")
        .and_then(|rest| rest.split([';', ',']).next())
        .unwrap_or("unknown");
    println!(
        "{} {}  {}  {}",
        short_id(item.id()).dimmed(),
        item.title().bold(),
        mime.dimmed(),
        format!("Uploaded on {}", display_date(&item.meta().created_at)).dimmed()
    );
}

fn kind_marker(kind: ItemKind) -> ColoredString {
    match kind {
        ItemKind::Note => "●".blue(),
        ItemKind::Image => "●".green(),
        ItemKind::Pdf => "●".yellow(),
    }
}

fn display_date(iso: &str) -> String {
    format_date(iso).unwrap_or_else(|_| iso.to_string())
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// First line of `text`, cut to 80 characters.
fn snippet(text: &str) -> String {
    let line = text.lines().next().unwrap_or("");
    let mut out: String = line.chars().take(80).collect();
    if line.chars().count() > 80 || text.lines().nth(1).is_some() {
        out.push('…');
    }
    out
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn human_size(bytes: u64) -> String {
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}
