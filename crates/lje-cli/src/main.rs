use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use lje_core::{
    ApplyOptions, CompactWhen, Document, EditError, Formatter, FsHost, JsonEdit, WriteOptions,
};

#[derive(Parser, Debug)]
#[command(
    name = "lje-cli",
    about = "Edit localization JSON files without disturbing their formatting",
    version
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print the parsed value of a document
    Value(ValueArgs),
    /// Set one dictionary key (creates the file with --force)
    SetKey(SetKeyArgs),
    /// Remove one dictionary key
    RmKey(RmKeyArgs),
    /// Append elements to an array document
    Push(PushArgs),
    /// Apply a raw edit descriptor (JSON, same wire shape as the editors use)
    Edit(EditArgs),
    /// Rewrite a document through the whole-document formatter
    Fmt(FmtArgs),
    /// Zip backup of a localization directory before bulk edits
    Backup(BackupArgs),
}

#[derive(ClapArgs, Debug)]
struct ValueArgs {
    /// Document to read
    path: PathBuf,
}

#[derive(ClapArgs, Debug)]
struct SetKeyArgs {
    path: PathBuf,
    /// Dictionary key
    key: String,
    /// New value as raw JSON (e.g. "text", 123, true, {"a":1})
    value: String,
    /// Create the file from the default value if missing or unparsable
    #[arg(long)]
    force: bool,
}

#[derive(ClapArgs, Debug)]
struct RmKeyArgs {
    path: PathBuf,
    /// Dictionary key to remove (missing key is a no-op)
    key: String,
}

#[derive(ClapArgs, Debug)]
struct PushArgs {
    path: PathBuf,
    /// Elements to append, as a raw JSON array
    values: String,
    /// Create the file from an empty array if missing or unparsable
    #[arg(long)]
    force: bool,
}

#[derive(ClapArgs, Debug)]
struct EditArgs {
    path: PathBuf,
    /// Edit descriptor, e.g. {"type":"object","action":"update","key":"title","value":"Hi"}
    edit: String,
    /// Default document value used when forcing creation
    #[arg(long, default_value = "{}")]
    default: String,
    #[arg(long)]
    force: bool,
}

#[derive(ClapArgs, Debug)]
struct FmtArgs {
    path: PathBuf,
    /// Keys to order first, in the given order
    #[arg(long, value_delimiter = ',')]
    key_order: Vec<String>,
    /// Compact collections of scalars up to this many entries
    #[arg(long)]
    compact: Option<usize>,
    /// Indent width in spaces
    #[arg(long, default_value_t = 4)]
    indent: usize,
}

#[derive(ClapArgs, Debug)]
struct BackupArgs {
    /// Localization data directory to back up
    dir: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Value(a) => cmd_value(a),
        Cmd::SetKey(a) => cmd_set_key(a),
        Cmd::RmKey(a) => cmd_rm_key(a),
        Cmd::Push(a) => cmd_push(a),
        Cmd::Edit(a) => cmd_edit(a),
        Cmd::Fmt(a) => cmd_fmt(a),
        Cmd::Backup(a) => cmd_backup(a),
    }
}

fn read_document(path: PathBuf, default: serde_json::Value) -> (Document, FsHost) {
    let host = FsHost::new();
    let mut doc = Document::new(path, default);
    if let Err(e) = doc.read(&host) {
        eprintln!("error: {}", e);
        std::process::exit(2);
    }
    (doc, host)
}

fn apply(doc: &mut Document, host: &mut FsHost, edit: &JsonEdit, force: bool) {
    match doc.apply_edit(host, edit, ApplyOptions { force, save: false }) {
        Ok(true) => {}
        Ok(false) => {
            eprintln!("error: {}", EditError::HostRejected);
            std::process::exit(4);
        }
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(4);
        }
    }
}

fn parse_json(raw: &str, what: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        eprintln!("invalid {} JSON: {}", what, e);
        std::process::exit(3);
    })
}

fn cmd_value(args: ValueArgs) {
    let (doc, _) = read_document(args.path, serde_json::json!({}));
    match serde_json::to_string_pretty(&doc.get_value()) {
        Ok(s) => println!("{}", s),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
    }
}

fn cmd_set_key(args: SetKeyArgs) {
    let value = parse_json(&args.value, "--value");
    let mut host = FsHost::new();
    let mut doc = Document::new(args.path, serde_json::json!({}));
    // Read errors are tolerated when forcing; apply_edit rewrites the default.
    if let Err(e) = doc.read(&host)
        && !args.force
    {
        eprintln!("error: {}", e);
        std::process::exit(2);
    }
    let edit = JsonEdit::update_key(args.key, value);
    apply(&mut doc, &mut host, &edit, args.force);
}

fn cmd_rm_key(args: RmKeyArgs) {
    let (mut doc, mut host) = read_document(args.path, serde_json::json!({}));
    let edit = JsonEdit::delete_key(args.key);
    apply(&mut doc, &mut host, &edit, false);
}

fn cmd_push(args: PushArgs) {
    let values = match parse_json(&args.values, "values") {
        serde_json::Value::Array(items) => items,
        _ => {
            eprintln!("values must be a JSON array");
            std::process::exit(3);
        }
    };
    let mut host = FsHost::new();
    let mut doc = Document::new(args.path, serde_json::json!([]));
    if let Err(e) = doc.read(&host)
        && !args.force
    {
        eprintln!("error: {}", e);
        std::process::exit(2);
    }
    let edit = JsonEdit::push(values);
    apply(&mut doc, &mut host, &edit, args.force);
}

fn cmd_edit(args: EditArgs) {
    let default = parse_json(&args.default, "--default");
    let edit: JsonEdit = serde_json::from_str(&args.edit).unwrap_or_else(|e| {
        eprintln!("invalid edit descriptor: {}", e);
        std::process::exit(3);
    });
    let mut host = FsHost::new();
    let mut doc = Document::new(args.path, default);
    if let Err(e) = doc.read(&host)
        && !args.force
    {
        eprintln!("error: {}", e);
        std::process::exit(2);
    }
    apply(&mut doc, &mut host, &edit, args.force);
}

fn cmd_fmt(args: FmtArgs) {
    let compact = match args.compact {
        Some(n) => CompactWhen::LeafMaxLen(n),
        None => CompactWhen::Never,
    };
    let formatter = Formatter::new()
        .key_order(args.key_order)
        .compact(compact)
        .indent(args.indent);
    let mut host = FsHost::new();
    let mut doc = Document::new(args.path, serde_json::json!({})).with_formatter(formatter);
    if let Err(e) = doc.read(&host) {
        eprintln!("error: {}", e);
        std::process::exit(2);
    }
    if let Err(e) = doc.write(&mut host, WriteOptions::default()) {
        eprintln!("error writing: {}", e);
        std::process::exit(5);
    }
}

fn cmd_backup(args: BackupArgs) {
    match lje_core::backup::zip_backup_dir(&args.dir) {
        Ok(dest) => println!("{}", dest.display()),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
    }
}
