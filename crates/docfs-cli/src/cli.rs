use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "docfs",
    about = "Browse and edit a document store as a tree of files",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Store snapshot to operate on; created on first mutation.
    #[arg(long, global = true, default_value = "docfs.json")]
    pub store: PathBuf,

    /// TOML configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// List databases, collections, or documents
    Ls(PathArgs),
    /// Print a document's JSON body
    Cat(CatArgs),
    /// Write text or JSON to a document
    Write(WriteArgs),
    /// Create an empty document
    Touch(PathArgs),
    /// Create a database or collection
    Mkdir(PathArgs),
    /// Drop a database or collection
    Rmdir(PathArgs),
    /// Delete a document
    Rm(PathArgs),
    /// Move a document
    Mv(MoveArgs),
    /// Show the attributes of an entry
    Stat(PathArgs),
    /// Truncate a document
    Truncate(TruncateArgs),
    /// Show filesystem capacity figures
    Df(DfArgs),
    /// Extended attributes (held only for the duration of one command)
    Xattr(XattrArgs),
}

impl Command {
    /// Whether the command can change store contents.
    pub fn mutates(&self) -> bool {
        matches!(
            self,
            Self::Write(_)
                | Self::Touch(_)
                | Self::Mkdir(_)
                | Self::Rmdir(_)
                | Self::Rm(_)
                | Self::Mv(_)
                | Self::Truncate(_)
        )
    }
}

#[derive(Args)]
pub struct PathArgs {
    #[arg(default_value = "/")]
    pub path: String,
}

#[derive(Args)]
pub struct CatArgs {
    pub path: String,
    /// Byte offset to start reading at
    #[arg(long, default_value = "0")]
    pub offset: u64,
    /// Maximum number of bytes to print
    #[arg(long)]
    pub size: Option<usize>,
}

#[derive(Args)]
pub struct WriteArgs {
    pub path: String,
    /// Text to write; read from stdin when absent
    pub text: Option<String>,
    /// Byte offset of the write; nonzero appends to plain-text documents
    #[arg(long, default_value = "0")]
    pub offset: u64,
}

#[derive(Args)]
pub struct MoveArgs {
    pub from: String,
    pub to: String,
}

#[derive(Args)]
pub struct TruncateArgs {
    pub path: String,
    #[arg(default_value = "0")]
    pub length: u64,
}

#[derive(Args)]
pub struct DfArgs {
    #[arg(default_value = "/")]
    pub path: String,
}

#[derive(Args)]
pub struct XattrArgs {
    #[command(subcommand)]
    pub action: XattrAction,
}

#[derive(Subcommand)]
pub enum XattrAction {
    Get { path: String, name: String },
    Set { path: String, name: String, value: String },
    List { path: String },
    Rm { path: String, name: String },
}
