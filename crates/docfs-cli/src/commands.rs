use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use anyhow::{anyhow, Context};
use colored::Colorize;
use docfs_core::{DocFs, FileKind, FsConfig, FsError};
use docfs_store::InMemoryDocumentStore;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let stdin = io::stdin();
    run_with(cli, &mut stdout.lock(), &mut stdin.lock())
}

/// Open the snapshot, run one operation, and save the snapshot back if the
/// operation can have changed it.
pub fn run_with(cli: Cli, out: &mut impl Write, input: &mut impl Read) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => FsConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => FsConfig::default(),
    };
    let store = Arc::new(open_store(&cli.store)?);
    let fs = DocFs::new(store.clone(), config);

    let mutates = cli.command.mutates();
    execute(&fs, cli.command, out, input)?;
    if mutates {
        store
            .save_snapshot(&cli.store)
            .with_context(|| format!("saving store to {}", cli.store.display()))?;
    }
    fs.destroy().map_err(failure)
}

fn open_store(path: &Path) -> anyhow::Result<InMemoryDocumentStore> {
    if path.exists() {
        InMemoryDocumentStore::load(path)
            .with_context(|| format!("loading store from {}", path.display()))
    } else {
        Ok(InMemoryDocumentStore::new())
    }
}

/// Report a filesystem failure the way a mounted tree would: errno first.
fn failure(err: FsError) -> anyhow::Error {
    anyhow!("{}: {}", err.errno_name(), err)
}

fn execute(
    fs: &DocFs,
    command: Command,
    out: &mut impl Write,
    input: &mut impl Read,
) -> anyhow::Result<()> {
    match command {
        Command::Ls(args) => cmd_ls(fs, &args.path, out),
        Command::Cat(args) => {
            let bytes = fs
                .read(&args.path, args.size.unwrap_or(usize::MAX), args.offset)
                .map_err(failure)?;
            out.write_all(&bytes)?;
            writeln!(out)?;
            Ok(())
        }
        Command::Write(args) => {
            let data = match args.text {
                Some(text) => text.into_bytes(),
                None => {
                    let mut buf = Vec::new();
                    input.read_to_end(&mut buf)?;
                    buf
                }
            };
            let written = fs.write(&args.path, &data, args.offset).map_err(failure)?;
            writeln!(out, "{} wrote {} bytes to {}", "✓".green(), written, args.path.bold())?;
            Ok(())
        }
        Command::Touch(args) => {
            let touched = match fs.create(&args.path, 0o644) {
                Err(FsError::AlreadyExists { .. }) => fs.utimens(&args.path, None, None),
                other => other,
            };
            touched.map_err(failure)
        }
        Command::Mkdir(args) => {
            fs.mkdir(&args.path, 0o755).map_err(failure)?;
            writeln!(out, "{} created {}", "✓".green(), args.path.bold())?;
            Ok(())
        }
        Command::Rmdir(args) => {
            fs.rmdir(&args.path).map_err(failure)?;
            writeln!(out, "{} removed {}", "✓".green(), args.path.bold())?;
            Ok(())
        }
        Command::Rm(args) => {
            fs.unlink(&args.path).map_err(failure)?;
            writeln!(out, "{} deleted {}", "✓".green(), args.path.bold())?;
            Ok(())
        }
        Command::Mv(args) => {
            fs.rename(&args.from, &args.to).map_err(failure)?;
            writeln!(out, "{} {} → {}", "✓".green(), args.from.bold(), args.to.bold())?;
            Ok(())
        }
        Command::Stat(args) => cmd_stat(fs, &args.path, out),
        Command::Truncate(args) => {
            fs.truncate(&args.path, args.length).map_err(failure)?;
            Ok(())
        }
        Command::Df(args) => {
            let st = fs.statfs(&args.path).map_err(failure)?;
            writeln!(out, "{:>10} {:>10} {:>10} {:>10} {:>8}", "bsize", "blocks", "free", "avail", "namelen")?;
            writeln!(
                out,
                "{:>10} {:>10} {:>10} {:>10} {:>8}",
                st.bsize, st.blocks, st.bfree, st.bavail, st.namelen
            )?;
            Ok(())
        }
        Command::Xattr(args) => cmd_xattr(fs, args.action, out),
    }
}

fn cmd_ls(fs: &DocFs, path: &str, out: &mut impl Write) -> anyhow::Result<()> {
    let entries = fs.readdir(path).map_err(failure)?;
    for name in entries.iter().filter(|n| *n != "." && *n != "..") {
        let child = format!("{}/{}", path.trim_end_matches('/'), name);
        let attr = fs.getattr(&child).map_err(failure)?;
        match attr.kind {
            FileKind::Directory => writeln!(out, "{}/", name.blue().bold())?,
            FileKind::RegularFile => {
                writeln!(out, "{}  {}", name, format!("{} bytes", attr.size).dimmed())?
            }
        }
    }
    Ok(())
}

fn cmd_stat(fs: &DocFs, path: &str, out: &mut impl Write) -> anyhow::Result<()> {
    let attr = fs.getattr(path).map_err(failure)?;
    let kind = match attr.kind {
        FileKind::Directory => "directory",
        FileKind::RegularFile => "regular file",
    };
    let secs = |t: std::time::SystemTime| t.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
    writeln!(out, "  File: {}", path.bold())?;
    writeln!(out, "  Type: {}", kind.cyan())?;
    writeln!(out, "  Size: {:<10} Blocks: {:<8} IO Block: {}", attr.size, attr.blocks, attr.blksize)?;
    writeln!(out, "  Mode: {:o}  Links: {}", attr.mode(), attr.nlink)?;
    writeln!(out, "   Uid: {:<8} Gid: {}", attr.uid, attr.gid)?;
    writeln!(out, "Access: {}", secs(attr.atime))?;
    writeln!(out, "Modify: {}", secs(attr.mtime))?;
    writeln!(out, "Change: {}", secs(attr.ctime))?;
    Ok(())
}

fn cmd_xattr(fs: &DocFs, action: XattrAction, out: &mut impl Write) -> anyhow::Result<()> {
    match action {
        XattrAction::Get { path, name } => {
            let value = fs.getxattr(&path, &name).map_err(failure)?;
            writeln!(out, "{}", String::from_utf8_lossy(&value))?;
        }
        XattrAction::Set { path, name, value } => {
            fs.setxattr(&path, &name, value.as_bytes()).map_err(failure)?;
        }
        XattrAction::List { path } => {
            for name in fs.listxattr(&path).map_err(failure)? {
                writeln!(out, "{name}")?;
            }
        }
        XattrAction::Rm { path, name } => {
            fs.removexattr(&path, &name).map_err(failure)?;
        }
    }
    Ok(())
}
