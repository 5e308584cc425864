//! Interactive CLI wrapper around a `flashq` queue directory, named out of
//! core scope but retained as the ambient operator tool the `DataQueue`
//! original shipped (spec.md 1). Every subcommand opens the queue, does
//! one thing, and closes it again — there is no long-lived handle across
//! invocations, since each run of this binary is its own process.
//!
//! Grounded in `other_examples`' `path_tag_fs` and `lsm-tree`'s `tool.rs`:
//! `clap` derive subcommands, `env_logger::init()` reading `RUST_LOG`.

mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use flashq_core::{AccessMode, AccessType, Engine, QueueError, QueueFlags, SeekType};
use flashq_posix::PosixPort;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "flashq", about = "Inspect and drive a flashq persistent queue directory")]
struct Cli {
    /// Directory containing queue subdirectories. Overrides `flashq.toml`.
    #[arg(long)]
    root: Option<PathBuf>,

    /// Config file to read defaults from.
    #[arg(long, default_value = "flashq.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new queue directory.
    Create {
        name: String,
        #[arg(long)]
        max_entries: Option<u8>,
        #[arg(long)]
        max_entry_size: Option<u16>,
        #[arg(long)]
        random_access: bool,
        #[arg(long)]
        message_log: bool,
    },
    /// Remove a queue directory. Fails if it is open or held by a lock.
    Destroy { name: String },
    /// Append one entry, reading its bytes from the argument.
    Enqueue { name: String, data: String },
    /// Remove and print the oldest entry.
    Dequeue {
        name: String,
        #[arg(long, default_value_t = 65536)]
        max_size: usize,
    },
    /// Move the read cursor on a random-access queue.
    Seek {
        name: String,
        #[arg(value_enum)]
        seek_type: CliSeekType,
        #[arg(default_value_t = 0)]
        position: u8,
    },
    /// Print the entry at the current read cursor without removing it.
    GetEntry {
        name: String,
        #[arg(long, default_value_t = 65536)]
        max_size: usize,
    },
    /// Print the number of live entries.
    Length { name: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum CliSeekType {
    Head,
    Tail,
    Position,
}

impl From<CliSeekType> for SeekType {
    fn from(value: CliSeekType) -> Self {
        match value {
            CliSeekType::Head => SeekType::Head,
            CliSeekType::Tail => SeekType::Tail,
            CliSeekType::Position => SeekType::Position,
        }
    }
}

fn status_code(err: QueueError) -> ExitCode {
    log::error!("{err}");
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let config = match CliConfig::load(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            log::error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let root = cli
        .root
        .or_else(|| config.root_dir.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));
    let engine = Engine::new(PosixPort::new(root));

    match run(&engine, &config, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => status_code(err),
    }
}

fn run(engine: &Engine<PosixPort>, config: &CliConfig, command: Command) -> Result<(), QueueError> {
    match command {
        Command::Create {
            name,
            max_entries,
            max_entry_size,
            random_access,
            message_log,
        } => {
            let max_entries = max_entries.or(config.max_entries).unwrap_or(16);
            let max_entry_size = max_entry_size.or(config.max_entry_size).unwrap_or(256);
            let mut flags = QueueFlags::empty();
            if random_access {
                flags |= QueueFlags::RANDOM_ACCESS;
            }
            if message_log {
                flags |= QueueFlags::MESSAGE_LOG;
            }
            engine.create(&name, max_entries, max_entry_size, flags)?;
            println!("created {name}");
            Ok(())
        }
        Command::Destroy { name } => {
            engine.destroy(&name)?;
            println!("destroyed {name}");
            Ok(())
        }
        Command::Enqueue { name, data } => {
            let handle = engine.open(&name, AccessType::ReadWrite, AccessMode::BinaryPacked)?;
            let result = engine.enqueue(handle, data.as_bytes());
            engine.close(handle)?;
            result?;
            println!("enqueued {} bytes to {name}", data.len());
            Ok(())
        }
        Command::Dequeue { name, max_size } => {
            let handle = engine.open(&name, AccessType::ReadWrite, AccessMode::BinaryPacked)?;
            let mut buf = vec![0u8; max_size];
            let result = engine.dequeue(handle, &mut buf);
            engine.close(handle)?;
            let n = result?;
            print_payload(&buf[..n]);
            Ok(())
        }
        Command::Seek {
            name,
            seek_type,
            position,
        } => {
            let handle = engine.open(&name, AccessType::ReadOnly, AccessMode::BinaryPacked)?;
            let result = engine.seek(handle, seek_type.into(), position);
            engine.close(handle)?;
            result?;
            println!("seeked {name}");
            Ok(())
        }
        Command::GetEntry { name, max_size } => {
            let handle = engine.open(&name, AccessType::ReadOnly, AccessMode::BinaryPacked)?;
            let mut buf = vec![0u8; max_size];
            let result = engine.get_entry(handle, &mut buf);
            engine.close(handle)?;
            let n = result?;
            print_payload(&buf[..n]);
            Ok(())
        }
        Command::Length { name } => {
            let handle = engine.open(&name, AccessType::ReadOnly, AccessMode::BinaryPacked)?;
            let result = engine.get_length(handle);
            engine.close(handle)?;
            println!("{}", result?);
            Ok(())
        }
    }
}

fn print_payload(bytes: &[u8]) {
    match std::str::from_utf8(bytes) {
        Ok(text) => println!("{text}"),
        Err(_) => println!("{bytes:?}"),
    }
}
