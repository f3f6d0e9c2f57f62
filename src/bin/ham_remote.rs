use std::{
    collections::BTreeMap,
    error::Error,
    io,
    sync::mpsc::{self, Receiver, Sender},
    thread,
    time::Duration,
};

use clap::Parser;
use log::{info, warn};

use ham_remote::{
    ClientConfig, Command, CommandError, Database, Environment, RemoteDatabase, RemoteEnvironment,
    RemoteTransaction, Transaction, prompt,
};

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Environment URL, e.g. ham://localhost:8080/test.db
    url: String,
    /// Ask the server to create the environment
    #[arg(long)]
    create: bool,
    /// Environment flags passed on connect
    #[arg(long, default_value_t = 0)]
    flags: u32,
    /// Seconds to wait for the TCP connection
    #[arg(long, value_name = "SECS")]
    connect_timeout: Option<u64>,
    /// Seconds to wait for a reply before dropping the connection
    #[arg(long, value_name = "SECS")]
    read_timeout: Option<u64>,
}

impl Cli {
    fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::default();
        if let Some(secs) = self.connect_timeout {
            config = config.with_connect_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = self.read_timeout {
            config = config.with_read_timeout(Duration::from_secs(secs));
        }
        config
    }
}

enum Event {
    Input(Result<Option<Command>, CommandError>),
    Interrupt,
}

/// Reads commands on its own thread so an interrupt can end the session while
/// the terminal is blocked on input. Waits for `resume` before prompting again
/// so output stays in order.
fn spawn_reader(events: Sender<Event>, resume: Receiver<()>) {
    thread::spawn(move || {
        loop {
            let input = prompt(io::stdin().lock(), io::stdout().lock());
            if events.send(Event::Input(input)).is_err() || resume.recv().is_err() {
                break;
            }
        }
    });
}

struct Shell {
    env: RemoteEnvironment,
    databases: BTreeMap<u16, RemoteDatabase>,
    txn: Option<RemoteTransaction>,
}

impl Shell {
    fn execute(&mut self, cmd: Command) -> ham_remote::Result<()> {
        match cmd {
            Command::Exit => {}
            Command::Names(capacity) => {
                let names = self.env.get_database_names(capacity)?;
                println!("{names:?}");
            }
            Command::Params(ids) => {
                for param in self.env.get_parameters(&ids)? {
                    match param.value {
                        Some(value) => println!("{}: {value}", param.id),
                        None => println!("{}: <unset>", param.id),
                    }
                }
            }
            Command::Flush => self.env.flush(0)?,
            Command::Create(name) => {
                let db = self.env.create_db(name, 0, &[])?;
                self.databases.insert(name, db);
            }
            Command::Open(name) => {
                let db = self.env.open_db(name, 0, &[])?;
                self.databases.insert(name, db);
            }
            Command::Close(name) => match self.databases.get_mut(&name) {
                Some(db) => {
                    db.close(0)?;
                    self.databases.remove(&name);
                }
                None => println!("database {name} is not open in this shell"),
            },
            Command::Erase(name) => self.env.erase_db(name, 0)?,
            Command::Rename { old, new } => self.env.rename_db(old, new, 0)?,
            Command::Begin(name) => {
                if self.txn.is_some() {
                    println!("a transaction is already running");
                    return Ok(());
                }
                let txn = self.env.txn_begin(name.as_deref(), 0)?;
                if let Some(handle) = txn.handle() {
                    println!("transaction {}", handle.raw());
                }
                self.txn = Some(txn);
            }
            Command::Commit => self.finish_txn(true)?,
            Command::Abort => self.finish_txn(false)?,
        }
        Ok(())
    }

    fn finish_txn(&mut self, commit: bool) -> ham_remote::Result<()> {
        let Some(mut txn) = self.txn.take() else {
            println!("no transaction is running");
            return Ok(());
        };
        let res = if commit {
            self.env.txn_commit(&mut txn, 0)
        } else {
            self.env.txn_abort(&mut txn, 0)
        };
        if res.is_err() && txn.handle().is_some() {
            self.txn = Some(txn);
        }
        res
    }

    /// Aborts the running transaction, then closes the environment, which
    /// closes every database still open.
    fn shutdown(mut self) {
        if let Some(mut txn) = self.txn.take() {
            if let Err(e) = txn.abort(0) {
                warn!("failed to abort transaction: {e}");
            }
        }
        if !self.env.is_connected() {
            return;
        }
        if let Err(e) = self.env.close(0) {
            eprintln!("failed to safely close environment. error: {e}");
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    // Initialize env_logger; For logging to STDOUT/STDERR
    env_logger::init();

    let cli = Cli::parse();
    let mut env = RemoteEnvironment::new(cli.config());
    if cli.create {
        env.create(&cli.url, cli.flags, 0o644, 0, 0, 0)?;
    } else {
        env.open(&cli.url, cli.flags)?;
    }
    info!("session started on {}", cli.url);

    let (events, inbox) = mpsc::channel();
    let (resume, resumed) = mpsc::channel();
    let interrupts = events.clone();
    ctrlc::set_handler(move || {
        let _ = interrupts.send(Event::Interrupt);
    })?;
    spawn_reader(events, resumed);

    let mut shell = Shell {
        env,
        databases: BTreeMap::new(),
        txn: None,
    };

    for event in inbox {
        match event {
            Event::Interrupt => {
                println!();
                info!("interrupted");
                break;
            }
            Event::Input(Ok(None)) | Event::Input(Ok(Some(Command::Exit))) => break,
            Event::Input(Ok(Some(cmd))) => {
                if let Err(e) = shell.execute(cmd) {
                    eprintln!("error: {e} ({})", e.status());
                }
            }
            Event::Input(Err(CommandError::Empty)) => {}
            Event::Input(Err(e)) => eprintln!("{e}"),
        }
        if resume.send(()).is_err() {
            break;
        }
    }

    shell.shutdown();
    Ok(())
}
