use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use pocket_bank::{
    bin_utils::Session,
    config::{Args, BankConfig},
    engine::AccountEngine,
    store::{AccountStore, file_store::FileAccountStore, in_memory_store::InMemoryAccountStore},
};
use tracing::Level;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .init();

    let config = BankConfig::from(Args::parse());
    match &config.data_dir {
        Some(dir) => {
            let store = FileAccountStore::open(dir)
                .with_context(|| format!("Failed to open account directory `{}`", dir.display()))?;
            run(store, &config)
        }
        None => run(InMemoryAccountStore::default(), &config),
    }
}

fn run<S: AccountStore>(store: S, config: &BankConfig) -> Result<()> {
    let engine = AccountEngine::new(store, config.agency, config.statement_policy);
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let session = Session {
        input: stdin.lock(),
        output: &mut stdout,
        engine,
    };
    session.run()?;
    stdout.flush()?;
    Ok(())
}
