use std::path::PathBuf;

use clap::Parser;

use crate::engine::StatementPolicy;

/// Single-user console bank. Each account is kept in its own JSON file.
#[derive(Debug, Parser)]
#[command(name = "pocket-bank", version, about)]
pub struct Args {
    /// Directory holding one file per account
    #[arg(long, default_value = "data/accounts")]
    pub data_dir: PathBuf,

    /// Banking agency number stamped into new accounts
    #[arg(long, default_value_t = 1)]
    pub agency: u32,

    /// Allow printing the statement of a closed account
    #[arg(long)]
    pub statement_on_closed: bool,

    /// Keep accounts in memory only; nothing is written to disk
    #[arg(long)]
    pub in_memory: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankConfig {
    /// `None` runs without persistence.
    pub data_dir: Option<PathBuf>,
    pub agency: u32,
    pub statement_policy: StatementPolicy,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            data_dir: Some(PathBuf::from("data/accounts")),
            agency: 1,
            statement_policy: StatementPolicy::OpenOnly,
        }
    }
}

impl From<Args> for BankConfig {
    fn from(args: Args) -> Self {
        Self {
            data_dir: (!args.in_memory).then_some(args.data_dir),
            agency: args.agency,
            statement_policy: if args.statement_on_closed {
                StatementPolicy::AnyExisting
            } else {
                StatementPolicy::OpenOnly
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_plain_invocation() {
        let args = Args::try_parse_from(["pocket-bank"]).unwrap();
        assert_eq!(BankConfig::from(args), BankConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "pocket-bank",
            "--data-dir",
            "/tmp/bank",
            "--agency",
            "42",
            "--statement-on-closed",
        ])
        .unwrap();
        let config = BankConfig::from(args);
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/bank")));
        assert_eq!(config.agency, 42);
        assert_eq!(config.statement_policy, StatementPolicy::AnyExisting);

        let args = Args::try_parse_from(["pocket-bank", "--in-memory"]).unwrap();
        assert_eq!(BankConfig::from(args).data_dir, None);
    }
}
