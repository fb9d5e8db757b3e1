//! # CLI Interface
//!
//! Command-line surface of `omniverse-sim`, built with `clap` derive.
//!
//! Operations are flags rather than subcommands, and more than one may be
//! given; exactly one runs, chosen by fixed precedence (see
//! [`SimulatorCli::operation`]). Flag values are split on `|` into tokens
//! before any validation.

use clap::Parser;
use std::path::PathBuf;

use omniverse_protocol::config::SIMULATOR_BANNER;

/// Omniverse NFT simulator for Flow.
///
/// Drives the Omniverse contracts on a Flow network (normally a local
/// emulator) using a fixed set of test accounts: configure member chains
/// and the cooling-off period, inspect them, list the test accounts' keys,
/// and prepare mint payloads.
#[derive(Parser, Debug)]
#[command(name = "omniverse-sim", version = SIMULATOR_BANNER)]
pub struct SimulatorCli {
    /// Print every test account with its public key.
    #[arg(long)]
    pub check_accounts: bool,

    /// Set the member chains of the Omniverse NFT.
    ///
    /// Takes one fcl-style JSON table, e.g. `[{"key":1,"value":"ethereum"}]`.
    #[arg(long, value_name = "MEMBERS", allow_hyphen_values = true)]
    pub set_members: Option<String>,

    /// Print the allowed member chains.
    #[arg(long)]
    pub check_members: bool,

    /// Set the cooling-off period (UFix64 seconds, e.g. `3600.0`).
    #[arg(long, value_name = "PERIOD", allow_hyphen_values = true)]
    pub set_lock_period: Option<String>,

    /// Print the cooling-off period.
    #[arg(long)]
    pub check_lock_period: bool,

    /// Prepare (and print) a mint of an Omniverse NFT to the owner account.
    #[arg(long)]
    pub mint: bool,

    /// Path to a settings file (TOML).
    #[arg(long, short = 'c', env = "OMNIVERSE_SIM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Flow access node REST endpoint. Overrides the settings file.
    #[arg(long, env = "OMNIVERSE_ACCESS_NODE")]
    pub access_node: Option<String>,

    /// Chain label embedded in mint payloads. Overrides the settings file.
    #[arg(long)]
    pub profile: Option<String>,

    /// Directory holding `transactions/` and `scripts/`. Overrides the
    /// settings file.
    #[arg(long, value_name = "DIR")]
    pub cadence_root: Option<PathBuf>,

    /// Log output format: `pretty` or `json`.
    #[arg(long, default_value = "pretty")]
    pub log_format: String,
}

/// The one operation a run performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    SetMembers(Vec<String>),
    CheckMembers,
    SetLockPeriod(Vec<String>),
    CheckLockPeriod,
    CheckAccounts,
    Mint,
}

impl SimulatorCli {
    /// Resolve the flags into a single operation.
    ///
    /// Precedence, first match wins: set-members, check-members,
    /// set-lock-period, check-lock-period, check-accounts, mint. Returns
    /// `None` when no operation flag was given.
    pub fn operation(&self) -> Option<Operation> {
        if let Some(raw) = &self.set_members {
            Some(Operation::SetMembers(split_tokens(raw)))
        } else if self.check_members {
            Some(Operation::CheckMembers)
        } else if let Some(raw) = &self.set_lock_period {
            Some(Operation::SetLockPeriod(split_tokens(raw)))
        } else if self.check_lock_period {
            Some(Operation::CheckLockPeriod)
        } else if self.check_accounts {
            Some(Operation::CheckAccounts)
        } else if self.mint {
            Some(Operation::Mint)
        } else {
            None
        }
    }
}

/// Split a flag value on `|`. Always yields at least one token.
pub fn split_tokens(raw: &str) -> Vec<String> {
    raw.split('|').map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> SimulatorCli {
        let mut argv = vec!["omniverse-sim"];
        argv.extend_from_slice(args);
        SimulatorCli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn verify_cli_structure() {
        SimulatorCli::command().debug_assert();
    }

    #[test]
    fn no_flags_means_no_operation() {
        assert_eq!(parse(&[]).operation(), None);
    }

    #[test]
    fn pipe_splits_into_tokens() {
        assert_eq!(split_tokens("a|b|c"), vec!["a", "b", "c"]);
        assert_eq!(split_tokens("3600.0"), vec!["3600.0"]);
        assert_eq!(split_tokens(""), vec![""]);
    }

    #[test]
    fn set_members_wins_over_everything() {
        let cli = parse(&[
            "--mint",
            "--check-accounts",
            "--check-members",
            "--set-members",
            r#"[{"key":1,"value":"ethereum"}]"#,
        ]);
        assert_eq!(
            cli.operation(),
            Some(Operation::SetMembers(vec![r#"[{"key":1,"value":"ethereum"}]"#.into()]))
        );
    }

    #[test]
    fn precedence_order_is_fixed() {
        assert_eq!(
            parse(&["--mint", "--check-members", "--set-lock-period", "1.0"]).operation(),
            Some(Operation::CheckMembers)
        );
        assert_eq!(
            parse(&["--mint", "--check-lock-period", "--set-lock-period", "1.0|2.0"]).operation(),
            Some(Operation::SetLockPeriod(vec!["1.0".into(), "2.0".into()]))
        );
        assert_eq!(
            parse(&["--mint", "--check-accounts", "--check-lock-period"]).operation(),
            Some(Operation::CheckLockPeriod)
        );
        assert_eq!(
            parse(&["--mint", "--check-accounts"]).operation(),
            Some(Operation::CheckAccounts)
        );
        assert_eq!(parse(&["--mint"]).operation(), Some(Operation::Mint));
    }

    #[test]
    fn global_options_parse() {
        let cli = parse(&[
            "--check-accounts",
            "--access-node",
            "http://localhost:8888",
            "--profile",
            "flowTestnet",
            "--log-format",
            "json",
        ]);
        assert_eq!(cli.access_node.as_deref(), Some("http://localhost:8888"));
        assert_eq!(cli.profile.as_deref(), Some("flowTestnet"));
        assert_eq!(cli.log_format, "json");
    }
}
