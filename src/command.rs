use std::{fmt, str::FromStr};

use thiserror::Error;

use crate::money::Money;

/// Operation names an operator can type at the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Create,
    Close,
    Reopen,
    Deposit,
    Withdrawal,
    Statement,
    Exit,
}

impl OperationKind {
    pub const ALL: [OperationKind; 7] = [
        OperationKind::Create,
        OperationKind::Close,
        OperationKind::Reopen,
        OperationKind::Deposit,
        OperationKind::Withdrawal,
        OperationKind::Statement,
        OperationKind::Exit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Create => "create",
            OperationKind::Close => "close",
            OperationKind::Reopen => "reopen",
            OperationKind::Deposit => "deposit",
            OperationKind::Withdrawal => "withdrawal",
            OperationKind::Statement => "statement",
            OperationKind::Exit => "exit",
        }
    }

    /// Question asked for the amount, for operations that take one.
    pub fn amount_prompt(self) -> Option<&'static str> {
        match self {
            OperationKind::Create => Some("Provide the amount you are starting with:"),
            OperationKind::Deposit => Some("Provide the amount you want to deposit:"),
            OperationKind::Withdrawal => Some("Provide the amount you want to withdraw:"),
            _ => None,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = AccountCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == needle)
            .ok_or(AccountCommandError::UnknownOperation(needle))
    }
}

/// Validated request against a single account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountCommand {
    Create { initial_credit: Money },
    Close,
    Reopen,
    Deposit { amount: Money },
    Withdraw { amount: Money },
}

#[derive(Debug, Error)]
pub enum AccountCommandError {
    #[error("The command {0} is not a valid command!")]
    UnknownOperation(String),
    #[error("Amount is required for {kind}")]
    AmountRequired { kind: OperationKind },
    #[error("{kind} does not change an account")]
    NotAccountOperation { kind: OperationKind },
}

impl AccountCommand {
    /// Amounts are taken as given: no sign check, matching the engine's contract.
    pub fn parse_command(
        kind: OperationKind,
        amount: Option<Money>,
    ) -> Result<Self, AccountCommandError> {
        let required = || amount.ok_or(AccountCommandError::AmountRequired { kind });
        match kind {
            OperationKind::Create => Ok(Self::Create {
                initial_credit: required()?,
            }),
            OperationKind::Close => Ok(Self::Close),
            OperationKind::Reopen => Ok(Self::Reopen),
            OperationKind::Deposit => Ok(Self::Deposit { amount: required()? }),
            OperationKind::Withdrawal => Ok(Self::Withdraw { amount: required()? }),
            OperationKind::Statement | OperationKind::Exit => {
                Err(AccountCommandError::NotAccountOperation { kind })
            }
        }
    }

    /// Human name used in notices, e.g. "Deposit".
    pub fn label(&self) -> &'static str {
        match self {
            AccountCommand::Create { .. } => "Account Creation",
            AccountCommand::Close => "Account Closing",
            AccountCommand::Reopen => "Reopen Account",
            AccountCommand::Deposit { .. } => "Deposit",
            AccountCommand::Withdraw { .. } => "Withdrawal",
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn parse_operation_names() {
        assert_eq!(
            " Withdrawal ".parse::<OperationKind>().unwrap(),
            OperationKind::Withdrawal
        );
        assert_eq!("exit".parse::<OperationKind>().unwrap(), OperationKind::Exit);
        let err = "transfer".parse::<OperationKind>().unwrap_err();
        assert_eq!(err.to_string(), "The command transfer is not a valid command!");
    }

    #[test]
    fn amount_required_where_needed() {
        let err = AccountCommand::parse_command(OperationKind::Deposit, None).unwrap_err();
        assert!(matches!(
            err,
            AccountCommandError::AmountRequired {
                kind: OperationKind::Deposit
            }
        ));
        assert_eq!(err.to_string(), "Amount is required for deposit");

        let cmd = AccountCommand::parse_command(OperationKind::Close, None).unwrap();
        assert_eq!(cmd, AccountCommand::Close);

        for kind in OperationKind::ALL {
            let takes_amount = AccountCommand::parse_command(kind, None).is_err()
                && !matches!(kind, OperationKind::Statement | OperationKind::Exit);
            assert_eq!(kind.amount_prompt().is_some(), takes_amount, "{kind}");
        }
    }

    #[test]
    fn negative_amounts_pass_through() {
        let amount = Money::new(dec!(-5));
        let cmd = AccountCommand::parse_command(OperationKind::Deposit, Some(amount)).unwrap();
        assert_eq!(cmd, AccountCommand::Deposit { amount });
    }

    #[test]
    fn read_only_operations_are_not_commands() {
        for kind in [OperationKind::Exit, OperationKind::Statement] {
            let err = AccountCommand::parse_command(kind, None).unwrap_err();
            assert!(matches!(
                err,
                AccountCommandError::NotAccountOperation { .. }
            ));
        }
    }
}
