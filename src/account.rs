use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{command::AccountCommand, identity, money::Money};

/// Lifecycle state of a holder's account. `Absent` is the state of a holder
/// with no record in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountState {
    Absent,
    Open,
    Closed,
}

impl AccountState {
    pub fn of(record: Option<&AccountRecord>) -> Self {
        match record {
            None => AccountState::Absent,
            Some(record) if record.is_closed => AccountState::Closed,
            Some(_) => AccountState::Open,
        }
    }
}

/// One completed operation. Entries are only ever appended to a record's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum LedgerEntry {
    AccountCreation {
        initial_credit: Money,
        created_at: DateTime<Utc>,
    },
    Closing {
        closed_at: DateTime<Utc>,
    },
    Reopening {
        was_closed_at: Option<DateTime<Utc>>,
        reopened_at: DateTime<Utc>,
    },
    Deposit {
        current_credit: Money,
        amount_deposited: Money,
        new_credit: Money,
        deposited_at: DateTime<Utc>,
    },
    Withdrawal {
        current_credit: Money,
        amount_withdrawn: Money,
        new_credit: Money,
        withdrawn_at: DateTime<Utc>,
    },
}

impl LedgerEntry {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            LedgerEntry::AccountCreation { created_at, .. } => *created_at,
            LedgerEntry::Closing { closed_at } => *closed_at,
            LedgerEntry::Reopening { reopened_at, .. } => *reopened_at,
            LedgerEntry::Deposit { deposited_at, .. } => *deposited_at,
            LedgerEntry::Withdrawal { withdrawn_at, .. } => *withdrawn_at,
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            LedgerEntry::AccountCreation { .. } => "account_creation",
            LedgerEntry::Closing { .. } => "closing",
            LedgerEntry::Reopening { .. } => "reopening",
            LedgerEntry::Deposit { .. } => "deposit",
            LedgerEntry::Withdrawal { .. } => "withdrawal",
        }
    }

    /// `(previous, amount, new)` for entries that moved money.
    pub fn amounts(&self) -> Option<(Money, Money, Money)> {
        match self {
            LedgerEntry::Deposit {
                current_credit,
                amount_deposited,
                new_credit,
                ..
            } => Some((*current_credit, *amount_deposited, *new_credit)),
            LedgerEntry::Withdrawal {
                current_credit,
                amount_withdrawn,
                new_credit,
                ..
            } => Some((*current_credit, *amount_withdrawn, *new_credit)),
            LedgerEntry::AccountCreation { initial_credit, .. } => {
                Some((Money::ZERO, *initial_credit, *initial_credit))
            }
            LedgerEntry::Closing { .. } | LedgerEntry::Reopening { .. } => None,
        }
    }
}

impl fmt::Display for LedgerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerEntry::AccountCreation {
                initial_credit,
                created_at,
            } => write!(
                f,
                "Initial Account Credit: {initial_credit}\nCreated At: {created_at}"
            ),
            LedgerEntry::Closing { closed_at } => {
                write!(f, "Closing Operation\nClosed At: {closed_at}")
            }
            LedgerEntry::Reopening {
                was_closed_at,
                reopened_at,
            } => {
                write!(f, "Reopening Operation\nWas Closed At: ")?;
                match was_closed_at {
                    Some(at) => write!(f, "{at}")?,
                    None => write!(f, "-")?,
                }
                write!(f, "\nReopened At: {reopened_at}")
            }
            LedgerEntry::Deposit {
                current_credit,
                amount_deposited,
                new_credit,
                deposited_at,
            } => write!(
                f,
                "Deposit Operation\nCurrent Credit: {current_credit}\nAmount Deposited: {amount_deposited}\nNew Credit: {new_credit}\nDeposited At: {deposited_at}"
            ),
            LedgerEntry::Withdrawal {
                current_credit,
                amount_withdrawn,
                new_credit,
                withdrawn_at,
            } => write!(
                f,
                "Withdrawal Operation\nCurrent Credit: {current_credit}\nAmount Withdrawn: {amount_withdrawn}\nNew Credit: {new_credit}\nWithdrawn At: {withdrawn_at}"
            ),
        }
    }
}

/// Reasons an operation is rejected. A rejected operation mutates nothing.
#[derive(Debug, Error, PartialEq)]
pub enum AccountError {
    #[error("An account already exists for holder: {holder}")]
    AlreadyExists { holder: String },
    #[error("Account not found for holder: {holder}")]
    NotFound { holder: String },
    #[error("Account is currently closed for holder: {holder}")]
    AccountClosed { holder: String },
    #[error("Account is not currently closed for holder: {holder}")]
    NotClosed { holder: String },
    #[error(
        "Holder does not have enough credit to withdraw: {requested}, holder credit: {available}. Operation aborted"
    )]
    InsufficientFunds { requested: Money, available: Money },
    #[error("Amount {amount} is out of range for holder credit: {available}. Operation aborted")]
    AmountOutOfRange { amount: Money, available: Money },
}

/// Persisted state of one holder's account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    account_holder: String,
    banking_agency: u32,
    account: String,
    #[serde(with = "balance_as_number")]
    balance: Money,
    account_history: Vec<LedgerEntry>,
    created_at: DateTime<Utc>,
    last_operation_at: DateTime<Utc>,
    is_closed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    closed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reopened_at: Option<DateTime<Utc>>,
}

impl AccountRecord {
    /// New open account. The initial credit is not validated.
    pub fn open(holder: &str, agency: u32, initial_credit: Money, now: DateTime<Utc>) -> Self {
        let mut record = Self {
            account_holder: holder.to_string(),
            banking_agency: agency,
            account: identity::account_number(holder, &now),
            balance: Money::ZERO,
            account_history: Vec::new(),
            created_at: now,
            last_operation_at: now,
            is_closed: false,
            closed_at: None,
            reopened_at: None,
        };
        record.apply(&LedgerEntry::AccountCreation {
            initial_credit,
            created_at: now,
        });
        record
    }

    pub fn holder(&self) -> &str {
        &self.account_holder
    }

    pub fn agency(&self) -> u32 {
        self.banking_agency
    }

    pub fn account_number(&self) -> &str {
        &self.account
    }

    pub fn balance(&self) -> Money {
        self.balance
    }

    pub fn history(&self) -> &[LedgerEntry] {
        &self.account_history
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_operation_at(&self) -> DateTime<Utc> {
        self.last_operation_at
    }

    pub fn is_closed(&self) -> bool {
        self.is_closed
    }

    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at
    }

    pub fn reopened_at(&self) -> Option<DateTime<Utc>> {
        self.reopened_at
    }

    pub fn state(&self) -> AccountState {
        AccountState::of(Some(self))
    }

    /// Applies an entry and appends it to the history. The entry is trusted,
    /// all validation happens in [`AccountRecord::handle_command`].
    pub fn apply(&mut self, entry: &LedgerEntry) {
        match entry {
            LedgerEntry::AccountCreation { initial_credit, .. } => {
                self.balance = *initial_credit;
            }
            LedgerEntry::Closing { closed_at } => {
                self.is_closed = true;
                self.closed_at = Some(*closed_at);
            }
            LedgerEntry::Reopening { reopened_at, .. } => {
                self.is_closed = false;
                self.closed_at = None;
                self.reopened_at = Some(*reopened_at);
            }
            LedgerEntry::Deposit {
                new_credit,
                deposited_at: at,
                ..
            }
            | LedgerEntry::Withdrawal {
                new_credit,
                withdrawn_at: at,
                ..
            } => {
                self.balance = *new_credit;
                self.last_operation_at = *at;
            }
        }
        self.account_history.push(entry.clone());
    }

    /// Decides whether `command` may run against this account and, if so,
    /// which entry it produces. Does not mutate.
    pub fn handle_command(
        &self,
        command: AccountCommand,
        now: DateTime<Utc>,
    ) -> Result<LedgerEntry, AccountError> {
        match command {
            AccountCommand::Create { .. } => Err(AccountError::AlreadyExists {
                holder: self.account_holder.clone(),
            }),
            AccountCommand::Close => {
                self.ensure_open()?;
                Ok(LedgerEntry::Closing { closed_at: now })
            }
            AccountCommand::Reopen => {
                if !self.is_closed {
                    return Err(AccountError::NotClosed {
                        holder: self.account_holder.clone(),
                    });
                }
                Ok(LedgerEntry::Reopening {
                    was_closed_at: self.closed_at,
                    reopened_at: now,
                })
            }
            AccountCommand::Deposit { amount } => {
                self.ensure_open()?;
                let new_credit = self.balance.checked_add(amount).ok_or(
                    AccountError::AmountOutOfRange {
                        amount,
                        available: self.balance,
                    },
                )?;
                Ok(LedgerEntry::Deposit {
                    current_credit: self.balance,
                    amount_deposited: amount,
                    new_credit,
                    deposited_at: now,
                })
            }
            AccountCommand::Withdraw { amount } => {
                self.ensure_open()?;
                let new_credit = self.balance.checked_sub(amount).ok_or(
                    AccountError::AmountOutOfRange {
                        amount,
                        available: self.balance,
                    },
                )?;
                if new_credit.is_negative() {
                    return Err(AccountError::InsufficientFunds {
                        requested: amount,
                        available: self.balance,
                    });
                }
                Ok(LedgerEntry::Withdrawal {
                    current_credit: self.balance,
                    amount_withdrawn: amount,
                    new_credit,
                    withdrawn_at: now,
                })
            }
        }
    }

    pub fn ensure_open(&self) -> Result<(), AccountError> {
        if self.is_closed {
            Err(AccountError::AccountClosed {
                holder: self.account_holder.clone(),
            })
        } else {
            Ok(())
        }
    }
}

/// `balance` is a plain JSON number on disk, unlike the prefixed amounts in
/// history. Written with every digit so a reload gives back the same value.
mod balance_as_number {
    use serde::{Deserializer, Serializer};

    use crate::money::Money;

    pub fn serialize<S: Serializer>(balance: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::arbitrary_precision::serialize(&balance.amount(), serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        rust_decimal::serde::arbitrary_precision::deserialize(deserializer).map(Money::new)
    }
}
