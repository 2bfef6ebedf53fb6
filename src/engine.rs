use std::fmt;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    account::{AccountError, AccountRecord, LedgerEntry},
    command::AccountCommand,
    identity::StorageKey,
    money::Money,
    store::{AccountStore, StoreError},
};

#[derive(Debug, Error)]
pub enum BankError {
    /// Operation refused; nothing was mutated or written.
    #[error(transparent)]
    Rejected(#[from] AccountError),
    /// Persistence failed. The session cannot safely continue.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Whether a statement may be printed for a closed account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatementPolicy {
    #[default]
    OpenOnly,
    AnyExisting,
}

/// Outcome of a successful mutating operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Created {
        holder: String,
        account: String,
        balance: Money,
    },
    Closed {
        holder: String,
    },
    Reopened {
        holder: String,
    },
    Deposited {
        holder: String,
        balance: Money,
    },
    Withdrawn {
        holder: String,
        balance: Money,
    },
}

impl Notice {
    fn after(command: AccountCommand, record: &AccountRecord) -> Self {
        let holder = record.holder().to_string();
        match command {
            AccountCommand::Create { .. } => Notice::Created {
                holder,
                account: record.account_number().to_string(),
                balance: record.balance(),
            },
            AccountCommand::Close => Notice::Closed { holder },
            AccountCommand::Reopen => Notice::Reopened { holder },
            AccountCommand::Deposit { .. } => Notice::Deposited {
                holder,
                balance: record.balance(),
            },
            AccountCommand::Withdraw { .. } => Notice::Withdrawn {
                holder,
                balance: record.balance(),
            },
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Created {
                holder,
                account,
                balance,
            } => write!(
                f,
                "Account {account} created for holder: {holder}, credit: {balance}"
            ),
            Notice::Closed { holder } => write!(f, "Account closed for holder: {holder}"),
            Notice::Reopened { holder } => write!(f, "Account reopened for holder: {holder}"),
            Notice::Deposited { holder, balance } => {
                write!(f, "Deposit completed for holder: {holder}, credit: {balance}")
            }
            Notice::Withdrawn { holder, balance } => {
                write!(f, "Withdrawal completed for holder: {holder}, credit: {balance}")
            }
        }
    }
}

/// Runs account operations against a store. Every accepted operation is
/// persisted through [`AccountStore::set`] before the call returns; rejected
/// ones touch nothing.
pub struct AccountEngine<S> {
    store: S,
    agency: u32,
    statement_policy: StatementPolicy,
}

impl<S: AccountStore> AccountEngine<S> {
    pub fn new(store: S, agency: u32, statement_policy: StatementPolicy) -> Self {
        info!("Bank ready with {} account(s)", store.len());
        Self {
            store,
            agency,
            statement_policy,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn account(&self, holder: &str) -> Option<&AccountRecord> {
        self.store.get(&StorageKey::for_holder(holder))
    }

    pub fn create(&mut self, holder: &str, initial_credit: Money) -> Result<Notice, BankError> {
        self.execute(holder, AccountCommand::Create { initial_credit })
    }

    pub fn close(&mut self, holder: &str) -> Result<Notice, BankError> {
        self.execute(holder, AccountCommand::Close)
    }

    pub fn reopen(&mut self, holder: &str) -> Result<Notice, BankError> {
        self.execute(holder, AccountCommand::Reopen)
    }

    pub fn deposit(&mut self, holder: &str, amount: Money) -> Result<Notice, BankError> {
        self.execute(holder, AccountCommand::Deposit { amount })
    }

    pub fn withdraw(&mut self, holder: &str, amount: Money) -> Result<Notice, BankError> {
        self.execute(holder, AccountCommand::Withdraw { amount })
    }

    pub fn execute(&mut self, holder: &str, command: AccountCommand) -> Result<Notice, BankError> {
        let key = StorageKey::for_holder(holder);
        let now = Utc::now();

        let updated = match (self.store.get(&key), command) {
            (None, AccountCommand::Create { initial_credit }) => {
                info!("Creating new account for holder: {holder}");
                AccountRecord::open(holder, self.agency, initial_credit, now)
            }
            (None, _) => {
                return Err(reject(AccountError::NotFound {
                    holder: holder.to_string(),
                }));
            }
            (Some(record), command) => {
                let entry = record.handle_command(command, now).map_err(reject)?;
                info!(
                    "Account found for holder: {holder}. Executing operation: {}",
                    command.label()
                );
                let mut updated = record.clone();
                updated.apply(&entry);
                updated
            }
        };

        let notice = Notice::after(command, &updated);
        self.store.set(key, updated)?;
        info!("{notice}");
        Ok(notice)
    }

    /// History of `holder`'s account in chronological order.
    pub fn statement(&self, holder: &str) -> Result<&[LedgerEntry], BankError> {
        let Some(record) = self.account(holder) else {
            return Err(reject(AccountError::NotFound {
                holder: holder.to_string(),
            }));
        };
        if self.statement_policy == StatementPolicy::OpenOnly {
            record.ensure_open().map_err(reject)?;
        }
        info!("Account found for holder: {holder}. Executing operation: Bank Statement Display");
        Ok(record.history())
    }

    /// Re-persists every account, e.g. before the session ends.
    pub fn flush(&mut self) -> Result<(), BankError> {
        self.store.flush_all()?;
        Ok(())
    }
}

fn reject(err: AccountError) -> BankError {
    warn!("{err}");
    BankError::Rejected(err)
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, io, rc::Rc};

    use rust_decimal_macros::dec;

    use crate::{account::AccountState, store::in_memory_store::InMemoryAccountStore};

    use super::*;

    /// In-memory store whose writes start failing once `broken` is set.
    #[derive(Default)]
    struct FlakyStore {
        inner: InMemoryAccountStore,
        broken: Rc<Cell<bool>>,
    }

    impl FlakyStore {
        fn check(&self, key: &StorageKey) -> Result<(), StoreError> {
            if self.broken.get() {
                return Err(StoreError::Io {
                    key: key.to_string(),
                    source: io::Error::other("disk full"),
                });
            }
            Ok(())
        }
    }

    impl AccountStore for FlakyStore {
        fn get(&self, key: &StorageKey) -> Option<&AccountRecord> {
            self.inner.get(key)
        }

        fn set(&mut self, key: StorageKey, record: AccountRecord) -> Result<(), StoreError> {
            self.check(&key)?;
            self.inner.set(key, record)
        }

        fn delete(&mut self, key: &StorageKey) -> Result<Option<AccountRecord>, StoreError> {
            self.check(key)?;
            self.inner.delete(key)
        }

        fn iter(&self) -> Box<dyn Iterator<Item = (&StorageKey, &AccountRecord)> + '_> {
            self.inner.iter()
        }

        fn flush_all(&mut self) -> Result<(), StoreError> {
            self.inner.flush_all()
        }
    }

    fn engine() -> AccountEngine<InMemoryAccountStore> {
        AccountEngine::new(
            InMemoryAccountStore::default(),
            1,
            StatementPolicy::OpenOnly,
        )
    }

    fn money(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount)
    }

    fn assert_rejected(result: Result<Notice, BankError>, expected: AccountError) {
        match result {
            Err(BankError::Rejected(err)) => assert_eq!(err, expected),
            other => panic!("expected rejection {expected:?}, got {other:?}"),
        }
    }

    #[test]
    fn create_deposit_withdraw() {
        let mut bank = engine();
        let notice = bank.create("alice", money(dec!(100))).unwrap();
        assert!(matches!(notice, Notice::Created { .. }));
        bank.deposit("alice", money(dec!(50))).unwrap();
        let notice = bank.withdraw("alice", money(dec!(30))).unwrap();
        assert_eq!(
            notice,
            Notice::Withdrawn {
                holder: "alice".to_string(),
                balance: money(dec!(120)),
            }
        );

        let acc = bank.account("alice").unwrap();
        assert_eq!(acc.balance(), money(dec!(120)));
        assert_eq!(acc.history().len(), 3);
        assert_eq!(bank.statement("alice").unwrap().len(), 3);
    }

    #[test]
    fn duplicate_create_is_a_no_op() {
        let mut bank = engine();
        bank.create("alice", money(dec!(100))).unwrap();
        let before = bank.account("alice").unwrap().clone();

        assert_rejected(
            bank.create("alice", money(dec!(999))),
            AccountError::AlreadyExists {
                holder: "alice".to_string(),
            },
        );
        assert_eq!(bank.account("alice").unwrap(), &before);
        assert_eq!(bank.store().len(), 1);
    }

    #[test]
    fn overdraw_is_rejected() {
        let mut bank = engine();
        bank.create("bob", money(dec!(0))).unwrap();

        assert_rejected(
            bank.withdraw("bob", money(dec!(10))),
            AccountError::InsufficientFunds {
                requested: money(dec!(10)),
                available: money(dec!(0)),
            },
        );
        let acc = bank.account("bob").unwrap();
        assert_eq!(acc.balance(), money(dec!(0)));
        assert_eq!(acc.history().len(), 1);
    }

    #[test]
    fn close_and_reopen() {
        let mut bank = engine();
        bank.create("carol", money(dec!(20))).unwrap();
        bank.close("carol").unwrap();
        assert_eq!(bank.account("carol").unwrap().state(), AccountState::Closed);

        // second close is refused and leaves a single closing entry
        assert_rejected(
            bank.close("carol"),
            AccountError::AccountClosed {
                holder: "carol".to_string(),
            },
        );
        assert_eq!(bank.account("carol").unwrap().history().len(), 2);

        assert_rejected(
            bank.deposit("carol", money(dec!(5))),
            AccountError::AccountClosed {
                holder: "carol".to_string(),
            },
        );

        bank.reopen("carol").unwrap();
        let acc = bank.account("carol").unwrap();
        assert_eq!(acc.state(), AccountState::Open);
        assert_eq!(acc.closed_at(), None);
        assert!(acc.reopened_at().is_some());
        assert_eq!(acc.balance(), money(dec!(20)));
        assert_eq!(acc.history().len(), 3);

        assert_rejected(
            bank.reopen("carol"),
            AccountError::NotClosed {
                holder: "carol".to_string(),
            },
        );
    }

    #[test]
    fn unknown_holder_is_not_found() {
        let mut bank = engine();
        let not_found = || AccountError::NotFound {
            holder: "nobody".to_string(),
        };
        assert_rejected(bank.close("nobody"), not_found());
        assert_rejected(bank.reopen("nobody"), not_found());
        assert_rejected(bank.deposit("nobody", money(dec!(1))), not_found());
        assert_rejected(bank.withdraw("nobody", money(dec!(1))), not_found());
        assert!(matches!(
            bank.statement("nobody"),
            Err(BankError::Rejected(AccountError::NotFound { .. }))
        ));
        assert!(bank.store().is_empty());
    }

    #[test]
    fn statement_policy_for_closed_accounts() {
        let mut bank = engine();
        bank.create("dave", money(dec!(1))).unwrap();
        bank.close("dave").unwrap();
        assert!(matches!(
            bank.statement("dave"),
            Err(BankError::Rejected(AccountError::AccountClosed { .. }))
        ));

        let mut lenient = AccountEngine::new(
            InMemoryAccountStore::default(),
            1,
            StatementPolicy::AnyExisting,
        );
        lenient.create("dave", money(dec!(1))).unwrap();
        lenient.close("dave").unwrap();
        let history = lenient.statement("dave").unwrap();
        assert_eq!(history.len(), 2);
        assert!(matches!(history[1], LedgerEntry::Closing { .. }));
    }

    #[test]
    fn balance_is_sum_of_accepted_operations() {
        let mut bank = engine();
        bank.create("erin", money(dec!(10))).unwrap();
        let ops = [dec!(5), dec!(-3), dec!(2.5), dec!(-12), dec!(7.25), dec!(-0.75)];
        for amount in ops {
            if amount.is_sign_negative() {
                bank.withdraw("erin", money(-amount)).unwrap();
            } else {
                bank.deposit("erin", money(amount)).unwrap();
            }
        }
        let acc = bank.account("erin").unwrap();
        let expected: rust_decimal::Decimal = dec!(10) + ops.iter().sum::<rust_decimal::Decimal>();
        assert_eq!(acc.balance(), money(expected));
        assert_eq!(acc.history().len(), ops.len() + 1);
    }

    #[test]
    fn amounts_are_not_validated() {
        let mut bank = engine();
        bank.create("frank", money(dec!(-5))).unwrap();
        bank.deposit("frank", money(dec!(-1))).unwrap();
        assert_eq!(bank.account("frank").unwrap().balance(), money(dec!(-6)));
    }

    #[test]
    fn overflowing_deposit_is_rejected() {
        let mut bank = engine();
        let max = money(rust_decimal::Decimal::MAX);
        bank.create("zoe", max).unwrap();

        assert_rejected(
            bank.deposit("zoe", max),
            AccountError::AmountOutOfRange {
                amount: max,
                available: max,
            },
        );
        let acc = bank.account("zoe").unwrap();
        assert_eq!(acc.balance(), max);
        assert_eq!(acc.history().len(), 1);
    }

    #[test]
    fn failed_write_leaves_account_unchanged() {
        let store = FlakyStore::default();
        let broken = store.broken.clone();
        let mut bank = AccountEngine::new(store, 1, StatementPolicy::OpenOnly);
        bank.create("gina", money(dec!(10))).unwrap();
        let before = bank.account("gina").unwrap().clone();

        broken.set(true);
        let err = bank.deposit("gina", money(dec!(5))).unwrap_err();
        assert!(matches!(err, BankError::Store(StoreError::Io { .. })));
        assert_eq!(bank.account("gina"), Some(&before));

        let err = bank.create("hank", money(dec!(1))).unwrap_err();
        assert!(matches!(err, BankError::Store(_)));
        assert!(bank.account("hank").is_none());
    }
}
