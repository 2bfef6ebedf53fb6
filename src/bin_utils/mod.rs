//! Interactive menu around [`AccountEngine`]. Kept in the library so the
//! integration tests can drive it with scripted input.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use crate::{
    command::{AccountCommand, OperationKind},
    engine::{AccountEngine, BankError},
    money::Money,
    store::AccountStore,
};
use statement_printer::print_statement;

pub mod statement_printer;

pub struct Session<'w, R, W: 'w, S> {
    pub input: R,
    pub output: &'w mut W,
    pub engine: AccountEngine<S>,
}

impl<'w, R, W, S> Session<'w, R, W, S>
where
    R: BufRead,
    W: Write + 'w,
    S: AccountStore,
{
    /// Runs the menu until the operator confirms `exit` or input ends, then
    /// flushes every account and hands the engine back.
    pub fn run(mut self) -> Result<AccountEngine<S>> {
        writeln!(self.output, "Welcome to our bank!")?;

        loop {
            writeln!(self.output, "\nHere is a list of available operations:")?;
            for kind in OperationKind::ALL {
                writeln!(self.output, "{kind}")?;
            }

            let Some(op) = self.ask("What operation do you wish to do now?")? else {
                break;
            };
            let kind = match op.parse::<OperationKind>() {
                Ok(kind) => kind,
                Err(err) => {
                    writeln!(self.output, "{err}")?;
                    continue;
                }
            };

            let keep_going = match kind {
                OperationKind::Exit => self.confirm_exit()?,
                OperationKind::Statement => self.statement()?,
                _ => self.mutate(kind)?,
            };
            if !keep_going {
                break;
            }
        }

        self.engine.flush().context("Failed to persist accounts")?;
        Ok(self.engine)
    }

    fn confirm_exit(&mut self) -> Result<bool> {
        let answer = self.ask("Are you sure you want to exit? (y/n)")?;
        match answer.map(|a| a.to_lowercase()).as_deref() {
            Some("y") | None => {
                writeln!(self.output, "Ending session on user request")?;
                writeln!(self.output, "Thanks for visiting our bank!")?;
                Ok(false)
            }
            Some("n") => {
                writeln!(self.output, "Returning to menu..")?;
                Ok(true)
            }
            Some(other) => {
                writeln!(self.output, "The command {other} is not a valid command!")?;
                writeln!(self.output, "Returning to menu..")?;
                Ok(true)
            }
        }
    }

    fn statement(&mut self) -> Result<bool> {
        let Some(holder) = self.ask_holder()? else {
            return Ok(false);
        };
        match self.engine.statement(&holder) {
            Ok(entries) => print_statement(self.output, entries)?,
            Err(err) => report(self.output, err)?,
        }
        Ok(true)
    }

    fn mutate(&mut self, kind: OperationKind) -> Result<bool> {
        let Some(holder) = self.ask_holder()? else {
            return Ok(false);
        };

        let amount = match kind.amount_prompt() {
            Some(question) => {
                let Some(raw) = self.ask(question)? else {
                    return Ok(false);
                };
                match raw.parse::<Money>() {
                    Ok(amount) => Some(amount),
                    Err(err) => {
                        writeln!(self.output, "{err}")?;
                        return Ok(true);
                    }
                }
            }
            None => None,
        };

        let command = AccountCommand::parse_command(kind, amount)?;
        match self.engine.execute(&holder, command) {
            Ok(notice) => writeln!(self.output, "{notice}")?,
            Err(err) => report(self.output, err)?,
        }
        Ok(true)
    }

    fn ask_holder(&mut self) -> Result<Option<String>> {
        Ok(self
            .ask("Provide holder's name:")?
            .map(|name| name.to_lowercase()))
    }

    /// `None` once input is exhausted.
    fn ask(&mut self, question: &str) -> Result<Option<String>> {
        writeln!(self.output, "\n{question}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

/// Rejections are shown to the operator; storage failures end the session.
fn report<W: Write>(output: &mut W, err: BankError) -> Result<()> {
    match err {
        BankError::Rejected(err) => {
            writeln!(output, "{err}")?;
            Ok(())
        }
        BankError::Store(err) => Err(err).context("Account could not be persisted"),
    }
}
