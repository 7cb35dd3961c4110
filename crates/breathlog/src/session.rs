//! Interactive capture session.
//!
//! A line-driven front end for [`CaptureForm`]. Each input line is one
//! command, processed to completion before the next is read. Reminders fire
//! in between and are printed as they arrive; any still pending when the
//! session ends are cancelled.

use std::fmt::Write as _;
use std::str::FromStr;

use chrono::{Local, NaiveDate};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::entry::{Breathing, MealSlot, MealTime};
use crate::error::{Error, Result};
use crate::form::{CaptureForm, FormState, SavedEntry};
use crate::reminders::{Reminder, ReminderScheduler};
use crate::storage::KeyValueStore;

/// Command summary printed by `help`.
pub const HELP: &str = "\
Commands:
  meal <breakfast|lunch|dinner>     select the meal time
  breathing <better|same|worse|none>
  oxygen <value>                    oxygen level (%)
  heart <value>                     heart rate (BPM)
  notes <text>
  food [slot] <text>                breakfast, lunch, dinner or snacks
  activities <text>
  show                              show the current entry
  save                              save the current entry
  clear                             discard the current entry
  help
  quit
";

/// One parsed session command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Select the meal time.
    Meal(MealTime),
    /// Set or clear the breathing choice.
    Breathing(Option<Breathing>),
    /// Set the oxygen reading.
    Oxygen(String),
    /// Set the heart-rate reading.
    Heart(String),
    /// Set the notes.
    Notes(String),
    /// Set a meal slot; `None` means the active slot.
    Food {
        /// Target slot.
        slot: Option<MealSlot>,
        /// Meal text.
        text: String,
    },
    /// Set the activities.
    Activities(String),
    /// Print the current fields.
    Show,
    /// Save the current fields.
    Save,
    /// Discard the current fields.
    Clear,
    /// Print the command summary.
    Help,
    /// End the session.
    Quit,
}

impl FromStr for SessionCommand {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(w, r)| (w, r.trim()));

        let command = match word.to_ascii_lowercase().as_str() {
            "meal" => Self::Meal(rest.parse()?),
            "breathing" => match rest.to_ascii_lowercase().as_str() {
                "" | "none" | "clear" => Self::Breathing(None),
                _ => Self::Breathing(Some(rest.parse()?)),
            },
            "oxygen" | "o2" => Self::Oxygen(rest.to_string()),
            "heart" | "hr" => Self::Heart(rest.to_string()),
            "notes" => Self::Notes(rest.to_string()),
            "food" => {
                let (first, tail) = rest
                    .split_once(char::is_whitespace)
                    .map_or((rest, ""), |(f, t)| (f, t.trim()));
                match first.parse::<MealSlot>() {
                    Ok(slot) => Self::Food {
                        slot: Some(slot),
                        text: tail.to_string(),
                    },
                    Err(_) => Self::Food {
                        slot: None,
                        text: rest.to_string(),
                    },
                }
            }
            "activities" => Self::Activities(rest.to_string()),
            "show" => Self::Show,
            "save" => Self::Save,
            "clear" => Self::Clear,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            _ => return Err(Error::invalid_field("command", word)),
        };
        Ok(command)
    }
}

/// Response to one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Text to show, possibly empty.
    pub text: String,
    /// Whether the session should end.
    pub quit: bool,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quit: false,
        }
    }

    fn quit() -> Self {
        Self {
            text: "Bye.\n".to_string(),
            quit: true,
        }
    }
}

/// An interactive session over one capture form.
#[derive(Debug)]
pub struct Session<S> {
    form: CaptureForm<S>,
    today: fn() -> NaiveDate,
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

impl<S: KeyValueStore> Session<S> {
    /// A session dating entries with the local date.
    pub fn new(form: CaptureForm<S>) -> Self {
        Self {
            form,
            today: local_today,
        }
    }

    /// Use `today` to date saved entries.
    #[must_use]
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// The underlying form.
    pub fn form(&self) -> &CaptureForm<S> {
        &self.form
    }

    /// Parse and apply one input line.
    ///
    /// Bad input and rejected edits are reported in the reply; the session
    /// keeps going.
    pub fn handle_line(&mut self, line: &str) -> Reply {
        if line.trim().is_empty() {
            return Reply::text("");
        }
        match line.parse::<SessionCommand>() {
            Ok(command) => self.apply(command),
            Err(e) => Reply::text(format!("error: {e}\n")),
        }
    }

    /// Apply one command to the form.
    pub fn apply(&mut self, command: SessionCommand) -> Reply {
        debug!(?command, "Session command");
        let result = match command {
            SessionCommand::Meal(meal_time) => {
                self.form.select_meal_time(meal_time);
                Ok(format!("Meal time: {meal_time}\n"))
            }
            SessionCommand::Breathing(breathing) => {
                self.form.set_breathing(breathing);
                Ok(String::new())
            }
            SessionCommand::Oxygen(value) => {
                self.form.set_oxygen(value);
                Ok(String::new())
            }
            SessionCommand::Heart(value) => {
                self.form.set_heart_rate(value);
                Ok(String::new())
            }
            SessionCommand::Notes(text) => {
                self.form.set_notes(text);
                Ok(String::new())
            }
            SessionCommand::Food { slot, text } => self.set_food(slot, text),
            SessionCommand::Activities(text) => {
                self.form.set_activities(text);
                Ok(String::new())
            }
            SessionCommand::Show => Ok(self.show()),
            SessionCommand::Save => self.form.save((self.today)()).map(|s| saved_text(&s)),
            SessionCommand::Clear => {
                self.form.discard_draft();
                Ok("Cleared.\n".to_string())
            }
            SessionCommand::Help => Ok(HELP.to_string()),
            SessionCommand::Quit => return Reply::quit(),
        };

        match result {
            Ok(text) => Reply::text(text),
            Err(e) => Reply::text(format!("error: {e}\n")),
        }
    }

    fn set_food(&mut self, slot: Option<MealSlot>, text: String) -> Result<String> {
        let slot = match slot.or_else(|| self.form.active_slot()) {
            Some(slot) => slot,
            None if self.form.is_gated() => return Err(Error::MealTimeNotSelected),
            None => return Err(Error::invalid_field("meal slot", "")),
        };
        self.form.set_meal(slot, text)?;
        Ok(String::new())
    }

    fn show(&self) -> String {
        let draft = self.form.draft();
        let mut out = String::new();
        if self.form.state() == FormState::SelectingMealTime {
            out.push_str("Meal time:  (not selected)\n");
        } else if let Some(meal_time) = self.form.meal_time() {
            let _ = writeln!(out, "Meal time:  {meal_time}");
        }
        let _ = writeln!(
            out,
            "Breathing:  {}",
            draft.breathing.map_or("", Breathing::as_str)
        );
        let _ = writeln!(out, "Oxygen:     {}", draft.oxygen);
        let _ = writeln!(out, "Heart rate: {}", draft.heart_rate);
        let _ = writeln!(out, "Notes:      {}", draft.notes);
        for slot in MealSlot::ALL {
            let text = draft.meals.get(slot);
            if !text.is_empty() {
                let _ = writeln!(out, "{:<11} {text}", format!("{slot}:"));
            }
        }
        let _ = writeln!(out, "Activities: {}", draft.activities);
        let _ = writeln!(out, "Saved entries: {}", self.form.collection().len());
        out
    }

    /// Run the session until `quit` or end of input.
    ///
    /// `reminders` are scheduled when the session starts and printed as they
    /// fire. Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if reading input or writing output fails.
    pub async fn run<R, W>(&mut self, input: R, output: &mut W, reminders: Vec<Reminder>) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let (mut scheduler, mut fired) = ReminderScheduler::new();
        scheduler.schedule_all(reminders);
        info!(
            reminders = scheduler.pending(),
            gated = self.form.is_gated(),
            "Session started"
        );

        write_out(output, "Type 'help' for commands.\n").await?;
        let mut lines = input.lines();
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    let reply = self.handle_line(&line);
                    write_out(output, &reply.text).await?;
                    if reply.quit {
                        break;
                    }
                }
                Some(reminder) = fired.recv() => {
                    write_out(output, &format!("Reminder: {}\n", reminder.message)).await?;
                }
            }
        }

        let cancelled = scheduler.cancel_all();
        info!(
            entries = self.form.collection().len(),
            cancelled_reminders = cancelled,
            "Session ended"
        );
        Ok(())
    }
}

fn saved_text(saved: &SavedEntry) -> String {
    let mut out = String::new();
    for advisory in &saved.advisories {
        let _ = writeln!(out, "warning: {advisory}");
    }
    let _ = writeln!(
        out,
        "Saved entry #{} for {}.",
        saved.index + 1,
        crate::chart::label(&saved.entry)
    );
    out
}

async fn write_out<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> Result<()> {
    if !text.is_empty() {
        output.write_all(text.as_bytes()).await?;
        output.flush().await?;
    }
    Ok(())
}
