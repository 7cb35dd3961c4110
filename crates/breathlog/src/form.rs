//! The capture form.
//!
//! [`CaptureForm`] holds the fields of the check-in being typed, appends a
//! finished [`LogEntry`] to the collection on save, and writes the whole
//! collection back through its [`LogStore`].
//!
//! One state machine serves both flows. With the meal-time gate on, the form
//! starts in [`FormState::SelectingMealTime`] and refuses to save until a
//! meal time is chosen; only the chosen meal slot is recorded. With the gate
//! off, it starts in [`FormState::Capturing`].
//!
//! ```text
//! SelectingMealTime --select_meal_time--> Capturing --save--> (saved) --> Capturing
//! ```
//!
//! Saving resets every field but keeps the selected meal time. A failed write
//! is returned to the caller with the collection and the fields unchanged.

use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

use crate::entry::{Advisory, Breathing, LogCollection, LogEntry, MealSlot, MealTime, Meals, Reading};
use crate::error::{Error, Result};
use crate::storage::{KeyValueStore, LogStore};

/// Where the form is in its workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    /// Gated form waiting for a meal time.
    SelectingMealTime,
    /// Fields can be edited and the entry saved.
    Capturing,
}

/// Field values of the check-in being captured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    /// Breathing choice.
    pub breathing: Option<Breathing>,
    /// Oxygen reading as typed.
    pub oxygen: Reading,
    /// Heart-rate reading as typed.
    pub heart_rate: Reading,
    /// Notes.
    pub notes: String,
    /// Meal text per slot.
    pub meals: Meals,
    /// Activities.
    pub activities: String,
}

impl Draft {
    /// True if nothing has been entered.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        *self == Self::default()
    }
}

/// Receipt for a saved entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedEntry {
    /// The entry as stored.
    pub entry: LogEntry,
    /// Its position in the collection.
    pub index: usize,
    /// Advisory findings on its readings.
    pub advisories: Vec<Advisory>,
}

/// The in-progress check-in plus the collection it is saved into.
#[derive(Debug)]
pub struct CaptureForm<S> {
    store: LogStore<S>,
    collection: LogCollection,
    meal_time_gate: bool,
    meal_time: Option<MealTime>,
    draft: Draft,
}

impl<S: KeyValueStore> CaptureForm<S> {
    /// Open a form, loading the stored collection.
    pub fn open(store: LogStore<S>, meal_time_gate: bool) -> Self {
        let collection = store.load_collection();
        debug!(
            entries = collection.len(),
            meal_time_gate, "Capture form opened"
        );
        Self {
            store,
            collection,
            meal_time_gate,
            meal_time: None,
            draft: Draft::default(),
        }
    }

    /// Current workflow state.
    #[must_use]
    pub fn state(&self) -> FormState {
        if self.meal_time_gate && self.meal_time.is_none() {
            FormState::SelectingMealTime
        } else {
            FormState::Capturing
        }
    }

    /// Whether saving requires a meal time.
    #[must_use]
    pub fn is_gated(&self) -> bool {
        self.meal_time_gate
    }

    /// Selected meal time, if any.
    #[must_use]
    pub fn meal_time(&self) -> Option<MealTime> {
        self.meal_time
    }

    /// The meal slot edits go to when the form is gated.
    #[must_use]
    pub fn active_slot(&self) -> Option<MealSlot> {
        if self.meal_time_gate {
            self.meal_time.map(MealTime::slot)
        } else {
            None
        }
    }

    /// Choose the meal time. Leaves the fields and the collection alone.
    pub fn select_meal_time(&mut self, meal_time: MealTime) {
        let before = self.state();
        self.meal_time = Some(meal_time);
        debug!(%meal_time, ?before, after = ?self.state(), "Meal time selected");
    }

    /// Replace the breathing choice.
    pub fn set_breathing(&mut self, breathing: Option<Breathing>) {
        self.draft.breathing = breathing;
    }

    /// Replace the oxygen reading.
    pub fn set_oxygen(&mut self, oxygen: impl Into<Reading>) {
        self.draft.oxygen = oxygen.into();
    }

    /// Replace the heart-rate reading.
    pub fn set_heart_rate(&mut self, heart_rate: impl Into<Reading>) {
        self.draft.heart_rate = heart_rate.into();
    }

    /// Replace the notes.
    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.draft.notes = notes.into();
    }

    /// Replace the activities.
    pub fn set_activities(&mut self, activities: impl Into<String>) {
        self.draft.activities = activities.into();
    }

    /// Replace the text of one meal slot.
    ///
    /// # Errors
    ///
    /// On a gated form, returns [`Error::MealTimeNotSelected`] before a meal
    /// time is chosen and [`Error::InactiveMealSlot`] for any slot other than
    /// the chosen one.
    pub fn set_meal(&mut self, slot: MealSlot, text: impl Into<String>) -> Result<()> {
        if self.meal_time_gate {
            let meal_time = self.meal_time.ok_or(Error::MealTimeNotSelected)?;
            if meal_time.slot() != slot {
                return Err(Error::InactiveMealSlot {
                    slot: slot.to_string(),
                    active: meal_time.slot().to_string(),
                });
            }
        }
        self.draft.meals.set(slot, text);
        Ok(())
    }

    /// Clear every field without saving. The meal time stays selected.
    pub fn discard_draft(&mut self) {
        self.draft = Draft::default();
    }

    /// Fields captured so far.
    #[must_use]
    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    /// Every saved entry.
    #[must_use]
    pub fn collection(&self) -> &LogCollection {
        &self.collection
    }

    /// The persistence adapter.
    #[must_use]
    pub fn store(&self) -> &LogStore<S> {
        &self.store
    }

    /// Save the current fields as an entry dated `date`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MealTimeNotSelected`] on a gated form without a meal
    /// time, or the storage error if the collection could not be written. On
    /// error nothing changes.
    pub fn save(&mut self, date: NaiveDate) -> Result<SavedEntry> {
        if self.state() == FormState::SelectingMealTime {
            return Err(Error::MealTimeNotSelected);
        }

        let meals = match self.active_slot() {
            Some(slot) => self.draft.meals.only(slot),
            None => self.draft.meals.clone(),
        };

        let entry = LogEntry {
            date,
            meal_time: self.meal_time,
            breathing: self.draft.breathing,
            oxygen: self.draft.oxygen.clone(),
            heart_rate: self.draft.heart_rate.clone(),
            notes: self.draft.notes.clone(),
            meals,
            activities: self.draft.activities.clone(),
        };

        let advisories = entry.advisories();
        for advisory in &advisories {
            info!(%advisory, "Saving reading outside the expected range");
        }

        self.collection.push(entry.clone());
        if let Err(e) = self.store.save_collection(&self.collection) {
            self.collection.rollback_last();
            warn!(error = %e, "Entry not saved; fields kept for retry");
            return Err(e);
        }

        self.draft = Draft::default();
        let index = self.collection.len() - 1;
        info!(
            %date,
            entries = self.collection.len(),
            meal_time = ?self.meal_time,
            "Entry saved"
        );

        Ok(SavedEntry {
            entry,
            index,
            advisories,
        })
    }

    /// Save the current fields as an entry dated today (local time).
    ///
    /// # Errors
    ///
    /// See [`CaptureForm::save`].
    pub fn save_now(&mut self) -> Result<SavedEntry> {
        self.save(Local::now().date_naive())
    }
}
