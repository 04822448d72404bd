//! View routing and session state shared by every screen.

use tracing::{debug, warn};

use crate::auth::User;
use crate::errors::IndieMarkError;
use crate::store::CampaignStore;
use crate::wire::{CampaignParameters, CampaignRecord};
use crate::wizard::{Wizard, WizardStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppView {
    Landing,
    Wizard,
    Generating,
    Results,
    History,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

/// Identifies one generation run; only the latest outstanding one may land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationTicket(u64);

#[derive(Debug, Default)]
pub struct GenerationGuard {
    seq: u64,
    outstanding: Option<u64>,
}

impl GenerationGuard {
    pub fn begin(&mut self) -> Result<GenerationTicket, IndieMarkError> {
        if self.outstanding.is_some() {
            return Err(IndieMarkError::GenerationInFlight);
        }
        self.seq += 1;
        self.outstanding = Some(self.seq);
        Ok(GenerationTicket(self.seq))
    }

    /// True when `ticket` is the outstanding run; it is then cleared.
    pub fn finish(&mut self, ticket: GenerationTicket) -> bool {
        if self.outstanding == Some(ticket.0) {
            self.outstanding = None;
            true
        } else {
            false
        }
    }

    pub fn abandon(&mut self) {
        self.outstanding = None;
    }

    pub fn is_busy(&self) -> bool {
        self.outstanding.is_some()
    }
}

pub struct App {
    view: AppView,
    pub wizard: Wizard,
    record: Option<CampaignRecord>,
    history: Vec<CampaignRecord>,
    user: Option<User>,
    guard: GenerationGuard,
    notice: Option<Notice>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            view: AppView::Landing,
            wizard: Wizard::new(),
            record: None,
            history: Vec::new(),
            user: None,
            guard: GenerationGuard::default(),
            notice: None,
        }
    }

    pub fn view(&self) -> AppView {
        self.view
    }

    pub fn record(&self) -> Option<&CampaignRecord> {
        self.record.as_ref()
    }

    pub fn history(&self) -> &[CampaignRecord] {
        &self.history
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn set_user(&mut self, user: Option<User>) {
        if user.is_none() {
            self.history.clear();
            if self.view == AppView::History {
                self.view = AppView::Landing;
            }
        }
        self.user = user;
    }

    /// Returns and clears the pending notice.
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    pub fn go_home(&mut self) {
        if self.view != AppView::Generating {
            self.view = AppView::Landing;
        }
    }

    pub fn start_wizard(&mut self) {
        if self.view != AppView::Generating {
            self.view = AppView::Wizard;
        }
    }

    /// Freezes the draft and moves to Generating. Only from the review step,
    /// and only while nothing else is generating.
    pub fn begin_generation(&mut self) -> Result<(GenerationTicket, CampaignParameters), IndieMarkError> {
        if self.guard.is_busy() {
            return Err(IndieMarkError::GenerationInFlight);
        }
        if self.view != AppView::Wizard || self.wizard.step() != WizardStep::ReviewGenerate {
            return Err(IndieMarkError::InvalidParameters("review the campaign before generating".into()));
        }
        let params = self.wizard.submission()?;
        let ticket = self.guard.begin()?;
        self.view = AppView::Generating;
        Ok((ticket, params))
    }

    /// Lands a generation result. Stale tickets are dropped and leave the
    /// current view untouched.
    pub fn finish_generation(
        &mut self,
        ticket: GenerationTicket,
        result: Result<CampaignRecord, IndieMarkError>,
    ) -> bool {
        if !self.guard.finish(ticket) {
            debug!(?ticket, "ignoring stale generation result");
            return false;
        }
        match result {
            Ok(record) => {
                self.record = Some(record);
                self.view = AppView::Results;
            }
            Err(e) => {
                warn!(error = %e, "generation failed");
                self.notice = Some(Notice::Error(format!(
                    "Failed to generate campaign: {e}. Please check your details and try again."
                )));
                self.view = AppView::Wizard;
            }
        }
        true
    }

    /// Leaves the Generating view; whatever is in flight becomes stale.
    pub fn cancel_generation(&mut self) {
        if self.view == AppView::Generating {
            self.guard.abandon();
            self.view = AppView::Wizard;
            self.notice = Some(Notice::Info("Generation cancelled.".into()));
        }
    }

    pub fn generate_another(&mut self) {
        self.wizard.reset();
        self.record = None;
        self.view = AppView::Wizard;
    }

    pub fn load_history(&mut self, store: &dyn CampaignStore) -> Result<(), IndieMarkError> {
        let user = self.user.as_ref().ok_or(IndieMarkError::SignedOut)?;
        self.history = store
            .list(&user.uid)
            .map_err(|e| IndieMarkError::Persistence(format!("{e:#}")))?;
        self.view = AppView::History;
        Ok(())
    }

    pub fn open_history_entry(&mut self, index: usize) -> bool {
        match self.history.get(index) {
            Some(record) => {
                self.record = Some(record.clone());
                self.view = AppView::Results;
                true
            }
            None => false,
        }
    }

    /// Persists the record on screen. Failures leave it displayed and
    /// retryable; a record that already has an id is not stored again.
    pub fn save_current(&mut self, store: &dyn CampaignStore) -> Result<CampaignRecord, IndieMarkError> {
        let user = self.user.as_ref().ok_or(IndieMarkError::SignedOut)?;
        let record = self
            .record
            .as_ref()
            .ok_or_else(|| IndieMarkError::Persistence("no campaign to save".into()))?;
        match store.save(&user.uid, record) {
            Ok(saved) => {
                if !self.history.iter().any(|r| r.id == saved.id) {
                    self.history.insert(0, saved.clone());
                }
                self.record = Some(saved.clone());
                self.notice = Some(Notice::Info("Campaign saved to history.".into()));
                Ok(saved)
            }
            Err(e) => {
                let err = IndieMarkError::Persistence(format!("{e:#}"));
                self.notice = Some(Notice::Error(format!("Failed to save campaign: {err}")));
                Err(err)
            }
        }
    }

    pub fn delete_history_entry(&mut self, store: &dyn CampaignStore, index: usize) -> Result<(), IndieMarkError> {
        let user = self.user.as_ref().ok_or(IndieMarkError::SignedOut)?;
        let Some(id) = self.history.get(index).and_then(|r| r.id.clone()) else {
            return Ok(());
        };
        store
            .delete(&user.uid, &id)
            .map_err(|e| IndieMarkError::Persistence(format!("{e:#}")))?;
        self.history.remove(index);
        if self.record.as_ref().and_then(|r| r.id.as_deref()) == Some(id.as_str()) {
            self.record = None;
        }
        Ok(())
    }
}
