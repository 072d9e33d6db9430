//! Admin maintenance panel over the `halls` collection.
//!
//! The panel keeps a live copy of the collection from the store
//! subscription. Without a configured store it stays in
//! [`AdminState::Loading`] with an empty list.

use hallnav_protocol::defaults::SEED_HALLS;
use hallnav_protocol::{DraftError, HallDraft, HallEdit, HallId, HallRecord};
use hallnav_store::{HallStore, Snapshot, StoreError, Subscription};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("No hall store is configured")]
    NotConfigured,

    #[error(transparent)]
    Invalid(#[from] DraftError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AdminError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Invalid(draft) => AdminError::Invalid(draft),
            other => AdminError::Store(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdminState {
    Loading,
    Ready(Snapshot),
}

/// Asks the operator for a new value of one field.
pub trait FieldPrompt {
    /// `None` or a blank answer keeps `current`.
    fn prompt(&mut self, label: &str, current: &str) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedAction {
    Created,
    Updated,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeedOutcome {
    pub name: String,
    pub capacity: u32,
    pub action: SeedAction,
    pub id: HallId,
}

pub struct AdminPanel {
    store: Option<Arc<dyn HallStore>>,
    subscription: Option<Subscription>,
    halls: Option<Snapshot>,
}

impl AdminPanel {
    /// Subscribe right away; the first snapshot arrives on the first [`sync`](Self::sync).
    pub fn new(store: Option<Arc<dyn HallStore>>) -> Self {
        let subscription = store.as_ref().map(|s| s.subscribe());
        Self {
            store,
            subscription,
            halls: None,
        }
    }

    pub fn state(&self) -> AdminState {
        match &self.halls {
            Some(halls) => AdminState::Ready(Arc::clone(halls)),
            None => AdminState::Loading,
        }
    }

    pub fn halls(&self) -> &[HallRecord] {
        self.halls.as_deref().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Wait for the next pushed snapshot. `false` when there is nothing to
    /// wait on (no store, or the store went away).
    pub async fn sync(&mut self) -> bool {
        let Some(subscription) = self.subscription.as_mut() else {
            return false;
        };
        match subscription.next().await {
            Some(snapshot) => {
                debug!("Admin panel received {} halls", snapshot.len());
                self.halls = Some(snapshot);
                true
            }
            None => {
                self.subscription = None;
                false
            }
        }
    }

    /// Ask the store to pick up changes made by other clients. Any change
    /// then arrives through [`sync`](Self::sync).
    pub async fn refresh(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.refresh().await {
                warn!("Hall store refresh failed: {}", e);
            }
        }
    }

    fn store(&self) -> Result<&Arc<dyn HallStore>, AdminError> {
        self.store.as_ref().ok_or(AdminError::NotConfigured)
    }

    pub async fn create(
        &self,
        name: &str,
        location: &str,
        description: &str,
    ) -> Result<HallRecord, AdminError> {
        let store = self.store()?;
        let draft = HallDraft::new(name, location, description)?;
        let record = store.add(draft).await?;
        info!("Created hall {} ({})", record.id, record.name);
        Ok(record)
    }

    /// Walk the editable fields through `prompt`. Returns `None` when the
    /// hall does not exist.
    pub async fn edit(
        &self,
        id: &HallId,
        prompt: &mut dyn FieldPrompt,
    ) -> Result<Option<HallRecord>, AdminError> {
        let store = self.store()?;
        let current = match self.halls().iter().find(|h| &h.id == id) {
            Some(hall) => hall.clone(),
            None => match store.list().await?.into_iter().find(|h| &h.id == id) {
                Some(hall) => hall,
                None => return Ok(None),
            },
        };

        let mut ask = |label: &str, value: &str| {
            prompt
                .prompt(label, value)
                .map(|answer| answer.trim().to_string())
                .filter(|answer| !answer.is_empty() && answer != value)
        };
        let edit = HallEdit {
            name: ask("Name", &current.name),
            location: ask("Location", &current.location),
            description: ask("Description", &current.description),
            ..Default::default()
        };

        if edit.is_empty() {
            debug!("No changes for hall {}", id);
            return Ok(Some(current));
        }
        let updated = store.update(id, edit).await?;
        info!("Updated hall {}", id);
        Ok(Some(updated))
    }

    /// Returns `false` when no such hall existed.
    pub async fn delete(&self, id: &HallId) -> Result<bool, AdminError> {
        let deleted = self.store()?.delete(id).await?;
        if deleted {
            info!("Deleted hall {}", id);
        }
        Ok(deleted)
    }

    /// Get-or-create the recognizable halls with their known capacities.
    pub async fn seed(&self) -> Result<Vec<SeedOutcome>, AdminError> {
        let store = self.store()?;
        let existing = store.list().await?;
        let mut outcomes = Vec::with_capacity(SEED_HALLS.len());

        for (name, capacity) in SEED_HALLS {
            let outcome = match existing.iter().find(|h| h.name == name) {
                Some(hall) if hall.capacity == Some(capacity) => SeedOutcome {
                    name: name.to_string(),
                    capacity,
                    action: SeedAction::Unchanged,
                    id: hall.id.clone(),
                },
                Some(hall) => {
                    store
                        .update(
                            &hall.id,
                            HallEdit {
                                capacity: Some(capacity),
                                ..Default::default()
                            },
                        )
                        .await?;
                    SeedOutcome {
                        name: name.to_string(),
                        capacity,
                        action: SeedAction::Updated,
                        id: hall.id.clone(),
                    }
                }
                None => {
                    let draft = HallDraft::new(name, format!("{name} complex"), "Lecture theatre")?;
                    let created = store.add(draft).await?;
                    store
                        .update(
                            &created.id,
                            HallEdit {
                                capacity: Some(capacity),
                                ..Default::default()
                            },
                        )
                        .await?;
                    SeedOutcome {
                        name: name.to_string(),
                        capacity,
                        action: SeedAction::Created,
                        id: created.id,
                    }
                }
            };
            info!("Seed {}: {:?}", outcome.name, outcome.action);
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }
}
