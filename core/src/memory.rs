//! In-memory expert store backing both the directory and the calendar.

use crate::calendar::{CalendarProjection, SlotOutcome, SlotUpdate};
use crate::directory::{ExpertDirectory, ExpertPage, ExpertQuery, Pagination};
use crate::error::StoreError;
use crate::types::{Expert, ExpertId, SlotKey, TimeSlot};
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::pin::Pin;
use tokio::sync::RwLock;

/// Experts and their embedded calendars, held in process memory.
#[derive(Default)]
pub struct InMemoryExpertStore {
    experts: RwLock<HashMap<ExpertId, Expert>>,
}

impl InMemoryExpertStore {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Provision an expert (and its calendar), replacing any previous entry.
    pub async fn provision(&self, expert: Expert) {
        self.experts.write().await.insert(expert.id, expert);
    }

    /// Number of experts
    pub async fn len(&self) -> usize {
        self.experts.read().await.len()
    }

    /// Whether the store is empty
    pub async fn is_empty(&self) -> bool {
        self.experts.read().await.is_empty()
    }
}

impl ExpertDirectory for InMemoryExpertStore {
    fn get_expert(
        &self,
        id: ExpertId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Expert>, StoreError>> + Send + '_>> {
        Box::pin(async move { Ok(self.experts.read().await.get(&id).cloned()) })
    }

    fn list_experts<'a>(
        &'a self,
        query: &'a ExpertQuery,
    ) -> Pin<Box<dyn Future<Output = Result<ExpertPage, StoreError>> + Send + 'a>> {
        Box::pin(async move {
            let experts = self.experts.read().await;
            let mut matching: Vec<&Expert> =
                experts.values().filter(|expert| query.matches(expert)).collect();
            matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.name.cmp(&b.name)));

            let total = matching.len() as u64;
            let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
            let page = matching
                .into_iter()
                .skip(offset)
                .take(query.limit as usize)
                .cloned()
                .collect();

            Ok(ExpertPage {
                experts: page,
                pagination: Pagination::new(query, total),
            })
        })
    }

    fn categories(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let experts = self.experts.read().await;
            let categories: BTreeSet<String> =
                experts.values().map(|expert| expert.category.clone()).collect();
            Ok(categories.into_iter().collect())
        })
    }
}

impl CalendarProjection for InMemoryExpertStore {
    fn find_slot(
        &self,
        key: &SlotKey,
    ) -> Pin<Box<dyn Future<Output = Result<Option<TimeSlot>, StoreError>> + Send + '_>> {
        let key = key.clone();
        Box::pin(async move {
            let experts = self.experts.read().await;
            Ok(experts
                .get(&key.expert_id)
                .and_then(|expert| expert.find_slot(&key.date, &key.time_slot))
                .cloned())
        })
    }

    fn apply_status<'a>(
        &'a self,
        update: &'a SlotUpdate,
    ) -> Pin<Box<dyn Future<Output = Result<SlotOutcome, StoreError>> + Send + 'a>> {
        Box::pin(async move {
            let key = update.key();
            let mut experts = self.experts.write().await;
            let Some(slot) = experts
                .get_mut(&key.expert_id)
                .and_then(|expert| expert.find_slot_mut(&key.date, &key.time_slot))
            else {
                return Ok(SlotOutcome::Missing);
            };
            Ok(slot.apply(update))
        })
    }
}
