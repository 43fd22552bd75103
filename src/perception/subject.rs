use anyhow::Result;
use std::time::Duration;

use crate::retry::RetryPolicy;

use super::backend::PerceptionSource;
use super::reading::SubjectId;

/// Keeps the id of the subject being watched and re-acquires it on loss.
#[derive(Debug, Clone)]
pub struct SubjectTracker {
    retry: RetryPolicy,
    current: Option<SubjectId>,
    acquisitions: u64,
}

impl SubjectTracker {
    pub fn new(retry: RetryPolicy) -> Self {
        Self {
            retry,
            current: None,
            acquisitions: 0,
        }
    }

    /// Current subject, polling the source until one is tracked when no id
    /// is held. Fails once the retry budget is spent.
    pub fn subject(&mut self, source: &mut dyn PerceptionSource) -> Result<SubjectId> {
        if let Some(id) = self.current {
            return Ok(id);
        }
        let id = self.retry.poll("subject acquisition", || {
            Ok(source.subject_ids()?.first().copied())
        })?;
        self.acquired(id, source.name());
        Ok(id)
    }

    /// Like [`subject`](Self::subject) but polls for at most `limit`.
    /// `Ok(None)` means nobody could be acquired in time.
    pub fn subject_within(
        &mut self,
        source: &mut dyn PerceptionSource,
        limit: Duration,
    ) -> Result<Option<SubjectId>> {
        if let Some(id) = self.current {
            return Ok(Some(id));
        }
        let Some(id) = self.retry.poll_within("subject acquisition", limit, || {
            Ok(source.subject_ids()?.first().copied())
        })?
        else {
            return Ok(None);
        };
        self.acquired(id, source.name());
        Ok(Some(id))
    }

    fn acquired(&mut self, id: SubjectId, source: &str) {
        self.acquisitions += 1;
        log::info!("tracking {} via {}", id, source);
        self.current = Some(id);
    }

    /// Drop the held id; the next [`subject`](Self::subject) call re-acquires.
    pub fn invalidate(&mut self) {
        if let Some(id) = self.current.take() {
            log::debug!("lost {}, will re-acquire", id);
        }
    }

    pub fn current(&self) -> Option<SubjectId> {
        self.current
    }

    /// Number of successful acquisitions so far.
    pub fn acquisitions(&self) -> u64 {
        self.acquisitions
    }
}
