//! Reconciles a desired link set against what has been applied.
//!
//! Links no longer desired are withdrawn. New links are announced, and a
//! changed link is announced again without being withdrawn first: the
//! registry replaces its server, so the new config may reuse the old
//! address. A link that fails to start is left unapplied, so the next
//! `apply` with the same set tries it again.

use std::collections::HashMap;
use std::sync::Arc;

use crate::link::{DestinationId, LinkConfig, LinkDefinition};
use crate::provider::LinkLifecycle;

/// Outcome of one reconciliation pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub added: Vec<DestinationId>,
    pub removed: Vec<DestinationId>,
    pub failed: Vec<DestinationId>,
}

pub struct LinkSync {
    lifecycle: Arc<dyn LinkLifecycle>,
    applied: HashMap<DestinationId, LinkConfig>,
}

impl LinkSync {
    pub fn new(lifecycle: Arc<dyn LinkLifecycle>) -> Self {
        Self {
            lifecycle,
            applied: HashMap::new(),
        }
    }

    pub fn applied(&self) -> impl Iterator<Item = &DestinationId> {
        self.applied.keys()
    }

    pub async fn apply<I>(&mut self, desired: I) -> SyncReport
    where
        I: IntoIterator<Item = LinkDefinition>,
    {
        let desired: HashMap<DestinationId, LinkConfig> = desired
            .into_iter()
            .map(|link| (link.destination, link.values))
            .collect();
        let mut report = SyncReport::default();

        let mut gone: Vec<DestinationId> = self
            .applied
            .keys()
            .filter(|id| !desired.contains_key(*id))
            .cloned()
            .collect();
        gone.sort();
        for id in gone {
            self.applied.remove(&id);
            self.lifecycle.on_link_removed(&id).await;
            report.removed.push(id);
        }

        let mut pending: Vec<(DestinationId, LinkConfig)> = desired
            .into_iter()
            .filter(|(id, config)| self.applied.get(id) != Some(config))
            .collect();
        pending.sort_by(|a, b| a.0.cmp(&b.0));

        // A changed link is re-added; the registry replaces the old server.
        for (id, config) in pending {
            match self
                .lifecycle
                .on_link_added(LinkDefinition::new(id.clone(), config.clone()))
                .await
            {
                Ok(()) => {
                    self.applied.insert(id.clone(), config);
                    report.added.push(id);
                }
                Err(e) => {
                    tracing::warn!(destination = %id, error = %e, "Link not applied, will retry on next reload");
                    self.applied.remove(&id);
                    report.failed.push(id);
                }
            }
        }

        tracing::info!(
            added = report.added.len(),
            removed = report.removed.len(),
            failed = report.failed.len(),
            "Links synchronized"
        );
        report
    }
}
