use std::sync::Arc;
use std::time::Duration;

use dealcast_core::DealSnapshot;
use tracing::warn;

use crate::crm::{CrmDirectory, EnrichmentError, RecordKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupFailure {
    pub kind: RecordKind,
    pub id: i64,
    pub error: EnrichmentError,
}

/// The enriched deal plus whatever went wrong along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    pub deal: DealSnapshot,
    pub diagnostics: Vec<LookupFailure>,
}

/// Best-effort fill of contact and organization names from the CRM.
///
/// Never fails: a lookup that errors or times out leaves its field empty
/// and is reported in [`Enrichment::diagnostics`].
#[derive(Clone)]
pub struct Enricher {
    directory: Option<Arc<dyn CrmDirectory>>,
    timeout: Duration,
}

impl Enricher {
    pub fn new(directory: Arc<dyn CrmDirectory>, timeout: Duration) -> Self {
        Self {
            directory: Some(directory),
            timeout,
        }
    }

    pub fn disabled() -> Self {
        Self {
            directory: None,
            timeout: Duration::ZERO,
        }
    }

    pub async fn enrich(&self, mut deal: DealSnapshot) -> Enrichment {
        let Some(directory) = self.directory.as_deref() else {
            return Enrichment {
                deal,
                diagnostics: Vec::new(),
            };
        };

        let person_id = deal.person_id.filter(|_| deal.person_name.is_none());
        let org_id = deal.org_id.filter(|_| deal.org_name.is_none());

        let (person, organization) = tokio::join!(
            self.lookup(directory, RecordKind::Person, person_id),
            self.lookup(directory, RecordKind::Organization, org_id),
        );

        let mut diagnostics = Vec::new();
        if let Some(name) = settle(person, &mut diagnostics) {
            deal.person_name = Some(name);
        }
        if let Some(name) = settle(organization, &mut diagnostics) {
            deal.org_name = Some(name);
        }

        Enrichment { deal, diagnostics }
    }

    async fn lookup(
        &self,
        directory: &dyn CrmDirectory,
        kind: RecordKind,
        id: Option<i64>,
    ) -> Option<(RecordKind, i64, Result<String, EnrichmentError>)> {
        let id = id?;
        let result = match tokio::time::timeout(self.timeout, directory.record_name(kind, id)).await
        {
            Ok(result) => result,
            Err(_) => Err(EnrichmentError::TimedOut),
        };

        Some((kind, id, result))
    }
}

fn settle(
    outcome: Option<(RecordKind, i64, Result<String, EnrichmentError>)>,
    diagnostics: &mut Vec<LookupFailure>,
) -> Option<String> {
    let (kind, id, result) = outcome?;
    match result {
        Ok(name) => Some(name),
        Err(error) => {
            warn!("{} {} lookup failed: {}", kind.path(), id, error);
            diagnostics.push(LookupFailure { kind, id, error });
            None
        }
    }
}
