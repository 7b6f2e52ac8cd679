// ➕ Add-Company Flow - Idle → Detecting → {Success, Error} → Idle
//
// The flow never performs I/O itself. `submit` validates and hands out a
// PendingDetection ticket; whoever owns the network call brings the result
// back through `complete`. Tickets carry a generation number, so a result
// that arrives after `reset` (or after a newer submission) is discarded
// instead of being applied to a view that no longer exists.

use tracing::{debug, info, warn};

use crate::catalog::{CompanyRecord, SessionCatalog, CUSTOM_SYMBOL};
use crate::domain::{derive_name, normalize_domain};
use crate::error::{AddCompanyError, ClassifierError};
use crate::provider::Provider;

// ============================================================================
// STATE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddFlowState {
    Idle,
    Detecting { domain: String },
    Failed(AddCompanyError),
}

impl AddFlowState {
    /// Short label for status bars and API payloads
    pub fn name(&self) -> &'static str {
        match self {
            AddFlowState::Idle => "idle",
            AddFlowState::Detecting { .. } => "detecting",
            AddFlowState::Failed(_) => "error",
        }
    }
}

/// Ticket for one in-flight classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDetection {
    generation: u64,
    url: String,
    domain: String,
}

impl PendingDetection {
    /// The URL exactly as submitted (trimmed); this is what gets classified
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }
}

/// What happened when a classification result came back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Added(CompanyRecord),
    Failed(AddCompanyError),
    /// The ticket belonged to an earlier generation; nothing changed
    Discarded,
}

// ============================================================================
// FLOW
// ============================================================================

#[derive(Debug, Clone)]
pub struct AddCompanyFlow {
    state: AddFlowState,
    input: String,
    generation: u64,
}

impl AddCompanyFlow {
    pub fn new() -> Self {
        AddCompanyFlow {
            state: AddFlowState::Idle,
            input: String::new(),
            generation: 0,
        }
    }

    pub fn state(&self) -> &AddFlowState {
        &self.state
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn is_detecting(&self) -> bool {
        matches!(self.state, AddFlowState::Detecting { .. })
    }

    pub fn error(&self) -> Option<&AddCompanyError> {
        match &self.state {
            AddFlowState::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Edit the input field. Editing clears a previous error.
    pub fn set_input(&mut self, text: &str) {
        self.input = text.to_string();
        if matches!(self.state, AddFlowState::Failed(_)) {
            self.state = AddFlowState::Idle;
        }
    }

    /// Validate a submission and move to `Detecting`.
    ///
    /// Duplicates fail here, before any network call is made.
    pub fn submit(
        &mut self,
        catalog: &SessionCatalog,
        url: &str,
    ) -> Result<PendingDetection, AddCompanyError> {
        if self.is_detecting() {
            return Err(AddCompanyError::DetectionInProgress);
        }

        self.input = url.to_string();
        let url = url.trim();
        if url.is_empty() {
            return Err(AddCompanyError::EmptyInput);
        }

        let domain = match normalize_domain(url) {
            Ok(domain) => domain,
            Err(err) => return Err(self.fail(err)),
        };

        if catalog.contains_domain(&domain) {
            debug!("{} already in catalog", domain);
            return Err(self.fail(AddCompanyError::AlreadyExists { domain }));
        }

        self.generation = self.generation.wrapping_add(1);
        self.state = AddFlowState::Detecting {
            domain: domain.clone(),
        };

        info!("Detecting provider for {} (generation {})", domain, self.generation);

        Ok(PendingDetection {
            generation: self.generation,
            url: url.to_string(),
            domain,
        })
    }

    /// Apply a classification result.
    pub fn complete(
        &mut self,
        catalog: &mut SessionCatalog,
        pending: PendingDetection,
        result: Result<String, ClassifierError>,
    ) -> Completion {
        let current = match &self.state {
            AddFlowState::Detecting { domain } => {
                pending.generation == self.generation && *domain == pending.domain
            }
            _ => false,
        };

        if !current {
            debug!(
                "Discarding stale result for {} (generation {}, now {})",
                pending.domain, pending.generation, self.generation
            );
            return Completion::Discarded;
        }

        let label = match result {
            Ok(label) => label,
            Err(err) => {
                warn!("Detection failed for {}: {}", pending.domain, err);
                return Completion::Failed(self.fail(AddCompanyError::ClassificationFailed(err)));
            }
        };

        let provider = Provider::from_label(&label).unwrap_or_else(|| {
            warn!("Unknown provider label {:?} for {}, using Other", label, pending.domain);
            Provider::Other
        });

        let record = CompanyRecord {
            name: derive_name(&pending.domain),
            symbol: CUSTOM_SYMBOL.to_string(),
            domain: pending.domain.clone(),
            provider,
        };

        if catalog.append(record.clone()).is_err() {
            return Completion::Failed(self.fail(AddCompanyError::AlreadyExists {
                domain: pending.domain,
            }));
        }

        self.input.clear();
        self.state = AddFlowState::Idle;
        Completion::Added(record)
    }

    /// End of the owning session's lifetime: anything in flight is void.
    pub fn reset(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.state = AddFlowState::Idle;
        self.input.clear();
    }

    fn fail(&mut self, err: AddCompanyError) -> AddCompanyError {
        self.state = AddFlowState::Failed(err.clone());
        err
    }
}

impl Default for AddCompanyFlow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    #[test]
    fn test_submit_then_success() {
        let mut catalog = Catalog::builtin().session();
        let mut flow = AddCompanyFlow::new();

        let pending = flow.submit(&catalog, "https://www.stripe.com").unwrap();
        assert_eq!(pending.domain(), "stripe.com");
        assert_eq!(pending.url(), "https://www.stripe.com");
        assert!(flow.is_detecting());

        let done = flow.complete(&mut catalog, pending, Ok("AWS".to_string()));

        let expected = CompanyRecord::new("Stripe", "CUSTOM", "stripe.com", Provider::Aws);
        assert_eq!(done, Completion::Added(expected.clone()));
        assert_eq!(catalog.appended(), &[expected]);
        assert_eq!(flow.state(), &AddFlowState::Idle);
        assert_eq!(flow.input(), "");
    }

    #[test]
    fn test_duplicate_fails_before_detecting() {
        let catalog = Catalog::builtin().session();
        let mut flow = AddCompanyFlow::new();

        let err = flow.submit(&catalog, "https://www.netflix.com/browse").unwrap_err();

        assert_eq!(
            err,
            AddCompanyError::AlreadyExists {
                domain: "netflix.com".to_string()
            }
        );
        assert_eq!(flow.state(), &AddFlowState::Failed(err));
        assert!(!flow.is_detecting());
    }

    #[test]
    fn test_same_domain_twice() {
        let mut catalog = Catalog::builtin().session();
        let mut flow = AddCompanyFlow::new();

        let pending = flow.submit(&catalog, "stripe.com").unwrap();
        flow.complete(&mut catalog, pending, Ok("GCP".to_string()));
        let size = catalog.len();

        let err = flow.submit(&catalog, "https://stripe.com").unwrap_err();
        assert!(matches!(err, AddCompanyError::AlreadyExists { .. }));
        assert_eq!(catalog.len(), size);
    }

    #[test]
    fn test_failure_preserves_input() {
        let mut catalog = Catalog::builtin().session();
        let mut flow = AddCompanyFlow::new();

        let pending = flow.submit(&catalog, " vercel.com ").unwrap();
        let done = flow.complete(&mut catalog, pending, Err(ClassifierError::Status(503)));

        assert!(matches!(
            done,
            Completion::Failed(AddCompanyError::ClassificationFailed(ClassifierError::Status(503)))
        ));
        assert_eq!(flow.input(), " vercel.com ");
        assert_eq!(catalog.appended().len(), 0);
        assert_eq!(
            flow.error().map(|e| e.to_string()),
            Some("Failed to detect cloud provider. Please try again.".to_string())
        );
    }

    #[test]
    fn test_resubmit_after_failure() {
        let mut catalog = Catalog::builtin().session();
        let mut flow = AddCompanyFlow::new();

        let pending = flow.submit(&catalog, "vercel.com").unwrap();
        flow.complete(&mut catalog, pending, Err(ClassifierError::Transport("down".into())));

        let input = flow.input().to_string();
        let pending = flow.submit(&catalog, &input).unwrap();
        let done = flow.complete(&mut catalog, pending, Ok("AWS".to_string()));

        assert!(matches!(done, Completion::Added(_)));
    }

    #[test]
    fn test_no_resubmit_while_detecting() {
        let catalog = Catalog::builtin().session();
        let mut flow = AddCompanyFlow::new();

        flow.submit(&catalog, "vercel.com").unwrap();
        let err = flow.submit(&catalog, "fly.io").unwrap_err();

        assert_eq!(err, AddCompanyError::DetectionInProgress);
        assert_eq!(
            flow.state(),
            &AddFlowState::Detecting {
                domain: "vercel.com".to_string()
            }
        );
    }

    #[test]
    fn test_empty_submission_is_ignored() {
        let catalog = Catalog::builtin().session();
        let mut flow = AddCompanyFlow::new();

        assert_eq!(flow.submit(&catalog, "   "), Err(AddCompanyError::EmptyInput));
        assert_eq!(flow.state(), &AddFlowState::Idle);
    }

    #[test]
    fn test_late_result_after_reset_is_discarded() {
        let mut catalog = Catalog::builtin().session();
        let mut flow = AddCompanyFlow::new();

        let pending = flow.submit(&catalog, "vercel.com").unwrap();
        flow.reset();

        let done = flow.complete(&mut catalog, pending, Ok("AWS".to_string()));

        assert_eq!(done, Completion::Discarded);
        assert_eq!(catalog.appended().len(), 0);
        assert_eq!(flow.state(), &AddFlowState::Idle);
    }

    #[test]
    fn test_stale_ticket_does_not_touch_newer_detection() {
        let mut catalog = Catalog::builtin().session();
        let mut flow = AddCompanyFlow::new();

        let old = flow.submit(&catalog, "vercel.com").unwrap();
        flow.reset();
        let new = flow.submit(&catalog, "fly.io").unwrap();

        assert_eq!(
            flow.complete(&mut catalog, old, Ok("AWS".to_string())),
            Completion::Discarded
        );
        assert!(flow.is_detecting());

        let done = flow.complete(&mut catalog, new, Ok("GCP".to_string()));
        assert!(matches!(done, Completion::Added(ref r) if r.domain == "fly.io"));
    }

    #[test]
    fn test_unknown_label_becomes_other() {
        let mut catalog = Catalog::builtin().session();
        let mut flow = AddCompanyFlow::new();

        let pending = flow.submit(&catalog, "hetzner-hosted.de").unwrap();
        let done = flow.complete(&mut catalog, pending, Ok("Hetzner".to_string()));

        match done {
            Completion::Added(record) => {
                assert_eq!(record.provider, Provider::Other);
                assert_eq!(record.name, "Hetzner-hosted");
            }
            other => panic!("expected Added, got {:?}", other),
        }
    }

    #[test]
    fn test_editing_input_clears_error() {
        let catalog = Catalog::builtin().session();
        let mut flow = AddCompanyFlow::new();

        flow.submit(&catalog, "netflix.com").unwrap_err();
        assert!(flow.error().is_some());

        flow.set_input("netflix.co");
        assert_eq!(flow.state(), &AddFlowState::Idle);
        assert_eq!(flow.input(), "netflix.co");
    }
}
