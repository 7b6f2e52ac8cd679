// 🧭 Explorer - One dashboard session
// Catalog + filter + add flow, the state every presentation layer drives

use tracing::debug;

use crate::add_flow::{AddCompanyFlow, Completion, PendingDetection};
use crate::aggregate::DashboardStats;
use crate::catalog::{Catalog, CompanyRecord, SessionCatalog};
use crate::classifier::ProviderClassifier;
use crate::domain::looks_like_domain;
use crate::error::{AddCompanyError, ClassifierError};
use crate::filter::{visible, FilterState};
use crate::provider::{Provider, BIG_THREE};

pub struct Explorer {
    catalog: SessionCatalog,
    filter: FilterState,
    add_flow: AddCompanyFlow,
    big_three: Vec<Provider>,
}

impl Explorer {
    pub fn new(base: &Catalog) -> Self {
        Explorer {
            catalog: base.session(),
            filter: FilterState::new(),
            add_flow: AddCompanyFlow::new(),
            big_three: BIG_THREE.to_vec(),
        }
    }

    pub fn with_big_three(mut self, providers: Vec<Provider>) -> Self {
        self.big_three = providers;
        self
    }

    pub fn catalog(&self) -> &SessionCatalog {
        &self.catalog
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn add_flow(&self) -> &AddCompanyFlow {
        &self.add_flow
    }

    pub fn big_three(&self) -> &[Provider] {
        &self.big_three
    }

    // ------------------------------------------------------------------------
    // Filtering
    // ------------------------------------------------------------------------

    pub fn set_query(&mut self, query: &str) {
        self.filter.query = query.to_string();
    }

    pub fn toggle_provider(&mut self, provider: Provider) {
        self.filter.toggle_provider(provider);
    }

    pub fn clear_selection(&mut self) {
        self.filter.selected_provider = None;
    }

    pub fn hover(&mut self, provider: Provider) {
        self.filter.hovered_provider = Some(provider);
    }

    pub fn unhover(&mut self) {
        self.filter.hovered_provider = None;
    }

    /// Companies to show under the session's own filter
    pub fn visible(&self) -> Vec<&CompanyRecord> {
        self.visible_with(&self.filter)
    }

    /// Companies to show under an externally held filter (web clients keep
    /// their filter in the page)
    pub fn visible_with(&self, state: &FilterState) -> Vec<&CompanyRecord> {
        visible(self.catalog.iter(), state)
    }

    pub fn stats(&self) -> DashboardStats {
        DashboardStats::compute(self.catalog.iter(), &self.big_three)
    }

    /// Grid title: "All Companies" or "<Provider> Companies"
    pub fn heading(&self) -> String {
        heading_for(&self.filter)
    }

    /// The search text looks like a domain and matches no company name,
    /// so it is worth offering as a new entry.
    pub fn should_offer_add(&self) -> bool {
        self.offers_add_for(&self.filter.query)
    }

    pub fn offers_add_for(&self, query: &str) -> bool {
        let query = query.trim();
        if !looks_like_domain(query) {
            return false;
        }

        let lower = query.to_lowercase();
        !self
            .catalog
            .iter()
            .any(|c| c.name.to_lowercase().contains(&lower))
    }

    // ------------------------------------------------------------------------
    // Adding companies
    // ------------------------------------------------------------------------

    pub fn set_add_input(&mut self, text: &str) {
        self.add_flow.set_input(text);
    }

    pub fn begin_add(&mut self, url: &str) -> Result<PendingDetection, AddCompanyError> {
        self.add_flow.submit(&self.catalog, url)
    }

    pub fn complete_add(
        &mut self,
        pending: PendingDetection,
        result: Result<String, ClassifierError>,
    ) -> Completion {
        self.add_flow.complete(&mut self.catalog, pending, result)
    }

    /// Drive one whole add flow against `classifier`
    pub async fn add_company(
        &mut self,
        url: &str,
        classifier: &dyn ProviderClassifier,
    ) -> Result<CompanyRecord, AddCompanyError> {
        let pending = self.begin_add(url)?;
        let result = classifier.classify(pending.url()).await;

        match self.complete_add(pending, result) {
            Completion::Added(record) => Ok(record),
            Completion::Failed(err) => Err(err),
            // Nothing else can touch the flow while we hold &mut self
            Completion::Discarded => Err(AddCompanyError::DetectionInProgress),
        }
    }

    /// End of this session's view: clear transient state and void any
    /// detection still in flight. Appended companies stay until the
    /// session itself is dropped.
    pub fn reset(&mut self) {
        debug!("Resetting explorer session");
        self.filter = FilterState::new();
        self.add_flow.reset();
    }
}

/// Grid title for a filter state
pub fn heading_for(state: &FilterState) -> String {
    match state.focused_provider() {
        Some(provider) => format!("{} Companies", provider),
        None => "All Companies".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers with a fixed result and counts calls
    struct CountingClassifier {
        calls: AtomicUsize,
        answer: Result<String, ClassifierError>,
    }

    impl CountingClassifier {
        fn answering(label: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                answer: Ok(label.to_string()),
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                answer: Err(ClassifierError::Status(500)),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProviderClassifier for CountingClassifier {
        async fn classify(&self, _url: &str) -> Result<String, ClassifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.clone()
        }
    }

    #[tokio::test]
    async fn test_add_company_stripe() {
        let mut explorer = Explorer::new(&Catalog::builtin());
        let classifier = CountingClassifier::answering("AWS");

        let record = explorer
            .add_company("https://www.stripe.com", &classifier)
            .await
            .unwrap();

        assert_eq!(
            record,
            CompanyRecord::new("Stripe", "CUSTOM", "stripe.com", Provider::Aws)
        );
        assert_eq!(classifier.calls(), 1);
        assert_eq!(explorer.catalog().len(), 79);
        assert_eq!(explorer.stats().total, 79);
    }

    #[tokio::test]
    async fn test_duplicate_makes_no_network_call() {
        let mut explorer = Explorer::new(&Catalog::builtin());
        let classifier = CountingClassifier::answering("AWS");

        let err = explorer
            .add_company("netflix.com", &classifier)
            .await
            .unwrap_err();

        assert!(matches!(err, AddCompanyError::AlreadyExists { .. }));
        assert_eq!(classifier.calls(), 0);
        assert_eq!(explorer.catalog().len(), 78);
    }

    #[tokio::test]
    async fn test_second_submission_is_duplicate() {
        let mut explorer = Explorer::new(&Catalog::builtin());
        let classifier = CountingClassifier::answering("GCP");

        explorer.add_company("stripe.com", &classifier).await.unwrap();
        let err = explorer
            .add_company("https://www.stripe.com/", &classifier)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Company already exists");
        assert_eq!(classifier.calls(), 1);
        assert_eq!(explorer.catalog().len(), 79);
    }

    #[tokio::test]
    async fn test_classification_failure() {
        let mut explorer = Explorer::new(&Catalog::builtin());
        let classifier = CountingClassifier::failing();

        let err = explorer.add_company("vercel.com", &classifier).await.unwrap_err();

        assert!(matches!(err, AddCompanyError::ClassificationFailed(_)));
        assert_eq!(explorer.add_flow().input(), "vercel.com");
        assert_eq!(explorer.catalog().len(), 78);
    }

    #[test]
    fn test_added_company_is_searchable() {
        let mut explorer = Explorer::new(&Catalog::builtin());

        let pending = explorer.begin_add("stripe.com").unwrap();
        explorer.complete_add(pending, Ok("Azure".to_string()));

        explorer.set_query("strip");
        let names: Vec<&str> = explorer.visible().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Stripe"]);
    }

    #[test]
    fn test_filtering_while_detecting() {
        let mut explorer = Explorer::new(&Catalog::builtin());
        let pending = explorer.begin_add("vercel.com").unwrap();

        explorer.toggle_provider(Provider::Oracle);
        assert_eq!(explorer.visible().len(), 5);

        explorer.hover(Provider::Alibaba);
        assert_eq!(explorer.visible().len(), 4);
        assert_eq!(explorer.heading(), "Alibaba Companies");

        explorer.unhover();
        assert_eq!(explorer.heading(), "Oracle Companies");

        explorer.clear_selection();
        assert_eq!(explorer.heading(), "All Companies");

        let done = explorer.complete_add(pending, Ok("AWS".to_string()));
        assert!(matches!(done, Completion::Added(_)));
    }

    #[test]
    fn test_reset_discards_in_flight() {
        let mut explorer = Explorer::new(&Catalog::builtin());
        let pending = explorer.begin_add("vercel.com").unwrap();
        explorer.set_query("net");

        explorer.reset();

        assert_eq!(explorer.complete_add(pending, Ok("AWS".to_string())), Completion::Discarded);
        assert!(explorer.filter().is_unfiltered());
        assert_eq!(explorer.catalog().len(), 78);
    }

    #[test]
    fn test_should_offer_add() {
        let mut explorer = Explorer::new(&Catalog::builtin());

        explorer.set_query("stripe.com");
        assert!(explorer.should_offer_add());

        explorer.set_query("netflix");
        assert!(!explorer.should_offer_add());

        explorer.set_query("a.b");
        assert!(!explorer.should_offer_add());
    }

    #[test]
    fn test_custom_big_three() {
        let explorer =
            Explorer::new(&Catalog::builtin()).with_big_three(vec![Provider::Oracle]);

        // round(5 / 78 * 100) = 6
        assert_eq!(explorer.stats().big_three_share, 6);
        assert_eq!(explorer.big_three(), &[Provider::Oracle]);
    }
}
