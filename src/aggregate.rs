// 📊 Aggregator - Per-provider counts and the Big 3 concentration number
// Always a pure function of the records passed in

use serde::Serialize;

use crate::catalog::CompanyRecord;
use crate::provider::Provider;

// ============================================================================
// PROVIDER AGGREGATE
// ============================================================================

/// Count of companies per provider.
///
/// Entries keep the order in which each provider was first seen in the
/// catalog. Providers with no companies are absent, not zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderAggregate {
    counts: Vec<(Provider, usize)>,
}

impl ProviderAggregate {
    pub fn get(&self, provider: Provider) -> Option<usize> {
        self.counts
            .iter()
            .find(|(p, _)| *p == provider)
            .map(|(_, count)| *count)
    }

    /// Count for a provider, 0 when absent
    pub fn count(&self, provider: Provider) -> usize {
        self.get(provider).unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, count)| count).sum()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Entries by descending count. The sort is stable, so ties keep
    /// first-encounter order.
    pub fn sorted_desc(&self) -> Vec<(Provider, usize)> {
        let mut sorted = self.counts.clone();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted
    }
}

/// Count records per provider
pub fn aggregate<'a, I>(records: I) -> ProviderAggregate
where
    I: IntoIterator<Item = &'a CompanyRecord>,
{
    let mut counts: Vec<(Provider, usize)> = Vec::new();

    for record in records {
        match counts.iter_mut().find(|(p, _)| *p == record.provider) {
            Some(entry) => entry.1 += 1,
            None => counts.push((record.provider, 1)),
        }
    }

    ProviderAggregate { counts }
}

/// Share of `total_count` held by `providers`, as a whole percentage.
///
/// Rounds to nearest. A zero total yields 0 instead of dividing by zero.
pub fn big_three_share(
    aggregate: &ProviderAggregate,
    total_count: usize,
    providers: &[Provider],
) -> u32 {
    if total_count == 0 {
        return 0;
    }

    let sum: usize = providers.iter().map(|p| aggregate.count(*p)).sum();
    percent(sum, total_count)
}

/// `part / whole * 100`, rounded. 0 when `whole` is 0.
pub fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

// ============================================================================
// DASHBOARD STATS
// ============================================================================

/// One row of the chart / pill bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderShare {
    pub provider: Provider,
    pub count: usize,
    pub percent: u32,
    pub color: &'static str,
}

/// Everything the chart and the headline need
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    /// Sorted by descending count
    pub providers: Vec<ProviderShare>,
    pub big_three_share: u32,
}

impl DashboardStats {
    pub fn compute<'a, I>(records: I, big_three: &[Provider]) -> Self
    where
        I: IntoIterator<Item = &'a CompanyRecord>,
    {
        let agg = aggregate(records);
        let total = agg.total();

        let providers = agg
            .sorted_desc()
            .into_iter()
            .map(|(provider, count)| ProviderShare {
                provider,
                count,
                percent: percent(count, total),
                color: provider.color_hex(),
            })
            .collect();

        DashboardStats {
            total,
            providers,
            big_three_share: big_three_share(&agg, total, big_three),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::provider::BIG_THREE;

    fn make(n: usize, provider: Provider, start: usize) -> Vec<CompanyRecord> {
        (start..start + n)
            .map(|i| {
                CompanyRecord::new(
                    &format!("Company {}", i),
                    "TST",
                    &format!("company{}.com", i),
                    provider,
                )
            })
            .collect()
    }

    fn sample() -> Vec<CompanyRecord> {
        let mut records = make(5, Provider::Aws, 0);
        records.extend(make(3, Provider::Azure, 5));
        records.extend(make(2, Provider::Gcp, 8));
        records.extend(make(1, Provider::Other, 10));
        records
    }

    #[test]
    fn test_aggregate_counts() {
        let records = sample();
        let agg = aggregate(&records);

        assert_eq!(agg.get(Provider::Aws), Some(5));
        assert_eq!(agg.get(Provider::Azure), Some(3));
        assert_eq!(agg.get(Provider::Gcp), Some(2));
        assert_eq!(agg.get(Provider::Other), Some(1));
    }

    #[test]
    fn test_absent_providers_omitted() {
        let records = sample();
        let agg = aggregate(&records);

        assert_eq!(agg.get(Provider::Oracle), None);
        assert_eq!(agg.count(Provider::Oracle), 0);
        assert_eq!(agg.len(), 4);
    }

    #[test]
    fn test_every_record_counted_once() {
        let records = sample();
        assert_eq!(aggregate(&records).total(), records.len());

        let catalog = Catalog::builtin();
        assert_eq!(aggregate(catalog.records()).total(), catalog.len());
    }

    #[test]
    fn test_big_three_share_example() {
        let records = sample();
        let agg = aggregate(&records);

        // round(10 / 11 * 100) = 91
        assert_eq!(big_three_share(&agg, records.len(), &BIG_THREE), 91);
    }

    #[test]
    fn test_big_three_share_zero_total() {
        let empty: Vec<CompanyRecord> = Vec::new();
        let agg = aggregate(&empty);
        assert!(agg.is_empty());
        assert_eq!(big_three_share(&agg, 0, &BIG_THREE), 0);
    }

    #[test]
    fn test_big_three_share_custom_subset() {
        let records = sample();
        let agg = aggregate(&records);

        // AWS only: round(5 / 11 * 100) = 45
        assert_eq!(big_three_share(&agg, records.len(), &[Provider::Aws]), 45);
    }

    #[test]
    fn test_sorted_desc_ties_keep_first_encounter() {
        let mut records = make(2, Provider::Oracle, 0);
        records.extend(make(3, Provider::Aws, 2));
        records.extend(make(2, Provider::Alibaba, 5));

        let sorted = aggregate(&records).sorted_desc();

        assert_eq!(
            sorted,
            vec![
                (Provider::Aws, 3),
                (Provider::Oracle, 2),
                (Provider::Alibaba, 2),
            ]
        );
    }

    #[test]
    fn test_dashboard_stats_builtin() {
        let catalog = Catalog::builtin();
        let stats = DashboardStats::compute(catalog.records(), &BIG_THREE);

        assert_eq!(stats.total, 78);
        assert_eq!(stats.providers[0].provider, Provider::Aws);
        assert_eq!(stats.providers[0].count, 28);
        assert_eq!(stats.providers[0].color, "#ff9900");
        // (28 + 19 + 16) / 78 = 80.77%
        assert_eq!(stats.big_three_share, 81);
    }

    #[test]
    fn test_percent_rounding() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 2), 50);
        assert_eq!(percent(5, 0), 0);
    }
}
