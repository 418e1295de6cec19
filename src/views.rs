use crate::models::{ChartResponse, EmissionEntry, EntryPage, MonthlyBucket, ScopeFilter, SummaryTotals};
use crate::preferences::Preferences;
use chrono::{Datelike, Local, NaiveDate};

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Twelve buckets, January first. Entries from different years share their month's bucket.
pub fn monthly_totals(entries: &[EmissionEntry], filter: ScopeFilter) -> Vec<MonthlyBucket> {
    let mut buckets: Vec<MonthlyBucket> = MONTH_LABELS
        .iter()
        .map(|label| MonthlyBucket {
            month: label.to_string(),
            scope1: 0.0,
            scope2: 0.0,
            scope3: 0.0,
            total: 0.0,
        })
        .collect();

    for entry in entries.iter().filter(|entry| filter.matches(entry.scope)) {
        buckets[entry.date.month0() as usize].add(entry.scope, entry.emission);
    }
    buckets
}

pub fn chart(entries: &[EmissionEntry], prefs: &Preferences) -> ChartResponse {
    ChartResponse {
        scope: prefs.bar_scope,
        stacked: prefs.is_stacked,
        months: monthly_totals(entries, prefs.bar_scope),
    }
}

/// One 1-based page of the entries matching `filter`. Pages past the end are empty.
pub fn filtered_and_paged(
    entries: &[EmissionEntry],
    filter: ScopeFilter,
    page: usize,
    page_size: usize,
) -> EntryPage {
    paginate(entries, |entry| filter.matches(entry.scope), page, page_size)
}

/// The table honours the chart filter first and then its own filter.
pub fn table_page(entries: &[EmissionEntry], prefs: &Preferences, page: usize) -> EntryPage {
    paginate(
        entries,
        |entry| prefs.bar_scope.matches(entry.scope) && prefs.table_filter_scope.matches(entry.scope),
        page,
        prefs.entries_per_page,
    )
}

fn paginate<F>(entries: &[EmissionEntry], keep: F, page: usize, page_size: usize) -> EntryPage
where
    F: Fn(&EmissionEntry) -> bool,
{
    let page_size = page_size.max(1);
    let total_entries = entries.iter().filter(|entry| keep(*entry)).count();
    let rows = match page.checked_sub(1) {
        Some(skipped_pages) => entries
            .iter()
            .filter(|entry| keep(*entry))
            .skip(skipped_pages.saturating_mul(page_size))
            .take(page_size)
            .cloned()
            .collect(),
        None => Vec::new(),
    };

    EntryPage {
        entries: rows,
        page,
        page_size,
        total_pages: total_entries.div_ceil(page_size).max(1),
        total_entries,
    }
}

pub fn next_page(current: usize, total_pages: usize) -> usize {
    current.saturating_add(1).min(total_pages.max(1))
}

pub fn prev_page(current: usize) -> usize {
    current.saturating_sub(1).max(1)
}

pub fn summary_totals(entries: &[EmissionEntry]) -> SummaryTotals {
    summary_totals_at(entries, Local::now().date_naive())
}

pub fn summary_totals_at(entries: &[EmissionEntry], today: NaiveDate) -> SummaryTotals {
    let mut totals = SummaryTotals {
        all_time: 0.0,
        current_month: 0.0,
    };
    for entry in entries {
        totals.all_time += entry.emission;
        if entry.date.year() == today.year() && entry.date.month() == today.month() {
            totals.current_month += entry.emission;
        }
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo;
    use crate::models::Scope;

    fn entry(id: u64, scope: Scope, emission: f64, date: NaiveDate) -> EmissionEntry {
        EmissionEntry {
            id,
            description: format!("entry {id}"),
            scope,
            emission,
            date,
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn filters() -> [ScopeFilter; 4] {
        [
            ScopeFilter::All,
            ScopeFilter::Only(Scope::Scope1),
            ScopeFilter::Only(Scope::Scope2),
            ScopeFilter::Only(Scope::Scope3),
        ]
    }

    #[test]
    fn monthly_totals_match_per_month_sums() {
        let entries = demo::generate(2_000);
        for filter in filters() {
            let buckets = monthly_totals(&entries, filter);
            assert_eq!(buckets.len(), 12);
            for (month0, bucket) in buckets.iter().enumerate() {
                let expected: f64 = entries
                    .iter()
                    .filter(|e| e.date.month0() as usize == month0 && filter.matches(e.scope))
                    .map(|e| e.emission)
                    .sum();
                assert_eq!(bucket.total, expected, "{filter} {}", bucket.month);
                for scope in Scope::ALL {
                    if !filter.matches(scope) {
                        assert_eq!(bucket.scope_total(scope), 0.0);
                    }
                }
            }
        }
    }

    #[test]
    fn monthly_totals_sum_to_all_time() {
        let entries = demo::generate(1_000);
        let buckets = monthly_totals(&entries, ScopeFilter::All);
        let charted: f64 = buckets.iter().map(|bucket| bucket.total).sum();
        let all_time = summary_totals_at(&entries, ymd(2024, 1, 1)).all_time;
        assert_eq!(charted, all_time);
    }

    #[test]
    fn months_collapse_across_years() {
        let entries = vec![
            entry(1, Scope::Scope1, 1.5, ymd(2022, 3, 1)),
            entry(2, Scope::Scope2, 2.0, ymd(2024, 3, 31)),
            entry(3, Scope::Scope2, 4.0, ymd(2024, 12, 9)),
        ];
        let buckets = monthly_totals(&entries, ScopeFilter::All);
        assert_eq!(buckets[2].month, "Mar");
        assert_eq!(buckets[2].scope1, 1.5);
        assert_eq!(buckets[2].scope2, 2.0);
        assert_eq!(buckets[2].total, 3.5);
        assert_eq!(buckets[11].total, 4.0);

        let only_two = monthly_totals(&entries, ScopeFilter::Only(Scope::Scope2));
        assert_eq!(only_two[2].total, 2.0);
        assert_eq!(only_two[2].scope1, 0.0);
    }

    #[test]
    fn paging_ten_thousand_entries() {
        let entries = demo::generate(10_000);
        let first = filtered_and_paged(&entries, ScopeFilter::All, 1, 50);
        assert_eq!(first.total_pages, 200);
        assert_eq!(first.entries.len(), 50);
        assert_eq!(first.entries[0].id, 1);

        let last = filtered_and_paged(&entries, ScopeFilter::All, 200, 50);
        assert_eq!(last.entries.len(), 50);
        assert_eq!(last.entries[49].id, 10_000);

        let beyond = filtered_and_paged(&entries, ScopeFilter::All, 201, 50);
        assert!(beyond.entries.is_empty());
        assert_eq!(beyond.total_pages, 200);
    }

    #[test]
    fn last_page_holds_the_remainder() {
        let entries = demo::generate(1_030);
        let page = filtered_and_paged(&entries, ScopeFilter::All, 21, 50);
        assert_eq!(page.total_pages, 21);
        assert_eq!(page.entries.len(), 30);
    }

    #[test]
    fn scope_filter_applies_before_slicing() {
        let entries = demo::generate(600);
        let filter = ScopeFilter::Only(Scope::Scope1);
        let matching = entries.iter().filter(|e| e.scope == Scope::Scope1).count();
        let page = filtered_and_paged(&entries, filter, 1, 20);
        assert_eq!(page.total_entries, matching);
        assert_eq!(page.total_pages, matching.div_ceil(20));
        assert!(page.entries.iter().all(|e| e.scope == Scope::Scope1));
    }

    #[test]
    fn empty_collection_is_one_empty_page() {
        let page = filtered_and_paged(&[], ScopeFilter::All, 1, 50);
        assert!(page.entries.is_empty());
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.total_entries, 0);

        let zero = filtered_and_paged(&[], ScopeFilter::All, 0, 50);
        assert!(zero.entries.is_empty());
    }

    #[test]
    fn table_page_combines_chart_and_table_filters() {
        let entries = vec![
            entry(1, Scope::Scope1, 1.0, ymd(2024, 1, 1)),
            entry(2, Scope::Scope2, 1.0, ymd(2024, 1, 1)),
            entry(3, Scope::Scope3, 1.0, ymd(2024, 1, 1)),
        ];
        let mut prefs = Preferences {
            bar_scope: ScopeFilter::Only(Scope::Scope2),
            ..Preferences::default()
        };
        let page = table_page(&entries, &prefs, 1);
        assert_eq!(page.entries.len(), 1);
        assert_eq!(page.entries[0].id, 2);

        prefs.table_filter_scope = ScopeFilter::Only(Scope::Scope3);
        let page = table_page(&entries, &prefs, 1);
        assert!(page.entries.is_empty());
        assert_eq!(page.page_size, 50);
    }

    #[test]
    fn page_navigation_clamps() {
        assert_eq!(next_page(1, 3), 2);
        assert_eq!(next_page(3, 3), 3);
        assert_eq!(next_page(1, 0), 1);
        assert_eq!(prev_page(2), 1);
        assert_eq!(prev_page(1), 1);
    }

    #[test]
    fn flight_example_moves_summary_totals() {
        let mut entries = vec![entry(1, Scope::Scope1, 10.0, ymd(2024, 2, 10))];
        let in_march = ymd(2024, 3, 25);
        let in_april = ymd(2024, 4, 2);
        let before_march = summary_totals_at(&entries, in_march);
        let before_april = summary_totals_at(&entries, in_april);

        entries.insert(0, entry(2, Scope::Scope3, 120.5, ymd(2024, 3, 10)));
        let after_march = summary_totals_at(&entries, in_march);
        let after_april = summary_totals_at(&entries, in_april);

        assert_eq!(after_march.all_time - before_march.all_time, 120.5);
        assert_eq!(after_march.current_month - before_march.current_month, 120.5);
        assert_eq!(after_april.current_month, before_april.current_month);
    }

    #[test]
    fn current_month_ignores_same_month_of_other_years() {
        let entries = vec![
            entry(1, Scope::Scope1, 5.0, ymd(2023, 3, 10)),
            entry(2, Scope::Scope1, 7.0, ymd(2024, 3, 1)),
            entry(3, Scope::Scope1, 9.0, ymd(2024, 3, 31)),
        ];
        let totals = summary_totals_at(&entries, ymd(2024, 3, 15));
        assert_eq!(totals.all_time, 21.0);
        assert_eq!(totals.current_month, 16.0);
    }
}
