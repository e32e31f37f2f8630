use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{info, info_span, warn, Instrument};

use crate::error::{EnrichError, Result};
use crate::fetcher::{fetch_all, link_url, page_url, PageSource};
use crate::parser::country::{country_name, CountryOutcome};
use crate::parser::occupation::CategoryTable;
use crate::parser::{extract_page, ExtractOptions};
use crate::settings::Settings;
use crate::table::{write_tsv, CandidateTable};

/// Fields appended to every output row. Never empty; `"Unknown"` when absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrichment {
    pub birth_year: String,
    pub country_of_origin: String,
    pub job: String,
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub base_url: String,
    pub concurrency: usize,
    pub extract: ExtractOptions,
}

impl PipelineOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        PipelineOptions {
            base_url: settings.base_url.clone(),
            concurrency: settings.concurrency,
            extract: ExtractOptions {
                country: settings.country_strategy,
                classifier_input: settings.classifier_input,
                categories: CategoryTable::preset(settings.variant),
            },
        }
    }
}

#[derive(Debug, Default)]
pub struct RunStats {
    pub rows: usize,
    pub pages: usize,
    pub missing: usize,
    pub links_followed: usize,
    pub links_resolved: usize,
}

impl RunStats {
    pub fn print(&self) {
        println!(
            "Enriched {} rows ({} pages fetched, {} missing, {}/{} links resolved).",
            self.rows, self.pages, self.missing, self.links_resolved, self.links_followed,
        );
    }
}

fn candidate_urls(table: &CandidateTable, base: &str) -> Vec<Option<String>> {
    table
        .candidates()
        .map(|name| (!name.trim().is_empty()).then(|| page_url(base, name)))
        .collect()
}

/// Fetch, extract and classify every row. Output lines up with `table.rows`.
pub async fn enrich<S: PageSource>(
    table: &CandidateTable,
    source: Arc<S>,
    opts: &PipelineOptions,
) -> (Vec<Enrichment>, RunStats) {
    // Phase 1: pages
    let urls = candidate_urls(table, &opts.base_url);
    let (pages, fetch_stats) =
        fetch_all(Arc::clone(&source), urls, opts.concurrency, "pages").await;

    // Phase 2: extraction (CPU only, order-preserving)
    let t_extract = Instant::now();
    let fields: Vec<_> = pages
        .par_iter()
        .map(|html| extract_page(html, &opts.extract))
        .collect();
    drop(pages);
    info!(
        rows = fields.len(),
        secs = t_extract.elapsed().as_secs_f64(),
        "extraction done"
    );

    // Phase 3: follow country links left by the phrase strategy
    let link_urls: Vec<Option<String>> = fields
        .iter()
        .map(|f| match &f.country {
            CountryOutcome::Link { href, .. } => Some(link_url(&opts.base_url, href)),
            CountryOutcome::Resolved(_) => None,
        })
        .collect();
    let links_followed = link_urls.iter().filter(|u| u.is_some()).count();
    let linked = if links_followed > 0 {
        fetch_all(source, link_urls, opts.concurrency, "links").await.0
    } else {
        vec![String::new(); fields.len()]
    };

    let mut links_resolved = 0;
    let enrichments: Vec<Enrichment> = fields
        .into_iter()
        .zip(linked)
        .map(|(f, linked_page)| {
            let country_of_origin = match f.country {
                CountryOutcome::Link { href, fallback } => match country_name(&linked_page) {
                    Some(name) => {
                        links_resolved += 1;
                        name
                    }
                    None => {
                        warn!(href = %href, "no country-name on linked page, keeping link text");
                        fallback
                    }
                },
                resolved => resolved.settle(),
            };
            Enrichment {
                birth_year: f.birth_year,
                country_of_origin,
                job: f.job,
            }
        })
        .collect();

    let stats = RunStats {
        rows: table.len(),
        pages: fetch_stats.ok,
        missing: fetch_stats.empty,
        links_followed,
        links_resolved,
    };
    (enrichments, stats)
}

/// Read `input`, enrich, write `output`. Nothing is written on failure.
pub async fn run<S: PageSource>(
    input: &Path,
    output: &Path,
    limit: Option<usize>,
    source: Arc<S>,
    opts: &PipelineOptions,
) -> Result<RunStats> {
    let span = info_span!("run", input = ?input, output = ?output);
    async {
        let mut table = CandidateTable::read(input)?;
        if let Some(n) = limit {
            table.truncate(n);
        }
        info!(rows = table.len(), strategy = ?opts.extract.country, "starting enrichment");

        let (fields, stats) = enrich(&table, source, opts).await;
        let (headers, rows) = table.enriched(&fields);
        write_tsv(output, &headers, &rows)?;
        Ok::<_, EnrichError>(stats)
    }
    .instrument(span)
    .await
}

/// Candidates whose page came back empty.
pub async fn missing_pages<S: PageSource>(
    table: &CandidateTable,
    source: Arc<S>,
    opts: &PipelineOptions,
) -> Vec<String> {
    let urls = candidate_urls(table, &opts.base_url);
    let (pages, _) = fetch_all(source, urls, opts.concurrency, "check").await;
    table
        .candidates()
        .zip(&pages)
        .filter(|(_, page)| page.is_empty())
        .map(|(name, _)| {
            warn!(candidate = name, "no page found");
            name.to_string()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::country::CountryStrategy;
    use crate::parser::UNKNOWN;
    use std::collections::HashMap;
    use std::path::PathBuf;

    const BASE: &str = "https://wiki.test";

    struct FixtureSource {
        pages: HashMap<String, String>,
    }

    impl FixtureSource {
        fn new(entries: &[(&str, &str)]) -> Arc<Self> {
            let pages = entries
                .iter()
                .map(|(path, fixture)| {
                    let html =
                        std::fs::read_to_string(format!("tests/fixtures/{}.html", fixture)).unwrap();
                    (format!("{}{}", BASE, path), html)
                })
                .collect();
            Arc::new(FixtureSource { pages })
        }
    }

    impl PageSource for FixtureSource {
        async fn fetch(&self, url: &str) -> String {
            self.pages.get(url).cloned().unwrap_or_default()
        }
    }

    struct EmptySource;

    impl PageSource for EmptySource {
        async fn fetch(&self, _url: &str) -> String {
            String::new()
        }
    }

    fn opts(country: CountryStrategy) -> PipelineOptions {
        PipelineOptions {
            base_url: BASE.to_string(),
            concurrency: 2,
            extract: ExtractOptions {
                country,
                ..Default::default()
            },
        }
    }

    fn table(text: &str) -> CandidateTable {
        CandidateTable::from_reader(text.as_bytes(), Path::new("test.tsv")).unwrap()
    }

    fn source() -> Arc<FixtureSource> {
        FixtureSource::new(&[
            ("/wiki/Barack_Obama", "politician"),
            ("/wiki/Pablo_Picasso", "painter"),
            ("/wiki/Ada_Example", "no_infobox"),
            ("/wiki/Honolulu", "country_page"),
        ])
    }

    const INPUT: &str = "Rank\tCandidate\n1\tPablo Picasso\n2\tNobody Here\n3\tBarack Obama\n4\tAda Example\n5\t\n";

    #[tokio::test]
    async fn rows_stay_in_input_order() {
        let t = table(INPUT);
        let (fields, stats) = enrich(&t, source(), &opts(CountryStrategy::InfoboxRow)).await;

        assert_eq!(fields.len(), t.len());
        assert_eq!(fields[0].job, "Artist");
        assert_eq!(fields[0].country_of_origin, "Spain");
        assert_eq!(fields[2].job, "Head of State");
        assert_eq!(fields[2].birth_year, "1961");
        assert_eq!(fields[2].country_of_origin, "United States");
        assert_eq!(stats.pages, 3);
        assert_eq!(stats.missing, 2);
        assert_eq!(stats.links_followed, 0);
    }

    #[tokio::test]
    async fn every_field_is_populated() {
        let t = table(INPUT);
        for strategy in [CountryStrategy::Phrase, CountryStrategy::InfoboxRow] {
            let (fields, _) = enrich(&t, source(), &opts(strategy)).await;
            for f in &fields {
                for v in [&f.birth_year, &f.country_of_origin, &f.job] {
                    assert!(!v.is_empty());
                }
            }
            assert_eq!(fields[1].birth_year, UNKNOWN);
            assert_eq!(fields[4].job, UNKNOWN);
        }
    }

    #[tokio::test]
    async fn phrase_strategy_follows_links() {
        let t = table(INPUT);
        let (fields, stats) = enrich(&t, source(), &opts(CountryStrategy::Phrase)).await;

        // Obama's "born in" links to Honolulu, whose page carries a country-name
        assert_eq!(fields[2].country_of_origin, "United States");
        // Picasso's link target is not served, so the link text stays
        assert_eq!(fields[0].country_of_origin, "Málaga");
        assert_eq!(stats.links_followed, 2);
        assert_eq!(stats.links_resolved, 1);
    }

    #[tokio::test]
    async fn empty_fetches_give_unknown_everywhere() {
        let t = table(INPUT);
        for strategy in [CountryStrategy::Phrase, CountryStrategy::InfoboxRow] {
            let (fields, stats) = enrich(&t, Arc::new(EmptySource), &opts(strategy)).await;
            assert_eq!(stats.pages, 0);
            for f in fields {
                assert_eq!(f.birth_year, UNKNOWN);
                assert_eq!(f.country_of_origin, UNKNOWN);
                assert_eq!(f.job, UNKNOWN);
            }
        }
    }

    #[tokio::test]
    async fn run_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.tsv");
        std::fs::write(&input, INPUT).unwrap();
        let out_a: PathBuf = dir.path().join("a.tsv");
        let out_b: PathBuf = dir.path().join("b.tsv");

        let o = opts(CountryStrategy::InfoboxRow);
        run(&input, &out_a, None, source(), &o).await.unwrap();
        run(&input, &out_b, None, source(), &o).await.unwrap();

        let a = std::fs::read(&out_a).unwrap();
        assert_eq!(a, std::fs::read(&out_b).unwrap());

        let back = CandidateTable::read(&out_a).unwrap();
        assert_eq!(back.len(), 5);
        assert_eq!(
            back.headers,
            vec!["Rank", "Candidate", "Birth Year", "Country of Origin", "Job"]
        );
        assert_eq!(back.rows[0], vec!["1", "Pablo Picasso", "1881", "Spain", "Artist"]);
        assert_eq!(back.rows[1], vec!["2", "Nobody Here", "Unknown", "Unknown", "Unknown"]);
    }

    #[tokio::test]
    async fn limit_truncates_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.tsv");
        std::fs::write(&input, INPUT).unwrap();
        let output = dir.path().join("out.tsv");

        let stats = run(&input, &output, Some(2), source(), &opts(CountryStrategy::InfoboxRow))
            .await
            .unwrap();
        assert_eq!(stats.rows, 2);
        assert_eq!(CandidateTable::read(&output).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn missing_column_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.tsv");
        std::fs::write(&input, "Name\nCher\n").unwrap();
        let output = dir.path().join("out.tsv");

        let res = run(&input, &output, None, source(), &opts(CountryStrategy::InfoboxRow)).await;
        assert!(res.is_err());
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn check_lists_missing_pages() {
        let t = table(INPUT);
        let missing = missing_pages(&t, source(), &opts(CountryStrategy::InfoboxRow)).await;
        assert_eq!(missing, vec!["Nobody Here".to_string(), String::new()]);
    }
}
