pub mod country;
pub mod gazetteer;
pub mod infobox;
pub mod occupation;

use scraper::Html;

use country::{CountryOutcome, CountryStrategy};
use occupation::{CategoryTable, ClassifierInput};

/// Placeholder for any field that cannot be determined.
pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub country: CountryStrategy,
    pub classifier_input: ClassifierInput,
    pub categories: CategoryTable,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions {
            country: CountryStrategy::default(),
            classifier_input: ClassifierInput::default(),
            categories: CategoryTable::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFields {
    pub birth_year: String,
    pub country: CountryOutcome,
    pub job: String,
}

/// Markup → birth year, country of origin, occupation label.
pub fn extract_page(html: &str, opts: &ExtractOptions) -> PageFields {
    let doc = Html::parse_document(html);

    let birth_year = infobox::birth_year(&doc);
    let country = country::extract(opts.country, html, &doc);
    let job = match opts.classifier_input {
        ClassifierInput::Summary => opts.categories.classify(&infobox::summary(&doc)),
        ClassifierInput::Lead => opts.categories.classify(&infobox::first_paragraph(&doc)),
        ClassifierInput::FullPage => opts.categories.classify(html),
    };

    PageFields {
        birth_year,
        country,
        job: job.label().to_string(),
    }
}
