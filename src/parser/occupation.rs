use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupation {
    Scientist,
    Author,
    Artist,
    BusinessLeader,
    Athlete,
    Religious,
    Government,
    Politician,
    HeadOfState,
    Unknown,
}

impl Occupation {
    pub fn label(self) -> &'static str {
        match self {
            Occupation::Scientist => "Scientist",
            Occupation::Author => "Author",
            Occupation::Artist => "Artist",
            Occupation::BusinessLeader => "Business Leader",
            Occupation::Athlete => "Athlete",
            Occupation::Religious => "Religious",
            Occupation::Government => "Government",
            Occupation::Politician => "Politician",
            Occupation::HeadOfState => "Head of State",
            Occupation::Unknown => "Unknown",
        }
    }
}

/// Which text the classifier reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ClassifierInput {
    /// Flattened infobox text
    #[default]
    Summary,
    /// First non-blank paragraph
    Lead,
    /// Raw page markup
    FullPage,
}

/// Preset category tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ClassifierVariant {
    /// Six general categories plus a Politician / Head of State override tier
    #[default]
    TwoTier,
    /// Seven general categories, political keywords folded into Government
    Merged,
}

const SCIENTIST: &[&str] = &[
    "scientist", "physicist", "chemist", "biologist", "researcher", "hypothesis", "doctor",
];
const AUTHOR: &[&str] = &["author", "writer", "novelist", "playwright", "poet", "bard"];
const ARTIST: &[&str] = &[
    "artist", "singer", "musician", "actor", "painter", "director", "dancer", "actress",
];
const BUSINESS: &[&str] = &[
    "businessman", "entrepreneur", "executive", "founder", "ceo", "industrialist",
];
const ATHLETE: &[&str] = &[
    "athlete", "sportsperson", "footballer", "basketball player", "runner", "swimmer",
    "tennis player", "baseball player", "volleyball player", "track and field athlete",
    "hockey player",
];
const RELIGIOUS: &[&str] = &[
    "priest", "pope", "rabbi", "imam", "bible", "reverend", "minister",
];
const POLITICIAN: &[&str] = &[
    "politician", "diplomat", "senator", "governor", "mayor", "congressman", " mp ",
    "councillor", "secretary", "treasur", "democrat", "republic",
];
const HEAD_OF_STATE: &[&str] = &[
    "president", "prime minister", "chancellor", "king", "queen", "emperor", "sultan", "shah",
    "monarch", "leader",
];

/// Ordered `(category, keywords)` lists. Declaration order breaks ties.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    pub general: Vec<(Occupation, Vec<String>)>,
    pub political: Vec<(Occupation, Vec<String>)>,
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

impl CategoryTable {
    pub fn preset(variant: ClassifierVariant) -> Self {
        let general = vec![
            (Occupation::Scientist, owned(SCIENTIST)),
            (Occupation::Author, owned(AUTHOR)),
            (Occupation::Artist, owned(ARTIST)),
            (Occupation::BusinessLeader, owned(BUSINESS)),
            (Occupation::Athlete, owned(ATHLETE)),
            (Occupation::Religious, owned(RELIGIOUS)),
        ];
        match variant {
            ClassifierVariant::TwoTier => CategoryTable {
                general,
                political: vec![
                    (Occupation::Politician, owned(POLITICIAN)),
                    (Occupation::HeadOfState, owned(HEAD_OF_STATE)),
                ],
            },
            ClassifierVariant::Merged => {
                let mut general = general;
                let government = POLITICIAN.iter().chain(HEAD_OF_STATE).copied();
                general.push((Occupation::Government, government.map(String::from).collect()));
                CategoryTable {
                    general,
                    political: Vec::new(),
                }
            }
        }
    }

    /// Classify `text`; `Occupation::Unknown` when nothing scores.
    pub fn classify(&self, text: &str) -> Occupation {
        let lower = text.to_lowercase();
        let general = score_all(&self.general, &lower);
        let political = score_all(&self.political, &lower);
        debug!(?general, ?political, "occupation scores");

        let (mut chosen, best_general) = best(&general).unwrap_or((Occupation::Unknown, 0));
        let mut chosen_score = best_general;

        let politician = political
            .iter()
            .find(|(c, _)| *c == Occupation::Politician)
            .map_or(0, |(_, s)| *s);
        if politician > best_general {
            if let Some((cat, score)) = best(&political) {
                if score > best_general {
                    chosen = cat;
                    chosen_score = score;
                }
            }
        }

        if chosen_score == 0 {
            Occupation::Unknown
        } else {
            chosen
        }
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        CategoryTable::preset(ClassifierVariant::default())
    }
}

/// Non-overlapping substring occurrences of every keyword, summed.
pub fn keyword_score(lower_text: &str, keywords: &[String]) -> usize {
    keywords
        .iter()
        .map(|k| lower_text.matches(k.as_str()).count())
        .sum()
}

fn score_all(table: &[(Occupation, Vec<String>)], lower: &str) -> Vec<(Occupation, usize)> {
    table
        .iter()
        .map(|(cat, words)| (*cat, keyword_score(lower, words)))
        .collect()
}

// First maximum wins.
fn best(scores: &[(Occupation, usize)]) -> Option<(Occupation, usize)> {
    scores.iter().copied().fold(None, |acc, (cat, score)| match acc {
        Some((_, top)) if top >= score => acc,
        _ => Some((cat, score)),
    })
}
