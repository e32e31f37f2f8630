use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// ISO 3166 country names (common short forms). Territories that the alias
/// table folds into a parent country are left out.
pub const COUNTRIES: &[&str] = &[
    "Afghanistan", "Albania", "Algeria", "Andorra", "Angola", "Antigua and Barbuda",
    "Argentina", "Armenia", "Australia", "Austria", "Azerbaijan", "Bahamas", "Bahrain",
    "Bangladesh", "Barbados", "Belarus", "Belgium", "Belize", "Benin", "Bhutan", "Bolivia",
    "Bosnia and Herzegovina", "Botswana", "Brazil", "Brunei", "Bulgaria", "Burkina Faso",
    "Burundi", "Cabo Verde", "Cambodia", "Cameroon", "Canada", "Central African Republic",
    "Chad", "Chile", "China", "Colombia", "Comoros", "Congo", "Costa Rica", "Croatia", "Cuba",
    "Cyprus", "Czechia", "Denmark", "Djibouti", "Dominica", "Dominican Republic", "Ecuador",
    "Egypt", "El Salvador", "Equatorial Guinea", "Eritrea", "Estonia", "Eswatini", "Ethiopia",
    "Fiji", "Finland", "France", "Gabon", "Gambia", "Georgia", "Germany", "Ghana", "Greece",
    "Grenada", "Guatemala", "Guinea", "Guinea-Bissau", "Guyana", "Haiti", "Honduras",
    "Hungary", "Iceland", "India", "Indonesia", "Iran", "Iraq", "Ireland", "Israel", "Italy",
    "Jamaica", "Japan", "Jordan", "Kazakhstan", "Kenya", "Kiribati", "Kuwait", "Kyrgyzstan",
    "Laos", "Latvia", "Lebanon", "Lesotho", "Liberia", "Libya", "Liechtenstein", "Lithuania",
    "Luxembourg", "Madagascar", "Malawi", "Malaysia", "Maldives", "Mali", "Malta",
    "Marshall Islands", "Mauritania", "Mauritius", "Mexico", "Micronesia", "Moldova",
    "Monaco", "Mongolia", "Montenegro", "Morocco", "Mozambique", "Myanmar", "Namibia",
    "Nauru", "Nepal", "Netherlands", "New Zealand", "Nicaragua", "Niger", "Nigeria",
    "North Korea", "North Macedonia", "Norway", "Oman", "Pakistan", "Palau", "Palestine",
    "Panama", "Papua New Guinea", "Paraguay", "Peru", "Philippines", "Poland", "Portugal",
    "Qatar", "Romania", "Russia", "Rwanda", "Saint Kitts and Nevis", "Saint Lucia",
    "Saint Vincent and the Grenadines", "Samoa", "San Marino", "Sao Tome and Principe",
    "Saudi Arabia", "Senegal", "Serbia", "Seychelles", "Sierra Leone", "Singapore",
    "Slovakia", "Slovenia", "Solomon Islands", "Somalia", "South Africa", "South Korea",
    "South Sudan", "Spain", "Sri Lanka", "Sudan", "Suriname", "Sweden", "Switzerland",
    "Syria", "Taiwan", "Tajikistan", "Tanzania", "Thailand", "Timor-Leste", "Togo", "Tonga",
    "Trinidad and Tobago", "Tunisia", "Turkey", "Turkmenistan", "Tuvalu", "Uganda",
    "Ukraine", "United Arab Emirates", "United Kingdom", "United States", "Uruguay",
    "Uzbekistan", "Vanuatu", "Vatican City", "Venezuela", "Vietnam", "Yemen", "Zambia",
    "Zimbabwe",
];

/// Sub-national and colloquial names mapped to their parent country.
pub const ALIASES: &[(&str, &str)] = &[
    ("England", "United Kingdom"),
    ("Scotland", "United Kingdom"),
    ("Wales", "United Kingdom"),
    ("Northern Ireland", "United Kingdom"),
    ("Great Britain", "United Kingdom"),
    ("Hong Kong", "China"),
    ("Macau", "China"),
    ("Puerto Rico", "United States"),
    ("Guam", "United States"),
    ("U.S.", "United States"),
    ("Soviet Union", "Russia"),
    ("Czech Republic", "Czechia"),
    ("Burma", "Myanmar"),
];

struct Entry {
    needle: String,
    country: &'static str,
}

// Gazetteer first, then aliases; `first_country` falls back to this order.
static ENTRIES: LazyLock<Vec<Entry>> = LazyLock::new(|| {
    COUNTRIES
        .iter()
        .map(|&c| (c, c))
        .chain(ALIASES.iter().copied())
        .map(|(needle, country)| Entry {
            needle: needle.to_lowercase(),
            country,
        })
        .collect()
});

/// Every country recognized in `text`, unioned across gazetteer and aliases.
///
/// Matching is case-insensitive substring matching, so short names can fire
/// inside longer words ("Oman" in "woman", "Niger" in "Nigeria").
pub fn find_countries(text: &str) -> BTreeSet<&'static str> {
    let lower = text.to_lowercase();
    ENTRIES
        .iter()
        .filter(|e| lower.contains(&e.needle))
        .map(|e| e.country)
        .collect()
}

/// The country whose mention starts earliest in `text`.
///
/// Mentions starting at the same position go to the longer name
/// ("Nigeria" over "Niger"), then to list order.
pub fn first_country(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    ENTRIES
        .iter()
        .enumerate()
        .filter_map(|(rank, e)| {
            lower
                .find(&e.needle)
                .map(|pos| (pos, e.needle.len(), rank, e.country))
        })
        .min_by_key(|&(pos, len, rank, _)| (pos, Reverse(len), rank))
        .map(|(_, _, _, country)| country)
}
