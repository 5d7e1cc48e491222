//! English inflection rules
//!
//! An [`Inflections`] value owns its rules; templates extend a renderer's copy
//! through the `add*` helpers. Nothing here is process-wide.

use std::collections::{BTreeMap, BTreeSet};

use heck::ToSnakeCase;

use crate::naming::capitalize;

/// A suffix rewrite, or a whole-word rewrite when `whole_word` is set
#[derive(Debug, Clone, PartialEq, Eq)]
struct Rule {
    /// Lowercase suffix (or word) to match
    pattern: String,
    replacement: String,
    whole_word: bool,
}

impl Rule {
    fn suffix(pattern: &str, replacement: &str) -> Self {
        Self {
            pattern: pattern.to_lowercase(),
            replacement: replacement.to_string(),
            whole_word: false,
        }
    }

    fn word(pattern: &str, replacement: &str) -> Self {
        Self {
            pattern: pattern.to_lowercase(),
            replacement: replacement.to_string(),
            whole_word: true,
        }
    }

    /// Rewrite `word` if the rule matches it
    fn apply(&self, word: &str) -> Option<String> {
        let lower = word.to_lowercase();
        let matched = if self.whole_word {
            lower == self.pattern
        } else {
            lower.ends_with(&self.pattern)
        };
        if !matched {
            return None;
        }

        // Keep the caller's casing for the untouched prefix when it lines up
        let cut = word.len().checked_sub(self.pattern.len());
        let (prefix, rest) = match cut {
            Some(cut) if lower.len() == word.len() && word.is_char_boundary(cut) => {
                (&word[..cut], &word[cut..])
            }
            _ => (&lower[..lower.len() - self.pattern.len()], ""),
        };

        let starts_upper = rest.chars().next().is_some_and(char::is_uppercase);
        if prefix.is_empty() && starts_upper {
            Some(prefix.to_string() + &capitalize(&self.replacement))
        } else {
            Some(prefix.to_string() + &self.replacement)
        }
    }
}

const PLURALS: &[(&str, &str)] = &[
    ("s", "s"),
    ("alias", "aliases"),
    ("status", "statuses"),
    ("bus", "buses"),
    ("octopus", "octopi"),
    ("virus", "viri"),
    ("octopi", "octopi"),
    ("viri", "viri"),
    ("axis", "axes"),
    ("testis", "testes"),
    ("buffalo", "buffaloes"),
    ("tomato", "tomatoes"),
    ("potato", "potatoes"),
    ("hero", "heroes"),
    ("tum", "ta"),
    ("ium", "ia"),
    ("ta", "ta"),
    ("ia", "ia"),
    ("sis", "ses"),
    ("lf", "lves"),
    ("rf", "rves"),
    ("fe", "ves"),
    ("y", "ies"),
    ("ay", "ays"),
    ("ey", "eys"),
    ("oy", "oys"),
    ("uy", "uys"),
    ("quy", "quies"),
    ("x", "xes"),
    ("ch", "ches"),
    ("ss", "sses"),
    ("sh", "shes"),
    ("matrix", "matrices"),
    ("vertex", "vertices"),
    ("index", "indices"),
    ("mouse", "mice"),
    ("louse", "lice"),
    ("mice", "mice"),
    ("lice", "lice"),
    ("hive", "hives"),
];

const PLURAL_WORDS: &[(&str, &str)] = &[("ox", "oxen"), ("oxen", "oxen"), ("quiz", "quizzes")];

const SINGULARS: &[(&str, &str)] = &[
    ("s", ""),
    ("ss", "ss"),
    ("us", "us"),
    ("sis", "sis"),
    ("news", "news"),
    ("ta", "tum"),
    ("ia", "ium"),
    ("analyses", "analysis"),
    ("bases", "basis"),
    ("diagnoses", "diagnosis"),
    ("parentheses", "parenthesis"),
    ("prognoses", "prognosis"),
    ("synopses", "synopsis"),
    ("theses", "thesis"),
    ("ves", "fe"),
    ("lves", "lf"),
    ("rves", "rf"),
    ("tives", "tive"),
    ("hives", "hive"),
    ("ies", "y"),
    ("series", "series"),
    ("movies", "movie"),
    ("xes", "x"),
    ("ches", "ch"),
    ("sses", "ss"),
    ("shes", "sh"),
    ("mice", "mouse"),
    ("lice", "louse"),
    ("buses", "bus"),
    ("oes", "o"),
    ("shoes", "shoe"),
    ("crises", "crisis"),
    ("axes", "axis"),
    ("testes", "testis"),
    ("octopi", "octopus"),
    ("viri", "virus"),
    ("aliases", "alias"),
    ("statuses", "status"),
    ("vertices", "vertex"),
    ("indices", "index"),
    ("matrices", "matrix"),
    ("quizzes", "quiz"),
    ("databases", "database"),
];

const SINGULAR_WORDS: &[(&str, &str)] = &[("oxen", "ox")];

const IRREGULARS: &[(&str, &str)] = &[
    ("person", "people"),
    ("man", "men"),
    ("child", "children"),
    ("sex", "sexes"),
    ("move", "moves"),
    ("zombie", "zombies"),
];

const UNCOUNTABLES: &[&str] = &[
    "equipment",
    "information",
    "rice",
    "money",
    "species",
    "series",
    "fish",
    "sheep",
    "jeans",
    "police",
];

/// A set of pluralization, singularization and casing rules
///
/// Later rules take precedence over earlier ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inflections {
    plurals: Vec<Rule>,
    singulars: Vec<Rule>,
    humans: Vec<Rule>,
    uncountables: BTreeSet<String>,
    /// Lowercase form to preferred spelling
    acronyms: BTreeMap<String, String>,
}

impl Default for Inflections {
    fn default() -> Self {
        Self::english()
    }
}

impl Inflections {
    /// A rule set with no rules at all
    pub fn empty() -> Self {
        Self {
            plurals: Vec::new(),
            singulars: Vec::new(),
            humans: Vec::new(),
            uncountables: BTreeSet::new(),
            acronyms: BTreeMap::new(),
        }
    }

    /// The default English rules
    pub fn english() -> Self {
        let mut rules = Self::empty();
        for (suffix, replacement) in PLURALS {
            rules.add_plural(suffix, replacement);
        }
        for (word, replacement) in PLURAL_WORDS {
            rules.plurals.push(Rule::word(word, replacement));
        }
        for (suffix, replacement) in SINGULARS {
            rules.add_singular(suffix, replacement);
        }
        for (word, replacement) in SINGULAR_WORDS {
            rules.singulars.push(Rule::word(word, replacement));
        }
        for (singular, plural) in IRREGULARS {
            rules.add_irregular(singular, plural);
        }
        for word in UNCOUNTABLES {
            rules.add_uncountable(word);
        }
        rules
    }

    pub fn add_plural(&mut self, suffix: &str, replacement: &str) {
        self.plurals.push(Rule::suffix(suffix, replacement));
    }

    pub fn add_singular(&mut self, suffix: &str, replacement: &str) {
        self.singulars.push(Rule::suffix(suffix, replacement));
    }

    /// Register a word whose plural follows no rule
    pub fn add_irregular(&mut self, singular: &str, plural: &str) {
        self.uncountables.remove(&singular.to_lowercase());
        self.uncountables.remove(&plural.to_lowercase());

        self.plurals.push(Rule::word(singular, plural));
        self.plurals.push(Rule::word(plural, plural));
        self.singulars.push(Rule::word(plural, singular));
        self.singulars.push(Rule::word(singular, singular));
    }

    pub fn add_uncountable(&mut self, word: &str) {
        self.uncountables.insert(word.to_lowercase());
    }

    /// Rewrite a trailing `suffix` when humanizing
    pub fn add_human(&mut self, suffix: &str, replacement: &str) {
        self.humans.push(Rule::suffix(suffix, replacement));
    }

    /// Keep `acronym` in this exact spelling when camelizing or humanizing
    pub fn add_acronym(&mut self, acronym: &str) {
        self.acronyms
            .insert(acronym.to_lowercase(), acronym.to_string());
    }

    pub fn pluralize(&self, word: &str) -> String {
        if word.is_empty() || self.is_uncountable(word) {
            return word.to_string();
        }
        apply_rules(&self.plurals, word).unwrap_or_else(|| format!("{}s", word))
    }

    pub fn singularize(&self, word: &str) -> String {
        if word.is_empty() || self.is_uncountable(word) {
            return word.to_string();
        }
        apply_rules(&self.singulars, word).unwrap_or_else(|| word.to_string())
    }

    /// `dino_party` and `dinoParty` become `DinoParty`
    pub fn camelize(&self, word: &str) -> String {
        words(word).iter().map(|w| self.titlecase(w)).collect()
    }

    /// `dino_party` becomes `dinoParty`
    pub fn camelize_down_first(&self, word: &str) -> String {
        let parts = words(word);
        let mut out = String::new();
        for (i, part) in parts.iter().enumerate() {
            if i == 0 {
                out.push_str(part);
            } else {
                out.push_str(&self.titlecase(part));
            }
        }
        out
    }

    /// `DinoParty` becomes `dino_party`
    pub fn underscore(&self, word: &str) -> String {
        word.to_snake_case()
    }

    /// `RawScaledScorer` becomes `raw_scaled_scorers`
    pub fn tableize(&self, word: &str) -> String {
        self.pluralize(&self.underscore(word))
    }

    /// `blog_posts` becomes `BlogPost`
    pub fn typeify(&self, word: &str) -> String {
        self.camelize(&self.singularize(word))
    }

    /// `employee_salary` becomes `Employee salary`, `author_id` becomes `Author`
    pub fn humanize(&self, word: &str) -> String {
        let word = apply_rules(&self.humans, word).unwrap_or_else(|| word.to_string());
        let word = word.strip_suffix("_id").unwrap_or(&word);

        let parts: Vec<String> = words(word)
            .iter()
            .map(|w| self.acronyms.get(w).cloned().unwrap_or_else(|| w.clone()))
            .collect();
        capitalize(&parts.join(" "))
    }

    fn titlecase(&self, word: &str) -> String {
        match self.acronyms.get(word) {
            Some(acronym) => acronym.clone(),
            None => capitalize(word),
        }
    }

    fn is_uncountable(&self, word: &str) -> bool {
        let lower = word.to_lowercase();
        let last = lower.rsplit('_').next().unwrap_or(&lower);
        self.uncountables.contains(last)
    }
}

/// Apply the most recently added matching rule
fn apply_rules(rules: &[Rule], word: &str) -> Option<String> {
    rules.iter().rev().find_map(|rule| rule.apply(word))
}

/// Lowercase words of an identifier in any casing
fn words(word: &str) -> Vec<String> {
    word.to_snake_case()
        .split('_')
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pluralize_regular_words() {
        let rules = Inflections::default();
        assert_eq!(rules.pluralize("user"), "users");
        assert_eq!(rules.pluralize("category"), "categories");
        assert_eq!(rules.pluralize("day"), "days");
        assert_eq!(rules.pluralize("box"), "boxes");
        assert_eq!(rules.pluralize("address"), "addresses");
        assert_eq!(rules.pluralize("status"), "statuses");
        assert_eq!(rules.pluralize("knife"), "knives");
        assert_eq!(rules.pluralize("matrix"), "matrices");
        assert_eq!(rules.pluralize("users"), "users");
    }

    #[test]
    fn test_pluralize_whole_word_rules() {
        let rules = Inflections::default();
        assert_eq!(rules.pluralize("ox"), "oxen");
        assert_eq!(rules.pluralize("fox"), "foxes");
        assert_eq!(rules.pluralize("quiz"), "quizzes");
        assert_eq!(rules.pluralize("person"), "people");
        assert_eq!(rules.pluralize("Person"), "People");
        assert_eq!(rules.pluralize("people"), "people");
    }

    #[test]
    fn test_singularize() {
        let rules = Inflections::default();
        assert_eq!(rules.singularize("users"), "user");
        assert_eq!(rules.singularize("categories"), "category");
        assert_eq!(rules.singularize("boxes"), "box");
        assert_eq!(rules.singularize("statuses"), "status");
        assert_eq!(rules.singularize("status"), "status");
        assert_eq!(rules.singularize("class"), "class");
        assert_eq!(rules.singularize("houses"), "house");
        assert_eq!(rules.singularize("databases"), "database");
        assert_eq!(rules.singularize("people"), "person");
        assert_eq!(rules.singularize("children"), "child");
        assert_eq!(rules.singularize("UserAccounts"), "UserAccount");
    }

    #[test]
    fn test_uncountables() {
        let mut rules = Inflections::default();
        assert_eq!(rules.pluralize("sheep"), "sheep");
        assert_eq!(rules.singularize("series"), "series");
        assert_eq!(rules.pluralize("office_equipment"), "office_equipment");

        rules.add_uncountable("metadata");
        assert_eq!(rules.singularize("metadata"), "metadata");
    }

    #[test]
    fn test_added_rules_take_precedence() {
        let mut rules = Inflections::default();
        rules.add_irregular("cactus", "cacti");
        assert_eq!(rules.pluralize("cactus"), "cacti");
        assert_eq!(rules.singularize("cacti"), "cactus");

        rules.add_plural("ium", "iums");
        assert_eq!(rules.pluralize("stadium"), "stadiums");

        rules.add_singular("ae", "a");
        assert_eq!(rules.singularize("formulae"), "formula");
    }

    #[test]
    fn test_irregular_removes_uncountable() {
        let mut rules = Inflections::default();
        rules.add_irregular("fish", "fishes");
        assert_eq!(rules.pluralize("fish"), "fishes");
    }

    #[test]
    fn test_camelize_and_underscore() {
        let rules = Inflections::default();
        assert_eq!(rules.camelize("dino_party"), "DinoParty");
        assert_eq!(rules.camelize("dinoParty"), "DinoParty");
        assert_eq!(rules.camelize_down_first("dino_party"), "dinoParty");
        assert_eq!(rules.underscore("DinoParty"), "dino_party");
        assert_eq!(rules.underscore("HTMLParser"), "html_parser");
    }

    #[test]
    fn test_acronyms() {
        let mut rules = Inflections::default();
        assert_eq!(rules.camelize("user_api"), "UserApi");

        rules.add_acronym("API");
        assert_eq!(rules.camelize("user_api"), "UserAPI");
        assert_eq!(rules.camelize_down_first("api_key"), "apiKey");
        assert_eq!(rules.humanize("api_key"), "API key");
    }

    #[test]
    fn test_tableize_and_typeify() {
        let rules = Inflections::default();
        assert_eq!(rules.tableize("RawScaledScorer"), "raw_scaled_scorers");
        assert_eq!(rules.tableize("Person"), "people");
        assert_eq!(rules.typeify("blog_posts"), "BlogPost");
        assert_eq!(rules.typeify("categories"), "Category");
    }

    #[test]
    fn test_humanize() {
        let mut rules = Inflections::default();
        assert_eq!(rules.humanize("employee_salary"), "Employee salary");
        assert_eq!(rules.humanize("author_id"), "Author");

        rules.add_human("_cnt", "_count");
        assert_eq!(rules.humanize("jobs_cnt"), "Jobs count");
    }

    #[test]
    fn test_empty_rules_fall_back() {
        let rules = Inflections::empty();
        assert_eq!(rules.pluralize("person"), "persons");
        assert_eq!(rules.singularize("people"), "people");
    }
}
