//! Reference-annotation table: term gene sets and the background universe.
//!
//! The table is tab-separated without a header, one row per
//! `(protein, category, term, description)`, with `#` comment lines.
//! Loaded indexes are immutable and shared through [`load_cached`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use modulyx_common::error::{ModulyxError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Identifies a term within its ontology source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TermKey {
    pub category: String,
    pub term_id: String,
}

/// A term and the genes annotated to it. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct TermSet {
    pub key: TermKey,
    pub description: Option<String>,
    pub genes: HashSet<String>,
}

#[derive(Debug, Deserialize)]
struct AnnotationRow {
    protein: String,
    category: String,
    term: String,
    #[serde(default)]
    description: Option<String>,
}

/// Immutable term → gene-set index over an allow-listed set of categories.
#[derive(Debug, Clone, Default)]
pub struct AnnotationIndex {
    terms: Vec<TermSet>,
    background: HashSet<String>,
}

impl AnnotationIndex {
    /// Build from `(protein, category, term, description)` tuples, keeping only
    /// rows whose trimmed category is in `categories`.
    pub fn from_rows<I, S>(rows: I, categories: &[S]) -> Self
    where
        I: IntoIterator<Item = (String, String, String, Option<String>)>,
        S: AsRef<str>,
    {
        let allowed: HashSet<&str> = categories.iter().map(|c| c.as_ref()).collect();
        let mut grouped: BTreeMap<TermKey, HashSet<String>> = BTreeMap::new();
        let mut descriptions: HashMap<String, String> = HashMap::new();
        let mut background = HashSet::new();

        for (protein, category, term, description) in rows {
            let category = category.trim();
            if !allowed.contains(category) {
                continue;
            }
            if let Some(d) = description {
                descriptions.insert(term.clone(), d);
            }
            background.insert(protein.clone());
            grouped
                .entry(TermKey { category: category.to_string(), term_id: term })
                .or_default()
                .insert(protein);
        }

        let terms = grouped
            .into_iter()
            .map(|(key, genes)| TermSet {
                description: descriptions.get(&key.term_id).cloned(),
                key,
                genes,
            })
            .collect();

        Self { terms, background }
    }

    /// Parse a tab-separated annotation table.
    pub fn from_reader<R: Read, S: AsRef<str>>(reader: R, categories: &[S]) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .comment(Some(b'#'))
            .quoting(false)
            .flexible(true)
            .from_reader(reader);

        let mut rows = Vec::new();
        for record in rdr.deserialize::<AnnotationRow>() {
            let row = record?;
            rows.push((row.protein, row.category, row.term, row.description));
        }
        debug!(rows = rows.len(), "Parsed annotation rows");
        Ok(Self::from_rows(rows, categories))
    }

    /// Load an annotation table from disk.
    pub fn load<S: AsRef<str>>(path: impl AsRef<Path>, categories: &[S]) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            ModulyxError::Config(format!("cannot open annotation file {}: {e}", path.display()))
        })?;
        let index = Self::from_reader(std::io::BufReader::new(file), categories)?;
        info!(
            "Loaded annotation index from {:?}: {} terms, {} background proteins",
            path,
            index.terms.len(),
            index.background.len()
        );
        Ok(index)
    }

    /// Terms ordered by `(category, term_id)`.
    pub fn terms(&self) -> &[TermSet] {
        &self.terms
    }

    pub fn background(&self) -> &HashSet<String> {
        &self.background
    }

    pub fn term(&self, category: &str, term_id: &str) -> Option<&TermSet> {
        self.terms
            .iter()
            .find(|t| t.key.category == category && t.key.term_id == term_id)
    }
}

type CacheKey = (PathBuf, Vec<String>);

fn cache() -> &'static Mutex<HashMap<CacheKey, Arc<AnnotationIndex>>> {
    static CACHE: OnceLock<Mutex<HashMap<CacheKey, Arc<AnnotationIndex>>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Load an annotation table once per `(path, categories)` for the process
/// lifetime. Reference files are assumed static, so entries are never invalidated.
pub fn load_cached<S: AsRef<str>>(path: impl AsRef<Path>, categories: &[S]) -> Result<Arc<AnnotationIndex>> {
    let key: CacheKey = (
        path.as_ref().to_path_buf(),
        categories.iter().map(|c| c.as_ref().to_string()).collect(),
    );
    let mut guard = cache()
        .lock()
        .map_err(|_| ModulyxError::Config("annotation cache lock poisoned".to_string()))?;

    if let Some(index) = guard.get(&key) {
        debug!(path = ?key.0, "Annotation index cache hit");
        return Ok(Arc::clone(index));
    }
    let index = Arc::new(AnnotationIndex::load(&key.0, &key.1)?);
    guard.insert(key, Arc::clone(&index));
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
# protein\tcategory\tterm\tdescription
p1\tBiological Process (Gene Ontology)\tGO:0001\tcell cycle
p2\tBiological Process (Gene Ontology)  \tGO:0001\tcell cycle
p2\tReactome Pathways\tR-1\tsignalling
p3\tKEGG\tmap01\tmetabolism
";

    fn cats() -> Vec<&'static str> {
        vec!["Biological Process (Gene Ontology)", "Reactome Pathways"]
    }

    #[test]
    fn test_category_filter_and_trim() {
        let index = AnnotationIndex::from_reader(TABLE.as_bytes(), &cats()).unwrap();
        assert_eq!(index.terms().len(), 2);
        let go = index.term("Biological Process (Gene Ontology)", "GO:0001").unwrap();
        assert_eq!(go.genes.len(), 2);
        assert_eq!(go.description.as_deref(), Some("cell cycle"));
        assert!(index.term("KEGG", "map01").is_none());
    }

    #[test]
    fn test_background_is_union_of_kept_terms() {
        let index = AnnotationIndex::from_reader(TABLE.as_bytes(), &cats()).unwrap();
        let mut bg: Vec<_> = index.background().iter().cloned().collect();
        bg.sort();
        assert_eq!(bg, vec!["p1", "p2"]);
    }

    #[test]
    fn test_missing_description_column() {
        let index = AnnotationIndex::from_reader("p1\tKEGG\tmap01\n".as_bytes(), &["KEGG"]).unwrap();
        assert_eq!(index.terms()[0].description, None);
    }

    #[test]
    fn test_cached_load_returns_same_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terms.tsv");
        std::fs::write(&path, TABLE).unwrap();
        let a = load_cached(&path, &cats()).unwrap();
        let b = load_cached(&path, &cats()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        let other = load_cached(&path, &["KEGG"]).unwrap();
        assert!(!Arc::ptr_eq(&a, &other));
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(AnnotationIndex::load("/nonexistent/terms.tsv", &cats()).is_err());
    }
}
