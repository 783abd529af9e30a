use std::collections::HashMap;
use std::path::Path;

use crate::domain::document::{CorpusKind, TextDocument};

/// Fields whose basename is used when no priority field resolves.
const SOURCE_FIELDS: [&str; 4] = ["source", "path", "file_path", "filename"];

pub type Extractor = Box<dyn Fn(&TextDocument) -> Option<String> + Send + Sync>;

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn basename(value: &str) -> Option<String> {
    Path::new(value.trim())
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(non_empty)
}

/// Ordered list of extractors; the first one yielding a value wins.
#[derive(Default)]
pub struct FirstMatchResolver {
    extractors: Vec<Extractor>,
}

impl FirstMatchResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then<F>(mut self, extractor: F) -> Self
    where
        F: Fn(&TextDocument) -> Option<String> + Send + Sync + 'static,
    {
        self.extractors.push(Box::new(extractor));
        self
    }

    /// Try the named field, trimmed, when it is non-empty.
    pub fn field(self, name: &'static str) -> Self {
        self.then(move |document| document.field(name).and_then(non_empty))
    }

    /// Try the base file name of the first non-empty field among `names`.
    pub fn basename_of(self, names: &'static [&'static str]) -> Self {
        self.then(move |document| {
            names
                .iter()
                .find_map(|name| document.field(name).and_then(non_empty))
                .and_then(|value| basename(&value))
        })
    }

    pub fn resolve(&self, document: &TextDocument) -> Option<String> {
        self.extractors
            .iter()
            .find_map(|extractor| extractor(document))
    }

    /// Group-key chain for a corpus: its priority fields, then the basename
    /// of a source path.
    pub fn group_key(kind: CorpusKind) -> Self {
        kind.group_key_priority()
            .into_iter()
            .fold(Self::new(), Self::field)
            .basename_of(&SOURCE_FIELDS)
    }

    /// Display-name chain: the title, then the basename of a source path.
    pub fn display_name() -> Self {
        Self::new()
            .field("title")
            .basename_of(&["source", "filename"])
    }
}

/// One logical document per group key, as parallel sequences in
/// first-seen order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GroupedCorpus {
    pub titles: Vec<String>,
    pub texts: Vec<String>,
    pub keys: Vec<String>,
}

impl GroupedCorpus {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keep only the logical documents whose title satisfies `keep`.
    pub fn retain_titles<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&str) -> bool,
    {
        let mask: Vec<bool> = self.titles.iter().map(|title| keep(title)).collect();
        let before = self.len();

        let mut flags = mask.iter();
        self.titles.retain(|_| *flags.next().unwrap_or(&true));
        let mut flags = mask.iter();
        self.texts.retain(|_| *flags.next().unwrap_or(&true));
        let mut flags = mask.iter();
        self.keys.retain(|_| *flags.next().unwrap_or(&true));

        before - self.len()
    }
}

/// Collapse stored fragments back into their source documents.
///
/// Fragments sharing a resolved key are joined with newlines in input
/// order. Fragments without any key get a positional `doc_{n}` key.
/// Groups whose name chain yields nothing are titled by the key's base
/// file name.
pub fn group_documents(
    documents: &[TextDocument],
    key_resolver: &FirstMatchResolver,
    name_resolver: &FirstMatchResolver,
) -> GroupedCorpus {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut fragments: Vec<Vec<&str>> = Vec::new();
    let mut grouped = GroupedCorpus::default();

    for document in documents {
        let key = key_resolver
            .resolve(document)
            .unwrap_or_else(|| format!("doc_{}", grouped.keys.len()));

        let position = match positions.get(&key) {
            Some(&position) => position,
            None => {
                let title = name_resolver
                    .resolve(document)
                    .or_else(|| basename(&key))
                    .unwrap_or_else(|| key.clone());
                positions.insert(key.clone(), grouped.keys.len());
                grouped.titles.push(title);
                grouped.keys.push(key);
                fragments.push(Vec::new());
                fragments.len() - 1
            }
        };
        fragments[position].push(document.text.as_str());
    }

    grouped.texts = fragments.into_iter().map(|parts| parts.join("\n")).collect();
    grouped
}

/// Group a corpus with its default key and display-name chains.
pub fn group_corpus(documents: &[TextDocument], kind: CorpusKind) -> GroupedCorpus {
    group_documents(
        documents,
        &FirstMatchResolver::group_key(kind),
        &FirstMatchResolver::display_name(),
    )
}
