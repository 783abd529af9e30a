use std::fs;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::document::RawDocument;
use crate::errors::MatcherResult;
use crate::sources::DocumentSource;

static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n(?:[ \t]*\n){2,}").expect("valid regex"));

/// Collapse runs of blank lines and trim the ends.
pub fn clean_text(text: &str) -> String {
    BLANK_RUNS
        .replace_all(&text.replace("\r\n", "\n"), "\n\n")
        .trim()
        .to_string()
}

/// Serves every regular file of a directory as one document, in file name
/// order. The file name is used as both id and title.
#[derive(Clone, Debug)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl DocumentSource for DirectorySource {
    fn documents(&self) -> MatcherResult<(Vec<RawDocument>, usize)> {
        let mut paths = fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.is_file())
            .collect::<Vec<_>>();
        paths.sort();

        let mut documents = Vec::with_capacity(paths.len());
        let mut unreadable = 0;
        for path in paths {
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                log::warn!("Skipping non UTF-8 file name {}", path.display());
                unreadable += 1;
                continue;
            };

            match fs::read_to_string(&path) {
                Ok(text) => documents.push(RawDocument {
                    id: name.to_string(),
                    title: name.to_string(),
                    text: clean_text(&text),
                }),
                Err(e) => {
                    log::warn!("Failed to read {}: {e}", path.display());
                    unreadable += 1;
                }
            }
        }

        log::info!(
            "Read {} documents from {} ({unreadable} unreadable)",
            documents.len(),
            self.root.display()
        );
        Ok((documents, unreadable))
    }
}

#[cfg(test)]
mod tests {
    use super::{DirectorySource, clean_text};
    use crate::sources::DocumentSource;

    #[test]
    fn clean_text_collapses_blank_runs() {
        assert_eq!(
            clean_text("  Java backend\r\n\r\n\r\n\n  \nSpring  \n"),
            "Java backend\n\nSpring"
        );
    }

    #[test]
    fn directory_source_reads_files_in_name_order() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("b.txt"), "Frontend React").unwrap();
        std::fs::write(dir.path().join("a.txt"), "Java backend").unwrap();
        std::fs::write(dir.path().join("bad.bin"), [0xff_u8, 0xfe, 0x00]).unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let (documents, unreadable) = DirectorySource::new(dir.path())
            .documents()
            .expect("directory should be listed");

        let ids: Vec<&str> = documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a.txt", "b.txt"]);
        assert_eq!(documents[0].text, "Java backend");
        assert_eq!(unreadable, 1);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let result = DirectorySource::new("/nonexistent/matcher/docs").documents();

        assert!(result.is_err());
    }
}
