//! Tripex Source - Where document text and annotations come from
//!
//! Provides:
//! - [`WikipediaSource`]: article text from the MediaWiki API
//! - [`FileSource`]: plain-text files on disk, one per title
//! - [`HttpAnnotator`]: an external tagging/parsing service
//!
//! Every source implements [`tripex_core::TextSource`] and reports
//! failures as `NotFound`, `AmbiguousTitle` or `Transport`.
//!
//! Author: hephaex@gmail.com

pub mod annotator;
pub mod file;
pub mod wikipedia;

use std::sync::Arc;

use tripex_core::{SourceConfig, TextSource};

pub use annotator::HttpAnnotator;
pub use file::FileSource;
pub use wikipedia::WikipediaSource;

/// Pick a text source from config
///
/// A configured text directory wins over Wikipedia.
pub fn create_text_source(config: &SourceConfig) -> tripex_core::Result<Arc<dyn TextSource>> {
    match &config.text_dir {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "using file text source");
            Ok(Arc::new(FileSource::new(dir)))
        }
        None => {
            tracing::info!(url = %config.wikipedia_url, "using wikipedia text source");
            Ok(Arc::new(WikipediaSource::from_config(config)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_dir_selects_file_source() {
        let config = SourceConfig {
            text_dir: Some("/tmp/texts".into()),
            ..Default::default()
        };
        assert_eq!(create_text_source(&config).unwrap().name(), "file");

        let config = SourceConfig::default();
        assert_eq!(create_text_source(&config).unwrap().name(), "wikipedia");
    }
}
