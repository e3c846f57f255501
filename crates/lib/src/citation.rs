//! # APA Citation Generation
//!
//! Builds a prompt from whatever bibliographic information is available,
//! asks the configured model for an APA citation, and degrades to a fixed
//! format when the model is unavailable.

use crate::{
    errors::CitationError,
    metadata::{extract_metadata, truncate_for_citation, PaperMetadata},
    providers::ai::AiProvider,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const CITATION_SYSTEM_PROMPT: &str = "You are an expert academic citation assistant. Generate accurate APA format citations. Only respond with the citation, no additional text or explanations.";

/// The inputs a caller may know about a paper.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CitationRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    /// Extracted text of the paper.
    #[serde(default)]
    pub text: Option<String>,
}

impl CitationRequest {
    /// The structured fields, with blank values treated as absent.
    pub fn metadata(&self) -> PaperMetadata {
        fn clean(v: &Option<String>) -> Option<String> {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }
        PaperMetadata {
            title: clean(&self.title),
            author: clean(&self.author),
            year: clean(&self.year),
        }
    }

    fn text(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// Structured fields, with gaps filled by heuristics over the text.
    pub fn resolved_metadata(&self) -> PaperMetadata {
        let given = self.metadata();
        match self.text() {
            Some(text) => given.or(extract_metadata(text)),
            None => given,
        }
    }
}

/// Where a citation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CitationOrigin {
    Ai,
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedCitation {
    pub citation: String,
    pub source: CitationOrigin,
    pub metadata: PaperMetadata,
}

/// Selects the user prompt for the model based on what is known.
pub fn build_citation_prompt(meta: &PaperMetadata, text: Option<&str>) -> Result<String, CitationError> {
    match (&meta.title, &meta.author, &meta.year) {
        (Some(title), Some(author), Some(year)) => Ok(format!(
            "Generate an APA format citation for an academic paper with the following details:\n\
             Title: {title}\n\
             Author: {author}\n\
             Year: {year}\n\n\
             Please provide only the citation in proper APA format."
        )),
        (None, None, None) => match text {
            Some(text) => Ok(format!(
                "Based on the following text from an academic paper, generate an APA format citation. \
                 Extract the title, author, year, and any other relevant publication information from the text:\n\n\
                 {}\n\n\
                 Please provide only the citation in proper APA format.",
                truncate_for_citation(text)
            )),
            None => Err(CitationError::NothingToCite),
        },
        (title, author, year) => {
            let mut known = Vec::new();
            if let Some(title) = title {
                known.push(format!("Title: {title}"));
            }
            if let Some(author) = author {
                known.push(format!("Author: {author}"));
            }
            if let Some(year) = year {
                known.push(format!("Year: {year}"));
            }
            Ok(format!(
                "Generate an APA format citation for an academic paper with the following available information:\n\
                 {}\n\n\
                 Please provide only the citation in proper APA format. \
                 If any information is missing, use appropriate placeholders or format adjustments.",
                known.join("\n")
            ))
        }
    }
}

/// A fixed-format citation used when the model cannot be reached.
pub fn generate_fallback_citation(meta: &PaperMetadata) -> String {
    format!(
        "{} ({}). {}. [PDF Document].",
        meta.author.as_deref().unwrap_or("[Author]"),
        meta.year.as_deref().unwrap_or("[Year]"),
        meta.title.as_deref().unwrap_or("[Title]"),
    )
}

/// Asks the model for a citation. Any provider failure degrades to the
/// fallback format; only a request with nothing to cite is an error.
pub async fn generate_citation(
    provider: Option<&dyn AiProvider>,
    request: &CitationRequest,
) -> Result<GeneratedCitation, CitationError> {
    let given = request.metadata();
    let prompt = build_citation_prompt(&given, request.text())?;
    let metadata = request.resolved_metadata();

    let Some(provider) = provider else {
        debug!("No citation model configured, using fallback format.");
        return Ok(GeneratedCitation {
            citation: generate_fallback_citation(&metadata),
            source: CitationOrigin::Fallback,
            metadata,
        });
    };

    match provider.generate(CITATION_SYSTEM_PROMPT, &prompt).await {
        Ok(citation) if !citation.trim().is_empty() => Ok(GeneratedCitation {
            citation: citation.trim().to_string(),
            source: CitationOrigin::Ai,
            metadata,
        }),
        Ok(_) => {
            warn!("Citation model returned an empty answer, using fallback format.");
            Ok(GeneratedCitation {
                citation: generate_fallback_citation(&metadata),
                source: CitationOrigin::Fallback,
                metadata,
            })
        }
        Err(e) => {
            warn!("Citation generation failed, using fallback format: {e}");
            Ok(GeneratedCitation {
                citation: generate_fallback_citation(&metadata),
                source: CitationOrigin::Fallback,
                metadata,
            })
        }
    }
}
