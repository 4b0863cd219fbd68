//! Lookup response types for the Unpaywall v2 API.
//!
//! Field names follow the JSON response. Everything the service may send as
//! `null` decodes to `None` (or an empty list for `oa_locations`).

use serde::{Deserialize, Deserializer, Serialize};

/// One open-access location of a work.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OaLocation {
    /// How the location was found (e.g. "open (via page says license)").
    pub evidence: Option<String>,
    /// `publisher` or `repository`.
    pub host_type: Option<String>,
    /// Whether the service picked this as the best location.
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_best: bool,
    /// License identifier such as `cc-by`.
    pub license: Option<String>,
    /// OAI-PMH identifier for repository copies.
    pub pmh_id: Option<String>,
    /// Last time this location was checked.
    pub updated: Option<String>,
    /// Either the PDF URL or the landing page URL.
    pub url: Option<String>,
    /// Landing page URL.
    pub url_for_landing_page: Option<String>,
    /// Direct PDF URL, if any.
    pub url_for_pdf: Option<String>,
    /// `submittedVersion`, `acceptedVersion` or `publishedVersion`.
    pub version: Option<String>,
}

impl OaLocation {
    /// Returns the PDF URL when it is present and not blank.
    #[must_use]
    pub fn pdf_url(&self) -> Option<&str> {
        self.url_for_pdf
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// An author entry from `z_authors`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Family name.
    pub family: Option<String>,
    /// Given name.
    pub given: Option<String>,
}

impl Author {
    /// Formats the author as `Family, Given`, falling back to whichever part exists.
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        match (self.family.as_deref(), self.given.as_deref()) {
            (Some(f), Some(g)) => Some(format!("{f}, {g}")),
            (Some(f), None) => Some(f.to_string()),
            (None, Some(g)) => Some(g.to_string()),
            (None, None) => None,
        }
    }
}

/// Decoded lookup response for one identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupRecord {
    /// The DOI, lower-cased by the service.
    #[serde(default, deserialize_with = "null_as_default")]
    pub doi: String,
    /// `https://doi.org/...` form of the DOI.
    pub doi_url: Option<String>,
    /// Work title.
    pub title: Option<String>,
    /// Crossref genre, e.g. `journal-article`.
    pub genre: Option<String>,
    /// Whether any open-access copy exists.
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_oa: bool,
    /// The best open-access location.
    pub best_oa_location: Option<OaLocation>,
    /// All known open-access locations.
    #[serde(default, deserialize_with = "null_as_default")]
    pub oa_locations: Vec<OaLocation>,
    /// Journal name.
    pub journal_name: Option<String>,
    /// Comma separated ISSNs.
    pub journal_issns: Option<String>,
    /// Whether the journal is fully open access.
    pub journal_is_oa: Option<bool>,
    /// Whether the journal is listed in DOAJ.
    pub journal_is_in_doaj: Option<bool>,
    /// Publisher name.
    pub publisher: Option<String>,
    /// Publication date (`YYYY-MM-DD`).
    pub published_date: Option<String>,
    /// Publication year.
    pub year: Option<i32>,
    /// Last time the record changed.
    pub updated: Option<String>,
    /// Data standard version used to compute the record.
    pub data_standard: Option<u8>,
    /// Authors as reported by Crossref.
    pub z_authors: Option<Vec<Author>>,
}

impl LookupRecord {
    /// Returns the best location's PDF URL when it is present and not blank.
    #[must_use]
    pub fn pdf_url(&self) -> Option<&str> {
        self.best_oa_location.as_ref().and_then(OaLocation::pdf_url)
    }

    /// Returns the title, untrimmed, when it is present and not blank.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title
            .as_deref()
            .filter(|title| !title.trim().is_empty())
    }

    /// Returns the formatted author list, `"; "` separated.
    #[must_use]
    pub fn authors(&self) -> Option<String> {
        let names: Vec<String> = self
            .z_authors
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter_map(Author::display_name)
            .collect();
        (!names.is_empty()).then(|| names.join("; "))
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
