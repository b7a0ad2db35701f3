use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "SpaceNews")]
    SpaceNews,
    #[serde(rename = "SNAPI")]
    Snapi,
    #[serde(rename = "SpaceWorks")]
    SpaceWorks,
    #[serde(rename = "European Spaceflight")]
    EuropeanSpaceflight,
    #[serde(rename = "Via Satellite")]
    ViaSatellite,
    #[serde(rename = "NASA TechPort")]
    NasaTechport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceCategory {
    Financial,
    Technical,
}

impl Source {
    pub const ALL: [Source; 6] = [
        Source::SpaceNews,
        Source::Snapi,
        Source::SpaceWorks,
        Source::EuropeanSpaceflight,
        Source::ViaSatellite,
        Source::NasaTechport,
    ];

    /// Name the backend expects on the wire.
    pub fn wire_name(self) -> &'static str {
        match self {
            Source::SpaceNews => "SpaceNews",
            Source::Snapi => "SNAPI",
            Source::SpaceWorks => "SpaceWorks",
            Source::EuropeanSpaceflight => "European Spaceflight",
            Source::ViaSatellite => "Via Satellite",
            Source::NasaTechport => "NASA TechPort",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Source::SpaceNews => "SpaceNews (Business)",
            Source::Snapi => "SNAPI (Aggregator)",
            Source::SpaceWorks => "SpaceWorks (Benchmark)",
            Source::EuropeanSpaceflight => "European Spaceflight (EU)",
            Source::ViaSatellite => "Via Satellite (Tech)",
            Source::NasaTechport => "NASA TechPort (R&D)",
        }
    }

    pub fn category(self) -> SourceCategory {
        match self {
            Source::SpaceNews
            | Source::Snapi
            | Source::SpaceWorks
            | Source::EuropeanSpaceflight => SourceCategory::Financial,
            Source::ViaSatellite | Source::NasaTechport => SourceCategory::Technical,
        }
    }

    pub fn in_category(category: SourceCategory) -> Vec<Source> {
        Source::ALL
            .into_iter()
            .filter(|source| source.category() == category)
            .collect()
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown source: {0}")]
pub struct UnknownSourceError(pub String);

impl FromStr for Source {
    type Err = UnknownSourceError;

    /// Accepts the wire name or a compact spelling ("nasa-techport",
    /// "via_satellite"), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = compact(s);
        Source::ALL
            .into_iter()
            .find(|source| compact(source.wire_name()) == wanted)
            .ok_or_else(|| UnknownSourceError(s.to_string()))
    }
}

fn compact(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("at least one source must stay selected")]
pub struct EmptySourceSetError;

/// Ordered, duplicate-free set of sources that always holds at least one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSelection {
    sources: Vec<Source>,
}

impl SourceSelection {
    pub fn new(first: Source) -> Self {
        Self {
            sources: vec![first],
        }
    }

    /// Builds a selection from any list; `None` when the list is empty.
    pub fn from_sources(sources: impl IntoIterator<Item = Source>) -> Option<Self> {
        let mut iter = sources.into_iter();
        let mut selection = Self::new(iter.next()?);
        for source in iter {
            selection.select(source);
        }
        Some(selection)
    }

    pub fn select(&mut self, source: Source) {
        if !self.sources.contains(&source) {
            self.sources.push(source);
        }
    }

    /// Removes `source` unless it is the last one selected. Removing a source
    /// that is not selected is a no-op.
    pub fn deselect(&mut self, source: Source) -> Result<(), EmptySourceSetError> {
        if !self.sources.contains(&source) {
            return Ok(());
        }
        if self.sources.len() == 1 {
            return Err(EmptySourceSetError);
        }
        self.sources.retain(|s| *s != source);
        Ok(())
    }

    pub fn toggle(&mut self, source: Source, checked: bool) -> Result<(), EmptySourceSetError> {
        if checked {
            self.select(source);
            Ok(())
        } else {
            self.deselect(source)
        }
    }

    pub fn contains(&self, source: Source) -> bool {
        self.sources.contains(&source)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Always false; kept for API symmetry with collections.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Source> + '_ {
        self.sources.iter().copied()
    }

    pub fn as_slice(&self) -> &[Source] {
        &self.sources
    }
}

impl Default for SourceSelection {
    fn default() -> Self {
        Self::new(Source::SpaceNews)
    }
}

impl Serialize for SourceSelection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.sources.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SourceSelection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let sources = Vec::<Source>::deserialize(deserializer)?;
        SourceSelection::from_sources(sources)
            .ok_or_else(|| serde::de::Error::custom(EmptySourceSetError))
    }
}
