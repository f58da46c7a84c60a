//! # Catalog Seed File
//!
//! The YAML document loaded by `medalla check` and `medalla seed`. Entries
//! use the same shapes as the API's create requests, so anything the seed
//! file accepts the API would accept too.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use medalla_api::extractors::Validate;
use medalla_api::routes::beers::CreateBeerRequest;
use medalla_api::routes::events::CreateEventRequest;
use medalla_api::routes::kegs::CreateKegRequest;
use medalla_api::routes::partners::CreatePartnerRequest;

/// Parsed contents of a catalog seed file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedFile {
    #[serde(default)]
    pub beers: Vec<CreateBeerRequest>,
    #[serde(default)]
    pub kegs: Vec<CreateKegRequest>,
    #[serde(default)]
    pub partners: Vec<CreatePartnerRequest>,
    #[serde(default)]
    pub events: Vec<CreateEventRequest>,
}

/// One invalid entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedProblem {
    pub section: &'static str,
    pub index: usize,
    pub message: String,
}

impl fmt::Display for SeedProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.section, self.index, self.message)
    }
}

impl SeedFile {
    /// Read and parse a seed file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read seed file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid seed file {}", path.display()))
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Validate every entry. An empty result means the file is loadable.
    pub fn problems(&self) -> Vec<SeedProblem> {
        let mut problems = Vec::new();
        collect("beers", &self.beers, &mut problems);
        collect("kegs", &self.kegs, &mut problems);
        collect("partners", &self.partners, &mut problems);
        collect("events", &self.events, &mut problems);

        let mut seen: HashMap<i64, usize> = HashMap::new();
        for (index, beer) in self.beers.iter().enumerate() {
            let Some(legacy_id) = beer.legacy_id else {
                continue;
            };
            if let Some(first) = seen.insert(legacy_id, index) {
                problems.push(SeedProblem {
                    section: "beers",
                    index,
                    message: format!("legacy_id {legacy_id} already used by beers[{first}]"),
                });
            }
        }
        problems
    }

    pub fn summary(&self) -> String {
        format!(
            "{} beers, {} kegs, {} partners, {} events",
            self.beers.len(),
            self.kegs.len(),
            self.partners.len(),
            self.events.len()
        )
    }
}

fn collect<T: Validate>(section: &'static str, entries: &[T], out: &mut Vec<SeedProblem>) {
    for (index, entry) in entries.iter().enumerate() {
        if let Err(message) = entry.validate() {
            out.push(SeedProblem {
                section,
                index,
                message,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = include_str!("../../../seed/catalog.yaml");

    #[test]
    fn bundled_catalog_is_valid() {
        let seed = SeedFile::parse(CATALOG).unwrap();
        assert_eq!(seed.beers.len(), 6);
        assert_eq!(seed.kegs.len(), 4);
        assert_eq!(seed.partners.len(), 8);
        assert_eq!(seed.events.len(), 5);
        assert!(seed.problems().is_empty(), "{:?}", seed.problems());
    }

    #[test]
    fn bundled_catalog_stock() {
        let seed = SeedFile::parse(CATALOG).unwrap();
        let stock: Vec<(&str, i64)> = seed
            .kegs
            .iter()
            .map(|k| (k.size.as_str(), k.stock))
            .collect();
        assert_eq!(
            stock,
            vec![
                ("10 Litros", 100),
                ("20 Litros", 50),
                ("30 Litros", 35),
                ("50 Litros", 20)
            ]
        );
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let seed = SeedFile::parse("kegs:\n  - size: 5 Litros\n").unwrap();
        assert!(seed.beers.is_empty());
        assert_eq!(seed.summary(), "0 beers, 1 kegs, 0 partners, 0 events");
    }

    #[test]
    fn unknown_section_is_rejected() {
        assert!(SeedFile::parse("wines: []\n").is_err());
    }

    #[test]
    fn problems_point_at_entries() {
        let raw = r#"
beers:
  - legacy_id: 1
    name: GOLDEN
  - legacy_id: 1
    name: HONEY
kegs:
  - size: "10 Litros"
    stock: -2
partners:
  - name: Lejos
    type: Bar
    location: { lat: 95.0, lng: -62.0 }
"#;
        let problems = SeedFile::parse(raw).unwrap().problems();
        let located: Vec<(&str, usize)> = problems.iter().map(|p| (p.section, p.index)).collect();
        assert_eq!(located, vec![("kegs", 0), ("partners", 0), ("beers", 1)]);
        assert!(problems[2].to_string().starts_with("beers[1]: legacy_id 1"));
    }
}
