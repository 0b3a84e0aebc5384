//! Static candidate catalog: races, candidates, party affiliation, and
//! external links. A fixed reference dataset consumed by page rendering —
//! nothing here is generated or mutated at runtime.

use serde::Serialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    Democrat,
    Republican,
    Libertarian,
    Green,
    Independent,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RaceKind {
    President,
    Senate,
    House,
}

#[derive(Debug, Clone, Serialize)]
pub struct Race {
    pub name: String,
    pub slug: String,
    pub locale: String,
    pub kind: RaceKind,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    Official,
    Wikipedia,
    Ballotpedia,
    Twitter,
    Facebook,
    Instagram,
    Youtube,
    Twitch,
    Reddit,
    Linkedin,
    Website,
}

#[derive(Debug, Clone, Serialize)]
pub struct Link {
    pub href: String,
    pub title: Option<String>,
    pub kind: LinkKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub name: String,
    pub slug: String,
    pub party: Party,
    pub race: Race,
    pub links: Vec<Link>,
}

impl Candidate {
    /// Topic tag the ingestion pipeline attaches to chunks about this
    /// candidate's campaign; the exact source filter matches against it.
    pub fn campaign_topic(&self) -> String {
        format!("{} 2024 Presidential Campaign", self.name)
    }
}

/// Issues surfaced on every candidate page.
pub const TRACKED_ISSUES: &[&str] = &[
    "Abortion",
    "Economy",
    "Immigration",
    "Healthcare",
    "Climate Change",
    "Foreign Policy",
];

/// The fixed candidate dataset. Built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct Catalog {
    races: Vec<Race>,
    candidates: Vec<Candidate>,
}

impl Catalog {
    pub fn builtin() -> Self {
        let president = Race {
            name: "President".to_string(),
            slug: "president".to_string(),
            locale: "United States".to_string(),
            kind: RaceKind::President,
        };
        let senate = Race {
            name: "Senate".to_string(),
            slug: "senate".to_string(),
            locale: "United States".to_string(),
            kind: RaceKind::Senate,
        };
        let house = Race {
            name: "House".to_string(),
            slug: "house".to_string(),
            locale: "United States".to_string(),
            kind: RaceKind::House,
        };

        let candidates = vec![
            Candidate {
                name: "Joe Biden".to_string(),
                slug: "joe-biden".to_string(),
                party: Party::Democrat,
                race: president.clone(),
                links: vec![
                    Link {
                        href: "https://en.wikipedia.org/wiki/Joe_Biden".to_string(),
                        title: Some("Wikipedia".to_string()),
                        kind: LinkKind::Wikipedia,
                    },
                    Link {
                        href: "https://joebiden.com".to_string(),
                        title: Some("Official Website".to_string()),
                        kind: LinkKind::Official,
                    },
                    Link {
                        href: "https://twitter.com/JoeBiden".to_string(),
                        title: None,
                        kind: LinkKind::Twitter,
                    },
                ],
            },
            Candidate {
                name: "Nikki Haley".to_string(),
                slug: "nikki-haley".to_string(),
                party: Party::Republican,
                race: president.clone(),
                links: vec![
                    Link {
                        href: "https://en.wikipedia.org/wiki/Nikki_Haley".to_string(),
                        title: Some("Wikipedia".to_string()),
                        kind: LinkKind::Wikipedia,
                    },
                    Link {
                        href: "https://www.nikkihaley.com".to_string(),
                        title: Some("Official Website".to_string()),
                        kind: LinkKind::Official,
                    },
                    Link {
                        href: "https://twitter.com/NikkiHaley".to_string(),
                        title: None,
                        kind: LinkKind::Twitter,
                    },
                ],
            },
        ];

        Self {
            races: vec![president, senate, house],
            candidates,
        }
    }

    pub fn races(&self) -> &[Race] {
        &self.races
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Look up a candidate by slug; unknown slugs are a `NotFound` error.
    pub fn candidate_by_slug(&self, slug: &str) -> Result<&Candidate> {
        self.candidates
            .iter()
            .find(|c| c.slug == slug)
            .ok_or_else(|| Error::NotFound(format!("candidate '{slug}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_slug() {
        let catalog = Catalog::builtin();
        let candidate = catalog.candidate_by_slug("nikki-haley").unwrap();
        assert_eq!(candidate.name, "Nikki Haley");
        assert_eq!(candidate.party, Party::Republican);
    }

    #[test]
    fn test_unknown_slug_is_not_found() {
        let catalog = Catalog::builtin();
        let err = catalog.candidate_by_slug("abe-lincoln").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_campaign_topic_format() {
        let catalog = Catalog::builtin();
        let candidate = catalog.candidate_by_slug("joe-biden").unwrap();
        assert_eq!(candidate.campaign_topic(), "Joe Biden 2024 Presidential Campaign");
    }

    #[test]
    fn test_slugs_unique() {
        let catalog = Catalog::builtin();
        let mut slugs: Vec<&str> = catalog.candidates().iter().map(|c| c.slug.as_str()).collect();
        slugs.sort_unstable();
        slugs.dedup();
        assert_eq!(slugs.len(), catalog.candidates().len());
    }

    #[test]
    fn test_every_candidate_runs_in_a_known_race() {
        let catalog = Catalog::builtin();
        for candidate in catalog.candidates() {
            assert!(catalog.races().iter().any(|r| r.slug == candidate.race.slug));
        }
    }
}
