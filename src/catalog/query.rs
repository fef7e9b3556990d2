//! Catalog query engine: filters, paging, random sampling and facets
//!
//! Queries run against one snapshot. Filters combine with AND; list-valued
//! filters (tags, search terms) require every entry to match. Results are
//! ordered by card type, then name, then id.

use crate::catalog::store::CatalogSnapshot;
use crate::core::{CardDef, CardElement, CardType, Country, CostAtom, Tag, WeaponType};
use crate::{Result, TcgError};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

pub const DEFAULT_PER_PAGE: usize = 20;
pub const MAX_PER_PAGE: usize = 100;

/// Card-type filter, including the aliases for "every action card"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardTypeFilter {
    Exact(CardType),
    NonCharacter,
}

impl CardTypeFilter {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "non_character" | "non-character" | "action" => Ok(CardTypeFilter::NonCharacter),
            _ => CardType::from_keyword(s)
                .map(CardTypeFilter::Exact)
                .ok_or_else(|| TcgError::InvalidFilter(format!("unknown card type '{s}'"))),
        }
    }

    fn matches(self, card_type: CardType) -> bool {
        match self {
            CardTypeFilter::Exact(t) => t == card_type,
            CardTypeFilter::NonCharacter => card_type.is_action(),
        }
    }
}

/// Energy-cost filter: a grouped cost value 0..=3, or anything else
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyCostFilter {
    Value(u8),
    Other,
}

impl EnergyCostFilter {
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("other") {
            return Ok(EnergyCostFilter::Other);
        }
        match s.parse::<u8>() {
            Ok(n) if n <= 3 => Ok(EnergyCostFilter::Value(n)),
            _ => Err(TcgError::InvalidFilter(format!(
                "energy_cost must be 0..3 or 'other', got '{s}'"
            ))),
        }
    }
}

/// Filter parameters as received from a caller; every field is optional text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawFilter {
    pub card_type: Option<String>,
    pub element: Option<String>,
    pub country: Option<String>,
    pub weapon_type: Option<String>,
    pub character_subtype: Option<String>,
    pub rarity: Option<u8>,
    pub tags: Vec<String>,
    pub search: Option<String>,
    pub energy_cost: Option<String>,
}

/// Typed query filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub card_type: Option<CardTypeFilter>,
    pub element: Option<CardElement>,
    pub country: Option<Country>,
    pub weapon_type: Option<WeaponType>,
    /// Whole subtype, compared case-insensitively
    pub character_subtype: Option<String>,
    pub rarity: Option<u8>,
    pub tags: Vec<Tag>,
    /// Lowercased whitespace-separated terms
    pub search_terms: Vec<String>,
    pub energy_cost: Option<EnergyCostFilter>,
}

impl TryFrom<RawFilter> for Filter {
    type Error = TcgError;

    fn try_from(raw: RawFilter) -> Result<Self> {
        let nonempty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Ok(Filter {
            card_type: nonempty(raw.card_type)
                .map(|s| CardTypeFilter::parse(&s))
                .transpose()?,
            element: nonempty(raw.element)
                .map(|s| {
                    CardElement::from_keyword(&s)
                        .ok_or_else(|| TcgError::InvalidFilter(format!("unknown element '{s}'")))
                })
                .transpose()?,
            country: nonempty(raw.country)
                .map(|s| {
                    Country::from_keyword(&s)
                        .ok_or_else(|| TcgError::InvalidFilter(format!("unknown country '{s}'")))
                })
                .transpose()?,
            weapon_type: nonempty(raw.weapon_type)
                .map(|s| {
                    WeaponType::from_keyword(&s).ok_or_else(|| {
                        TcgError::InvalidFilter(format!("unknown weapon type '{s}'"))
                    })
                })
                .transpose()?,
            character_subtype: nonempty(raw.character_subtype).map(|s| s.trim().to_lowercase()),
            rarity: raw.rarity,
            tags: raw
                .tags
                .iter()
                .filter(|t| !t.trim().is_empty())
                .map(|t| {
                    Tag::from_keyword(t)
                        .ok_or_else(|| TcgError::InvalidFilter(format!("unknown tag '{t}'")))
                })
                .collect::<Result<Vec<_>>>()?,
            search_terms: raw
                .search
                .unwrap_or_default()
                .split_whitespace()
                .map(str::to_lowercase)
                .collect(),
            energy_cost: nonempty(raw.energy_cost)
                .map(|s| EnergyCostFilter::parse(&s))
                .transpose()?,
        })
    }
}

impl Filter {
    pub fn matches(&self, card: &CardDef) -> bool {
        if let Some(t) = self.card_type {
            if !t.matches(card.card_type) {
                return false;
            }
        }
        if let Some(e) = self.element {
            if card.element != Some(e) {
                return false;
            }
        }
        if let Some(c) = self.country {
            if card.country != Some(c) {
                return false;
            }
        }
        if let Some(w) = self.weapon_type {
            if card.weapon_type != Some(w) {
                return false;
            }
        }
        if let Some(sub) = &self.character_subtype {
            if card.character_subtype.trim().to_lowercase() != *sub {
                return false;
            }
        }
        if let Some(r) = self.rarity {
            if card.rarity != r {
                return false;
            }
        }
        if !self.tags.iter().all(|t| card_has_tag(card, *t)) {
            return false;
        }
        if !self.search_terms.is_empty() {
            let haystack = search_text(card);
            if !self.search_terms.iter().all(|t| haystack.contains(t.as_str())) {
                return false;
            }
        }
        match self.energy_cost {
            None => true,
            Some(filter) => energy_cost_matches(card, filter),
        }
    }
}

/// A tag matches through the computed tag set or any of the card's texts
fn card_has_tag(card: &CardDef, tag: Tag) -> bool {
    card.has_tag(tag)
        || tag.occurs_in(card.card_type.as_str())
        || tag.occurs_in(&card.character_subtype)
        || tag.occurs_in(&card.description)
        || card.skills.iter().any(|s| tag.occurs_in(&s.description))
}

fn search_text(card: &CardDef) -> String {
    let mut text = format!(
        "{} {} {} {}",
        card.name, card.description, card.card_type, card.character_subtype
    );
    for skill in &card.skills {
        text.push(' ');
        text.push_str(&skill.name);
        text.push(' ');
        text.push_str(&skill.description);
    }
    text.to_lowercase()
}

/// Grouped dice values of every cost the card carries. An empty cost
/// contributes zero.
fn cost_values(card: &CardDef) -> Vec<u8> {
    let costs: Vec<&crate::core::Cost> = if card.skills.is_empty() {
        vec![&card.cost]
    } else {
        card.skills.iter().map(|s| &s.cost).collect()
    };
    let mut values = Vec::new();
    for cost in costs {
        let groups: Vec<u8> = cost
            .groups()
            .into_iter()
            .filter(|(atom, _)| *atom != CostAtom::Energy)
            .map(|(_, n)| n)
            .collect();
        if groups.is_empty() {
            values.push(0);
        } else {
            values.extend(groups);
        }
    }
    values
}

fn energy_cost_matches(card: &CardDef, filter: EnergyCostFilter) -> bool {
    let values = cost_values(card);
    match filter {
        EnergyCostFilter::Value(n) => values.contains(&n),
        EnergyCostFilter::Other => !values.iter().any(|v| *v <= 3),
    }
}

/// Page request; out-of-range values are clamped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    pub page: usize,
    pub per_page: usize,
}

impl Default for Paging {
    fn default() -> Self {
        Paging {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl Paging {
    pub fn new(page: usize, per_page: usize) -> Self {
        Paging { page, per_page }
    }

    fn normalized(self, max_per_page: usize) -> Paging {
        Paging {
            page: self.page.max(1),
            per_page: if self.per_page == 0 {
                DEFAULT_PER_PAGE.min(max_per_page)
            } else {
                self.per_page.min(max_per_page)
            },
        }
    }
}

/// One page of results with its paging metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub cards: Vec<T>,
    pub total: usize,
    pub pages: usize,
    pub current_page: usize,
    pub per_page: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

/// Filter values present in the catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub card_types: Vec<String>,
    pub elements: Vec<CardElement>,
    pub countries: Vec<Country>,
    pub weapon_types: Vec<WeaponType>,
    pub tags: Vec<Tag>,
}

/// Stateless query operations over a snapshot
pub struct QueryEngine<'a> {
    snapshot: &'a CatalogSnapshot,
    max_per_page: usize,
}

impl<'a> QueryEngine<'a> {
    pub fn new(snapshot: &'a CatalogSnapshot) -> Self {
        QueryEngine {
            snapshot,
            max_per_page: MAX_PER_PAGE,
        }
    }

    pub fn with_max_per_page(mut self, max_per_page: usize) -> Self {
        self.max_per_page = max_per_page.max(1);
        self
    }

    /// Every matching card in the stable order
    pub fn matching(&self, filter: &Filter) -> Vec<Arc<CardDef>> {
        let mut cards: Vec<Arc<CardDef>> = self
            .snapshot
            .cards()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        cards.sort_by(|a, b| {
            a.card_type
                .cmp(&b.card_type)
                .then_with(|| a.name.as_str().cmp(b.name.as_str()))
                .then_with(|| a.id.as_str().cmp(b.id.as_str()))
        });
        cards
    }

    /// One page of matching cards. A page past the end is empty, not an error.
    pub fn query(&self, filter: &Filter, paging: Paging) -> Page<Arc<CardDef>> {
        let paging = paging.normalized(self.max_per_page);
        let all = self.matching(filter);
        let total = all.len();
        let pages = total.div_ceil(paging.per_page);
        let start = (paging.page - 1).saturating_mul(paging.per_page);
        let cards: Vec<Arc<CardDef>> = all.into_iter().skip(start).take(paging.per_page).collect();
        Page {
            cards,
            total,
            pages,
            current_page: paging.page,
            per_page: paging.per_page,
            has_next: paging.page < pages,
            has_prev: paging.page > 1,
        }
    }

    /// Up to `k` distinct matching cards chosen uniformly
    pub fn random<R: Rng + ?Sized>(
        &self,
        filter: &Filter,
        k: usize,
        rng: &mut R,
    ) -> Vec<Arc<CardDef>> {
        let all = self.matching(filter);
        all.choose_multiple(rng, k.min(all.len())).cloned().collect()
    }

    /// Distinct values of each filterable field, sorted
    pub fn filter_options(&self) -> FilterOptions {
        let mut card_types: BTreeSet<&'static str> = BTreeSet::new();
        let mut elements = BTreeSet::new();
        let mut countries = BTreeSet::new();
        let mut weapon_types = BTreeSet::new();
        let mut tags = BTreeSet::new();
        for card in self.snapshot.cards() {
            card_types.insert(card.card_type.as_str());
            elements.extend(card.element);
            countries.extend(card.country);
            weapon_types.extend(card.weapon_type);
            tags.extend(card.tags.iter().copied());
        }
        let mut card_types: Vec<String> = card_types.into_iter().map(str::to_string).collect();
        card_types.push("action".to_string());
        card_types.push("non_character".to_string());
        card_types.sort();
        FilterOptions {
            card_types,
            elements: elements.into_iter().collect(),
            countries: countries.into_iter().collect(),
            weapon_types: weapon_types.into_iter().collect(),
            tags: tags.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::store::CatalogStore;
    use crate::core::{CardId, Cost, Element, SkillDef, SkillEffect, SkillType};

    fn character(id: &str, name: &str, element: Element, costs: &[&str]) -> CardDef {
        let mut card = CardDef::new(CardId::new(id), name, CardType::Character);
        card.element = Some(CardElement::Elemental(element));
        for (i, cost) in costs.iter().enumerate() {
            card.skills.push(SkillDef {
                id: format!("{id}/{i}"),
                name: format!("{name} skill {i}"),
                skill_type: SkillType::ElementalSkill,
                cost: Cost::parse(cost).unwrap(),
                description: String::new(),
                effect: SkillEffect::default(),
            });
        }
        card
    }

    fn store() -> CatalogStore {
        let store = CatalogStore::new();
        let mut events: Vec<CardDef> = (0..25)
            .map(|i| CardDef::new(CardId::new(format!("e{i}")), format!("Event {i:02}"), CardType::Event))
            .collect();
        events[0].description = "Food: heal 1 HP".to_string();
        let mut cards = vec![
            character("ganyu", "Ganyu", Element::Cryo, &["1cryo 2unaligned", "3cryo"]),
            character("diluc", "Diluc", Element::Pyro, &["1pyro 2unaligned", "4pyro"]),
        ];
        cards.append(&mut events);
        store.upsert_batch(cards);
        store
    }

    #[test]
    fn test_paging() {
        let store = store();
        let snapshot = store.snapshot();
        let engine = QueryEngine::new(&snapshot);
        let filter = Filter::try_from(RawFilter {
            card_type: Some("non_character".to_string()),
            ..RawFilter::default()
        })
        .unwrap();
        let page = engine.query(&filter, Paging::new(2, 10));
        assert_eq!(page.total, 25);
        assert_eq!(page.pages, 3);
        assert_eq!(page.cards.len(), 10);
        assert!(page.has_next && page.has_prev);
        assert_eq!(page.cards[0].name.as_str(), "Event 10");

        let past = engine.query(&filter, Paging::new(9, 10));
        assert!(past.cards.is_empty());
        assert!(!past.has_next);

        let capped = engine.query(&filter, Paging::new(1, 1000));
        assert_eq!(capped.per_page, MAX_PER_PAGE);
    }

    #[test]
    fn test_energy_cost_filter() {
        let store = store();
        let snapshot = store.snapshot();
        let engine = QueryEngine::new(&snapshot);
        let three = Filter {
            energy_cost: Some(EnergyCostFilter::Value(3)),
            ..Filter::default()
        };
        let names: Vec<String> = engine.matching(&three).iter().map(|c| c.name.to_string()).collect();
        assert_eq!(names, vec!["Ganyu"]);

        let other = Filter {
            card_type: Some(CardTypeFilter::Exact(CardType::Character)),
            energy_cost: Some(EnergyCostFilter::Other),
            ..Filter::default()
        };
        assert!(engine.matching(&other).is_empty());

        let zero = Filter {
            energy_cost: Some(EnergyCostFilter::Value(0)),
            ..Filter::default()
        };
        assert_eq!(engine.matching(&zero).len(), 25);
    }

    #[test]
    fn test_invalid_filter_values() {
        assert!(EnergyCostFilter::parse("7").is_err());
        let raw = RawFilter {
            tags: vec!["sparkly".to_string()],
            ..RawFilter::default()
        };
        assert_eq!(Filter::try_from(raw).unwrap_err().kind(), crate::ErrorKind::Validation);
    }

    #[test]
    fn test_tag_and_search() {
        let store = store();
        let snapshot = store.snapshot();
        let engine = QueryEngine::new(&snapshot);
        let food = Filter {
            tags: vec![Tag::Food],
            ..Filter::default()
        };
        assert_eq!(engine.matching(&food).len(), 1);

        let search = Filter {
            search_terms: vec!["ganyu".to_string(), "skill".to_string()],
            ..Filter::default()
        };
        assert_eq!(engine.matching(&search).len(), 1);
    }

    #[test]
    fn test_random_is_distinct() {
        use rand::SeedableRng;
        let store = store();
        let snapshot = store.snapshot();
        let engine = QueryEngine::new(&snapshot);
        let mut rng = rand_chacha::ChaCha12Rng::seed_from_u64(7);
        let picks = engine.random(&Filter::default(), 5, &mut rng);
        let ids: BTreeSet<&str> = picks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids.len(), 5);
        assert_eq!(engine.random(&Filter::default(), 500, &mut rng).len(), 27);
    }

    #[test]
    fn test_filter_options() {
        let store = store();
        let snapshot = store.snapshot();
        let options = QueryEngine::new(&snapshot).filter_options();
        assert!(options.card_types.contains(&"non_character".to_string()));
        assert!(options.card_types.contains(&"character".to_string()));
        assert_eq!(
            options.elements,
            vec![CardElement::Elemental(Element::Cryo), CardElement::Elemental(Element::Pyro)]
        );
    }
}
