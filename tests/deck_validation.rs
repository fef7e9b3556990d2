//! Deck validation against the fixture catalog

mod common;

use common::{catalog, deck, fixture};
use invokation_rs::core::CardId;
use invokation_rs::deck::{DeckList, DeckSpec, DeckValidator, RuleKey};
use invokation_rs::TcgError;

fn swap(deck: &mut DeckSpec, store: &invokation_rs::catalog::CatalogStore, from: &str, to: &str) {
    let replacement = store.by_id(&CardId::new(to)).unwrap();
    let list = if replacement.is_character() {
        &mut deck.characters
    } else {
        &mut deck.actions
    };
    let pos = list.iter().position(|c| c.id.as_str() == from).unwrap();
    list[pos] = replacement;
}

#[test]
fn test_fixture_decks_are_valid() {
    let store = catalog();
    for file in ["deck_liyue.txt", "deck_mondstadt.txt"] {
        let report = DeckValidator::validate(&deck(&store, file));
        assert!(report.valid, "{file}: {:?}", report.errors);
        assert!(report.suggestions.is_empty());
    }
}

#[test]
fn test_resonance_without_enough_characters() {
    let store = catalog();
    let report = DeckValidator::validate(&deck(&store, "deck_soothing_water.txt"));

    assert!(!report.valid);
    let rule = report.rule(RuleKey::ElementalResonance).unwrap();
    assert!(!rule.valid);
    assert!(rule.messages[0].contains("Elemental Resonance: Soothing Water"));
    for key in RuleKey::ALL {
        if key != RuleKey::ElementalResonance {
            assert!(report.rule(key).unwrap().valid, "{key:?} should pass");
        }
    }
    assert_eq!(report.suggestions.len(), 1);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["rules"]["elemental_resonance"]["valid"], false);
}

#[test]
fn test_second_legacy_copy_breaks_copy_limit() {
    let store = catalog();
    let mut spec = deck(&store, "deck_liyue.txt");
    swap(&mut spec, &store, "crossfire", "fresh-wind-of-freedom");

    let report = DeckValidator::validate(&spec);
    let rule = report.rule(RuleKey::CopyLimit).unwrap();
    assert!(!rule.valid);
    assert!(rule.messages[0].contains("Fresh Wind of Freedom"));
    assert!(report.rule(RuleKey::ActionCount).unwrap().valid);
}

#[test]
fn test_talent_without_its_character() {
    let store = catalog();
    let mut spec = deck(&store, "deck_mondstadt.txt");
    swap(&mut spec, &store, "mona", "sucrose");

    let report = DeckValidator::validate(&spec);
    let rule = report.rule(RuleKey::TalentBinding).unwrap();
    assert!(!rule.valid);
    // Two copies of the talent yield one message
    assert_eq!(rule.messages.len(), 1);
    assert!(rule.messages[0].contains("莫娜"));
}

#[test]
fn test_country_card_needs_two_countrymen() {
    let store = catalog();
    let mut spec = deck(&store, "deck_mondstadt.txt");
    swap(&mut spec, &store, "dawn-winery", "liyue-harbor-wharf");

    let report = DeckValidator::validate(&spec);
    let rule = report.rule(RuleKey::CountryBinding).unwrap();
    assert!(!rule.valid);
    assert!(rule.messages[0].contains("Liyue Harbor Wharf"));
}

#[test]
fn test_every_rule_reported_for_an_empty_deck() {
    let report = DeckValidator::validate(&DeckSpec::default());
    assert!(!report.valid);
    assert_eq!(report.rules.len(), RuleKey::ALL.len());
    assert!(!report.rule(RuleKey::CharacterCount).unwrap().valid);
    assert!(!report.rule(RuleKey::ActionCount).unwrap().valid);
    assert!(report.rule(RuleKey::CopyLimit).unwrap().valid);
}

#[test]
fn test_stats_of_mixed_language_deck() {
    let store = catalog();
    let stats = DeckValidator::stats(&deck(&store, "deck_mondstadt.txt"));
    assert_eq!(stats.total_cards, 33);
    assert_eq!(stats.character_count, 3);
    assert_eq!(stats.action_count, 30);
    assert!(stats.characters.contains(&"莫娜".to_string()));
    assert_eq!(stats.element_distribution.get("hydro"), Some(&1));
    assert_eq!(stats.element_distribution.get("pyro"), Some(&1));
    assert_eq!(stats.action_type_distribution.get("talent"), Some(&4));
    assert_eq!(stats.action_type_distribution.get("support"), Some(&6));
}

#[test]
fn test_deck_list_errors() {
    let store = catalog();
    let err = DeckList::parse("[Characters]\nGanyu\n[Sideboard]\nPaimon").unwrap_err();
    assert!(matches!(err, TcgError::InvalidDeckFormat(_)));

    let list = DeckList::parse("[Characters]\nGanyu\nNobody At All\n").unwrap();
    let err = list.resolve(&store.snapshot()).unwrap_err();
    assert!(matches!(err, TcgError::CardNotFound(_)));

    let list = DeckList::load_from_file(&fixture("deck_liyue.txt")).unwrap();
    assert_eq!(list.total_cards(), 33);
}
