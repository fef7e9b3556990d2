//! Ingesting the fixture dump: normalization, skips, upserts and persistence

mod common;

use common::{catalog, fixture};
use invokation_rs::catalog::{CatalogStore, Ingestor};
use invokation_rs::core::{
    CardElement, CardId, CardType, Country, EffectTrigger, Element, SkillType, Tag, WeaponType,
};
use std::path::PathBuf;

const ACCEPTED: usize = 32;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("invokation-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_fixture_dump_skips_malformed_records() {
    let store = CatalogStore::new();
    let report = Ingestor::new()
        .unwrap()
        .ingest_file(&store, &fixture("cards.json"))
        .unwrap();

    assert_eq!(report.accepted, ACCEPTED);
    assert_eq!(report.inserted, ACCEPTED);
    assert_eq!(report.updated, 0);
    assert_eq!(report.skipped_count(), 3);
    let mut sections: Vec<&str> = report.skipped.iter().map(|s| s.section.as_str()).collect();
    sections.sort();
    assert_eq!(sections, vec!["characters", "equipments", "events"]);
    let chaotic = report
        .skipped
        .iter()
        .find(|s| s.name.as_deref() == Some("Chaotic Cost"))
        .unwrap();
    assert!(chaotic.reason.contains("moonlight"));
    assert_eq!(store.snapshot().len(), ACCEPTED);
}

#[test]
fn test_reingest_updates_in_place() {
    let store = catalog();
    let version = store.snapshot().version();
    let report = Ingestor::new()
        .unwrap()
        .ingest_file(&store, &fixture("cards.json"))
        .unwrap();

    assert_eq!(report.inserted, 0);
    assert_eq!(report.updated, ACCEPTED);
    assert_eq!(store.snapshot().len(), ACCEPTED);
    assert!(store.snapshot().version() > version);
}

#[test]
fn test_character_fields_normalized() {
    let store = catalog();
    let ganyu = store.by_id(&CardId::new("ganyu")).unwrap();
    assert_eq!(ganyu.card_type, CardType::Character);
    assert_eq!(ganyu.country, Some(Country::Liyue));
    assert_eq!(ganyu.weapon_type, Some(WeaponType::Bow));
    assert_eq!(ganyu.element, Some(CardElement::Elemental(Element::Cryo)));
    assert_eq!(ganyu.health(), 10);
    assert_eq!(ganyu.energy_capacity(), 3);
    let ids: Vec<&str> = ganyu.skills.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["ganyu/0", "ganyu/1", "ganyu/2"]);
    assert_eq!(ganyu.skills[2].skill_type, SkillType::ElementalBurst);
    assert!(ganyu.has_tag(Tag::Character));
}

#[test]
fn test_chinese_character_and_talent() {
    let store = catalog();
    let mona = store.by_id(&CardId::new("mona")).unwrap();
    assert_eq!(mona.name.as_str(), "莫娜");
    assert_eq!(mona.country, Some(Country::Mondstadt));
    assert_eq!(mona.weapon_type, Some(WeaponType::Catalyst));
    assert_eq!(mona.dice_element(), Some(Element::Hydro));
    assert_eq!(mona.skills[0].skill_type, SkillType::NormalAttack);
    assert_eq!(mona.energy_capacity(), 3);

    let talent = store.by_id(&CardId::new("sunken-prophecy")).unwrap();
    assert_eq!(talent.card_type, CardType::Talent);
    assert_eq!(talent.character_subtype, "莫娜");
    assert!(talent.effect.damage_bonus >= 1);
    assert!(talent.has_tag(Tag::Equipment));
}

#[test]
fn test_action_card_effects() {
    let store = catalog();
    let wharf = store.by_id(&CardId::new("liyue-harbor-wharf")).unwrap();
    assert_eq!(wharf.card_type, CardType::Support);
    assert_eq!(wharf.effect.trigger, EffectTrigger::EndPhase);
    assert_eq!(wharf.effect.draw, 2);
    assert_eq!(wharf.effect.usages, Some(2));

    let bow = store.by_id(&CardId::new("raven-bow")).unwrap();
    assert_eq!(bow.card_type, CardType::Weapon);
    assert_eq!(bow.weapon_type, Some(WeaponType::Bow));
    assert_eq!(bow.effect.damage, 0);
    assert_eq!(bow.effect.damage_bonus, 1);

    let resonance = store.by_id(&CardId::new("soothing-water")).unwrap();
    assert!(resonance.has_tag(Tag::Resonance));
}

#[test]
fn test_directory_ingest_counts_unreadable_files() {
    let dir = scratch_dir("ingest-dir");
    std::fs::copy(fixture("cards.json"), dir.join("a-cards.json")).unwrap();
    std::fs::write(dir.join("b-broken.json"), "not json at all").unwrap();
    std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

    let store = CatalogStore::new();
    let report = Ingestor::new().unwrap().ingest_dir(&store, &dir).unwrap();

    assert_eq!(report.accepted, ACCEPTED);
    assert_eq!(report.skipped_count(), 4);
    assert!(report
        .skipped
        .iter()
        .any(|s| s.section.ends_with("b-broken.json")));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_save_then_load() {
    let dir = scratch_dir("save-load");
    let path = dir.join("catalog.json");
    let store = catalog();
    store.save(&path).unwrap();

    let loaded = CatalogStore::load(&path).unwrap();
    assert_eq!(loaded.snapshot().len(), ACCEPTED);
    assert_eq!(
        loaded.by_id(&CardId::new("ganyu")).unwrap(),
        store.by_id(&CardId::new("ganyu")).unwrap()
    );
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_load_async_matches_blocking_load() {
    let dir = scratch_dir("load-async");
    let path = dir.join("catalog.json");
    catalog().save(&path).unwrap();

    let loaded = CatalogStore::load_async(&path).await.unwrap();
    let wharf = loaded.by_id(&CardId::new("liyue-harbor-wharf")).unwrap();
    assert_eq!(wharf.effect.usages, Some(2));
    assert_eq!(loaded.snapshot().len(), ACCEPTED);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_character_element_and_health_rules() {
    let store = CatalogStore::new();
    let json = r#"{"characters": [
        {"name": "Late Bloomer", "description": "", "region": "Sumeru",
         "skills": [
            {"name": "Jab", "type": "normal_attack", "description": "",
             "cost": [{"type": "unaligned", "value": 3}]},
            {"name": "Vines", "type": "elemental_skill", "description": "",
             "cost": [{"type": "dendro", "value": 3}]}
         ]},
        {"name": "Bare Hands", "description": "", "region": "Monster",
         "skills": [{"name": "Jab", "type": "normal_attack", "description": "",
                     "cost": [{"type": "unaligned", "value": 3}]}]},
        {"name": "Ghost", "description": "", "region": "Monster", "hp": 0,
         "skills": [{"name": "Jab", "type": "normal_attack", "description": "",
                     "cost": [{"type": "unaligned", "value": 3}]}]}
    ]}"#;
    let report = Ingestor::new().unwrap().ingest_str(&store, json).unwrap();

    assert_eq!(report.accepted, 2);
    assert_eq!(report.skipped_count(), 1);
    assert_eq!(report.skipped[0].name.as_deref(), Some("Ghost"));

    let snapshot = store.snapshot();
    let late = snapshot.find_by_name("Late Bloomer", CardType::Character).unwrap();
    assert_eq!(late.element, Some(CardElement::Elemental(Element::Dendro)));
    let bare = snapshot.find_by_name("Bare Hands", CardType::Character).unwrap();
    assert_eq!(bare.element, None);
    assert_eq!(bare.health_max, Some(10));
}
