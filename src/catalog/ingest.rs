//! Catalog ingestion from scraped JSON dumps
//!
//! A dump is an object with up to four sections (`characters`, `equipments`,
//! `supports`, `events`), each an array of raw records. Records are
//! normalized one at a time: a malformed record is skipped, counted and
//! logged, and never aborts the rest of the job. The good records of a job
//! are committed to the store in one atomic batch.

use crate::catalog::store::{CatalogStore, UpsertOutcome};
use crate::core::{
    CardDef, CardEffect, CardElement, CardId, CardType, Cost, CostAtom, Country, DamageType,
    EffectTrigger, Element, SkillDef, SkillEffect, SkillType, StatusSpec, SummonSpec, Tag,
    WeaponType,
};
use crate::{Result, TcgError};
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level sections of a dump, in processing order
const SECTIONS: [&str; 4] = ["characters", "equipments", "supports", "events"];

/// Cost marker of anomaly characters (Primordial Force)
const ANOMALY_MARKER: &str = "始基力";

#[derive(Debug, Clone, Deserialize)]
struct RawCost {
    #[serde(rename = "type")]
    kind: String,
    value: u8,
}

#[derive(Debug, Clone, Deserialize)]
struct RawSkill {
    name: String,
    #[serde(default, rename = "type")]
    skill_type: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    cost: Vec<RawCost>,
    #[serde(default)]
    damage: Option<u8>,
    #[serde(default)]
    damage_type: Option<String>,
    #[serde(default)]
    element_application: Option<String>,
    #[serde(default)]
    status_applied: Option<StatusSpec>,
    #[serde(default)]
    summon: Option<SummonSpec>,
    #[serde(default)]
    shield: Option<u8>,
    #[serde(default)]
    heal: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawCard {
    #[serde(default)]
    id: Option<String>,
    name: String,
    description: String,
    skills: Vec<RawSkill>,
    #[serde(default, alias = "type")]
    card_type: Option<String>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    weapon: Option<String>,
    #[serde(default)]
    element: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    detail_type: Option<String>,
    #[serde(default)]
    subtype: Option<String>,
    /// Owning character of a talent card
    #[serde(default)]
    character: Option<String>,
    #[serde(default)]
    cost: Vec<RawCost>,
    #[serde(default)]
    rarity: Option<u8>,
    #[serde(default, alias = "hp")]
    health: Option<u8>,
    #[serde(default)]
    energy: Option<u8>,
    #[serde(default)]
    tags: Vec<String>,
    /// Structured effect; overrides description extraction when present
    #[serde(default)]
    effect: Option<CardEffect>,
}

/// A record the ingestor refused
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecord {
    pub section: String,
    pub index: usize,
    pub name: Option<String>,
    pub reason: String,
}

/// Summary of one ingest job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Records that normalized and were committed
    pub accepted: usize,
    pub inserted: usize,
    pub updated: usize,
    pub skipped: Vec<SkippedRecord>,
}

impl IngestReport {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    fn absorb(&mut self, other: IngestReport) {
        self.accepted += other.accepted;
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.skipped.extend(other.skipped);
    }
}

/// Compiled description patterns for effect extraction
///
/// Each pattern has a Chinese and an English form; the first capture group is
/// the amount.
#[derive(Debug, Clone)]
struct EffectScanner {
    damage_zh: Regex,
    damage_en: Regex,
    heal_zh: Regex,
    heal_en: Regex,
    shield_zh: Regex,
    shield_en: Regex,
    draw_zh: Regex,
    draw_en: Regex,
    energy_zh: Regex,
    energy_en: Regex,
    omni_zh: Regex,
    omni_en: Regex,
    usages_zh: Regex,
    usages_en: Regex,
    bonus_zh: Regex,
    bonus_en: Regex,
    survive: Regex,
    end_phase: Regex,
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| TcgError::InvalidConfig(format!("bad effect pattern {pattern:?}: {e}")))
}

fn first_number(re: &Regex, text: &str) -> Option<u8> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

impl EffectScanner {
    fn new() -> Result<Self> {
        Ok(EffectScanner {
            damage_zh: compile(r"造成(\d+)点(物理|穿透|冰|水|火|雷|风|岩|草)(?:元素)?伤害")?,
            damage_en: compile(
                r"(?i)deals?\s+(\d+)\s+(physical|piercing|cryo|hydro|pyro|electro|anemo|geo|dendro)\s+dmg",
            )?,
            heal_zh: compile(r"治疗[^，。\d]*?(\d+)点")?,
            heal_en: compile(r"(?i)heals?\s+[^.\d]*?(\d+)\s*hp")?,
            shield_zh: compile(r"(\d+)点(?:护盾|黄盾|紫盾)")?,
            shield_en: compile(r"(?i)(\d+)\s+shield\s+points?")?,
            draw_zh: compile(r"抓(\d+)张")?,
            draw_en: compile(r"(?i)draw\s+(\d+)\s+cards?")?,
            energy_zh: compile(r"(?:获得|充能)(\d+)点充能")?,
            energy_en: compile(r"(?i)gains?\s+(\d+)\s+energy")?,
            omni_zh: compile(r"生成(\d+)个万能元素")?,
            omni_en: compile(r"(?i)create\s+(\d+)\s+omni\s+element")?,
            usages_zh: compile(r"可用次数[：:]\s*(\d+)")?,
            usages_en: compile(r"(?i)usage\(s\):\s*(\d+)")?,
            bonus_zh: compile(r"伤害\+(\d+)")?,
            bonus_en: compile(r"(?i)deals?\s+\+(\d+)\s+dmg")?,
            survive: compile(r"(?i)免于被击倒|would be defeated")?,
            end_phase: compile(r"(?i)结束阶段|end phase")?,
        })
    }

    fn number(&self, zh: &Regex, en: &Regex, text: &str) -> Option<u8> {
        first_number(zh, text).or_else(|| first_number(en, text))
    }

    /// First damage clause: amount and type
    fn damage(&self, text: &str) -> Option<(u8, DamageType)> {
        for re in [&self.damage_zh, &self.damage_en] {
            if let Some(caps) = re.captures(text) {
                let amount = caps.get(1)?.as_str().parse().ok()?;
                let damage_type = DamageType::from_keyword(caps.get(2)?.as_str())?;
                return Some((amount, damage_type));
            }
        }
        None
    }

    fn skill_effect(&self, text: &str) -> SkillEffect {
        let mut effect = match self.damage(text) {
            Some((amount, damage_type)) => SkillEffect::damage(amount, damage_type),
            None => SkillEffect::default(),
        };
        effect.shield = self.number(&self.shield_zh, &self.shield_en, text).unwrap_or(0);
        effect.heal = self.number(&self.heal_zh, &self.heal_en, text).unwrap_or(0);
        effect
    }

    fn card_effect(&self, text: &str) -> CardEffect {
        let (damage, damage_type) = self.damage(text).unwrap_or((0, DamageType::Physical));
        CardEffect {
            damage,
            damage_type,
            heal: self.number(&self.heal_zh, &self.heal_en, text).unwrap_or(0),
            shield: self.number(&self.shield_zh, &self.shield_en, text).unwrap_or(0),
            draw: self.number(&self.draw_zh, &self.draw_en, text).unwrap_or(0),
            energy: self.number(&self.energy_zh, &self.energy_en, text).unwrap_or(0),
            omni_dice: self.number(&self.omni_zh, &self.omni_en, text).unwrap_or(0),
            damage_bonus: self.number(&self.bonus_zh, &self.bonus_en, text).unwrap_or(0),
            survive_once: self.survive.is_match(text),
            trigger: if self.end_phase.is_match(text) {
                EffectTrigger::EndPhase
            } else {
                EffectTrigger::OnPlay
            },
            usages: self.number(&self.usages_zh, &self.usages_en, text),
        }
    }
}

/// Normalizes raw dumps into card definitions and commits them
#[derive(Debug, Clone)]
pub struct Ingestor {
    scanner: EffectScanner,
}

impl Ingestor {
    pub fn new() -> Result<Self> {
        Ok(Ingestor {
            scanner: EffectScanner::new()?,
        })
    }

    /// Ingest one JSON document into `store`
    pub fn ingest_str(&self, store: &CatalogStore, json: &str) -> Result<IngestReport> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| TcgError::InvalidPayload(format!("catalog dump is not JSON: {e}")))?;
        self.ingest_value(store, &value)
    }

    pub fn ingest_value(
        &self,
        store: &CatalogStore,
        value: &serde_json::Value,
    ) -> Result<IngestReport> {
        let (cards, skipped) = self.normalize_dump(value)?;
        Ok(self.commit(store, cards, skipped))
    }

    pub fn ingest_file(&self, store: &CatalogStore, path: &Path) -> Result<IngestReport> {
        let contents = std::fs::read_to_string(path)?;
        self.ingest_str(store, &contents)
    }

    /// Ingest every `*.json` file under `dir`.
    ///
    /// Files are discovered with jwalk and normalized in parallel with rayon,
    /// then committed in path order so that re-running the same directory
    /// produces the same catalog. A file that is not a dump object counts as
    /// one skipped record.
    pub fn ingest_dir(&self, store: &CatalogStore, dir: &Path) -> Result<IngestReport> {
        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in jwalk::WalkDir::new(dir).sort(true) {
            let entry = entry
                .map_err(|e| TcgError::IoError(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?;
            let path = entry.path();
            if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let shards: Vec<(PathBuf, Result<(Vec<CardDef>, Vec<SkippedRecord>)>)> = paths
            .into_par_iter()
            .map(|path| {
                let parsed = std::fs::read_to_string(&path)
                    .map_err(TcgError::from)
                    .and_then(|text| {
                        serde_json::from_str::<serde_json::Value>(&text).map_err(TcgError::from)
                    })
                    .and_then(|value| self.normalize_dump(&value));
                (path, parsed)
            })
            .collect();

        let mut report = IngestReport::default();
        for (path, shard) in shards {
            match shard {
                Ok((cards, skipped)) => report.absorb(self.commit(store, cards, skipped)),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable dump");
                    report.skipped.push(SkippedRecord {
                        section: path.display().to_string(),
                        index: 0,
                        name: None,
                        reason: e.to_string(),
                    });
                }
            }
        }
        tracing::info!(
            accepted = report.accepted,
            skipped = report.skipped_count(),
            "directory ingest finished"
        );
        Ok(report)
    }

    fn commit(
        &self,
        store: &CatalogStore,
        cards: Vec<CardDef>,
        mut skipped: Vec<SkippedRecord>,
    ) -> IngestReport {
        let UpsertOutcome {
            inserted,
            updated,
            rejected,
        } = store.upsert_batch(cards);
        for (name, reason) in rejected {
            tracing::warn!(card = %name, %reason, "catalog rejected record");
            skipped.push(SkippedRecord {
                section: "commit".to_string(),
                index: 0,
                name: Some(name),
                reason,
            });
        }
        let report = IngestReport {
            accepted: inserted + updated,
            inserted,
            updated,
            skipped,
        };
        tracing::info!(
            inserted = report.inserted,
            updated = report.updated,
            skipped = report.skipped_count(),
            "ingest committed"
        );
        report
    }

    /// Normalize every record of a dump without touching any store
    fn normalize_dump(
        &self,
        value: &serde_json::Value,
    ) -> Result<(Vec<CardDef>, Vec<SkippedRecord>)> {
        let object = value.as_object().ok_or_else(|| {
            TcgError::InvalidPayload("catalog dump must be a JSON object".to_string())
        })?;
        let mut cards = Vec::new();
        let mut skipped = Vec::new();
        for section in SECTIONS {
            let Some(records) = object.get(section) else {
                continue;
            };
            let Some(records) = records.as_array() else {
                skipped.push(SkippedRecord {
                    section: section.to_string(),
                    index: 0,
                    name: None,
                    reason: format!("section '{section}' is not an array"),
                });
                continue;
            };
            for (index, record) in records.iter().enumerate() {
                match self.normalize_record(section, record) {
                    Ok(card) => cards.push(card),
                    Err(e) => {
                        let name = record
                            .get("name")
                            .and_then(|n| n.as_str())
                            .map(str::to_string);
                        tracing::warn!(section, index, name = ?name, error = %e, "skipping record");
                        skipped.push(SkippedRecord {
                            section: section.to_string(),
                            index,
                            name,
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }
        Ok((cards, skipped))
    }

    fn normalize_record(&self, section: &str, record: &serde_json::Value) -> Result<CardDef> {
        let raw: RawCard = serde_json::from_value(record.clone())
            .map_err(|e| TcgError::InvalidCardRecord(e.to_string()))?;
        let name = raw.name.trim();
        if name.is_empty() {
            return Err(TcgError::InvalidCardRecord("record has an empty name".to_string()));
        }
        let card_type = self.card_type(section, &raw)?;
        let id = raw
            .id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(CardId::new)
            .unwrap_or_else(CardId::generate);

        let mut card = CardDef::new(id, name, card_type);
        card.description = raw.description.clone();
        card.rarity = raw.rarity.unwrap_or(0);
        card.skills = self.skills(&card.id, &raw.skills, card_type)?;

        if card_type == CardType::Character {
            self.fill_character(&mut card, &raw)?;
        } else {
            self.fill_action(&mut card, &raw)?;
        }
        self.fill_tags(&mut card, &raw);
        card.check()?;
        Ok(card)
    }

    fn card_type(&self, section: &str, raw: &RawCard) -> Result<CardType> {
        match section {
            "characters" => Ok(CardType::Character),
            "supports" => Ok(CardType::Support),
            "events" => Ok(CardType::Event),
            _ => {
                // Equipment kind is spread over several loosely filled fields
                let text = [&raw.card_type, &raw.category, &raw.detail_type, &raw.subtype]
                    .into_iter()
                    .flatten()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(" ");
                let lower = text.to_lowercase();
                if text.contains("天赋") || lower.contains("talent") {
                    Ok(CardType::Talent)
                } else if text.contains("圣遗物") || lower.contains("artifact") {
                    Ok(CardType::Artifact)
                } else if text.contains("武器")
                    || lower.contains("weapon")
                    || WeaponType::find_in(&text).is_some()
                {
                    Ok(CardType::Weapon)
                } else {
                    Err(TcgError::InvalidCardRecord(format!(
                        "cannot tell equipment kind of '{}' from {text:?}",
                        raw.name
                    )))
                }
            }
        }
    }

    fn cost(&self, raw: &[RawCost]) -> Result<Cost> {
        let mut cost = Cost::new();
        for item in raw {
            let atom = if item.kind.contains(ANOMALY_MARKER) {
                CostAtom::Same
            } else {
                CostAtom::from_keyword(&item.kind).ok_or_else(|| {
                    TcgError::InvalidCardRecord(format!("unknown cost type '{}'", item.kind))
                })?
            };
            cost.push_group(atom, item.value);
        }
        Ok(cost)
    }

    fn skills(&self, card_id: &CardId, raw: &[RawSkill], card_type: CardType) -> Result<Vec<SkillDef>> {
        let mut skills = Vec::with_capacity(raw.len());
        for (index, skill) in raw.iter().enumerate() {
            let skill_type = match skill.skill_type.as_deref() {
                Some(t) => SkillType::from_keyword(t).ok_or_else(|| {
                    TcgError::InvalidCardRecord(format!("unknown skill type '{t}'"))
                })?,
                None if card_type == CardType::Character => {
                    return Err(TcgError::InvalidCardRecord(format!(
                        "skill '{}' has no type",
                        skill.name
                    )))
                }
                None => SkillType::Passive,
            };
            let mut effect = self.scanner.skill_effect(&skill.description);
            if let Some(damage) = skill.damage {
                effect.damage = damage;
            }
            if let Some(dt) = skill.damage_type.as_deref() {
                effect.damage_type = DamageType::from_keyword(dt).ok_or_else(|| {
                    TcgError::InvalidCardRecord(format!("unknown damage type '{dt}'"))
                })?;
                effect.element_application = effect.damage_type.element();
            }
            if let Some(e) = skill.element_application.as_deref() {
                effect.element_application = Some(Element::from_keyword(e).ok_or_else(|| {
                    TcgError::InvalidCardRecord(format!("unknown element '{e}'"))
                })?);
            }
            if skill.status_applied.is_some() {
                effect.status_applied = skill.status_applied.clone();
            }
            if skill.summon.is_some() {
                effect.summon = skill.summon.clone();
            }
            if let Some(shield) = skill.shield {
                effect.shield = shield;
            }
            if let Some(heal) = skill.heal {
                effect.heal = heal;
            }
            skills.push(SkillDef {
                id: format!("{card_id}/{index}"),
                name: skill.name.trim().to_string(),
                skill_type,
                cost: self.cost(&skill.cost)?,
                description: skill.description.clone(),
                effect,
            });
        }
        Ok(skills)
    }

    fn fill_character(&self, card: &mut CardDef, raw: &RawCard) -> Result<()> {
        let region = raw
            .region
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| {
                TcgError::InvalidCardRecord(format!("character '{}' has no region", raw.name))
            })?;
        if !raw.cost.is_empty() {
            return Err(TcgError::InvalidCardRecord(format!(
                "character '{}' carries a top-level cost",
                raw.name
            )));
        }
        let weapon = raw.weapon.as_deref().map(str::trim).unwrap_or("");
        card.character_subtype = [region, weapon]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        card.country = Country::find_in(region);
        card.weapon_type = WeaponType::find_in(weapon).or_else(|| WeaponType::find_in(region));
        card.element = self.character_element(card, raw);
        let health = raw.health.unwrap_or(10);
        if health == 0 {
            return Err(TcgError::InvalidCardRecord(format!(
                "character '{}' has no health",
                raw.name
            )));
        }
        card.health_max = Some(health);
        card.energy_max = Some(raw.energy.unwrap_or_else(|| {
            card.skills
                .iter()
                .find(|s| s.skill_type == SkillType::ElementalBurst)
                .map(|s| s.cost.energy_count())
                .filter(|&n| n > 0)
                .unwrap_or(2)
        }));
        Ok(())
    }

    fn character_element(&self, card: &CardDef, raw: &RawCard) -> Option<CardElement> {
        if let Some(explicit) = raw.element.as_deref().and_then(CardElement::from_keyword) {
            return Some(explicit);
        }
        let anomaly = |text: &str| {
            if !text.contains(ANOMALY_MARKER) {
                None
            } else if text.contains("荒性") {
                Some(CardElement::AnomalyWild)
            } else if text.contains("芒性") {
                Some(CardElement::AnomalyBloom)
            } else {
                None
            }
        };
        if let Some(found) = raw.region.as_deref().and_then(anomaly) {
            return Some(found);
        }
        let first = raw.skills.first()?;
        if let Some(found) = first.cost.iter().find_map(|c| anomaly(&c.kind)) {
            return Some(found);
        }
        // First skill decides; later skills only fill in when it has no element
        card.skills
            .iter()
            .find_map(|s| s.cost.first_element())
            .map(CardElement::Elemental)
    }

    fn fill_action(&self, card: &mut CardDef, raw: &RawCard) -> Result<()> {
        card.cost = if raw.cost.is_empty() {
            raw.skills
                .first()
                .map(|s| self.cost(&s.cost))
                .transpose()?
                .unwrap_or_default()
        } else {
            self.cost(&raw.cost)?
        };
        card.character_subtype = match card.card_type {
            CardType::Talent => raw
                .character
                .as_deref()
                .or(raw.detail_type.as_deref())
                .or(raw.subtype.as_deref())
                .unwrap_or("")
                .trim()
                .to_string(),
            _ => [&raw.category, &raw.detail_type, &raw.subtype]
                .into_iter()
                .flatten()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
        };
        if card.card_type == CardType::Weapon {
            let text = [&raw.weapon, &raw.detail_type, &raw.subtype, &raw.category]
                .into_iter()
                .flatten()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" ");
            card.weapon_type = WeaponType::find_in(&text);
        }
        if card.card_type == CardType::Talent && card.character_subtype.is_empty() {
            return Err(TcgError::InvalidCardRecord(format!(
                "talent '{}' names no character",
                raw.name
            )));
        }

        card.effect = match &raw.effect {
            Some(effect) => effect.clone(),
            None => {
                let mut text = raw.description.clone();
                for skill in &raw.skills {
                    text.push('\n');
                    text.push_str(&skill.description);
                }
                let mut effect = self.scanner.card_effect(&text);
                if card.card_type == CardType::Talent && effect.damage_bonus == 0 {
                    effect.damage_bonus = 1;
                }
                if card.card_type != CardType::Support {
                    effect.trigger = EffectTrigger::OnPlay;
                }
                effect
            }
        };
        if card.card_type.is_equipment() {
            // Equipment damage text describes the holder's bonus, not a hit
            if card.effect.damage > 0 && card.effect.damage_bonus == 0 {
                card.effect.damage_bonus = 1;
            }
            card.effect.damage = 0;
        }
        Ok(())
    }

    fn fill_tags(&self, card: &mut CardDef, raw: &RawCard) {
        let mut texts: Vec<&str> = vec![&card.character_subtype, &card.description];
        texts.extend(raw.category.as_deref());
        texts.extend(raw.subtype.as_deref());
        texts.extend(card.skills.iter().map(|s| s.description.as_str()));
        let scanned: Vec<Tag> = texts.into_iter().flat_map(Tag::scan).collect();
        card.tags.extend(scanned);
        card.tags
            .extend(raw.tags.iter().filter_map(|t| Tag::from_keyword(t)));
        if card.card_type.is_equipment() {
            card.tags.insert(Tag::Equipment);
        }
        let resonance_name =
            card.name.as_str().contains("元素共鸣") || card.name.to_lowercase().contains("resonance");
        if card.card_type == CardType::Event && resonance_name {
            card.tags.insert(Tag::Resonance);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ingest(value: serde_json::Value) -> (CatalogStore, IngestReport) {
        let store = CatalogStore::new();
        let report = Ingestor::new().unwrap().ingest_value(&store, &value).unwrap();
        (store, report)
    }

    fn ganyu() -> serde_json::Value {
        json!({
            "name": "甘雨",
            "description": "",
            "region": "璃月",
            "weapon": "弓",
            "skills": [
                {"name": "流天射术", "type": "普通攻击", "description": "造成2点物理伤害。",
                 "cost": [{"type": "冰", "value": 1}, {"type": "无色", "value": 2}]},
                {"name": "山泽麟迹", "type": "元素战技", "description": "造成1点冰元素伤害，生成1点护盾。",
                 "cost": [{"type": "冰", "value": 3}]},
                {"name": "降众天华", "type": "元素爆发", "description": "造成2点冰元素伤害。",
                 "cost": [{"type": "冰", "value": 3}, {"type": "充能", "value": 2}]}
            ]
        })
    }

    #[test]
    fn test_character_normalization() {
        let (store, report) = ingest(json!({ "characters": [ganyu()] }));
        assert_eq!(report.inserted, 1);
        assert!(report.skipped.is_empty());

        let snapshot = store.snapshot();
        let card = snapshot.find_by_name("甘雨", CardType::Character).unwrap();
        assert_eq!(card.dice_element(), Some(Element::Cryo));
        assert_eq!(card.country, Some(Country::Liyue));
        assert_eq!(card.weapon_type, Some(WeaponType::Bow));
        assert_eq!(card.energy_capacity(), 2);
        assert_eq!(card.skills[0].id, format!("{}/0", card.id));
        assert_eq!(card.skills[0].effect.damage, 2);
        assert_eq!(card.skills[0].effect.damage_type, DamageType::Physical);
        assert_eq!(card.skills[1].effect.damage_type, DamageType::Elemental(Element::Cryo));
        assert_eq!(card.skills[1].effect.shield, 1);
        assert!(card.cost.is_empty());
    }

    #[test]
    fn test_malformed_records_are_skipped() {
        let (store, report) = ingest(json!({
            "characters": [
                ganyu(),
                {"name": "无名", "description": "", "skills": []},
                {"description": "no name", "region": "蒙德", "skills": []}
            ],
            "events": [
                {"name": "Strategize", "description": "Draw 2 cards.", "skills": [],
                 "cost": [{"type": "mystery", "value": 1}]}
            ]
        }));
        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped_count(), 3);
        assert_eq!(store.snapshot().len(), 1);
        assert!(report.skipped.iter().any(|s| s.reason.contains("unknown cost type")));
    }

    #[test]
    fn test_event_effect_extraction() {
        let (store, _) = ingest(json!({
            "events": [
                {"name": "Strategize", "description": "Draw 2 cards.", "skills": [],
                 "cost": [{"type": "same", "value": 1}]},
                {"name": "Blazing Strike", "description": "Deals 1 Pyro DMG to the opposing active character.",
                 "skills": [], "cost": [{"type": "unaligned", "value": 2}]}
            ]
        }));
        let snapshot = store.snapshot();
        let strategize = snapshot.find_by_name("Strategize", CardType::Event).unwrap();
        assert_eq!(strategize.effect.draw, 2);
        assert_eq!(strategize.cost.to_string(), "1same");
        let strike = snapshot.find_by_name("Blazing Strike", CardType::Event).unwrap();
        assert_eq!(strike.effect.damage, 1);
        assert_eq!(strike.effect.damage_type, DamageType::Elemental(Element::Pyro));
    }

    #[test]
    fn test_support_end_phase_trigger() {
        let (store, _) = ingest(json!({
            "supports": [
                {"name": "Liyue Harbor Wharf", "category": "Location",
                 "description": "End Phase: Draw 2 cards. Usage(s): 2", "skills": [],
                 "cost": [{"type": "same", "value": 2}]}
            ]
        }));
        let snapshot = store.snapshot();
        let wharf = snapshot.find_by_name("Liyue Harbor Wharf", CardType::Support).unwrap();
        assert_eq!(wharf.effect.trigger, EffectTrigger::EndPhase);
        assert_eq!(wharf.effect.usages, Some(2));
        assert_eq!(wharf.effect.draw, 2);
        assert!(wharf.has_tag(Tag::Location));
    }

    #[test]
    fn test_equipment_kind_detection() {
        let (store, report) = ingest(json!({
            "characters": [ganyu()],
            "equipments": [
                {"name": "Sacrificial Bow", "category": "Weapon", "detail_type": "Bow",
                 "description": "The character deals +1 DMG.", "skills": [],
                 "cost": [{"type": "same", "value": 3}]},
                {"name": "Undivided Heart", "category": "Talent", "character": "甘雨",
                 "description": "", "skills": [], "cost": [{"type": "冰", "value": 1}]},
                {"name": "Mystery Box", "category": "Trinket", "description": "", "skills": []}
            ]
        }));
        assert_eq!(report.inserted, 3);
        assert_eq!(report.skipped_count(), 1);
        let snapshot = store.snapshot();
        let bow = snapshot.find_by_name("Sacrificial Bow", CardType::Weapon).unwrap();
        assert_eq!(bow.weapon_type, Some(WeaponType::Bow));
        assert_eq!(bow.effect.damage_bonus, 1);
        let talent = snapshot.find_by_name("Undivided Heart", CardType::Talent).unwrap();
        assert_eq!(talent.character_subtype, "甘雨");
        assert!(talent.has_tag(Tag::Equipment));
    }

    #[test]
    fn test_anomaly_marker() {
        let (store, _) = ingest(json!({
            "characters": [{
                "name": "Anomaly", "description": "", "region": "始基力：荒性",
                "skills": [{"name": "Strike", "type": "normal_attack", "description": "",
                            "cost": [{"type": "始基力：荒性", "value": 1}]}]
            }]
        }));
        let snapshot = store.snapshot();
        let card = snapshot.find_by_name("Anomaly", CardType::Character).unwrap();
        assert_eq!(card.element, Some(CardElement::AnomalyWild));
        assert_eq!(card.dice_element(), None);
    }

    fn character(name: &str, skill_costs: &[&str]) -> serde_json::Value {
        let skills: Vec<_> = skill_costs
            .iter()
            .enumerate()
            .map(|(i, kind)| {
                let skill_type = if i == 0 { "普通攻击" } else { "元素战技" };
                json!({"name": format!("{name} {i}"), "type": skill_type, "description": "",
                       "cost": [{"type": kind, "value": 3}]})
            })
            .collect();
        json!({"name": name, "description": "", "region": "蒙德", "skills": skills})
    }

    #[test]
    fn test_element_falls_back_to_later_skills() {
        let (store, report) = ingest(json!({
            "characters": [
                character("Late Cryo", &["无色", "冰"]),
                character("Colorless", &["无色", "无色"])
            ]
        }));
        assert_eq!(report.inserted, 2);
        let snapshot = store.snapshot();
        let late = snapshot.find_by_name("Late Cryo", CardType::Character).unwrap();
        assert_eq!(late.element, Some(CardElement::Elemental(Element::Cryo)));
        let colorless = snapshot.find_by_name("Colorless", CardType::Character).unwrap();
        assert_eq!(colorless.element, None);
    }

    #[test]
    fn test_zero_health_character_is_skipped() {
        let mut broken = ganyu();
        broken["name"] = json!("Hollow");
        broken["hp"] = json!(0);
        let (store, report) = ingest(json!({ "characters": [ganyu(), broken] }));
        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped_count(), 1);
        assert!(report.skipped[0].reason.contains("no health"));
        assert!(store.snapshot().find_by_name("Hollow", CardType::Character).is_none());
    }

    #[test]
    fn test_not_an_object() {
        let store = CatalogStore::new();
        let err = Ingestor::new().unwrap().ingest_str(&store, "[1, 2]").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Validation);
    }
}
