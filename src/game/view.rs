//! Viewer projection of a duel
//!
//! A viewer sees their own hand, dice and flags in full. For the opponent
//! only counts are shown: hand size, deck size and dice count. Characters,
//! summons and supports are public on both sides.

use crate::core::{CardDef, CardId, DamageType, DicePool, Element, PlayerId};
use crate::game::character::{LiveCharacter, StatusInstance};
use crate::game::phase::Phase;
use crate::game::state::{DuelState, PlayerState, SummonInstance, Terminal, TurnFlags};
use crate::{Result, TcgError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardView {
    pub id: CardId,
    pub name: String,
}

impl From<&CardDef> for CardView {
    fn from(card: &CardDef) -> Self {
        CardView {
            id: card.id.clone(),
            name: card.name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterView {
    pub card: CardView,
    pub health: u8,
    pub health_max: u8,
    pub energy: u8,
    pub energy_max: u8,
    pub alive: bool,
    pub aura: Option<Element>,
    pub shield: u8,
    pub weapon: Option<CardView>,
    pub artifact: Option<CardView>,
    pub talent: Option<CardView>,
    pub statuses: Vec<StatusInstance>,
    pub has_full_stomach: bool,
}

impl From<&LiveCharacter> for CharacterView {
    fn from(c: &LiveCharacter) -> Self {
        let card = |slot: &Option<std::sync::Arc<CardDef>>| slot.as_deref().map(CardView::from);
        CharacterView {
            card: CardView::from(c.def.as_ref()),
            health: c.health,
            health_max: c.health_max,
            energy: c.energy,
            energy_max: c.energy_max,
            alive: c.alive,
            aura: c.aura,
            shield: c.shield,
            weapon: card(&c.weapon),
            artifact: card(&c.artifact),
            talent: card(&c.talent),
            statuses: c.statuses.clone(),
            has_full_stomach: c.has_full_stomach,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummonView {
    pub name: String,
    pub damage: u8,
    pub damage_type: DamageType,
    pub usages: u8,
}

impl From<&SummonInstance> for SummonView {
    fn from(s: &SummonInstance) -> Self {
        SummonView {
            name: s.name.clone(),
            damage: s.damage,
            damage_type: s.damage_type,
            usages: s.usages,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportView {
    pub card: CardView,
    pub usages: Option<u8>,
}

/// Fields both players may see
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicSide {
    pub player_id: PlayerId,
    pub characters: Vec<CharacterView>,
    pub active_character_index: usize,
    pub summons: Vec<SummonView>,
    pub supports: Vec<SupportView>,
    pub team_statuses: Vec<StatusInstance>,
    pub hand_size: usize,
    pub deck_size: usize,
    pub dice_count: usize,
    pub discard_size: usize,
    pub passed: bool,
}

impl From<&PlayerState> for PublicSide {
    fn from(p: &PlayerState) -> Self {
        PublicSide {
            player_id: p.player_id.clone(),
            characters: p.characters.iter().map(CharacterView::from).collect(),
            active_character_index: p.active_character_index,
            summons: p.summons.iter().map(SummonView::from).collect(),
            supports: p
                .supports
                .iter()
                .map(|s| SupportView {
                    card: CardView::from(s.def.as_ref()),
                    usages: s.usages,
                })
                .collect(),
            team_statuses: p.team_statuses.clone(),
            hand_size: p.hand.len(),
            deck_size: p.deck.len(),
            dice_count: p.dice.len(),
            discard_size: p.discard_pile.len(),
            passed: p.flags.passed,
        }
    }
}

/// The viewer's own side: public fields plus hand, dice and flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnSide {
    #[serde(flatten)]
    pub public: PublicSide,
    pub hand: Vec<CardView>,
    pub dice: DicePool,
    pub flags: TurnFlags,
}

/// A duel as seen by one seated player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuelView {
    pub viewer_side: usize,
    pub phase: Phase,
    pub round_number: u32,
    pub turn: u32,
    pub first_player_index: usize,
    pub active_player_index: usize,
    /// Side that must choose a new active character before play continues
    pub pending_choice: Option<usize>,
    pub terminal: Terminal,
    pub me: OwnSide,
    pub opponent: PublicSide,
}

impl DuelState {
    /// Project the duel for `viewer`; unseated viewers are rejected
    pub fn view_for(&self, viewer: &PlayerId) -> Result<DuelView> {
        let side = self
            .side_of(viewer)
            .ok_or_else(|| TcgError::WrongPlayer(format!("{viewer} is not seated in this duel")))?;
        let own = self.player(side);
        Ok(DuelView {
            viewer_side: side,
            phase: self.phase,
            round_number: self.round_number,
            turn: self.turn,
            first_player_index: self.first_player_index,
            active_player_index: self.active_player_index,
            pending_choice: self.pending_choice(),
            terminal: self.terminal.clone(),
            me: OwnSide {
                public: PublicSide::from(own),
                hand: own.hand.iter().map(|c| CardView::from(c.as_ref())).collect(),
                dice: own.dice.clone(),
                flags: own.flags.clone(),
            },
            opponent: PublicSide::from(self.player(DuelState::other(side))),
        })
    }
}
