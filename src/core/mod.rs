//! Core catalog and duel types

pub mod card;
pub mod cost;
pub mod dice;
pub mod effects;
pub mod element;
pub mod entity;
pub mod types;

pub use card::{CardDef, CardType, SkillDef, SkillType};
pub use cost::{Cost, CostAtom};
pub use dice::DicePool;
pub use effects::{
    CardEffect, DamageType, EffectTrigger, SkillEffect, StatusKind, StatusPayload, StatusSpec,
    StatusTarget, SummonSpec,
};
pub use element::{CardElement, DiceKind, Element};
pub use entity::{Entity, EntityStore};
pub use types::{CardId, CardName, Country, DuelId, PlayerId, Tag, WeaponType};
