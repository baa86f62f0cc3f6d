use chrono::NaiveDate;
use tracing::{debug, info};

use crate::options::{ACCESSORIES, COLORS, HATS};
use crate::types::{Character, Customization};

/// Hats unlocked after `stages_cleared` stages: one at the start, one more per stage.
pub fn unlocked_hats(stages_cleared: u32) -> &'static [&'static str] {
    let count = (stages_cleared as usize).saturating_add(1).min(HATS.len());
    &HATS[..count]
}

/// Accessories unlocked after `stages_cleared` stages: one more every second stage.
pub fn unlocked_accessories(stages_cleared: u32) -> &'static [&'static str] {
    let count = (stages_cleared as usize / 2).saturating_add(1).min(ACCESSORIES.len());
    &ACCESSORIES[..count]
}

/// Colors are never gated.
pub fn unlocked_colors(_stages_cleared: u32) -> &'static [&'static str] {
    &COLORS
}

/// Owns the player profile and applies the mutations that change it.
/// The caller is responsible for persisting after each mutation.
#[derive(Debug, Clone, Default)]
pub struct CharacterStore {
    character: Character,
}

impl CharacterStore {
    pub fn new(character: Character) -> Self {
        Self { character }
    }

    pub fn character(&self) -> &Character {
        &self.character
    }

    pub fn record_stage_cleared(&mut self, today: NaiveDate) {
        self.character.stages_cleared = self.character.stages_cleared.saturating_add(1);
        let first_today = self.character.cleared_dates.insert(today);

        info!(
            stages_cleared = self.character.stages_cleared,
            date = %today,
            first_today = first_today,
            "Stage cleared"
        );
    }

    /// Merges the given fields into the profile.
    ///
    /// Values are not checked against the unlock tables; front-ends only offer
    /// unlocked options and selections made earlier must keep loading.
    pub fn apply_customization(&mut self, customization: Customization) {
        if let Some(color) = customization.color {
            self.character.color = color;
        }
        if let Some(hat) = customization.hat {
            self.character.hat = hat;
        }
        if let Some(accessory) = customization.accessory {
            self.character.accessory = accessory;
        }

        debug!(
            color = %self.character.color,
            hat = %self.character.hat,
            accessory = %self.character.accessory,
            "Customization applied"
        );
    }

    pub fn unlocked_hats(&self) -> &'static [&'static str] {
        unlocked_hats(self.character.stages_cleared)
    }

    pub fn unlocked_accessories(&self) -> &'static [&'static str] {
        unlocked_accessories(self.character.stages_cleared)
    }

    pub fn unlocked_colors(&self) -> &'static [&'static str] {
        unlocked_colors(self.character.stages_cleared)
    }

    pub fn cleared_on(&self, date: NaiveDate) -> bool {
        self.character.cleared_dates.contains(&date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_unlocked_hats_progression() {
        assert_eq!(unlocked_hats(0), &["none"]);
        assert_eq!(unlocked_hats(1), &["none", "Top Hat"]);
        assert_eq!(unlocked_hats(4).len(), HATS.len());
        assert_eq!(unlocked_hats(u32::MAX).len(), HATS.len());

        let mut previous = 0;
        for stages in 0..50 {
            let len = unlocked_hats(stages).len();
            assert!(len >= previous);
            assert!(len <= HATS.len());
            previous = len;
        }
    }

    #[test]
    fn test_unlocked_accessories_progression() {
        assert_eq!(unlocked_accessories(0), &["none"]);
        assert_eq!(unlocked_accessories(1), &["none"]);
        assert_eq!(unlocked_accessories(2), &["none", "Glasses"]);
        assert_eq!(unlocked_accessories(6).len(), ACCESSORIES.len());
        assert_eq!(unlocked_accessories(1000).len(), ACCESSORIES.len());
    }

    #[test]
    fn test_record_stage_cleared_same_day() {
        let mut store = CharacterStore::default();
        let today = date(2026, 10, 18);

        store.record_stage_cleared(today);
        store.record_stage_cleared(today);

        assert_eq!(store.character().stages_cleared, 2);
        assert_eq!(store.character().cleared_dates.len(), 1);
        assert!(store.cleared_on(today));
    }

    #[test]
    fn test_record_stage_cleared_across_days() {
        let mut store = CharacterStore::default();
        store.record_stage_cleared(date(2026, 10, 17));
        store.record_stage_cleared(date(2026, 10, 18));
        assert_eq!(store.character().cleared_dates.len(), 2);
        assert_eq!(store.unlocked_hats().len(), 3);
    }

    #[test]
    fn test_apply_customization_merges() {
        let mut store = CharacterStore::default();
        store.apply_customization(Customization::hat("Crown"));
        store.apply_customization(Customization::color("#ef4444"));

        let character = store.character();
        assert_eq!(character.hat, "Crown");
        assert_eq!(character.color, "#ef4444");
        assert_eq!(character.accessory, "none");
        // Not unlocked at zero stages, kept anyway
        assert!(!store.unlocked_hats().contains(&"Crown"));
    }
}
