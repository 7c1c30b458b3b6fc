//! Level progression: converts accumulated experience into level-ups.

use crate::game::types::PlayerRecord;

/// Experience required to clear the given level.
///
/// Strictly increasing in `level`; level 5 requires 600, matching the
/// seeded progression curve.
pub fn experience_to_next(level: u32) -> u64 {
    100 + 100 * u64::from(level)
}

/// Add experience and resolve any resulting level-ups.
///
/// Overflow carries the remainder into the next level rather than
/// resetting, and large awards may clear several levels at once.
/// Returns the number of levels gained.
pub fn award_experience(player: &mut PlayerRecord, amount: u64) -> u32 {
    player.experience += amount;
    let mut gained = 0;
    while player.experience >= player.experience_to_next {
        player.experience -= player.experience_to_next;
        player.level += 1;
        player.experience_to_next = experience_to_next(player.level);
        gained += 1;
    }
    gained
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player_at(level: u32, experience: u64) -> PlayerRecord {
        let mut player = PlayerRecord::new("p1", "Alice");
        player.level = level;
        player.experience = experience;
        player.experience_to_next = experience_to_next(level);
        player
    }

    #[test]
    fn curve_is_strictly_increasing() {
        for level in 1..100 {
            assert!(experience_to_next(level + 1) > experience_to_next(level));
        }
    }

    #[test]
    fn small_award_does_not_level() {
        let mut player = player_at(1, 0);
        assert_eq!(award_experience(&mut player, 50), 0);
        assert_eq!(player.level, 1);
        assert_eq!(player.experience, 50);
    }

    #[test]
    fn overflow_carries_remainder() {
        // Level 5 at 450/600; +200 clears the 600 threshold and carries
        // the remaining 50 into level 6 with a larger threshold.
        let mut player = player_at(5, 450);
        assert_eq!(player.experience_to_next, 600);

        let gained = award_experience(&mut player, 200);
        assert_eq!(gained, 1);
        assert_eq!(player.level, 6);
        assert_eq!(player.experience, 50);
        assert_eq!(player.experience_to_next, 700);
    }

    #[test]
    fn large_award_clears_multiple_levels() {
        let mut player = player_at(1, 0);
        // 200 (lvl 1) + 300 (lvl 2) = 500 consumed, 100 carried into level 3.
        let gained = award_experience(&mut player, 600);
        assert_eq!(gained, 2);
        assert_eq!(player.level, 3);
        assert_eq!(player.experience, 100);
        assert_eq!(player.experience_to_next, 400);
    }
}
