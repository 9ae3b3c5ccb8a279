/// Where the player is placed after colliding with a wall, the grid edge, or a ghost.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum CollisionRecovery {
    /// Back to the position the session started (or was loaded) at.
    #[default]
    SessionStart,
    /// Back to the position the current run started at.
    RunStart,
    /// The move is refused and the player keeps its pre-step position.
    #[strum(to_string = "stay", serialize = "stay-in-place")]
    StayInPlace,
}

/// When a `RunUntilCrossroad` loop evaluates the crossroad predicate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum CrossroadCheck {
    /// Stop after a move lands on a crossroad.
    #[default]
    Landing,
    /// Stop before entering a crossroad cell.
    Lookahead,
}

/// Game configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameConfig {
    pub starting_lives: u32,
    pub starting_iterations: u32,
    /// Score awarded for each pellet consumed.
    pub pellet_reward: u32,
    /// Score removed on a collision (the score never drops below zero).
    pub collision_penalty: u32,
    pub collision_recovery: CollisionRecovery,
    pub crossroad_check: CrossroadCheck,
}

impl GameConfig {
    // ===== compile-time constants used as type parameters =====
    /// Capacity of the command queue.
    pub const MAX_COMMANDS: usize = 10;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_LIVES: u32 = 3;
    pub const DEFAULT_ITERATIONS: u32 = 20;
    pub const DEFAULT_PELLET_REWARD: u32 = 10;
    pub const DEFAULT_COLLISION_PENALTY: u32 = 5;

    pub fn new() -> Self {
        Self {
            starting_lives: Self::DEFAULT_LIVES,
            starting_iterations: Self::DEFAULT_ITERATIONS,
            pellet_reward: Self::DEFAULT_PELLET_REWARD,
            collision_penalty: Self::DEFAULT_COLLISION_PENALTY,
            collision_recovery: CollisionRecovery::default(),
            crossroad_check: CrossroadCheck::default(),
        }
    }

    #[must_use]
    pub fn with_collision_recovery(mut self, recovery: CollisionRecovery) -> Self {
        self.collision_recovery = recovery;
        self
    }

    #[must_use]
    pub fn with_crossroad_check(mut self, check: CrossroadCheck) -> Self {
        self.crossroad_check = check;
        self
    }

    #[must_use]
    pub fn with_budget(mut self, lives: u32, iterations: u32) -> Self {
        self.starting_lives = lives;
        self.starting_iterations = iterations;
        self
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovery_policy_parses_from_env_style_names() {
        assert_eq!(
            "session-start".parse::<CollisionRecovery>().unwrap(),
            CollisionRecovery::SessionStart
        );
        assert_eq!(
            "Run-Start".parse::<CollisionRecovery>().unwrap(),
            CollisionRecovery::RunStart
        );
        assert_eq!(
            "stay".parse::<CollisionRecovery>().unwrap(),
            CollisionRecovery::StayInPlace
        );
        assert!("teleport".parse::<CollisionRecovery>().is_err());
    }

    #[test]
    fn defaults_match_reference_rules() {
        let config = GameConfig::default();
        assert_eq!(config.starting_lives, 3);
        assert_eq!(config.starting_iterations, 20);
        assert_eq!(config.pellet_reward, 10);
        assert_eq!(config.collision_penalty, 5);
        assert_eq!(config.crossroad_check, CrossroadCheck::Landing);
    }
}
