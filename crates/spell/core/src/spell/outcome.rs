/// Result of a cast attempt.
///
/// Outcomes are returned, never raised, and carry enough information for a
/// calling layer to print a short message without inspecting the world again.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum CastOutcome {
    /// The spell executed; resources were consumed.
    Success,
    /// Generic refusal (disabled spell, offline caster, busy caster, failed hook).
    Failure,
    /// The magic pool cannot cover the cost.
    InsufficientMagic,
    /// A cooldown entry for this spell has not expired.
    OnCooldown,
    /// The caster lacks the spell or element permission.
    NoPermission,
    /// The spell found no valid target.
    InvalidTarget,
    /// A pre-cast interceptor vetoed the cast after admission passed.
    Cancelled,
}

impl CastOutcome {
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// Default player-facing message.
    pub const fn message(self) -> &'static str {
        match self {
            Self::Success => "Spell cast successfully",
            Self::Failure => "Spell cast failed",
            Self::InsufficientMagic => "Not enough magic",
            Self::OnCooldown => "Spell is on cooldown",
            Self::NoPermission => "Missing permission to cast this spell",
            Self::InvalidTarget => "Invalid target for this spell",
            Self::Cancelled => "Spell cast was cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_reason_strings() {
        let outcome: CastOutcome = "on_cooldown".parse().expect("known outcome");
        assert_eq!(outcome, CastOutcome::OnCooldown);
        assert!("MANA_BURN".parse::<CastOutcome>().is_err());
    }

    #[test]
    fn only_success_is_success() {
        assert!(CastOutcome::Success.is_success());
        assert!(!CastOutcome::Cancelled.is_success());
        assert_eq!(CastOutcome::InsufficientMagic.to_string(), "INSUFFICIENT_MAGIC");
    }
}
