//! # Gait telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Identifier of a gait known to the gait engine.
///
/// `None` is the "no gait" sentinel. Requesting it stops the current gait at the next sequence
/// boundary.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GaitId {
    None,
    Down,
    Up,
    UpdateHeight,
    DirectMovement,
    DirectMovementShort,
    ReverseMovement,
    ReverseMovementShort,
    RotateLeft,
    RotateLeftShort,
    RotateRight,
    RotateRightShort,
    AttackLeft,
    AttackRight,
    Dance,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl GaitId {
    /// Every playable gait, the `None` sentinel excluded.
    pub const ALL: [GaitId; 14] = [
        GaitId::Down,
        GaitId::Up,
        GaitId::UpdateHeight,
        GaitId::DirectMovement,
        GaitId::DirectMovementShort,
        GaitId::ReverseMovement,
        GaitId::ReverseMovementShort,
        GaitId::RotateLeft,
        GaitId::RotateLeftShort,
        GaitId::RotateRight,
        GaitId::RotateRightShort,
        GaitId::AttackLeft,
        GaitId::AttackRight,
        GaitId::Dance,
    ];

    pub fn is_none(&self) -> bool {
        *self == GaitId::None
    }
}

impl Default for GaitId {
    fn default() -> Self {
        GaitId::None
    }
}

impl std::fmt::Display for GaitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}
