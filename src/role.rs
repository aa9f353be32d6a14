//! Toy assignment roles and the cycling rule.

use serde::{Deserialize, Serialize};

/// Who is expected to control a toy.
///
/// Variants are declared in cycling order; [`Role::next`] walks this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Role {
    /// Unassigned or disabled.
    #[default]
    None,
    /// Offered by a peer. Only ever granted by an announcement.
    Shared,
    Left,
    Right,
    /// Both hands, one per vibration channel.
    Both,
    Either,
}

impl Role {
    /// Every role in cycling order.
    pub const ALL: [Role; 6] = [
        Role::None,
        Role::Shared,
        Role::Left,
        Role::Right,
        Role::Both,
        Role::Either,
    ];

    /// The role after `self` in cycling order, wrapping to [`Role::None`].
    pub fn successor(self) -> Role {
        let idx = Self::ALL.iter().position(|r| *r == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// The next role a toy may take.
    ///
    /// `Shared` is never entered by cycling, and `Both` requires two vibration
    /// channels. `None` is always allowed, so the walk terminates.
    pub fn next(self, two_vibrators: bool) -> Role {
        let mut role = self.successor();
        while !role.reachable(two_vibrators) {
            role = role.successor();
        }
        role
    }

    fn reachable(self, two_vibrators: bool) -> bool {
        match self {
            Role::Shared => false,
            Role::Both => two_vibrators,
            _ => true,
        }
    }

    /// Roles visited when cycling from `None` with the given capability.
    pub fn cycle(two_vibrators: bool) -> Vec<Role> {
        Self::ALL
            .into_iter()
            .filter(|r| r.reachable(two_vibrators))
            .collect()
    }
}
