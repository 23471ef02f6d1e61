//! Goal selection: chase the flag, or bring it home.

use crate::grid::Cell;
use crate::world::{Flag, SceneObject, TankControls};

/// Cell the agent should path toward this planning cycle.
///
/// A tank holding the flag heads for its home base. Otherwise it heads for the
/// flag's current cell, which tracks whichever tank carries it. Returns `None`
/// while the flag has not been handed to the agent yet.
#[must_use]
pub fn resolve_goal<T: TankControls + ?Sized>(tank: &T, flag: Option<&Flag>) -> Option<Cell> {
    if tank.carries_flag() {
        return Some(tank.home_cell());
    }
    flag.map(Flag::cell)
}

/// Index of the flag within a scene object list, found once and reused.
///
/// Hosts that only expose a mixed list of [`SceneObject`]s resolve the flag
/// through this before handing it to the agents.
///
/// A round has exactly one flag, so after the first successful lookup the
/// index stays valid until the scene is rebuilt (round reset), at which point
/// the binding is cleared with [`FlagBinding::clear`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlagBinding {
    index: Option<usize>,
}

impl FlagBinding {
    /// Locate the flag in `objects`, scanning only until the first success.
    pub fn resolve<'a>(&mut self, objects: &'a [SceneObject]) -> Option<&'a Flag> {
        if let Some(flag) = self.index.and_then(|i| flag_at(objects, i)) {
            return Some(flag);
        }

        let (index, flag) = objects.iter().enumerate().find_map(|(i, object)| match object {
            SceneObject::Flag(flag) => Some((i, flag)),
            _ => None,
        })?;
        self.index = Some(index);
        Some(flag)
    }

    /// Whether the flag has been found.
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.index.is_some()
    }

    /// Forget the cached index.
    pub fn clear(&mut self) {
        self.index = None;
    }
}

fn flag_at(objects: &[SceneObject], index: usize) -> Option<&Flag> {
    match objects.get(index) {
        Some(SceneObject::Flag(flag)) => Some(flag),
        _ => None,
    }
}
