//! A single mirrored entity.

use std::collections::HashMap;
use std::fmt;

use emberlink_protocol::{EntityId, StateValue};

/// Local copy of a server entity.
///
/// `id` and `name` are fixed at creation. `states` only grows or
/// overwrites; it is never trimmed while the entity lives.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    id: EntityId,
    name: Option<String>,
    states: HashMap<String, StateValue>,
}

impl Entity {
    pub(crate) fn new(id: EntityId, name: Option<String>) -> Self {
        Self {
            id,
            name,
            states: HashMap::new(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Current value of one named state.
    pub fn state(&self, state_id: &str) -> Option<&StateValue> {
        self.states.get(state_id)
    }

    pub fn states(&self) -> &HashMap<String, StateValue> {
        &self.states
    }

    /// Position on the ground plane, from the `PositionX` / `PositionY`
    /// states. `None` until the server has sent both.
    pub fn position_2d(&self) -> Option<(f64, f64)> {
        let x = self.state("PositionX")?.as_f64()?;
        let y = self.state("PositionY")?.as_f64()?;
        Some((x, y))
    }

    pub(crate) fn set_state(&mut self, state_id: String, value: StateValue) {
        self.states.insert(state_id, value);
    }
}

impl fmt::Display for Entity {
    /// `<Entity id=5, name='Orc'>`, long names shortened to six characters
    /// and an ellipsis.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) if name.chars().count() > 8 => {
                let short: String = name.chars().take(6).collect();
                write!(f, "<Entity id={}, name='{short}...'>", self.id.0)
            }
            Some(name) => write!(f, "<Entity id={}, name='{name}'>", self.id.0),
            None => write!(f, "<Entity id={}, name=None>", self.id.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_short_name() {
        let e = Entity::new(EntityId(5), Some("Orc".into()));
        assert_eq!(e.to_string(), "<Entity id=5, name='Orc'>");
    }

    #[test]
    fn test_display_truncates_long_name() {
        let e = Entity::new(EntityId(12), Some("Goblin Shaman".into()));
        assert_eq!(e.to_string(), "<Entity id=12, name='Goblin...'>");
    }

    #[test]
    fn test_display_eight_chars_is_not_truncated() {
        let e = Entity::new(EntityId(1), Some("Skeleton".into()));
        assert_eq!(e.to_string(), "<Entity id=1, name='Skeleton'>");
    }

    #[test]
    fn test_display_unnamed() {
        let e = Entity::new(EntityId(3), None);
        assert_eq!(e.to_string(), "<Entity id=3, name=None>");
    }

    #[test]
    fn test_position_needs_both_axes() {
        let mut e = Entity::new(EntityId(1), None);
        assert_eq!(e.position_2d(), None);

        e.set_state("PositionX".into(), StateValue::Int(4));
        assert_eq!(e.position_2d(), None);

        e.set_state("PositionY".into(), StateValue::Float(-2.5));
        assert_eq!(e.position_2d(), Some((4.0, -2.5)));
    }

    #[test]
    fn test_non_numeric_position_is_ignored() {
        let mut e = Entity::new(EntityId(1), None);
        e.set_state("PositionX".into(), StateValue::from("left"));
        e.set_state("PositionY".into(), StateValue::Int(0));
        assert_eq!(e.position_2d(), None);
    }
}
