//! Multipart condition evaluation.

use crate::definitions::Condition;
use crate::types::BlockState;
use std::collections::HashMap;

/// Check one `property: value` constraint. `a|b` accepts either value; a
/// property the block does not carry never matches.
fn constraint_holds(state: &BlockState, key: &str, expected: &str) -> bool {
    match state.property(key) {
        Some(actual) => expected.split('|').any(|v| v == actual),
        None => false,
    }
}

fn all_hold(constraints: &HashMap<String, String>, state: &BlockState) -> bool {
    constraints
        .iter()
        .all(|(key, expected)| constraint_holds(state, key, expected))
}

fn any_holds(constraints: &HashMap<String, String>, state: &BlockState) -> bool {
    constraints
        .iter()
        .any(|(key, expected)| constraint_holds(state, key, expected))
}

impl Condition {
    /// Evaluate the clause against a block state.
    ///
    /// Passes iff every direct field matches, every `AND` element matches in
    /// full, and, when an `OR` list is given, at least one of its elements has
    /// a matching field.
    pub fn matches(&self, state: &BlockState) -> bool {
        let or_passes = match &self.or {
            Some(alternatives) => alternatives.iter().any(|alt| any_holds(alt, state)),
            None => true,
        };

        all_hold(&self.fields, state)
            && self.and.iter().all(|conj| all_hold(conj, state))
            && or_passes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cond(json: &str) -> Condition {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_condition_simple() {
        let c = cond(r#"{ "facing": "north" }"#);
        assert!(c.matches(&BlockState::new("x").with_property("facing", "north")));
        assert!(!c.matches(&BlockState::new("x").with_property("facing", "south")));
        assert!(!c.matches(&BlockState::new("x")));
    }

    #[test]
    fn test_condition_multiple_fields() {
        let c = cond(r#"{ "north": "true", "up": "false" }"#);
        let both = BlockState::new("x")
            .with_property("north", "true")
            .with_property("up", "false");
        let one = BlockState::new("x").with_property("north", "true");
        assert!(c.matches(&both));
        assert!(!c.matches(&one));
    }

    #[test]
    fn test_condition_and() {
        let c = cond(r#"{ "AND": [{ "north": "true" }, { "south": "true" }] }"#);
        let both = BlockState::new("x")
            .with_property("north", "true")
            .with_property("south", "true");
        let only_north = BlockState::new("x").with_property("north", "true");
        assert!(c.matches(&both));
        assert!(!c.matches(&only_north));
    }

    #[test]
    fn test_condition_unsatisfiable_and() {
        let c = cond(r#"{ "AND": [{ "facing": "north" }, { "facing": "south" }] }"#);
        for facing in ["north", "south", "east", "west"] {
            assert!(!c.matches(&BlockState::new("x").with_property("facing", facing)));
        }
        assert!(!c.matches(&BlockState::new("x")));
    }

    #[test]
    fn test_condition_or() {
        let c = cond(r#"{ "OR": [{ "facing": "north" }, { "facing": "south" }] }"#);
        assert!(c.matches(&BlockState::new("x").with_property("facing", "north")));
        assert!(c.matches(&BlockState::new("x").with_property("facing", "south")));
        assert!(!c.matches(&BlockState::new("x").with_property("facing", "east")));
    }

    #[test]
    fn test_condition_or_element_any_field() {
        let c = cond(r#"{ "OR": [{ "north": "true", "south": "true" }] }"#);
        assert!(c.matches(&BlockState::new("x").with_property("south", "true")));
        assert!(!c.matches(&BlockState::new("x").with_property("east", "true")));
    }

    #[test]
    fn test_condition_empty_or_list_never_passes() {
        let c = cond(r#"{ "OR": [] }"#);
        assert!(!c.matches(&BlockState::new("x")));
    }

    #[test]
    fn test_condition_fields_with_or() {
        let c = cond(r#"{ "up": "true", "OR": [{ "north": "true" }, { "east": "true" }] }"#);
        let up_east = BlockState::new("x")
            .with_property("up", "true")
            .with_property("east", "true");
        let east_only = BlockState::new("x").with_property("east", "true");
        let up_only = BlockState::new("x").with_property("up", "true");
        assert!(c.matches(&up_east));
        assert!(!c.matches(&east_only));
        assert!(!c.matches(&up_only));
    }

    #[test]
    fn test_condition_pipe_values() {
        let c = cond(r#"{ "east": "low|tall" }"#);
        assert!(c.matches(&BlockState::new("x").with_property("east", "low")));
        assert!(c.matches(&BlockState::new("x").with_property("east", "tall")));
        assert!(!c.matches(&BlockState::new("x").with_property("east", "none")));
    }

    #[test]
    fn test_condition_empty_always_passes() {
        assert!(cond("{}").matches(&BlockState::new("x")));
    }
}
