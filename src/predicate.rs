//! The predicate taxonomy of §3.6: every edge and link is tagged with a
//! predicate that falls into exactly one of three disjoint classes.

use std::fmt;

/// A predicate's semantic class. `Predicate::class` is consulted everywhere
/// a traversal needs to decide whether to confer a role on the node it
/// reaches (`Functional`), merely pass through it (`Section`), or skip over
/// it while still walking through (`Bridge`).
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum PredicateClass {
    Functional,
    Section,
    Bridge,
}

/// The canonical predicate identifiers. Functional predicates determine the
/// semantic role of the child node they point at; `Section` groups children
/// without conferring a role; `Bridge` is a traversable skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display, strum_macros::EnumIter)]
pub enum Predicate {
    #[strum(to_string = "enum-of")]
    EnumOf,
    #[strum(to_string = "field-of")]
    FieldOf,
    #[strum(to_string = "property-of")]
    PropertyOf,
    #[strum(to_string = "required-indicator")]
    RequiredIndicator,
    #[strum(to_string = "required-metadata")]
    RequiredMetadata,
    #[strum(to_string = "section-of")]
    SectionOf,
    #[strum(to_string = "bridge-of")]
    BridgeOf,
}

impl Predicate {
    pub fn class(self) -> PredicateClass {
        match self {
            Predicate::EnumOf
            | Predicate::FieldOf
            | Predicate::PropertyOf
            | Predicate::RequiredIndicator
            | Predicate::RequiredMetadata => PredicateClass::Functional,
            Predicate::SectionOf => PredicateClass::Section,
            Predicate::BridgeOf => PredicateClass::Bridge,
        }
    }

    pub fn is_functional(self) -> bool {
        self.class() == PredicateClass::Functional
    }
}

impl fmt::Debug for PredicateClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredicateClass::Functional => write!(f, "functional"),
            PredicateClass::Section => write!(f, "section"),
            PredicateClass::Bridge => write!(f, "bridge"),
        }
    }
}

/// Direction is a per-operation flag, not a property of the predicate
/// itself (§3.6): `ChildrenPointToParent` is "many-to-one", the common case
/// for e.g. `enum-of` (many enumeration values pointing up to their root);
/// `ParentPointsToChildren` is "one-to-many".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ChildrenPointToParent,
    ParentPointsToChildren,
}

impl Direction {
    pub fn from_bool(direction: bool) -> Self {
        if direction {
            Direction::ChildrenPointToParent
        } else {
            Direction::ParentPointsToChildren
        }
    }
}

/// The set of predicates tolerated while checking reachability or pruning a
/// traversal: the operation's own functional predicate, any extra
/// caller-supplied `traversal_predicates`, and section/bridge unconditionally
/// (§4.3.1 step 2, §9's normalization note).
pub fn reachability_predicates(
    functional: Predicate,
    traversal_predicates: &[Predicate],
) -> Vec<Predicate> {
    let mut set = vec![functional, Predicate::SectionOf, Predicate::BridgeOf];
    for p in traversal_predicates {
        if !set.contains(p) {
            set.push(*p);
        }
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicate_classes_are_disjoint() {
        assert_eq!(Predicate::EnumOf.class(), PredicateClass::Functional);
        assert_eq!(Predicate::SectionOf.class(), PredicateClass::Section);
        assert_eq!(Predicate::BridgeOf.class(), PredicateClass::Bridge);
    }

    #[test]
    fn reachability_predicates_always_include_section_and_bridge() {
        let set = reachability_predicates(Predicate::EnumOf, &[]);
        assert!(set.contains(&Predicate::SectionOf));
        assert!(set.contains(&Predicate::BridgeOf));
        assert!(set.contains(&Predicate::EnumOf));
    }
}
