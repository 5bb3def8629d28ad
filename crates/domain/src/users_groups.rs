//! Users, groups and group-state resolution.
//!
//! Groups contain users and other groups. The registry guarantees that the
//! group graph is acyclic, that no name is both a user and a group, and that
//! every member resolves.
//!
//! A group's observed state is the fold of its members' states
//! ([`fold_group_states`]): the union of everything its members are in, with
//! the absent state dropped unless it is the only state left. Everyone being
//! absent keeps the group absent; someone being absent while others are
//! awake does not.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::definition::UserDefinition;
use crate::error::{ConfigError, MatchError};
use crate::state::{StateValue, UserStates};

/// A person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub name: String,
    pub guest: bool,
    pub tracking_entity: Option<String>,
}

impl User {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            guest: false,
            tracking_entity: None,
        }
    }
}

/// A named set of users and other groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub members: BTreeSet<String>,
}

impl Group {
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }
}

/// Result of looking up an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Member<'a> {
    User(&'a User),
    Group(&'a Group),
}

/// Validated registry of users and groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsersGroups {
    users: BTreeMap<String, User>,
    groups: BTreeMap<String, Group>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

impl UsersGroups {
    /// Build and validate a registry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NameCollision`], [`ConfigError::UnknownMember`]
    /// or [`ConfigError::GroupCycle`] when the invariants do not hold.
    pub fn new(
        users: impl IntoIterator<Item = User>,
        groups: impl IntoIterator<Item = Group>,
    ) -> Result<Self, ConfigError> {
        let registry = Self {
            users: users.into_iter().map(|u| (u.name.clone(), u)).collect(),
            groups: groups.into_iter().map(|g| (g.name.clone(), g)).collect(),
        };
        registry.validate()?;
        Ok(registry)
    }

    /// Build from document definitions.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateMember`] when a group lists a member
    /// twice, plus everything [`UsersGroups::new`] rejects.
    pub fn from_definitions(
        users: &BTreeMap<String, Option<UserDefinition>>,
        groups: &BTreeMap<String, Vec<String>>,
    ) -> Result<Self, ConfigError> {
        let users = users.iter().map(|(name, definition)| {
            let definition = definition.clone().unwrap_or_default();
            User {
                name: name.clone(),
                guest: definition.guest,
                tracking_entity: definition.tracking_entity,
            }
        });

        let mut built = Vec::with_capacity(groups.len());
        for (name, members) in groups {
            let group = Group::new(name, members.iter().cloned());
            if group.members.len() != members.len() {
                let mut seen = HashSet::new();
                let member = members
                    .iter()
                    .find(|m| !seen.insert(m.as_str()))
                    .cloned()
                    .unwrap_or_default();
                return Err(ConfigError::DuplicateMember {
                    group: name.clone(),
                    member,
                });
            }
            built.push(group);
        }

        Self::new(users, built)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for group in self.groups.values() {
            if self.users.contains_key(&group.name) {
                return Err(ConfigError::NameCollision(group.name.clone()));
            }
            if let Some(member) = group.members.iter().find(|m| !self.contains(m)) {
                return Err(ConfigError::UnknownMember {
                    group: group.name.clone(),
                    member: member.clone(),
                });
            }
        }
        self.check_acyclic()
    }

    /// Iterative depth-first search over groups; a member that is still on
    /// the stack closes a cycle.
    fn check_acyclic(&self) -> Result<(), ConfigError> {
        let mut visits: HashMap<&str, Visit> = HashMap::with_capacity(self.groups.len());

        for root in self.groups.values() {
            if visits.contains_key(root.name.as_str()) {
                continue;
            }
            visits.insert(&root.name, Visit::InProgress);
            let mut stack = vec![(root.name.as_str(), root.members.iter())];

            loop {
                let Some(top) = stack.last_mut() else {
                    break;
                };
                let current = top.0;
                let Some(member) = top.1.next() else {
                    visits.insert(current, Visit::Done);
                    stack.pop();
                    continue;
                };
                let Some(group) = self.groups.get(member) else {
                    continue;
                };
                match visits.get(member.as_str()) {
                    Some(Visit::Done) => {}
                    Some(Visit::InProgress) => {
                        let start = stack
                            .iter()
                            .position(|(name, _)| *name == member.as_str())
                            .unwrap_or(0);
                        let mut path: Vec<String> =
                            stack[start..].iter().map(|(name, _)| (*name).to_string()).collect();
                        path.push(member.clone());
                        return Err(ConfigError::GroupCycle { path });
                    }
                    None => {
                        visits.insert(&group.name, Visit::InProgress);
                        stack.push((group.name.as_str(), group.members.iter()));
                    }
                }
            }
        }
        Ok(())
    }

    /// Look up a user or group.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Member<'_>> {
        self.users
            .get(name)
            .map(Member::User)
            .or_else(|| self.groups.get(name).map(Member::Group))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.users.contains_key(name) || self.groups.contains_key(name)
    }

    #[must_use]
    pub fn is_group(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    #[must_use]
    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    /// Every individual user reachable from `name`: the user itself, or all
    /// users nested anywhere below a group. `None` for an unknown name.
    #[must_use]
    pub fn individuals(&self, name: &str) -> Option<BTreeSet<String>> {
        if self.users.contains_key(name) {
            return Some(BTreeSet::from([name.to_string()]));
        }
        let root = self.groups.get(name)?;

        let mut people = BTreeSet::new();
        let mut seen = HashSet::from([root.name.as_str()]);
        let mut pending = vec![root];
        while let Some(group) = pending.pop() {
            for member in &group.members {
                match self.groups.get(member) {
                    Some(nested) => {
                        if seen.insert(nested.name.as_str()) {
                            pending.push(nested);
                        }
                    }
                    None => {
                        people.insert(member.clone());
                    }
                }
            }
        }
        Some(people)
    }
}

/// Fold member states into one canonical group state.
///
/// Takes the union of every member state. When the union holds anything but
/// exactly one state, `absent_state` is removed from it.
pub fn fold_group_states<'a>(
    member_states: impl IntoIterator<Item = &'a StateValue>,
    absent_state: &str,
) -> BTreeSet<String> {
    let mut states: BTreeSet<String> = member_states
        .into_iter()
        .flat_map(StateValue::iter)
        .map(ToString::to_string)
        .collect();
    if states.len() != 1 {
        states.remove(absent_state);
    }
    states
}

/// Resolves groups to canonical states given the atomic state of each
/// individual. Nested groups are resolved once per [`GroupResolver::reset`].
#[derive(Debug)]
pub struct GroupResolver<'a> {
    registry: &'a UsersGroups,
    absent_state: &'a str,
    memo: HashMap<&'a str, StateValue>,
}

impl<'a> GroupResolver<'a> {
    #[must_use]
    pub fn new(registry: &'a UsersGroups, absent_state: &'a str) -> Self {
        Self {
            registry,
            absent_state,
            memo: HashMap::new(),
        }
    }

    /// Forget resolved groups. Call whenever the individual states change.
    pub fn reset(&mut self) {
        self.memo.clear();
    }

    /// Observed state of `name`: the individual's own state, or the folded
    /// state of a group.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::MissingState`] when `name` is unknown or some
    /// individual below it has no entry in `people`.
    pub fn resolve(&mut self, name: &str, people: &UserStates) -> Result<StateValue, MatchError> {
        let registry = self.registry;
        match registry.get(name) {
            Some(Member::User(_)) => people
                .get(name)
                .cloned()
                .ok_or_else(|| MatchError::MissingState(name.to_string())),
            Some(Member::Group(group)) => {
                self.resolve_group(group, people)?;
                self.memo
                    .get(group.name.as_str())
                    .cloned()
                    .ok_or_else(|| MatchError::MissingState(name.to_string()))
            }
            None => Err(MatchError::MissingState(name.to_string())),
        }
    }

    /// Post-order traversal with an explicit stack: a group is folded once
    /// all of its nested groups are in the memo.
    fn resolve_group(&mut self, root: &'a Group, people: &UserStates) -> Result<(), MatchError> {
        let registry = self.registry;
        let mut stack = vec![(root, false)];
        while let Some((group, expanded)) = stack.pop() {
            if self.memo.contains_key(group.name.as_str()) {
                continue;
            }
            if !expanded {
                stack.push((group, true));
                for member in &group.members {
                    if let Some(nested) = registry.group(member) {
                        if !self.memo.contains_key(nested.name.as_str()) {
                            stack.push((nested, false));
                        }
                    }
                }
                continue;
            }

            let mut member_states = Vec::with_capacity(group.members.len());
            for member in &group.members {
                let state = if registry.is_group(member) {
                    self.memo.get(member.as_str())
                } else {
                    people.get(member)
                };
                member_states.push(state.ok_or_else(|| MatchError::MissingState(member.clone()))?);
            }
            let folded = fold_group_states(member_states, self.absent_state);
            self.memo.insert(group.name.as_str(), StateValue::Set(folded));
        }
        Ok(())
    }
}
