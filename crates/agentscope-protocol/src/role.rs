//! Agent functional roles.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Planner,
    Executor,
    Reviewer,
    Guard,
    Tester,
    Writer,
    Explorer,
    Architect,
    Debugger,
    Verifier,
    Designer,
    Custom,
}

/// Orchestrator agent names and the canonical role each one plays.
const ROLE_MAP: &[(&str, Role)] = &[
    ("planner", Role::Planner),
    ("executor", Role::Executor),
    ("deep-executor", Role::Executor),
    ("explore", Role::Explorer),
    ("architect", Role::Architect),
    ("debugger", Role::Debugger),
    ("verifier", Role::Verifier),
    ("designer", Role::Designer),
    ("code-reviewer", Role::Reviewer),
    ("style-reviewer", Role::Reviewer),
    ("quality-reviewer", Role::Reviewer),
    ("api-reviewer", Role::Reviewer),
    ("performance-reviewer", Role::Reviewer),
    ("security-reviewer", Role::Guard),
    ("test-engineer", Role::Tester),
    ("writer", Role::Writer),
    ("analyst", Role::Planner),
    ("product-manager", Role::Planner),
    ("product-analyst", Role::Planner),
    ("ux-researcher", Role::Planner),
    ("information-architect", Role::Planner),
    ("build-fixer", Role::Executor),
    ("scientist", Role::Explorer),
    ("dependency-expert", Role::Explorer),
    ("git-master", Role::Executor),
    ("qa-tester", Role::Tester),
    ("critic", Role::Reviewer),
];

impl Role {
    pub const ALL: [Role; 12] = [
        Role::Planner,
        Role::Executor,
        Role::Reviewer,
        Role::Guard,
        Role::Tester,
        Role::Writer,
        Role::Explorer,
        Role::Architect,
        Role::Debugger,
        Role::Verifier,
        Role::Designer,
        Role::Custom,
    ];

    /// Resolve an orchestrator agent name to its canonical role.
    ///
    /// Returns `(Role::Custom, false)` for names missing from the table so
    /// callers can flag them.
    pub fn lookup(agent_name: &str) -> (Role, bool) {
        ROLE_MAP
            .iter()
            .find(|(name, _)| *name == agent_name)
            .map_or((Role::Custom, false), |(_, role)| (*role, true))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Planner => "planner",
            Role::Executor => "executor",
            Role::Reviewer => "reviewer",
            Role::Guard => "guard",
            Role::Tester => "tester",
            Role::Writer => "writer",
            Role::Explorer => "explorer",
            Role::Architect => "architect",
            Role::Debugger => "debugger",
            Role::Verifier => "verifier",
            Role::Designer => "designer",
            Role::Custom => "custom",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
