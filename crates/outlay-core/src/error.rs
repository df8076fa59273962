use std::fmt;

/// Machine-readable error codes for log scraping and batch reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    UnknownGroupDependency,
    GroupCycleDetected,
    UnknownAdapterKind,
    AdapterBuildFailed,
    FieldCycleFallback,
    DependencyViolation,
    TargetNotValidated,
    NonNumericComparison,
    UnknownCustomRule,
    AdapterRejectedValue,
    RelationshipCycleSkipped,
    CardinalityExceeded,
    ExclusiveConflict,
    UnknownRelationType,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::UnknownGroupDependency => "E1002",
            Self::GroupCycleDetected => "E1003",
            Self::UnknownAdapterKind => "E1004",
            Self::AdapterBuildFailed => "E1005",
            Self::FieldCycleFallback => "E2001",
            Self::DependencyViolation => "E3001",
            Self::TargetNotValidated => "E3002",
            Self::NonNumericComparison => "E3003",
            Self::UnknownCustomRule => "E3004",
            Self::AdapterRejectedValue => "E3005",
            Self::RelationshipCycleSkipped => "E4001",
            Self::CardinalityExceeded => "E4002",
            Self::ExclusiveConflict => "E4003",
            Self::UnknownRelationType => "E4004",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::UnknownGroupDependency => "Validation group references unknown group",
            Self::GroupCycleDetected => "Validation group dependency cycle",
            Self::UnknownAdapterKind => "Unknown field adapter kind",
            Self::AdapterBuildFailed => "Field adapter construction failed",
            Self::FieldCycleFallback => "Field dependency cycle, lexicographic order in effect",
            Self::DependencyViolation => "Cross-field dependency violated",
            Self::TargetNotValidated => "Dependency target not yet validated",
            Self::NonNumericComparison => "Non-numeric operand in numeric comparison",
            Self::UnknownCustomRule => "Custom rule not registered",
            Self::AdapterRejectedValue => "Field adapter rejected value",
            Self::RelationshipCycleSkipped => "Hierarchy edge skipped, would create cycle",
            Self::CardinalityExceeded => "Relationship cardinality limit reached",
            Self::ExclusiveConflict => "Exclusive relationship already present",
            Self::UnknownRelationType => "Relationship type not configured",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in the dataset config and retry."),
            Self::UnknownGroupDependency => {
                Some("Every `dependencies` entry must name an existing group id.")
            }
            Self::GroupCycleDetected => {
                Some("Remove one dependency from the listed groups to break the cycle.")
            }
            Self::UnknownAdapterKind => {
                Some("Register the adapter kind before loading config, or fix the kind name.")
            }
            Self::AdapterBuildFailed => Some("Check the adapter options (pattern, format, range)."),
            Self::FieldCycleFallback => Some(
                "Validation order is degraded to lexicographic; fix the field dependency cycle.",
            ),
            Self::DependencyViolation | Self::TargetNotValidated => None,
            Self::NonNumericComparison => {
                Some("greater_than/less_than require numeric values on both sides.")
            }
            Self::UnknownCustomRule => {
                Some("Register the named rule in the RuleRegistry at startup.")
            }
            Self::AdapterRejectedValue => None,
            Self::RelationshipCycleSkipped => {
                Some("Check source data for contradictory parent/child links.")
            }
            Self::CardinalityExceeded | Self::ExclusiveConflict => {
                Some("Raise max_cardinality or drop exclusive in the relationship rules.")
            }
            Self::UnknownRelationType => {
                Some("Declare the relationship type in the entity's relationship config.")
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
