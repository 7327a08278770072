use std::fmt;

/// Outcome of one filtering step. Fatal conditions are not represented
/// here; they travel as `Err(CorpusError)` beside it.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification<T> {
    Accepted(T),
    Skipped(SkipReason),
}

impl<T> Classification<T> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Classification::Accepted(_))
    }

    pub fn accepted(self) -> Option<T> {
        match self {
            Classification::Accepted(t) => Some(t),
            Classification::Skipped(_) => None,
        }
    }

    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match self {
            Classification::Accepted(_) => None,
            Classification::Skipped(reason) => Some(reason),
        }
    }
}

/// Why a file was passed over. None of these are errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Extension is not `.yaml`, `.yml` or `.json`.
    NotCandidate,
    /// Same content id was already classified in this run.
    AlreadySeen,
    /// Does not decode as a specification document.
    Unparseable(String),
    /// `info.title` is missing or empty.
    MissingTitle,
    /// `info.version` is missing or empty.
    MissingVersion,
    /// The API already has the configured number of versions.
    CapReached { api: String },
    /// This exact version string was already accepted for the API.
    DuplicateVersion { api: String, version: String },
    /// The metadata sidecar, not a specification.
    Sidecar,
    /// A specification whose file name is the sidecar's name; persisting
    /// it would be overwritten by the sidecar.
    ReservedName,
    /// The path has no `<name>/<version>` directories above the file.
    NoLayoutPosition,
}

impl SkipReason {
    /// Short stable label, used for tallies.
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::NotCandidate => "not-candidate",
            SkipReason::AlreadySeen => "already-seen",
            SkipReason::Unparseable(_) => "unparseable",
            SkipReason::MissingTitle => "missing-title",
            SkipReason::MissingVersion => "missing-version",
            SkipReason::CapReached { .. } => "cap-reached",
            SkipReason::DuplicateVersion { .. } => "duplicate-version",
            SkipReason::Sidecar => "sidecar",
            SkipReason::ReservedName => "reserved-name",
            SkipReason::NoLayoutPosition => "no-layout-position",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotCandidate => write!(f, "not a specification file extension"),
            SkipReason::AlreadySeen => write!(f, "content already classified"),
            SkipReason::Unparseable(e) => write!(f, "not a specification document: {}", e),
            SkipReason::MissingTitle => write!(f, "info.title is empty"),
            SkipReason::MissingVersion => write!(f, "info.version is empty"),
            SkipReason::CapReached { api } => write!(f, "version cap reached for {}", api),
            SkipReason::DuplicateVersion { api, version } => {
                write!(f, "{} {} already collected", api, version)
            }
            SkipReason::Sidecar => write!(f, "metadata sidecar"),
            SkipReason::ReservedName => write!(f, "file name is reserved for the sidecar"),
            SkipReason::NoLayoutPosition => {
                write!(f, "path has no <name>/<version> directories")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_helpers() {
        let c: Classification<u8> = Classification::Accepted(7);
        assert!(c.is_accepted());
        assert!(c.skip_reason().is_none());
        assert_eq!(c.accepted(), Some(7));
    }

    #[test]
    fn test_skipped_helpers() {
        let c: Classification<u8> = Classification::Skipped(SkipReason::MissingTitle);
        assert!(!c.is_accepted());
        assert_eq!(c.skip_reason(), Some(&SkipReason::MissingTitle));
        assert_eq!(c.accepted(), None);
    }

    #[test]
    fn test_display_includes_context() {
        let reason = SkipReason::DuplicateVersion {
            api: "Pet_Store".into(),
            version: "1.0".into(),
        };
        assert_eq!(reason.to_string(), "Pet_Store 1.0 already collected");
        assert_eq!(reason.label(), "duplicate-version");
    }

    #[test]
    fn test_reserved_name_label() {
        assert_eq!(SkipReason::ReservedName.label(), "reserved-name");
        assert!(SkipReason::ReservedName.to_string().contains("sidecar"));
    }
}
