#![doc = include_str!("../README.md")]

mod classify;
mod collect;
mod corpus;
mod error;
mod examples;
mod history;
mod openapi;
mod reader;
mod sniff;
mod types;
mod value;

pub mod v1 {
    //! Versioned public API for collecting and aggregating specifications.
    //!
    //! # Collecting
    //!
    //! - [`HistorySource`] and [`Snapshot`] abstract a version-controlled
    //!   history; [`MemoryHistory`] is an in-memory implementation
    //! - [`collect`] walks a history and writes the layout directory
    //! - [`CollectionState`] carries the per-run cap and dedup bookkeeping
    //!
    //! # Reading and aggregating
    //!
    //! - [`read_layout`] finds every specification in a layout directory
    //! - [`extract_examples`] builds the per-schema example index
    //! - [`aggregate`] groups documents into a [`Corpus`]
    //! - [`write_corpus`] and [`read_corpus`] move the artifact to and from disk
    //!
    //! # Example: collect, then aggregate
    //!
    //! ```
    //! use specpath::v1::*;
    //! use chrono::DateTime;
    //!
    //! let layout = tempfile::tempdir().unwrap();
    //! let history = MemoryHistory::new().with_snapshot(
    //!     MemorySnapshot::new("c0", DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap())
    //!         .with_file("openapi.yaml", "info: { title: Widgets, version: '1.0' }\n"),
    //! );
    //! collect(&history, layout.path(), &CollectConfig::default(), CollectionState::new()).unwrap();
    //!
    //! let corpus = build_corpus(layout.path()).unwrap();
    //! assert_eq!(corpus.apis[0].name, "Widgets");
    //! assert_eq!(corpus.apis[0].version_names(), vec!["1.0"]);
    //! ```

    /// Typed view of the parts of an OpenAPI document the example index reads.
    pub mod openapi {
        pub use crate::openapi::{
            Components, ExampleObject, Info, MediaType, OpenApi, Operation, Parameter, PathItem,
            RefOr, Reference, RequestBody, Response, SCHEMA_REF_PREFIX, Schema,
            schema_name_from_ref,
        };
    }

    pub use crate::classify::{Classification, SkipReason};
    pub use crate::collect::{
        Admitted, CollectConfig, CollectOutcome, CollectionState, DEFAULT_MAX_VERSIONS, INFO_FILE,
        PersistedVersion, SkipCounts, VersionKey, classify, collect, persist,
    };
    pub use crate::corpus::{
        CORPUS_FILE, CorpusDocument, DATA_DIR, aggregate, build_corpus, corpus_path, read_corpus,
        write_corpus,
    };
    pub use crate::error::{CorpusError, Result};
    pub use crate::examples::extract_examples;
    pub use crate::history::{
        HistorySource, MemoryHistory, MemorySnapshot, Snapshot, SnapshotFile,
    };
    pub use crate::reader::{LayoutDocument, ReadOutcome, layout_position, read_info, read_layout};
    pub use crate::sniff::{
        CANDIDATE_EXTENSIONS, ParsedSpec, Sniffed, is_candidate, sanitize_path_segment, sniff,
    };
    pub use crate::types::{ApiEntry, Corpus, Example, Info, SchemaExampleIndex, VersionEntry};
    pub use crate::value::{OrderedMap, SpecValue};
}
