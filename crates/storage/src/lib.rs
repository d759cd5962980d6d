#![forbid(unsafe_code)]

pub mod corpus_json;
pub mod repository;
pub mod snapshot;
pub mod sqlite;

pub use repository::{
    InMemoryRepository, PreferencesStore, ProgressStore, Storage, StorageError, WordCorpusLoader,
};
