//! Pipeline stages. Each stage reads the previous stage's artifact from storage and
//! publishes its own, named by the run's [`DateLabel`].

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::artifact::{Artifact, DateLabel, Layout};
use crate::error::Result;
use crate::storage::{self, BlobStore};

pub mod ingest;
pub mod match_ids;
pub mod prepare;
pub mod resolve;
pub mod roster;

pub use ingest::{IngestReport, MatchIngestor};
pub use match_ids::{MatchIdDiscoverer, MatchIdReport};
pub use prepare::{ChampionLookup, ChampionLookupBuilder};
pub use resolve::{IdentifierResolver, PuuidCache, ResolveReport};
pub use roster::{RosterFetcher, RosterReport};

/// Download an upstream CSV artifact and read its rows. Fails if the artifact is missing.
pub fn fetch_rows<T: DeserializeOwned>(
    store: &dyn BlobStore,
    layout: &Layout,
    artifact: Artifact,
    label: &DateLabel,
) -> Result<Vec<T>> {
    let local = layout.local_path(artifact, label);
    store.download(&layout.blob_name(artifact, label), &local)?;
    storage::read_csv(&local)
}

/// Write rows to the local staging file and upload it, overwriting both.
pub fn publish_rows<T: Serialize>(
    store: &dyn BlobStore,
    layout: &Layout,
    artifact: Artifact,
    label: &DateLabel,
    header: &[&str],
    rows: &[T],
) -> Result<()> {
    let local = layout.local_path(artifact, label);
    storage::write_csv(&local, header, rows)?;
    store.upload(&local, &layout.blob_name(artifact, label))?;
    log::info!(
        "Wrote {} rows to `{}`.",
        rows.len(),
        layout.blob_name(artifact, label)
    );
    Ok(())
}
