//! Folding binary columns into the base grid
//!
//! A merge turns the per-row weights of the column store into one additive
//! engine request per occupied row, lowest row first, strictly one after
//! the other. Each request sees the grid left by the previous one. The
//! store is reset only when every request succeeded.

use thiserror::Error;
use tracing::{info, warn};

use crate::domain::columns::BinaryColumnStore;
use crate::domain::core::GridSnapshot;
use crate::engine::{ArithmeticEngine, EngineCallError};

/// One additive request issued by a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddRequest {
    pub row: u32,
    pub weight: u32,
}

/// Successful merge outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    /// Grid after the last request, or the unchanged input grid for a no-op
    pub snapshot: GridSnapshot,
    /// Requests sent, in order
    pub applied: Vec<AddRequest>,
}

impl MergeReport {
    /// True when the store was empty and nothing was sent
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// A merge that stopped at a failing request
///
/// Requests in `applied` already reached the engine and are not rolled
/// back; `last_snapshot` is what the engine returned for the last of them.
/// The column store is left as it was before the merge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("merge stopped at row {} after {} applied request(s): {source}", .failed.row, .applied.len())]
pub struct MergeFailure {
    pub failed: AddRequest,
    pub applied: Vec<AddRequest>,
    /// Requests never sent because of the failure
    pub pending: Vec<AddRequest>,
    pub last_snapshot: Option<GridSnapshot>,
    pub source: EngineCallError,
}

/// Requests a merge of `store` would issue, ascending by row
pub fn plan(store: &BinaryColumnStore) -> Vec<AddRequest> {
    store
        .count_by_row()
        .into_iter()
        .map(|(row, weight)| AddRequest { row, weight })
        .collect()
}

/// Runs a merge through an arbitrary add call
///
/// # Arguments
/// * `store` - Column store to fold; reset on success only
/// * `current` - Grid before the merge, returned unchanged for a no-op
/// * `call_add` - Issues one additive request and returns the new grid
///
/// # Returns
/// The merge report, or the failure with the last good snapshot and the
/// failing row
pub fn merge<F>(
    store: &mut BinaryColumnStore,
    current: &GridSnapshot,
    mut call_add: F,
) -> Result<MergeReport, MergeFailure>
where
    F: FnMut(AddRequest) -> Result<GridSnapshot, EngineCallError>,
{
    let requests = plan(store);
    if requests.is_empty() {
        return Ok(MergeReport {
            snapshot: current.clone(),
            applied: Vec::new(),
        });
    }

    let mut latest: Option<GridSnapshot> = None;
    let mut applied = Vec::with_capacity(requests.len());

    for (position, request) in requests.iter().enumerate() {
        info!(row = request.row, weight = request.weight, "merge add");
        match call_add(*request) {
            Ok(snapshot) => {
                latest = Some(snapshot);
                applied.push(*request);
            }
            Err(source) => {
                warn!(row = request.row, error = %source, "merge aborted");
                return Err(MergeFailure {
                    failed: *request,
                    applied,
                    pending: requests[position + 1..].to_vec(),
                    last_snapshot: latest,
                    source,
                });
            }
        }
    }

    store.reset_all();
    Ok(MergeReport {
        snapshot: latest.unwrap_or_else(|| current.clone()),
        applied,
    })
}

/// Runs a merge against an engine's `add` operation
pub fn merge_into<E>(
    store: &mut BinaryColumnStore,
    current: &GridSnapshot,
    engine: &mut E,
) -> Result<MergeReport, MergeFailure>
where
    E: ArithmeticEngine + ?Sized,
{
    merge(store, current, |request| engine.add(request.row, request.weight))
}
