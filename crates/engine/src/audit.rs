// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Audit record writer.

use cf_core::AuditRecord;
use cf_storage::{Keys, Store, StoreError};

/// Assign the next per-case sequence number and persist the record.
pub(crate) async fn record<S: Store + ?Sized>(
    store: &S,
    keys: &Keys,
    mut record: AuditRecord,
) -> Result<(), StoreError> {
    record.seq = store.incr_counter(&keys.audit_counter(&record.case_id)).await?;
    let key = keys.audit_record(&record.case_id, record.seq, &record.step);
    store.save_or_update(&key, serde_json::to_value(&record)?).await
}
