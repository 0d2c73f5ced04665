//! Expired-object sweep.
//!
//! A maintenance operation, not part of the render path: list the bucket,
//! read each object's retention metadata, delete what has expired.
//! Per-object failures (unreadable metadata, failed stat or delete) are
//! collected and reported; they never abort the sweep.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::client::MinioClient;
use crate::types::RetentionMetadata;
use crate::{Result, TRACING_TARGET_SWEEP};

/// Outcome of one expired-object sweep.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    /// Number of objects examined.
    pub checked: usize,
    /// Keys of deleted objects.
    pub deleted: Vec<String>,
    /// Per-object failure descriptions.
    pub errors: Vec<String>,
}

impl MinioClient {
    /// Deletes every object whose retention window has passed.
    ///
    /// Objects without readable retention metadata are left in place and
    /// reported in the sweep errors.
    ///
    /// # Errors
    ///
    /// Returns an error only when the bucket listing itself fails;
    /// everything per-object is collected into the report.
    pub async fn sweep_expired(&self) -> Result<SweepReport> {
        let now = OffsetDateTime::now_utc();
        let objects = self.list_objects().await?;

        let mut report = SweepReport {
            checked: objects.len(),
            ..SweepReport::default()
        };

        for object in objects {
            let stat = match self.stat_object(&object.key).await {
                Ok(stat) => stat,
                Err(e) => {
                    report
                        .errors
                        .push(format!("stat {} failed: {e}", object.key));
                    continue;
                }
            };

            let expires_at =
                match RetentionMetadata::expiry_from_metadata(&stat.key, &stat.metadata) {
                    Ok(expires_at) => expires_at,
                    Err(e) => {
                        report.errors.push(e.to_string());
                        continue;
                    }
                };

            if now <= expires_at {
                continue;
            }

            match self.delete_object(&object.key).await {
                Ok(()) => {
                    tracing::info!(
                        target: TRACING_TARGET_SWEEP,
                        key = %object.key,
                        expired_at = %expires_at,
                        "deleted expired object"
                    );
                    report.deleted.push(object.key);
                }
                Err(e) => {
                    report
                        .errors
                        .push(format!("delete {} failed: {e}", object.key));
                }
            }
        }

        tracing::info!(
            target: TRACING_TARGET_SWEEP,
            checked = report.checked,
            deleted = report.deleted.len(),
            errors = report.errors.len(),
            "sweep finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use time::format_description::well_known::Rfc3339;

    use super::*;
    use crate::types::META_EXPIRES_AT;

    #[test]
    fn test_sweep_report_serializes_camel_case() {
        let report = SweepReport {
            checked: 3,
            deleted: vec!["a.png".to_owned()],
            errors: vec!["stat b.png failed: timeout".to_owned()],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["checked"], 3);
        assert_eq!(json["deleted"][0], "a.png");
        assert_eq!(json["errors"][0], "stat b.png failed: timeout");
    }

    #[test]
    fn test_expiry_comparison_drives_deletion_decision() {
        let past = (OffsetDateTime::now_utc() - time::Duration::days(1))
            .format(&Rfc3339)
            .unwrap();
        let mut metadata = HashMap::new();
        metadata.insert(META_EXPIRES_AT.to_owned(), past);

        let expires_at = RetentionMetadata::expiry_from_metadata("old.png", &metadata).unwrap();
        assert!(OffsetDateTime::now_utc() > expires_at);
    }
}
