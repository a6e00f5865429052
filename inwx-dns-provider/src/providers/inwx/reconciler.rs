//! Record reconciliation
//!
//! Records have no stable foreign key until INWX assigns an id, so each
//! input is located by `(type, name)` or `(type, name, content)`. Inputs are
//! processed one at a time in order; the first failure ends the batch and
//! earlier changes stay applied.

use crate::error::{ProviderError, Result};
use crate::providers::PROVIDER_ID;
use crate::providers::common::{
    full_name_to_relative, normalize_domain_name, relative_to_full_name,
};
use crate::types::Record;

use super::codec::{to_generic, to_native};
use super::{NativeRecord, Session};

pub(crate) struct Reconciler<'a> {
    session: &'a Session,
    zone: &'a str,
    domain: String,
}

impl<'a> Reconciler<'a> {
    pub fn new(session: &'a Session, zone: &'a str) -> Self {
        Self {
            session,
            zone,
            domain: normalize_domain_name(zone),
        }
    }

    /// Every record in the zone, decoded. One undecodable record fails the call.
    pub async fn list(&self) -> Result<Vec<Record>> {
        self.session
            .list_zone(&self.domain)
            .await?
            .iter()
            .map(|native| to_generic(native, self.zone))
            .collect()
    }

    /// Remote records with the same type and name as `wanted`, and the same
    /// content (and priority) when `match_content` is set.
    async fn lookup(&self, wanted: &NativeRecord, match_content: bool) -> Result<Vec<NativeRecord>> {
        let absolute = relative_to_full_name(&wanted.name, self.zone);
        let candidates = self
            .session
            .find_records(
                &self.domain,
                &wanted.record_type,
                &absolute,
                match_content.then_some(wanted.content.as_str()),
            )
            .await?;

        let wanted_name = relative_name(&wanted.name);
        Ok(candidates
            .into_iter()
            .filter(|c| c.record_type.eq_ignore_ascii_case(&wanted.record_type))
            .filter(|c| full_name_to_relative(&c.name, self.zone).eq_ignore_ascii_case(&wanted_name))
            .filter(|c| !match_content || (c.content == wanted.content && c.prio == wanted.prio))
            .collect())
    }

    /// Creates every record without looking for existing ones.
    pub async fn append(&self, records: &[Record]) -> Result<Vec<Record>> {
        let mut created = Vec::with_capacity(records.len());
        for record in records {
            let id = self
                .session
                .create_record(&self.domain, &to_native(record))
                .await?;
            created.push(record.clone().with_id(id));
        }
        Ok(created)
    }

    /// Creates when nothing exists at `(type, name)`, updates when exactly
    /// one record does, and refuses to guess between several.
    ///
    /// A record that already carries an id is updated by that id directly.
    pub async fn set(&self, records: &[Record]) -> Result<Vec<Record>> {
        let mut applied = Vec::with_capacity(records.len());
        for record in records {
            let mut native = to_native(record);

            if native.id.is_empty() {
                let matches = self.lookup(&native, false).await?;
                match matches.as_slice() {
                    [] => {
                        let id = self.session.create_record(&self.domain, &native).await?;
                        log::debug!(
                            "[{PROVIDER_ID}] Created {} '{}' (id {id})",
                            native.record_type,
                            record.name
                        );
                        applied.push(record.clone().with_id(id));
                        continue;
                    }
                    [existing] => native.id.clone_from(&existing.id),
                    _ => {
                        return Err(ProviderError::AmbiguousMatch {
                            provider: PROVIDER_ID.to_string(),
                            record_name: record.rr().name,
                            record_type: native.record_type,
                            count: matches.len(),
                        });
                    }
                }
            }

            self.session.update_record(&native).await?;
            log::debug!(
                "[{PROVIDER_ID}] Updated {} '{}' (id {})",
                native.record_type,
                record.name,
                native.id
            );
            applied.push(record.clone().with_id(native.id));
        }
        Ok(applied)
    }

    /// Deletes every exact `(type, name, content)` match; no match is not an
    /// error. Returns the records actually removed.
    ///
    /// A record that carries an id is deleted by that id directly.
    pub async fn delete(&self, records: &[Record]) -> Result<Vec<Record>> {
        let mut removed = Vec::new();
        for record in records {
            let native = to_native(record);

            if !native.id.is_empty() {
                self.session.delete_record(&native.id).await?;
                removed.push(record.clone());
                continue;
            }

            let matches = self.lookup(&native, true).await?;
            if matches.is_empty() {
                log::debug!(
                    "[{PROVIDER_ID}] Nothing to delete for {} '{}'",
                    native.record_type,
                    record.name
                );
            }
            for existing in &matches {
                let decoded = to_generic(existing, self.zone)?;
                self.session.delete_record(&existing.id).await?;
                removed.push(decoded);
            }
        }
        Ok(removed)
    }
}

/// `""` and `"@"` both mean the apex.
fn relative_name(native_name: &str) -> String {
    if native_name.is_empty() {
        "@".to_string()
    } else {
        native_name.to_string()
    }
}
