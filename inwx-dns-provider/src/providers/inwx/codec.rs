//! Record ⇄ `NativeRecord`
//!
//! INWX stores the priority of MX, SRV and service-binding records in a
//! separate `prio` field; everything else travels in `content` in
//! presentation format.

use std::time::Duration;

use crate::error::Result;
use crate::providers::common::full_name_to_relative;
use crate::types::{Record, RecordData, Rr};

use super::NativeRecord;

/// Types whose leading presentation field lives in `prio`.
fn carries_priority(record_type: &str) -> bool {
    matches!(record_type, "MX" | "SRV" | "HTTPS" | "SVCB")
}

/// 将 `Record` 转换为 INWX 写入格式
///
/// The name stays zone-relative, with the apex written as `""`.
pub fn to_native(record: &Record) -> NativeRecord {
    let rr = record.rr();

    let (content, prio) = match &record.data {
        RecordData::MX {
            preference,
            exchange,
        } => (exchange.clone(), *preference),
        RecordData::SRV {
            priority,
            weight,
            port,
            target,
            ..
        } => (format!("{weight} {port} {target}"), *priority),
        RecordData::HTTPS {
            priority,
            target,
            params,
        }
        | RecordData::SVCB {
            priority,
            target,
            params,
        } => {
            if params.is_empty() {
                (target.clone(), *priority)
            } else {
                (format!("{target} {params}"), *priority)
            }
        }
        _ => (rr.data, 0),
    };

    NativeRecord {
        id: record.id.clone().unwrap_or_default(),
        name: native_name(&rr.name),
        record_type: rr.record_type,
        content,
        ttl: record.ttl.as_secs(),
        prio,
    }
}

/// 将 INWX 记录转换为 `Record`
///
/// `native.name` is zone-absolute. Fails with `RecordParseError` when the
/// content does not fit the grammar of the declared type.
pub fn to_generic(native: &NativeRecord, zone: &str) -> Result<Record> {
    let record_type = native.record_type.to_ascii_uppercase();
    let data = if carries_priority(&record_type) {
        format!("{} {}", native.prio, native.content)
    } else {
        native.content.clone()
    };

    let mut record = Record::from_rr(&Rr {
        name: full_name_to_relative(&native.name, zone),
        ttl: Duration::from_secs(native.ttl),
        record_type,
        data,
    })?;
    record.id = (!native.id.is_empty()).then(|| native.id.clone());
    Ok(record)
}

/// Relative name as the write API expects it.
pub(crate) fn native_name(relative: &str) -> String {
    if relative == "@" {
        String::new()
    } else {
        relative.to_string()
    }
}
