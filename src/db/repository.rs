use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::*;
use crate::models::{now_seconds, ScanOutcome, ScanRecord};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SELECT_COLUMNS: &str = "SELECT id, owner_id, scan_type, result, confidence, notes,
     recommendations, findings, needs_hospital, severity, image_ref, analysis_path,
     created_at, deleted_at
     FROM health_scans";

pub fn insert_scan(conn: &Connection, record: &ScanRecord) -> Result<(), DatabaseError> {
    let recommendations = encode_list("recommendations", &record.outcome.recommendations)?;
    let findings = encode_list("findings", &record.outcome.findings)?;

    conn.execute(
        "INSERT INTO health_scans (id, owner_id, scan_type, result, confidence, notes,
         recommendations, findings, needs_hospital, severity, image_ref, analysis_path,
         created_at, deleted_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            record.id.to_string(),
            record.owner_id,
            record.scan_type.as_str(),
            record.outcome.result.as_str(),
            record.outcome.confidence as i64,
            record.outcome.notes,
            recommendations,
            findings,
            record.outcome.needs_hospital as i32,
            record.outcome.severity.as_str(),
            record.image_ref,
            record.analysis_path.as_str(),
            record.created_at.format(TIMESTAMP_FORMAT).to_string(),
            record.deleted_at.map(|d| d.format(TIMESTAMP_FORMAT).to_string()),
        ],
    )?;
    Ok(())
}

/// List an owner's scans, newest first. Soft-deleted rows are included only
/// when asked for.
pub fn list_scans(
    conn: &Connection,
    owner_id: &str,
    include_deleted: bool,
) -> Result<Vec<ScanRecord>, DatabaseError> {
    let sql = if include_deleted {
        format!("{SELECT_COLUMNS} WHERE owner_id = ?1 ORDER BY created_at DESC, rowid DESC")
    } else {
        format!(
            "{SELECT_COLUMNS} WHERE owner_id = ?1 AND deleted_at IS NULL
             ORDER BY created_at DESC, rowid DESC"
        )
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![owner_id], read_row)?;

    let mut scans = Vec::new();
    for row in rows {
        scans.push(scan_from_row(row?)?);
    }
    Ok(scans)
}

/// Fetch a single live (not deleted) scan.
pub fn get_scan(
    conn: &Connection,
    owner_id: &str,
    id: &Uuid,
) -> Result<Option<ScanRecord>, DatabaseError> {
    let sql = format!("{SELECT_COLUMNS} WHERE id = ?1 AND owner_id = ?2 AND deleted_at IS NULL");
    let row = conn
        .query_row(&sql, params![id.to_string(), owner_id], read_row)
        .optional()?;
    row.map(scan_from_row).transpose()
}

/// Stamp `deleted_at` on an owned scan. Deleting an already-deleted scan
/// re-stamps it.
pub fn soft_delete_scan(
    conn: &Connection,
    owner_id: &str,
    id: &Uuid,
) -> Result<NaiveDateTime, DatabaseError> {
    let deleted_at = now_seconds();
    let affected = conn.execute(
        "UPDATE health_scans SET deleted_at = ?1
         WHERE id = ?2 AND owner_id = ?3",
        params![
            deleted_at.format(TIMESTAMP_FORMAT).to_string(),
            id.to_string(),
            owner_id
        ],
    )?;
    if affected == 0 {
        return Err(not_found(id));
    }
    Ok(deleted_at)
}

/// Clear `deleted_at` on a soft-deleted scan and return the restored record.
/// Restoring a live scan reports not-found.
pub fn restore_scan(
    conn: &Connection,
    owner_id: &str,
    id: &Uuid,
) -> Result<ScanRecord, DatabaseError> {
    let affected = conn.execute(
        "UPDATE health_scans SET deleted_at = NULL
         WHERE id = ?1 AND owner_id = ?2 AND deleted_at IS NOT NULL",
        params![id.to_string(), owner_id],
    )?;
    if affected == 0 {
        return Err(not_found(id));
    }
    get_scan(conn, owner_id, id)?.ok_or_else(|| not_found(id))
}

fn not_found(id: &Uuid) -> DatabaseError {
    DatabaseError::NotFound {
        entity_type: "health_scan".into(),
        id: id.to_string(),
    }
}

fn encode_list(column: &str, items: &[String]) -> Result<String, DatabaseError> {
    serde_json::to_string(items).map_err(|e| DatabaseError::MalformedColumn {
        column: column.into(),
        reason: e.to_string(),
    })
}

fn decode_list(column: &str, raw: &str) -> Result<Vec<String>, DatabaseError> {
    serde_json::from_str(raw).map_err(|e| DatabaseError::MalformedColumn {
        column: column.into(),
        reason: e.to_string(),
    })
}

fn parse_timestamp(column: &str, raw: &str) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).map_err(|e| {
        DatabaseError::MalformedColumn {
            column: column.into(),
            reason: e.to_string(),
        }
    })
}

/// Raw column values, converted to domain types outside the rusqlite closure.
struct ScanRow {
    id: String,
    owner_id: String,
    scan_type: String,
    result: String,
    confidence: i64,
    notes: String,
    recommendations: String,
    findings: String,
    severity: String,
    image_ref: String,
    analysis_path: String,
    created_at: String,
    deleted_at: Option<String>,
}

fn read_row(row: &rusqlite::Row) -> Result<ScanRow, rusqlite::Error> {
    Ok(ScanRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        scan_type: row.get(2)?,
        result: row.get(3)?,
        confidence: row.get(4)?,
        notes: row.get(5)?,
        recommendations: row.get(6)?,
        findings: row.get(7)?,
        severity: row.get(9)?,
        image_ref: row.get(10)?,
        analysis_path: row.get(11)?,
        created_at: row.get(12)?,
        deleted_at: row.get(13)?,
    })
}

fn scan_from_row(row: ScanRow) -> Result<ScanRecord, DatabaseError> {
    let id = Uuid::parse_str(&row.id).map_err(|e| DatabaseError::MalformedColumn {
        column: "id".into(),
        reason: e.to_string(),
    })?;
    let result = Category::from_str(&row.result)?;
    let severity = Severity::from_str(&row.severity)?;

    Ok(ScanRecord {
        id,
        owner_id: row.owner_id,
        scan_type: ScanType::from_str(&row.scan_type)?,
        outcome: ScanOutcome {
            result,
            confidence: row.confidence.clamp(0, 100) as u8,
            notes: row.notes,
            recommendations: decode_list("recommendations", &row.recommendations)?,
            findings: decode_list("findings", &row.findings)?,
            needs_hospital: severity == Severity::High,
            severity,
        },
        image_ref: row.image_ref,
        analysis_path: AnalysisPath::from_str(&row.analysis_path)?,
        created_at: parse_timestamp("created_at", &row.created_at)?,
        deleted_at: row
            .deleted_at
            .as_deref()
            .map(|raw| parse_timestamp("deleted_at", raw))
            .transpose()?,
    })
}
