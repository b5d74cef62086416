//! Event configuration and school persistence
//!
//! Events, their field definitions, discount tiers and fees are owned by
//! event administrators; this core loads them as an immutable snapshot.
//! The save functions are provisioning hooks (seeding, admin tooling).

use crate::models::{
    DiscountTier, EventSnapshot, FieldConstraints, FieldDefinition, FieldType, School,
};
use crate::{Error, Result};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::str::FromStr;

/// Load one event's full configuration snapshot
pub async fn load_event_snapshot(pool: &SqlitePool, event_id: &str) -> Result<EventSnapshot> {
    let row = sqlx::query(
        "SELECT id, code, name, active, deadline FROM events WHERE id = ?",
    )
    .bind(event_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Event not found: {}", event_id)))?;

    let deadline: Option<String> = row.get("deadline");
    let deadline = deadline
        .map(|s| chrono::DateTime::parse_from_rfc3339(&s))
        .transpose()
        .map_err(|e| Error::Internal(format!("Failed to parse deadline: {}", e)))?
        .map(|dt| dt.with_timezone(&chrono::Utc));

    let field_rows = sqlx::query(
        r#"
        SELECT field_id, label, field_type, required, options,
               min_value, max_value, min_length, max_length, pattern, sort_order
        FROM event_fields
        WHERE event_id = ?
        ORDER BY sort_order
        "#,
    )
    .bind(event_id)
    .fetch_all(pool)
    .await?;

    let mut fields = Vec::with_capacity(field_rows.len());
    for field_row in field_rows {
        let type_str: String = field_row.get("field_type");
        let options: Option<String> = field_row.get("options");
        let options: Vec<String> = match options {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| Error::Internal(format!("Failed to parse options: {}", e)))?,
            None => Vec::new(),
        };
        fields.push(FieldDefinition {
            id: field_row.get("field_id"),
            label: field_row.get("label"),
            field_type: FieldType::from_str(&type_str)?,
            required: field_row.get::<i64, _>("required") != 0,
            options,
            constraints: FieldConstraints {
                min: field_row.get("min_value"),
                max: field_row.get("max_value"),
                min_length: field_row
                    .get::<Option<i64>, _>("min_length")
                    .map(|v| v as usize),
                max_length: field_row
                    .get::<Option<i64>, _>("max_length")
                    .map(|v| v as usize),
                pattern: field_row.get("pattern"),
            },
            order: field_row.get("sort_order"),
        });
    }

    let tier_rows = sqlx::query(
        r#"
        SELECT min_students, discount_percent
        FROM discount_tiers
        WHERE event_id = ?
        ORDER BY min_students
        "#,
    )
    .bind(event_id)
    .fetch_all(pool)
    .await?;
    let tiers = tier_rows
        .iter()
        .map(|r| DiscountTier {
            min_students: r.get::<i64, _>("min_students") as u32,
            discount_percent: r.get("discount_percent"),
        })
        .collect();

    let fee_rows = sqlx::query("SELECT currency, unit_fee FROM event_fees WHERE event_id = ?")
        .bind(event_id)
        .fetch_all(pool)
        .await?;
    let mut fees = HashMap::new();
    for fee_row in fee_rows {
        fees.insert(fee_row.get("currency"), fee_row.get("unit_fee"));
    }

    let snapshot = EventSnapshot {
        id: row.get("id"),
        code: row.get("code"),
        name: row.get("name"),
        active: row.get::<i64, _>("active") != 0,
        deadline,
        fields,
        tiers,
        fees,
    };
    snapshot.validate()?;
    Ok(snapshot)
}

/// Load a school by id
pub async fn load_school(pool: &SqlitePool, school_id: &str) -> Result<School> {
    let row = sqlx::query("SELECT id, name, currency FROM schools WHERE id = ?")
        .bind(school_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("School not found: {}", school_id)))?;

    Ok(School {
        id: row.get("id"),
        name: row.get("name"),
        currency: row.get("currency"),
    })
}

/// Upsert a school (provisioning hook)
pub async fn save_school(pool: &SqlitePool, school: &School) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO schools (id, name, currency)
        VALUES (?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            currency = excluded.currency,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(&school.id)
    .bind(&school.name)
    .bind(&school.currency)
    .execute(pool)
    .await?;
    Ok(())
}

/// Upsert an event's full configuration (provisioning hook)
///
/// Replaces the event's fields, tiers and fees wholesale so the stored
/// configuration always matches the snapshot exactly.
pub async fn save_event_snapshot(pool: &SqlitePool, event: &EventSnapshot) -> Result<()> {
    event.validate()?;

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO events (id, code, name, active, deadline)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            code = excluded.code,
            name = excluded.name,
            active = excluded.active,
            deadline = excluded.deadline,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(&event.id)
    .bind(&event.code)
    .bind(&event.name)
    .bind(event.active as i64)
    .bind(event.deadline.map(|d| d.to_rfc3339()))
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM event_fields WHERE event_id = ?")
        .bind(&event.id)
        .execute(&mut *tx)
        .await?;
    for field in &event.fields {
        let options = if field.options.is_empty() {
            None
        } else {
            Some(
                serde_json::to_string(&field.options)
                    .map_err(|e| Error::Internal(format!("Failed to serialize options: {}", e)))?,
            )
        };
        sqlx::query(
            r#"
            INSERT INTO event_fields (
                event_id, field_id, label, field_type, required, options,
                min_value, max_value, min_length, max_length, pattern, sort_order
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&event.id)
        .bind(&field.id)
        .bind(&field.label)
        .bind(field.field_type.as_str())
        .bind(field.required as i64)
        .bind(options)
        .bind(field.constraints.min)
        .bind(field.constraints.max)
        .bind(field.constraints.min_length.map(|v| v as i64))
        .bind(field.constraints.max_length.map(|v| v as i64))
        .bind(&field.constraints.pattern)
        .bind(field.order)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query("DELETE FROM discount_tiers WHERE event_id = ?")
        .bind(&event.id)
        .execute(&mut *tx)
        .await?;
    for tier in &event.tiers {
        sqlx::query(
            "INSERT INTO discount_tiers (event_id, min_students, discount_percent) VALUES (?, ?, ?)",
        )
        .bind(&event.id)
        .bind(tier.min_students as i64)
        .bind(tier.discount_percent)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query("DELETE FROM event_fees WHERE event_id = ?")
        .bind(&event.id)
        .execute(&mut *tx)
        .await?;
    for (currency, unit_fee) in &event.fees {
        sqlx::query("INSERT INTO event_fees (event_id, currency, unit_fee) VALUES (?, ?, ?)")
            .bind(&event.id)
            .bind(currency)
            .bind(unit_fee)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldConstraints, FieldType};

    fn snapshot() -> EventSnapshot {
        EventSnapshot {
            id: "evt-1".to_string(),
            code: "SCI24".to_string(),
            name: "Science Olympiad".to_string(),
            active: true,
            deadline: None,
            fields: vec![FieldDefinition {
                id: "tshirt".to_string(),
                label: "T-Shirt Size".to_string(),
                field_type: FieldType::Select,
                required: true,
                options: vec!["Small".to_string(), "Large".to_string()],
                constraints: FieldConstraints {
                    min_length: Some(1),
                    ..Default::default()
                },
                order: 1,
            }],
            tiers: vec![DiscountTier { min_students: 10, discount_percent: 5.0 }],
            fees: HashMap::from([("INR".to_string(), 10_000_i64)]),
        }
    }

    #[tokio::test]
    async fn test_save_and_load_event_snapshot() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        crate::db::init_schema(&pool).await.unwrap();

        let event = snapshot();
        save_event_snapshot(&pool, &event).await.unwrap();

        let loaded = load_event_snapshot(&pool, "evt-1").await.unwrap();
        assert_eq!(loaded.code, "SCI24");
        assert_eq!(loaded.fields.len(), 1);
        assert_eq!(loaded.fields[0].options, vec!["Small", "Large"]);
        assert_eq!(loaded.fields[0].constraints.min_length, Some(1));
        assert_eq!(loaded.tiers, event.tiers);
        assert_eq!(loaded.unit_fee("INR"), Some(10_000));
    }

    #[tokio::test]
    async fn test_load_missing_event_is_not_found() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        crate::db::init_schema(&pool).await.unwrap();
        let result = load_event_snapshot(&pool, "nope").await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_save_and_load_school() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        crate::db::init_schema(&pool).await.unwrap();

        let school = School {
            id: "sch-1".to_string(),
            name: "Hillside Public School".to_string(),
            currency: "INR".to_string(),
        };
        save_school(&pool, &school).await.unwrap();
        let loaded = load_school(&pool, "sch-1").await.unwrap();
        assert_eq!(loaded.name, "Hillside Public School");
        assert_eq!(loaded.currency, "INR");
    }
}
