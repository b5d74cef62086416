//! Shared fixtures for integration tests
#![allow(dead_code)]

use regbatch::db;
use regbatch::models::{
    DiscountTier, EventSnapshot, FieldConstraints, FieldDefinition, FieldType, School,
    ValidatedRow,
};
use sqlx::SqlitePool;
use std::collections::HashMap;

pub async fn setup_pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    db::init_schema(&pool).await.expect("Failed to init schema");
    pool
}

fn field(
    id: &str,
    label: &str,
    field_type: FieldType,
    required: bool,
    options: Vec<&str>,
    order: i64,
) -> FieldDefinition {
    FieldDefinition {
        id: id.to_string(),
        label: label.to_string(),
        field_type,
        required,
        options: options.into_iter().map(String::from).collect(),
        constraints: FieldConstraints::default(),
        order,
    }
}

/// Event with a mixed dynamic schema: two required fields, one optional
/// select, unit fee 100 minor units, tiers at 10 (5%) and 50 (10%)
pub fn science_event() -> EventSnapshot {
    EventSnapshot {
        id: "evt-sci".to_string(),
        code: "SCI24".to_string(),
        name: "Science Olympiad 2024".to_string(),
        active: true,
        deadline: None,
        fields: vec![
            field("parent_email", "Parent Email", FieldType::Email, true, vec![], 1),
            field("dob", "Date of Birth", FieldType::Date, true, vec![], 2),
            field(
                "tshirt",
                "T-Shirt Size",
                FieldType::Select,
                false,
                vec!["Small", "Medium", "Large"],
                3,
            ),
        ],
        tiers: vec![
            DiscountTier { min_students: 10, discount_percent: 5.0 },
            DiscountTier { min_students: 50, discount_percent: 10.0 },
        ],
        fees: HashMap::from([("INR".to_string(), 100_i64)]),
    }
}

pub fn hillside_school() -> School {
    School {
        id: "sch-hillside".to_string(),
        name: "Hillside Public School".to_string(),
        currency: "INR".to_string(),
    }
}

pub async fn seed(pool: &SqlitePool) -> (EventSnapshot, School) {
    let event = science_event();
    let school = hillside_school();
    db::events::save_event_snapshot(pool, &event)
        .await
        .expect("Failed to seed event");
    db::events::save_school(pool, &school)
        .await
        .expect("Failed to seed school");
    (event, school)
}

/// N already-validated rows, as the spreadsheet ingester would emit them
pub fn validated_rows(count: usize) -> Vec<ValidatedRow> {
    (0..count)
        .map(|i| ValidatedRow {
            row: (i + 2) as u32,
            student_name: format!("Student {}", i + 1),
            grade: "5".to_string(),
            section: Some("A".to_string()),
            dynamic_data: Default::default(),
        })
        .collect()
}
