//! Student entity, its column definitions, and typed request bodies.

use crate::error::AppError;
use chrono::{DateTime, SubsecRound, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix of the derived display identifier (`stu_id`).
pub const STU_ID_PREFIX: &str = "STU-";

/// Table backing the entity.
pub const TABLE: &str = "students";

/// One persisted column: name, SQL type, and the default used when the column
/// is added to an existing table.
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub default: Option<&'static str>,
    pub primary_key: bool,
}

const fn column(name: &'static str, sql_type: &'static str, default: &'static str) -> ColumnDef {
    ColumnDef {
        name,
        sql_type,
        default: Some(default),
        primary_key: false,
    }
}

/// Columns in declaration order. Auto-migration and every SQL statement in the
/// Postgres store are derived from this list.
pub const COLUMNS: &[ColumnDef] = &[
    ColumnDef {
        name: "id",
        sql_type: "UUID",
        default: None,
        primary_key: true,
    },
    column("stu_id", "TEXT", "''"),
    column("name", "TEXT", "''"),
    column("course", "TEXT", "''"),
    column("status", "TEXT", "''"),
    column("email", "TEXT", "''"),
    column("phone", "TEXT", "''"),
    column("age", "INTEGER", "0"),
    column("progress", "INTEGER", "0"),
    column("created_at", "TIMESTAMPTZ", "NOW()"),
    column("updated_at", "TIMESTAMPTZ", "NOW()"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Student {
    pub id: Uuid,
    pub stu_id: String,
    pub name: String,
    pub course: String,
    pub status: String,
    pub email: String,
    pub phone: String,
    pub age: i32,
    pub progress: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Current time at the precision Postgres stores (microseconds), so a record
/// returned on create equals the one read back later.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

impl Student {
    /// Build a new record from a create request: fresh id, derived `stu_id`,
    /// zeroed progress, both timestamps set to `at`.
    pub fn create(new: NewStudent, at: DateTime<Utc>) -> Self {
        let id = Uuid::new_v4();
        Student {
            id,
            stu_id: format!("{}{}", STU_ID_PREFIX, id),
            name: new.name,
            course: new.course,
            status: new.status,
            email: new.email,
            phone: new.phone,
            age: new.age,
            progress: 0,
            created_at: at,
            updated_at: at,
        }
    }

    /// Overwrite the fields present in `changes`. `updated_at` never moves backwards.
    pub fn apply(&mut self, changes: &StudentChanges, at: DateTime<Utc>) {
        if let Some(ref v) = changes.name {
            self.name = v.clone();
        }
        if let Some(ref v) = changes.course {
            self.course = v.clone();
        }
        if let Some(ref v) = changes.status {
            self.status = v.clone();
        }
        if let Some(ref v) = changes.email {
            self.email = v.clone();
        }
        if let Some(ref v) = changes.phone {
            self.phone = v.clone();
        }
        if let Some(v) = changes.age {
            self.age = v;
        }
        self.updated_at = self.updated_at.max(at);
    }
}

/// Body of `POST /students`.
///
/// Server-controlled keys (`id`, `stu_id`, `progress`, `created_at`,
/// `updated_at`) are accepted and discarded; any other unknown key is rejected.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewStudent {
    pub name: String,
    #[serde(default)]
    pub course: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub age: i32,

    #[serde(default, rename = "id")]
    _id: Option<IgnoredAny>,
    #[serde(default, rename = "stu_id")]
    _stu_id: Option<IgnoredAny>,
    #[serde(default, rename = "progress")]
    _progress: Option<IgnoredAny>,
    #[serde(default, rename = "created_at")]
    _created_at: Option<IgnoredAny>,
    #[serde(default, rename = "updated_at")]
    _updated_at: Option<IgnoredAny>,
}

impl NewStudent {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_name(Some(&self.name))?;
        validate_age(Some(self.age))
    }
}

/// Body of `PUT /students/:id`. Absent or `null` fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudentChanges {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub age: Option<i32>,

    #[serde(default, rename = "id")]
    _id: Option<IgnoredAny>,
    #[serde(default, rename = "stu_id")]
    _stu_id: Option<IgnoredAny>,
    #[serde(default, rename = "progress")]
    _progress: Option<IgnoredAny>,
    #[serde(default, rename = "created_at")]
    _created_at: Option<IgnoredAny>,
    #[serde(default, rename = "updated_at")]
    _updated_at: Option<IgnoredAny>,
}

impl StudentChanges {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_name(self.name.as_deref())?;
        validate_age(self.age)
    }
}

fn validate_name(name: Option<&str>) -> Result<(), AppError> {
    match name {
        Some(n) if n.trim().is_empty() => Err(AppError::BadRequest("name must not be empty".into())),
        _ => Ok(()),
    }
}

fn validate_age(age: Option<i32>) -> Result<(), AppError> {
    match age {
        Some(a) if a < 0 => Err(AppError::BadRequest("age must not be negative".into())),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_student(body: serde_json::Value) -> NewStudent {
        serde_json::from_value(body).expect("valid body")
    }

    #[test]
    fn create_stamps_server_fields() {
        let at = now();
        let s = Student::create(new_student(json!({"name": "Ana", "course": "Math", "age": 20})), at);
        assert_eq!(s.stu_id, format!("STU-{}", s.id));
        assert_eq!(s.progress, 0);
        assert_eq!(s.created_at, s.updated_at);
        assert_eq!(s.created_at, at);
        assert_eq!(s.status, "");
    }

    #[test]
    fn create_generates_distinct_ids() {
        let at = now();
        let a = Student::create(new_student(json!({"name": "A"})), at);
        let b = Student::create(new_student(json!({"name": "B"})), at);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn server_controlled_keys_are_ignored() {
        let body = json!({
            "id": "not-even-a-uuid",
            "name": "Ana",
            "progress": 99,
            "created_at": "1999-01-01T00:00:00Z",
        });
        let s = Student::create(new_student(body), now());
        assert_eq!(s.progress, 0);
        assert_ne!(s.created_at.to_rfc3339(), "1999-01-01T00:00:00+00:00");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let res: Result<NewStudent, _> = serde_json::from_value(json!({"name": "Ana", "nickname": "A"}));
        assert!(res.is_err());
        let res: Result<StudentChanges, _> = serde_json::from_value(json!({"grade": 3}));
        assert!(res.is_err());
    }

    #[test]
    fn name_is_required_and_non_blank() {
        let res: Result<NewStudent, _> = serde_json::from_value(json!({"course": "Math"}));
        assert!(res.is_err());
        assert!(new_student(json!({"name": "   "})).validate().is_err());
        assert!(new_student(json!({"name": "Ana", "age": -1})).validate().is_err());
        assert!(new_student(json!({"name": "Ana"})).validate().is_ok());
    }

    #[test]
    fn changes_reject_blank_name_and_negative_age() {
        let changes = |v| serde_json::from_value::<StudentChanges>(v).unwrap();
        assert!(changes(json!({"name": "  "})).validate().is_err());
        assert!(changes(json!({"age": -1})).validate().is_err());
        assert!(changes(json!({"name": null, "age": null})).validate().is_ok());
        assert!(changes(json!({})).validate().is_ok());
    }

    #[test]
    fn apply_touches_only_present_fields() {
        let created = now();
        let mut s = Student::create(new_student(json!({"name": "Ana", "course": "Math", "email": "a@x.io"})), created);
        let changes: StudentChanges = serde_json::from_value(json!({"name": "Ana M.", "age": 21, "email": null})).unwrap();
        let later = created + chrono::Duration::seconds(5);
        s.apply(&changes, later);
        assert_eq!(s.name, "Ana M.");
        assert_eq!(s.age, 21);
        assert_eq!(s.course, "Math");
        assert_eq!(s.email, "a@x.io");
        assert_eq!(s.created_at, created);
        assert_eq!(s.updated_at, later);
    }

    #[test]
    fn updated_at_never_goes_backwards() {
        let created = now();
        let mut s = Student::create(new_student(json!({"name": "Ana"})), created);
        s.apply(&StudentChanges::default(), created - chrono::Duration::seconds(10));
        assert_eq!(s.updated_at, created);
    }

    #[test]
    fn columns_match_entity_fields() {
        let names: Vec<&str> = COLUMNS.iter().map(|c| c.name).collect();
        assert_eq!(
            names,
            [
                "id", "stu_id", "name", "course", "status", "email", "phone", "age", "progress", "created_at",
                "updated_at"
            ]
        );
        assert_eq!(COLUMNS.iter().filter(|c| c.primary_key).count(), 1);
    }
}
