use serde::{Deserialize, Serialize};

/// Placeholder used when a student document carries no guardian name.
pub const DEFAULT_PARENT_NAME: &str = "Parent";
/// Placeholder used when a student document carries no name.
pub const DEFAULT_STUDENT_NAME: &str = "Student";

/// A student as seen by the conversational surface, enriched with the
/// owning tenant's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub student_id: String,
    pub tenant_id: String,
    pub tenant_name: String,
    pub parent_name: String,
    pub student_name: String,
    #[serde(default)]
    pub class_grade: String,
    #[serde(default)]
    pub section: String,
}

impl StudentRecord {
    /// `"<class>-<section>"`, as shown in menus and digests.
    pub fn class_label(&self) -> String {
        format!("{}-{}", self.class_grade, self.section)
    }
}

/// Pick the guardian label: father, then mother, then the generic parent
/// field, then the placeholder.  Blank strings count as absent.
pub fn guardian_name(
    father: Option<&str>,
    mother: Option<&str>,
    parent: Option<&str>,
) -> String {
    [father, mother, parent]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(DEFAULT_PARENT_NAME)
        .to_owned()
}

/// One row of a tenant's parent contact sheet (broadcast targeting).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentContact {
    pub email: String,
    pub phone: String,
    pub alternate_phone: String,
    pub name: String,
    pub student_id: String,
    pub student_name: String,
    #[serde(rename = "class")]
    pub class_grade: String,
    pub section: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guardian_prefers_father_then_mother_then_parent() {
        assert_eq!(guardian_name(Some("Raj"), Some("Priya"), Some("X")), "Raj");
        assert_eq!(guardian_name(None, Some("Priya"), Some("X")), "Priya");
        assert_eq!(guardian_name(None, None, Some("X")), "X");
        assert_eq!(guardian_name(None, None, None), DEFAULT_PARENT_NAME);
    }

    #[test]
    fn blank_guardian_fields_are_skipped() {
        assert_eq!(guardian_name(Some("  "), Some(""), Some("Asha")), "Asha");
    }

    #[test]
    fn student_record_serializes_camel_case() {
        let s = StudentRecord {
            student_id: "s1".into(),
            tenant_id: "t1".into(),
            tenant_name: "Green Valley".into(),
            parent_name: "Raj".into(),
            student_name: "Aarav".into(),
            class_grade: "5".into(),
            section: "A".into(),
        };
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["studentId"], "s1");
        assert_eq!(v["tenantName"], "Green Valley");
        assert_eq!(s.class_label(), "5-A");
    }
}
