//! Cache key layout shared by readers and the writers that invalidate them.

pub fn students(normalized_phone: &str) -> String {
    format!("students:{normalized_phone}")
}

pub fn tenant_name(tenant: &str) -> String {
    format!("school_name:{tenant}")
}

pub fn parent_contacts(tenant: &str) -> String {
    format!("parent_contacts:{tenant}")
}

pub fn homework(tenant: &str, class_grade: &str, section: &str) -> String {
    format!("homework:{tenant}:{class_grade}:{section}")
}

pub fn announcements(tenant: &str) -> String {
    format!("announcements:{tenant}")
}

pub fn dashboard(tenant: &str) -> String {
    format!("dashboard:{tenant}")
}

/// `students:` keys for every variant of a raw number, so a write can drop
/// resolutions cached under any format the number was looked up in.
pub fn students_all_variants(raw_phone: &str, country_code: &str) -> Vec<String> {
    es_domain::phone::variants(raw_phone, country_code)
        .iter()
        .map(|v| students(v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_keys_cover_both_formats() {
        let keys = students_all_variants("98765 43210", "91");
        assert_eq!(keys, vec!["students:9876543210", "students:919876543210"]);
    }

    #[test]
    fn homework_key_scopes_class_and_section() {
        assert_eq!(homework("t1", "5", "A"), "homework:t1:5:A");
    }
}
