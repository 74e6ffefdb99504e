use std::collections::BTreeMap;

use crate::models::{GradedStudent, SectionGroup};

/// Groups students by section and orders each group by last then first name.
/// Callers must not rely on the order of the returned groups.
pub fn partition_by_section(students: Vec<GradedStudent>) -> Vec<SectionGroup> {
    let mut sections: BTreeMap<String, Vec<GradedStudent>> = BTreeMap::new();
    for student in students {
        sections
            .entry(student.record.section.clone())
            .or_default()
            .push(student);
    }

    sections
        .into_iter()
        .map(|(section, mut students)| {
            students.sort_by(|a, b| {
                a.record
                    .last_name
                    .cmp(&b.record.last_name)
                    .then_with(|| a.record.first_name.cmp(&b.record.first_name))
                    .then_with(|| a.record.identifier.cmp(&b.record.identifier))
            });
            SectionGroup { section, students }
        })
        .collect()
}
