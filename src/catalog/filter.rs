use super::{Course, Section};
use tracing::debug;

pub fn is_qualifying(section: &Section) -> bool {
    section.kind().is_qualifying()
}

/// Keeps lecture and discussion sections, dropping courses left with none.
pub fn filter(courses: Vec<Course>) -> Vec<Course> {
    courses
        .into_iter()
        .filter_map(|mut course| {
            course.sections.retain(is_qualifying);
            if course.sections.is_empty() {
                debug!(
                    "Skipping course {} {} - no Lecture or Discussion sections",
                    course.subject_code, course.number
                );
                None
            } else {
                Some(course)
            }
        })
        .collect()
}
