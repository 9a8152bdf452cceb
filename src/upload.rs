use crate::{
    catalog::{is_qualifying, Course, Section},
    Table,
};
use serde::Serialize;
use std::ops::AddAssign;
use tracing::{error, info};

#[derive(Debug, Serialize)]
pub struct CourseRecord<'a> {
    #[serde(rename = "Course Number")]
    pub number: &'a str,
    #[serde(rename = "Course Name")]
    pub name: &'a str,
    #[serde(rename = "Units")]
    pub units: &'a str,
    #[serde(rename = "Subject Code")]
    pub subject_code: &'a str,
}

impl<'a> From<&'a Course> for CourseRecord<'a> {
    fn from(course: &'a Course) -> Self {
        CourseRecord {
            number: &course.number,
            name: &course.name,
            units: &course.units,
            subject_code: &course.subject_code,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SectionRecord<'a> {
    #[serde(rename = "Section ID")]
    pub section_id: &'a str,
    #[serde(rename = "Meeting Type")]
    pub meeting_type: &'a str,
    #[serde(rename = "Days")]
    pub days: &'a str,
    #[serde(rename = "Time")]
    pub time: &'a str,
    #[serde(rename = "Building")]
    pub building: &'a str,
    #[serde(rename = "Room")]
    pub room: &'a str,
    #[serde(rename = "Instructor")]
    pub instructor: &'a str,
    #[serde(rename = "Available Seats")]
    pub available_seats: u32,
    #[serde(rename = "Seat Limit")]
    pub seat_limit: u32,
    /// Linked-record field, holding the parent course's id.
    #[serde(rename = "Course Link")]
    pub course_link: [&'a str; 1],
    #[serde(rename = "Subject Code")]
    pub subject_code: &'a str,
}

impl<'a> SectionRecord<'a> {
    pub fn new(section: &'a Section, course_id: &'a str, course: &'a Course) -> Self {
        SectionRecord {
            section_id: &section.section_id,
            meeting_type: &section.meeting_type,
            days: &section.days,
            time: &section.time,
            building: &section.building,
            room: &section.room,
            instructor: &section.instructor,
            available_seats: section.available_seats,
            seat_limit: section.seat_limit,
            course_link: [course_id],
            subject_code: &course.subject_code,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UploadReport {
    pub courses_created: usize,
    pub courses_skipped: usize,
    pub course_failures: usize,
    pub sections_created: usize,
    pub section_failures: usize,
}

impl AddAssign for UploadReport {
    fn add_assign(&mut self, other: Self) {
        self.courses_created += other.courses_created;
        self.courses_skipped += other.courses_skipped;
        self.course_failures += other.course_failures;
        self.sections_created += other.sections_created;
        self.section_failures += other.section_failures;
    }
}

/// Writes courses and their qualifying sections into a linked table pair.
pub struct UploadPipeline<C, S> {
    courses: C,
    sections: S,
}

impl<C, S> UploadPipeline<C, S>
where
    C: Table + Sync,
    S: Table + Sync,
{
    pub fn new(courses: C, sections: S) -> Self {
        UploadPipeline { courses, sections }
    }

    pub async fn upload(&self, courses: &[Course]) -> UploadReport {
        let mut report = UploadReport::default();
        info!(
            "Starting upload of {} courses to {}",
            courses.len(),
            self.courses.get_name()
        );
        for course in courses {
            self.upload_course(course, &mut report).await;
        }
        info!(
            "Finished upload: {} courses, {} sections created",
            report.courses_created, report.sections_created
        );
        report
    }

    async fn upload_course(&self, course: &Course, report: &mut UploadReport) {
        if !course.sections.iter().any(is_qualifying) {
            info!(
                "Skipping course {} - no Lecture or Discussion sections",
                course.number
            );
            report.courses_skipped += 1;
            return;
        }

        let course_id = match self.courses.create(&CourseRecord::from(course)).await {
            Ok(id) => {
                info!("Created course: {} - {}", course.number, course.name);
                report.courses_created += 1;
                id
            }
            Err(e) => {
                error!(
                    "Error creating course {} {}: {}",
                    course.subject_code, course.number, e
                );
                report.course_failures += 1;
                return;
            }
        };

        for section in course.sections.iter().filter(|s| is_qualifying(s)) {
            let record = SectionRecord::new(section, &course_id, course);
            match self.sections.create(&record).await {
                Ok(_) => {
                    info!("Created section: {} {}", course.number, section.section_id);
                    report.sections_created += 1;
                }
                Err(e) => {
                    error!(
                        "Error creating section {} of {}: {}",
                        section.section_id, course.number, e
                    );
                    report.section_failures += 1;
                }
            }
        }
    }
}
