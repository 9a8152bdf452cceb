use super::{Course, RawCell, RawRow, RowKind, Section};
use crate::error::RowError;
use crate::utils::{non_blank, normalize, parse_count, NOT_AVAILABLE};
use lazy_regex::regex;
use std::mem;
use tracing::{debug, warn};

/// Column positions of the results table.
///
/// Header rows carry the course number and a title cell holding the bold
/// course name followed by a `( 4 Units)` parenthetical. Section rows carry
/// the meeting fields at fixed offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLayout {
    pub course_number: usize,
    pub course_title: usize,
    pub min_section_cells: usize,
    pub section_id: usize,
    pub meeting_type: usize,
    pub days: usize,
    pub time: usize,
    pub building: usize,
    pub room: usize,
    pub instructor: usize,
    pub available_seats: usize,
    pub seat_limit: usize,
}

impl RowLayout {
    /// Layout of the Schedule of Classes student results page.
    pub const SOC_2024: RowLayout = RowLayout {
        course_number: 1,
        course_title: 2,
        min_section_cells: 13,
        section_id: 2,
        meeting_type: 3,
        days: 5,
        time: 6,
        building: 7,
        room: 8,
        instructor: 9,
        available_seats: 10,
        seat_limit: 11,
    };
}

impl Default for RowLayout {
    fn default() -> Self {
        RowLayout::SOC_2024
    }
}

#[derive(Debug, Default, Clone)]
pub struct TableParser {
    layout: RowLayout,
}

#[derive(Debug)]
enum State {
    NoCurrentCourse,
    InCourse(Course),
}

#[derive(Debug)]
struct Accumulator {
    state: State,
    courses: Vec<Course>,
}

impl Default for Accumulator {
    fn default() -> Self {
        Accumulator {
            state: State::NoCurrentCourse,
            courses: vec![],
        }
    }
}

impl Accumulator {
    /// Emits the current course if it owns at least one section.
    fn flush(&mut self) {
        if let State::InCourse(course) = mem::replace(&mut self.state, State::NoCurrentCourse) {
            if course.sections.is_empty() {
                debug!("Dropping course {} without sections", course.number);
            } else {
                self.courses.push(course);
            }
        }
    }
}

impl TableParser {
    pub fn new(layout: RowLayout) -> Self {
        TableParser { layout }
    }

    /// Turns one page worth of rows into courses, in row order.
    pub fn parse(&self, rows: &[RawRow], subject_code: &str) -> Vec<Course> {
        let mut acc = rows
            .iter()
            .fold(Accumulator::default(), |acc, row| {
                self.step(acc, row, subject_code)
            });
        acc.flush();
        acc.courses
    }

    fn step(&self, mut acc: Accumulator, row: &RawRow, subject_code: &str) -> Accumulator {
        if row.cells.is_empty() {
            return acc;
        }

        match row.kind {
            RowKind::Header => {
                acc.flush();
                match self.header(row, subject_code) {
                    Ok(course) => acc.state = State::InCourse(course),
                    Err(e) => warn!("Skipping header row in {}: {}", subject_code, e),
                }
            }
            RowKind::Section => match &mut acc.state {
                State::InCourse(course) => match self.section(row) {
                    Ok(section) => course.sections.push(section),
                    Err(e) => warn!(
                        "Skipping section row of {} {}: {}",
                        subject_code, course.number, e
                    ),
                },
                State::NoCurrentCourse => {
                    debug!("Skipping section row in {}: {}", subject_code, RowError::Orphan)
                }
            },
            RowKind::Other => {}
        }
        acc
    }

    fn header(&self, row: &RawRow, subject_code: &str) -> Result<Course, RowError> {
        let number = cell(row, self.layout.course_number)
            .and_then(|c| non_blank(&c.text))
            .ok_or(RowError::MissingField("course number"))?;

        let title = cell(row, self.layout.course_title);
        let name = title
            .and_then(|c| c.marker.as_deref().and_then(non_blank))
            .or_else(|| title.and_then(|c| non_blank(strip_units(&c.text))))
            .ok_or(RowError::MissingField("course name"))?;

        let units = title
            .and_then(|c| units(&c.text))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        Ok(Course {
            number,
            name,
            units,
            subject_code: subject_code.to_string(),
            sections: vec![],
        })
    }

    fn section(&self, row: &RawRow) -> Result<Section, RowError> {
        let l = &self.layout;
        if row.cells.len() < l.min_section_cells {
            return Err(RowError::TooFewCells {
                found: row.cells.len(),
                required: l.min_section_cells,
            });
        }

        let text = |i: usize| normalize(&row.cells[i].text);

        let type_cell = &row.cells[l.meeting_type];
        let meeting_type = type_cell
            .hint
            .as_deref()
            .and_then(non_blank)
            .unwrap_or_else(|| normalize(&type_cell.text))
            .to_uppercase();

        let available = &row.cells[l.available_seats];
        let (available_seats, seat_limit) = if is_full(available) {
            (0, parse_count(&row.cells[l.seat_limit].text))
        } else {
            (
                parse_count(&available.text),
                parse_count(&row.cells[l.seat_limit].text),
            )
        };

        Ok(Section {
            section_id: text(l.section_id),
            meeting_type,
            days: text(l.days),
            time: text(l.time),
            building: text(l.building),
            room: text(l.room),
            instructor: text(l.instructor),
            available_seats,
            seat_limit,
        })
    }
}

fn cell(row: &RawRow, i: usize) -> Option<&RawCell> {
    row.cells.get(i)
}

fn is_full(cell: &RawCell) -> bool {
    cell.marker
        .as_deref()
        .unwrap_or(&cell.text)
        .to_uppercase()
        .contains("FULL")
}

fn units(title: &str) -> Option<String> {
    regex!(r"(?i)\(\s*([^()]*?)\s*units?\s*\)")
        .captures(title)
        .and_then(|c| c.get(1))
        .and_then(|m| non_blank(m.as_str()))
}

fn strip_units(title: &str) -> String {
    regex!(r"(?i)\(\s*[^()]*?\s*units?\s*\)")
        .replace_all(title, "")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Section;
    use pretty_assertions::assert_eq;

    fn header(number: &str, name: &str, units: &str) -> RawRow {
        RawRow {
            kind: RowKind::Header,
            cells: vec![
                RawCell::text(""),
                RawCell::text(number),
                RawCell {
                    text: format!("{} ( {} Units)", name, units),
                    hint: None,
                    marker: Some(name.to_string()),
                },
            ],
        }
    }

    fn section(id: &str, kind: &str, available: RawCell, limit: &str) -> RawRow {
        let mut cells = vec![RawCell::default(); 13];
        cells[2] = RawCell::text(id);
        cells[3] = RawCell {
            text: kind.to_string(),
            hint: None,
            marker: Some(kind.to_string()),
        };
        cells[4] = RawCell::text("A01");
        cells[5] = RawCell::text("MWF");
        cells[6] = RawCell::text("10:00a-10:50a");
        cells[7] = RawCell::text("CENTR");
        cells[8] = RawCell::text("115");
        cells[9] = RawCell::text("Smith,  John\n");
        cells[10] = available;
        cells[11] = RawCell::text(limit);
        RawRow {
            kind: RowKind::Section,
            cells,
        }
    }

    fn lecture(id: &str) -> RawRow {
        section(id, "LE", RawCell::text("12"), "30")
    }

    fn ids(course: &Course) -> Vec<&str> {
        course.sections.iter().map(|s| s.section_id.as_str()).collect()
    }

    #[test]
    fn headers_own_following_sections_in_order() {
        let rows = vec![
            header("10", "Intro", "4"),
            lecture("1"),
            lecture("2"),
            header("20", "Next", "2"),
            lecture("3"),
        ];
        let courses = TableParser::default().parse(&rows, "CSE");

        assert_eq!(courses.len(), 2);
        assert_eq!(courses[0].number, "10");
        assert_eq!(courses[0].name, "Intro");
        assert_eq!(courses[0].units, "4");
        assert_eq!(courses[0].subject_code, "CSE");
        assert_eq!(ids(&courses[0]), vec!["1", "2"]);
        assert_eq!(courses[1].number, "20");
        assert_eq!(ids(&courses[1]), vec!["3"]);
    }

    #[test]
    fn header_without_sections_is_dropped() {
        let rows = vec![
            header("10", "Empty", "4"),
            header("20", "Full", "4"),
            lecture("1"),
            header("30", "Trailing", "4"),
        ];
        let courses = TableParser::default().parse(&rows, "CSE");
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].number, "20");
    }

    #[test]
    fn orphan_sections_are_dropped() {
        let rows = vec![lecture("0"), header("10", "Intro", "4"), lecture("1")];
        let courses = TableParser::default().parse(&rows, "CSE");
        assert_eq!(courses.len(), 1);
        assert_eq!(ids(&courses[0]), vec!["1"]);
    }

    #[test]
    fn malformed_header_discards_until_next_header() {
        let rows = vec![
            header("", "No number", "4"),
            lecture("1"),
            header("20", "Good", "4"),
            lecture("2"),
        ];
        let courses = TableParser::default().parse(&rows, "CSE");
        assert_eq!(courses.len(), 1);
        assert_eq!(ids(&courses[0]), vec!["2"]);
    }

    #[test]
    fn short_and_empty_rows_are_skipped() {
        let short = RawRow {
            kind: RowKind::Section,
            cells: vec![RawCell::text("FI"); 9],
        };
        let empty = RawRow {
            kind: RowKind::Header,
            cells: vec![],
        };
        let rows = vec![header("10", "Intro", "4"), short, empty, lecture("1")];
        let courses = TableParser::default().parse(&rows, "CSE");
        assert_eq!(courses.len(), 1);
        assert_eq!(ids(&courses[0]), vec!["1"]);
    }

    #[test]
    fn full_marker_zeroes_available_seats() {
        let full = RawCell {
            text: "FULL Waitlist(4)".to_string(),
            hint: None,
            marker: Some("FULL Waitlist(4)".to_string()),
        };
        let rows = vec![header("10", "Intro", "4"), section("1", "LE", full, "30")];
        let s = &TableParser::default().parse(&rows, "CSE")[0].sections[0];
        assert_eq!((s.available_seats, s.seat_limit), (0, 30));
    }

    #[test]
    fn seat_counts_parse_or_default_to_zero() {
        let rows = vec![
            header("10", "Intro", "4"),
            lecture("1"),
            section("2", "LE", RawCell::text("Unlim"), "x"),
        ];
        let courses = TableParser::default().parse(&rows, "CSE");
        let seats: Vec<(u32, u32)> = courses[0]
            .sections
            .iter()
            .map(|s| (s.available_seats, s.seat_limit))
            .collect();
        assert_eq!(seats, vec![(12, 30), (0, 0)]);
    }

    #[test]
    fn blank_fields_become_not_available() {
        let mut row = lecture("   ");
        row.cells[7] = RawCell::text("\n\t");
        let rows = vec![header("10", "Intro", "4"), row];
        let s = &TableParser::default().parse(&rows, "CSE")[0].sections[0];
        assert_eq!(
            s,
            &Section {
                section_id: "N/A".to_string(),
                meeting_type: "LE".to_string(),
                days: "MWF".to_string(),
                time: "10:00a-10:50a".to_string(),
                building: "N/A".to_string(),
                room: "115".to_string(),
                instructor: "Smith, John".to_string(),
                available_seats: 12,
                seat_limit: 30,
            }
        );
    }

    #[test]
    fn meeting_type_prefers_hint() {
        let mut row = lecture("1");
        row.cells[3].hint = Some("Discussion".to_string());
        let rows = vec![header("10", "Intro", "4"), row];
        let s = &TableParser::default().parse(&rows, "CSE")[0].sections[0];
        assert_eq!(s.meeting_type, "DISCUSSION");
    }

    #[test]
    fn header_name_falls_back_to_text_and_units_to_sentinel() {
        let row = RawRow {
            kind: RowKind::Header,
            cells: vec![
                RawCell::text(""),
                RawCell::text("199"),
                RawCell::text("Independent Study"),
            ],
        };
        let courses = TableParser::default().parse(&[row, lecture("1")], "CSE");
        assert_eq!(courses[0].name, "Independent Study");
        assert_eq!(courses[0].units, "N/A");

        assert_eq!(units("Topics ( 1 -4 Units)"), Some("1 -4".to_string()));
        assert_eq!(strip_units("Topics ( 2 Units)").trim(), "Topics");
    }

    #[test]
    fn parsing_is_deterministic() {
        let rows = vec![header("10", "Intro", "4"), lecture("1"), lecture("2")];
        let parser = TableParser::default();
        assert_eq!(parser.parse(&rows, "CSE"), parser.parse(&rows, "CSE"));
    }
}
