mod filter;
mod parser;

pub use filter::{filter, is_qualifying};
pub use parser::{RowLayout, TableParser};

use std::fmt;

/// One selectable entry of the search form's subject list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub code: String,
    pub label: String,
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code, self.label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Header,
    Section,
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCell {
    pub text: String,
    /// `title` attribute of the first nested element carrying one.
    pub hint: Option<String>,
    /// Text of the first nested emphasis element (`FULL`, a bold course title).
    pub marker: Option<String>,
}

impl RawCell {
    pub fn text<S: Into<String>>(text: S) -> Self {
        RawCell {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// A table row as handed over by the page session, not yet interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub kind: RowKind,
    pub cells: Vec<RawCell>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    pub number: String,
    pub name: String,
    pub units: String,
    pub subject_code: String,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub section_id: String,
    pub meeting_type: String,
    pub days: String,
    pub time: String,
    pub building: String,
    pub room: String,
    pub instructor: String,
    pub available_seats: u32,
    pub seat_limit: u32,
}

impl Section {
    pub fn kind(&self) -> MeetingType {
        MeetingType::from(self.meeting_type.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeetingType {
    Lecture,
    Discussion,
    Other(String),
}

impl MeetingType {
    pub fn is_qualifying(&self) -> bool {
        matches!(self, MeetingType::Lecture | MeetingType::Discussion)
    }
}

impl From<&str> for MeetingType {
    fn from(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "LECTURE" | "LE" => MeetingType::Lecture,
            "DISCUSSION" | "DI" => MeetingType::Discussion,
            other => MeetingType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Course {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {} - {} ({} units)",
            self.subject_code, self.number, self.name, self.units
        )?;
        for s in &self.sections {
            writeln!(
                f,
                "  {:<10} {:<8} {:<6} {:<16} {:<8} {:<6} {} [{}/{}]",
                s.meeting_type,
                s.section_id,
                s.days,
                s.time,
                s.building,
                s.room,
                s.instructor,
                s.available_seats,
                s.seat_limit
            )?;
        }
        Ok(())
    }
}
