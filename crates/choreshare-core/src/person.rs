use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::datetime::{format_iso, within_interval};

pub type PersonId = u64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PersonColor {
    Red,
    Blue,
    Green,
    Yellow,
    Magenta,
    Cyan,
    #[default]
    Grey,
}

impl PersonColor {
    pub fn ansi_code(self) -> &'static str {
        match self {
            PersonColor::Red => "31",
            PersonColor::Green => "32",
            PersonColor::Yellow => "33",
            PersonColor::Blue => "34",
            PersonColor::Magenta => "35",
            PersonColor::Cyan => "36",
            PersonColor::Grey => "90",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PersonColor::Red => "red",
            PersonColor::Blue => "blue",
            PersonColor::Green => "green",
            PersonColor::Yellow => "yellow",
            PersonColor::Magenta => "magenta",
            PersonColor::Cyan => "cyan",
            PersonColor::Grey => "grey",
        }
    }
}

impl FromStr for PersonColor {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "red" => Ok(PersonColor::Red),
            "blue" => Ok(PersonColor::Blue),
            "green" => Ok(PersonColor::Green),
            "yellow" => Ok(PersonColor::Yellow),
            "magenta" => Ok(PersonColor::Magenta),
            "cyan" => Ok(PersonColor::Cyan),
            "grey" | "gray" => Ok(PersonColor::Grey),
            other => Err(anyhow!("unknown color: {other}")),
        }
    }
}

/// Inclusive range of days a person is away.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AbsenceInterval {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl AbsenceInterval {
    /// Rejects ranges that end before they start.
    pub fn new(start: NaiveDate, end: NaiveDate) -> anyhow::Result<Self> {
        if end < start {
            return Err(anyhow!(
                "invalid date range: {} ends before {}",
                format_iso(end),
                format_iso(start)
            ));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        within_interval(date, self.start, self.end)
    }
}

impl fmt::Display for AbsenceInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", format_iso(self.start), format_iso(self.end))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    #[serde(default)]
    pub color: PersonColor,
    #[serde(default)]
    pub absences: Vec<AbsenceInterval>,
}

impl Person {
    pub fn new(id: PersonId, name: String, color: PersonColor) -> Self {
        Self {
            id,
            name,
            color,
            absences: vec![],
        }
    }

    pub fn is_absent_on(&self, date: NaiveDate) -> bool {
        self.absences.iter().any(|absence| absence.contains(date))
    }
}
