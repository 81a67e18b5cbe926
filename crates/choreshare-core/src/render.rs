use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono::Locale;
use tracing::warn;
use unicode_width::UnicodeWidthStr;

use crate::config::{Config, DEFAULT_DATE_FORMAT};
use crate::datetime::{days_in_month, format_day, parse_locale};
use crate::household::Household;
use crate::person::{Person, PersonColor};
use crate::report::{PersonTotal, absent_on, assignments_on};
use crate::task::Task;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    locale: Locale,
    date_format: String,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        let locale_cfg = cfg.get("calendar.locale").unwrap_or_default();
        let locale = parse_locale(&locale_cfg).unwrap_or_else(|| {
            warn!(locale = %locale_cfg, "unsupported calendar locale; using POSIX");
            Locale::POSIX
        });

        let date_format = cfg
            .get("calendar.date.format")
            .filter(|fmt| !fmt.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string());

        Ok(Self {
            color,
            locale,
            date_format,
        })
    }

    #[tracing::instrument(skip(self, out, people))]
    pub fn print_people<W: Write>(&self, out: &mut W, people: &[&Person]) -> anyhow::Result<()> {
        let headers = vec![
            "ID".to_string(),
            "Name".to_string(),
            "Absences".to_string(),
        ];

        let rows = people
            .iter()
            .map(|person| {
                let absences = if person.absences.is_empty() {
                    "None".to_string()
                } else {
                    person
                        .absences
                        .iter()
                        .enumerate()
                        .map(|(idx, absence)| format!("{}) {absence}", idx + 1))
                        .collect::<Vec<_>>()
                        .join("; ")
                };
                vec![
                    self.paint(&person.id.to_string(), "33"),
                    self.paint(&person.name, person.color.ansi_code()),
                    absences,
                ]
            })
            .collect();

        write_table(out, headers, rows)
    }

    #[tracing::instrument(skip(self, out, tasks))]
    pub fn print_tasks<W: Write>(&self, out: &mut W, tasks: &[Task]) -> anyhow::Result<()> {
        let headers = vec!["#".to_string(), "Name".to_string(), "Weight".to_string()];

        let rows = tasks
            .iter()
            .enumerate()
            .map(|(idx, task)| {
                vec![
                    self.paint(&(idx + 1).to_string(), "33"),
                    task.name.clone(),
                    task.weight.to_string(),
                ]
            })
            .collect();

        write_table(out, headers, rows)
    }

    #[tracing::instrument(skip(self, out, totals))]
    pub fn print_totals<W: Write>(&self, out: &mut W, totals: &[PersonTotal]) -> anyhow::Result<()> {
        let headers = vec!["Name".to_string(), "Total weight".to_string()];
        let rows = totals
            .iter()
            .map(|row| vec![row.name.clone(), row.total_weight.to_string()])
            .collect();
        write_table(out, headers, rows)
    }

    /// One block per day of the selected month: absent people first, then
    /// what each person has to do.
    #[tracing::instrument(skip(self, out, household))]
    pub fn print_calendar<W: Write>(
        &self,
        out: &mut W,
        household: &Household,
        year: i32,
    ) -> anyhow::Result<()> {
        let people = household.people();
        for day in days_in_month(year, household.month()) {
            let header = format_day(day, &self.date_format, self.locale);
            writeln!(out, "{}", self.paint(&header, "1"))?;

            for person in absent_on(people, day) {
                writeln!(out, "  {}", self.paint(&format!("{} absent", person.name), "90"))?;
            }

            for entry in assignments_on(household.assignments(), day) {
                let (name, color) = match household.person(entry.person_id) {
                    Some(person) => (person.name.clone(), person.color),
                    None => (format!("#{}", entry.person_id), PersonColor::Grey),
                };
                let line = format!("{} - {}", entry.task, name);
                writeln!(out, "  {}", self.paint(&line, color.ansi_code()))?;
            }
        }
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    writer: &mut W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use chrono::{Month, NaiveDate};

    use super::{Renderer, strip_ansi};
    use crate::config::Config;
    use crate::household::Household;

    fn plain_renderer() -> Renderer {
        let mut cfg = Config::default();
        cfg.apply_overrides(vec![
            ("color".to_string(), "off".to_string()),
            ("calendar.locale".to_string(), "en_US".to_string()),
            ("calendar.date.format".to_string(), "%Y-%m-%d %a".to_string()),
        ]);
        Renderer::new(&cfg).expect("renderer")
    }

    #[test]
    fn rejects_unknown_color_setting() {
        let mut cfg = Config::default();
        cfg.apply_overrides(vec![("color".to_string(), "sometimes".to_string())]);
        assert!(Renderer::new(&cfg).is_err());
    }

    #[test]
    fn calendar_lists_absences_and_assignments() {
        let mut household = Household::seed(Month::March).expect("seed");
        let day = NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid date");
        household.add_absence(2, day, day).expect("absence");
        household.distribute(2025);
        household.remove_person(3).expect("remove");

        let mut buf = Vec::new();
        plain_renderer()
            .print_calendar(&mut buf, &household, 2025)
            .expect("render");
        let text = String::from_utf8(buf).expect("utf8");

        let first_day: Vec<&str> = text.lines().take(5).collect();
        assert_eq!(first_day[0], "2025-03-01 Sat");
        assert_eq!(first_day[1], "  Bob absent");
        assert_eq!(first_day[2], "  Lessives - Alice");
        assert_eq!(first_day[3], "  Vaisselle - #3");
        assert_eq!(first_day[4], "  Sol - Alice");
        assert!(text.contains("2025-03-31 Mon"));
    }

    #[test]
    fn tables_align_columns() {
        let household = Household::seed(Month::March).expect("seed");
        let mut buf = Vec::new();
        plain_renderer()
            .print_tasks(&mut buf, household.tasks())
            .expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("# Name"));
        assert!(lines[4].starts_with("3 Lessives"));
    }

    #[test]
    fn strips_escape_sequences() {
        assert_eq!(strip_ansi("\x1b[31mred\x1b[0m"), "red");
    }
}
