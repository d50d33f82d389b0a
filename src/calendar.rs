//! Month-grid calendar printed straight to stdout; the one part of the UI
//! that is plain linear output.

use std::collections::BTreeMap;
use std::io::{self, Write};

use chrono::{Datelike, Days, NaiveDate, NaiveTime};

const DAYS_IN_WEEK: usize = 7;

/// Timed entries shown under their day cell, in time order per day.
pub type Events = BTreeMap<NaiveDate, Vec<(NaiveTime, String)>>;

/// Renders one month as a grid of week rows sized to the terminal width.
pub struct CalendarView {
    events: Events,
}

impl CalendarView {
    pub fn new(events: Events) -> Self {
        CalendarView { events }
    }

    /// Print the month containing `day`, `columns` cells wide.
    pub fn render(&self, out: &mut impl Write, columns: usize, day: NaiveDate) -> io::Result<()> {
        let first = day.with_day(1).unwrap_or(day);
        let day_width = columns.saturating_sub(DAYS_IN_WEEK + 1) / DAYS_IN_WEEK;

        writeln!(out, "{}", first.format("%B ·· %Y"))?;
        self.print_ruler(out, day_width)?;

        // weeks start on Sunday; the first row may reach into the previous month
        let mut week_start =
            first - Days::new(u64::from(first.weekday().num_days_from_sunday()));
        while week_start.month() == first.month() || week_start < first {
            let week: Vec<NaiveDate> = (0..DAYS_IN_WEEK as u64)
                .map(|offset| week_start + Days::new(offset))
                .collect();

            let labels: Vec<String> = week
                .iter()
                .map(|d| format!(" {}", d.format("%d/%b (%a)")))
                .collect();
            self.print_line(out, day_width, &labels)?;

            // one row per event depth; always at least one (possibly empty) row
            let mut index = 0;
            loop {
                let mut any = false;
                let cells: Vec<String> = week
                    .iter()
                    .map(|d| match self.events.get(d).and_then(|e| e.get(index)) {
                        Some((time, title)) => {
                            any = true;
                            format!(" {}  {}", time.format("%H:%M"), title)
                        }
                        None => String::new(),
                    })
                    .collect();
                self.print_line(out, day_width, &cells)?;
                index += 1;
                if !any {
                    break;
                }
            }

            self.print_ruler(out, day_width)?;
            week_start = week_start + Days::new(DAYS_IN_WEEK as u64);
        }
        Ok(())
    }

    fn print_ruler(&self, out: &mut impl Write, day_width: usize) -> io::Result<()> {
        let mut line = String::from("+");
        for _ in 0..DAYS_IN_WEEK {
            line.push_str(&"-".repeat(day_width));
            line.push('+');
        }
        writeln!(out, "{line}")
    }

    fn print_line(&self, out: &mut impl Write, day_width: usize, cells: &[String]) -> io::Result<()> {
        let mut line = String::from("|");
        for cell in cells {
            let padding = day_width
                .saturating_sub(cell.chars().count())
                .saturating_sub(1);
            line.push_str(cell);
            line.push_str(&" ".repeat(padding));
            line.push_str(" |");
        }
        writeln!(out, "{line}")
    }
}
