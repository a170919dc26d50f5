use std::io::{self, IsTerminal, Write};

use unicode_width::UnicodeWidthStr;

use crate::calendar::WEEKDAY_LABELS;
use crate::config::Config;
use crate::controller::{CalendarView, DayCell, IndexPanel, MonthGrid, WeekRow};
use crate::density::DensityTier;
use crate::holiday::{Country, Holiday};

const CELL_WIDTH: usize = 4;
const LIGHT_GREEN_BG: &str = "30;48;5;120";
const DARK_GREEN_BG: &str = "97;48;5;22";
const TODAY: &str = "1;4";

/// Terminal surface for a computed [`CalendarView`]. Holds no calendar
/// logic; everything it prints is already in the view.
#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color = cfg.color()? && io::stdout().is_terminal();
        Ok(Self { color })
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip_all)]
    pub fn print_view(&mut self, view: &CalendarView, countries: &[Country]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_view(&mut out, view, countries)
    }

    #[tracing::instrument(skip_all)]
    pub fn print_json(&mut self, view: &CalendarView) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        serde_json::to_writer_pretty(&mut out, view)?;
        writeln!(out)?;
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    pub fn print_countries(&mut self, countries: &[Country]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_countries(&mut out, countries)
    }

    pub fn write_view<W: Write>(
        &self,
        out: &mut W,
        view: &CalendarView,
        countries: &[Country],
    ) -> anyhow::Result<()> {
        writeln!(
            out,
            "{} {} ({})",
            country_label(&view.state.country, countries),
            view.state.year,
            view.state.view_mode.label()
        )?;
        writeln!(out)?;

        for month in &view.months {
            self.write_month(out, view.state.year, month)?;
            writeln!(out)?;
        }

        self.write_index(out, &view.index)?;
        writeln!(out)?;
        self.write_legend(out)?;
        Ok(())
    }

    pub fn write_countries<W: Write>(
        &self,
        out: &mut W,
        countries: &[Country],
    ) -> anyhow::Result<()> {
        let headers = vec!["Code".to_string(), "Name".to_string()];
        let rows = countries
            .iter()
            .map(|c| vec![c.country_code.clone(), c.name.clone()])
            .collect();
        write_table(out, headers, rows)
    }

    fn write_month<W: Write>(&self, out: &mut W, year: i32, month: &MonthGrid) -> anyhow::Result<()> {
        writeln!(out, "{} {}", self.paint(month.name, "1"), year)?;
        for label in WEEKDAY_LABELS {
            write!(out, "{label:>CELL_WIDTH$}")?;
        }
        writeln!(out)?;

        for week in &month.weeks {
            self.write_week(out, week)?;
        }
        Ok(())
    }

    fn write_week<W: Write>(&self, out: &mut W, week: &WeekRow) -> anyhow::Result<()> {
        let blanks = " ".repeat(CELL_WIDTH * week.leading_blanks as usize);
        write!(out, "{blanks}")?;
        for cell in &week.days {
            write!(out, "{}", self.day_cell(cell, week.tier))?;
        }

        if !self.color {
            match week.tier {
                DensityTier::None => {}
                DensityTier::Single => write!(out, "  *")?,
                DensityTier::Multiple => write!(out, "  **")?,
            }
        }
        writeln!(out)?;

        for cell in week.days.iter().filter(|c| !c.holidays.is_empty()) {
            for holiday in &cell.holidays {
                writeln!(out, "    - {:>2} {}", cell.date.day(), holiday.name)?;
            }
        }
        Ok(())
    }

    fn day_cell(&self, cell: &DayCell, tier: DensityTier) -> String {
        let day = cell.date.day();
        if !self.color {
            let text = if cell.is_today {
                format!("[{day}]")
            } else {
                day.to_string()
            };
            return format!("{text:>CELL_WIDTH$}");
        }

        let mut codes = Vec::new();
        if let Some(bg) = tier_background(tier) {
            codes.push(bg);
        }
        if cell.is_today {
            codes.push(TODAY);
        }

        let text = format!("{day:>CELL_WIDTH$}");
        if codes.is_empty() {
            text
        } else {
            self.paint(&text, &codes.join(";"))
        }
    }

    fn write_index<W: Write>(&self, out: &mut W, index: &IndexPanel) -> anyhow::Result<()> {
        match index {
            IndexPanel::Monthly(group) => {
                writeln!(out, "{}", self.paint(&format!("Holidays in {}", group.name), "1"))?;
                write_holiday_list(out, &group.holidays)?;
            }
            IndexPanel::Quarterly(group) => {
                writeln!(
                    out,
                    "{}",
                    self.paint(&format!("Holidays in Quarter {}", group.quarter), "1")
                )?;
                for month in &group.months {
                    writeln!(out, "  {}", month.name)?;
                    write_holiday_list(out, &month.holidays)?;
                }
            }
        }
        Ok(())
    }

    fn write_legend<W: Write>(&self, out: &mut W) -> anyhow::Result<()> {
        for tier in [DensityTier::Single, DensityTier::Multiple] {
            let Some(label) = tier.legend() else {
                continue;
            };
            let swatch = if self.color {
                self.paint("    ", tier_background(tier).unwrap_or_default())
            } else if tier == DensityTier::Single {
                "*   ".to_string()
            } else {
                "**  ".to_string()
            };
            writeln!(out, "{swatch} {label}")?;
        }
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

/// `India (IN)` when the code is in the loaded list, the bare code otherwise.
fn country_label(code: &str, countries: &[Country]) -> String {
    countries
        .iter()
        .find(|c| c.country_code.eq_ignore_ascii_case(code))
        .map(|c| format!("{} ({code})", c.name))
        .unwrap_or_else(|| code.to_string())
}

fn tier_background(tier: DensityTier) -> Option<&'static str> {
    match tier {
        DensityTier::None => None,
        DensityTier::Single => Some(LIGHT_GREEN_BG),
        DensityTier::Multiple => Some(DARK_GREEN_BG),
    }
}

fn write_holiday_list<W: Write>(out: &mut W, holidays: &[Holiday]) -> anyhow::Result<()> {
    if holidays.is_empty() {
        writeln!(out, "    (none)")?;
        return Ok(());
    }
    for holiday in holidays {
        writeln!(out, "    {}: {}", holiday.date.format("%Y-%m-%d"), holiday.name)?;
    }
    Ok(())
}

fn write_table<W: Write>(
    mut writer: W,
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
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(cell.as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let padding = widths[idx].saturating_sub(UnicodeWidthStr::width(cell.as_str()));
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}
