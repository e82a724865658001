//! Monitor dashboard drawing
//!
//! Full-screen status view: header clock, cycle status, the raw matrix
//! echo, and the probability table with countdowns. Valid periods show in
//! approximate US-Eastern local time.

use std::io::{self, Write};

use crossterm::{
    cursor::MoveTo,
    execute,
    style::Stylize,
    terminal::{Clear, ClearType},
};
use time::{
    macros::format_description, Date, Duration, Month, OffsetDateTime, UtcOffset, Weekday,
};

use crate::product::ProbabilityWindow;

/// Poll-loop status surfaced in the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus {
    Init,
    Scanning,
    /// Showing the target cycle
    Live,
    /// Target not released yet; showing the previous cycle
    Backup,
    /// File published but the station block is missing
    ParseMiss,
    TransportError(String),
}

pub struct MonitorScreen {
    pub station: String,
    pub target: Option<(Date, u8)>,
    pub shown: Option<(Date, u8)>,
    pub status: PollStatus,
    pub seconds_to_poll: i64,
    pub matrix: Option<String>,
    pub windows: Vec<ProbabilityWindow>,
    pub last_msg: Option<String>,
}

impl MonitorScreen {
    pub fn new(station: String) -> MonitorScreen {
        MonitorScreen {
            station,
            target: None,
            shown: None,
            status: PollStatus::Init,
            seconds_to_poll: 0,
            matrix: None,
            windows: Vec::new(),
            last_msg: None,
        }
    }
}

fn day_of_month(year: i32, month: Month, weekday: Weekday, nth: u8) -> u8 {
    let mut seen = 0;
    for day in 1..=31u8 {
        let Ok(date) = Date::from_calendar_date(year, month, day) else {
            break;
        };
        if date.weekday() == weekday {
            seen += 1;
            if seen == nth {
                return day;
            }
        }
    }
    31
}

/// US-Eastern offset by the DST calendar rule (second Sunday of March to
/// first Sunday of November). Date-granular, which is close enough for a
/// dashboard clock.
pub fn eastern_offset(date: Date) -> UtcOffset {
    let dst = match u8::from(date.month()) {
        4..=10 => true,
        3 => date.day() >= day_of_month(date.year(), Month::March, Weekday::Sunday, 2),
        11 => date.day() < day_of_month(date.year(), Month::November, Weekday::Sunday, 1),
        _ => false,
    };
    let hours = if dst { -4 } else { -5 };
    UtcOffset::from_hms(hours, 0, 0).unwrap_or(UtcOffset::UTC)
}

pub fn to_eastern(utc: OffsetDateTime) -> OffsetDateTime {
    utc.to_offset(eastern_offset(utc.date()))
}

/// `HH:MM:SS` countdown, or `PASSED` once the instant is behind us
pub fn format_delta(delta: Duration) -> String {
    let total = delta.whole_seconds();
    if total < 0 {
        return "PASSED".to_string();
    }
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

fn format_cycle(cycle: Option<(Date, u8)>) -> String {
    match cycle {
        Some((date, hour)) => format!("{} {:02}Z", crate::product::format_yyyymmdd(date), hour),
        None => "---".to_string(),
    }
}

fn format_period(window: &ProbabilityWindow) -> String {
    let fmt = format_description!(
        "[weekday repr:short] [month]/[day] [hour repr:12 padding:zero][period case:upper]"
    );
    let start = to_eastern(window.start);
    let end = to_eastern(window.end);
    let start_str = start.format(&fmt).unwrap_or_else(|_| "?".to_string());
    let end_str = end.format(&fmt).unwrap_or_else(|_| "?".to_string());
    format!("{} - {}", start_str, end_str)
}

fn opt_value(value: Option<i32>) -> String {
    value.map_or_else(|| "--".to_string(), |v| v.to_string())
}

pub fn draw(out: &mut impl Write, screen: &MonitorScreen, now: OffsetDateTime) -> io::Result<()> {
    execute!(out, Clear(ClearType::All), MoveTo(0, 0))?;

    let clock_fmt = format_description!("[hour]:[minute]:[second]");
    let clock = to_eastern(now)
        .format(&clock_fmt)
        .unwrap_or_else(|_| "--:--:--".to_string());

    writeln!(out, "{}", "=".repeat(80).blue().bold())?;
    writeln!(
        out,
        "{}{}  {}",
        " NBM TERMINAL ".bold(),
        format!("// {} // TX PROBABILITY DISTRIBUTION", screen.station).dark_grey(),
        format!("{} ET", clock).cyan()
    )?;
    writeln!(out, "{}", "=".repeat(80).blue())?;

    let status_text = match &screen.status {
        PollStatus::Init => "INIT".dark_grey().to_string(),
        PollStatus::Scanning => "SCANNING".yellow().to_string(),
        PollStatus::Live => "LIVE".green().to_string(),
        PollStatus::Backup => "USING BACKUP".magenta().to_string(),
        PollStatus::ParseMiss => "PARSE MISS".red().to_string(),
        PollStatus::TransportError(e) => format!("ERR {}", e).red().to_string(),
    };
    let shown_text = match (&screen.status, screen.shown) {
        (PollStatus::Backup, shown) => format!("BACKUP ({})", format_cycle(shown))
            .yellow()
            .to_string(),
        (PollStatus::Live, shown) => format!("LIVE ({})", format_cycle(shown)).green().to_string(),
        _ => "---".to_string(),
    };
    let timer_text = if screen.seconds_to_poll > 0 {
        format!("{}s", screen.seconds_to_poll)
    } else {
        "NOW".to_string()
    };

    writeln!(
        out,
        " {:<24} {:<34} {}",
        "TARGET CYCLE".dark_grey(),
        "CURRENTLY SHOWING".dark_grey(),
        "NEXT POLL".dark_grey()
    )?;
    writeln!(
        out,
        " {:<24} {:<34} {}",
        format_cycle(screen.target).bold(),
        shown_text,
        timer_text.bold()
    )?;
    writeln!(out, " {:<24} {}", "STATUS".dark_grey(), status_text)?;

    writeln!(out, "{}", "-".repeat(80).dark_grey())?;
    writeln!(out, "{}", " RAW DATA STREAM".bold())?;
    writeln!(out, "{}", "-".repeat(80).dark_grey())?;
    match &screen.matrix {
        Some(matrix) => {
            for line in matrix.lines() {
                writeln!(out, "{}", line.green())?;
            }
        }
        None => writeln!(out, "{}", "   [ No data available yet. Retrying... ]".dark_grey())?,
    }

    if !screen.windows.is_empty() {
        writeln!(out, "{}", "-".repeat(80).dark_grey())?;
        let mut title = " DAILY HIGH (TX) PROBABILITY SPREAD (18-HR WINDOW)".to_string();
        if screen.status == PollStatus::Backup {
            title.push_str(" [BACKUP DATA]");
        }
        writeln!(out, "{}", title.bold())?;
        writeln!(out, "{}", "-".repeat(80).dark_grey())?;
        writeln!(
            out,
            "{}",
            format!(
                " {:<40} {:<5} {:<5} {:<5} {:<5} {:<5} STATUS",
                "VALID PERIOD (ET)", "10%", "20%", "50%", "70%", "90%"
            )
            .dark_grey()
        )?;

        let mut next_start: Option<(String, Duration)> = None;
        let mut next_end: Option<(String, Duration)> = None;
        let mut active_found = false;

        for window in &screen.windows {
            let row = format!(
                " {:<40} {:<5} {:<5} {:<5} {:<5} {:<5} ",
                format_period(window),
                opt_value(window.p10),
                opt_value(window.p20),
                window.p50,
                opt_value(window.p70),
                opt_value(window.p90),
            );
            if window.is_active(now) {
                writeln!(out, "{}{}", row.cyan().bold(), "ACTIVE".cyan().bold())?;
                if !active_found {
                    next_end = Some(("End of Current Window".to_string(), window.end - now));
                    active_found = true;
                }
            } else if window.is_future(now) {
                writeln!(out, "{}{}", row.white(), "UPCOMING".white())?;
                let day_fmt = format_description!("[weekday repr:short]");
                let day = to_eastern(window.start)
                    .format(&day_fmt)
                    .unwrap_or_else(|_| "?".to_string());
                if next_start.is_none() {
                    next_start = Some((format!("Start of {} Window", day), window.start - now));
                }
                if next_end.is_none() && !active_found {
                    next_end = Some((format!("End of {} Window", day), window.end - now));
                }
            } else {
                writeln!(out, "{}{}", row, "PASSED")?;
            }
        }

        writeln!(out, "{}", ".".repeat(80).dark_grey())?;
        let (start_label, start_delta) = next_start
            .map(|(label, delta)| (label, format_delta(delta)))
            .unwrap_or_else(|| ("WAITING FOR NEXT WINDOW".to_string(), "--:--:--".to_string()));
        let (end_label, end_delta) = next_end
            .map(|(label, delta)| (label, format_delta(delta)))
            .unwrap_or_else(|| ("WINDOW CLOSING TIME".to_string(), "--:--:--".to_string()));
        writeln!(
            out,
            " {}  |  {}",
            format!("{:<30}", start_label).yellow(),
            end_label.magenta()
        )?;
        writeln!(
            out,
            " {}  |  {}",
            format!("{:<30}", start_delta).bold(),
            end_delta.bold()
        )?;
    }

    if let Some(msg) = &screen.last_msg {
        writeln!(out)?;
        writeln!(out, " {}", format!("> {}", msg).cyan())?;
    }
    out.flush()
}
