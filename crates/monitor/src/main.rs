mod cli;
mod cycles;
mod product;
mod view;

use std::io;
use std::time::Duration;

use anyhow::Error;
use slog::{debug, info, Logger};
use time::{Date, OffsetDateTime};
use tokio::time::interval;
use wxgrid_core::{file_logger, level_from_str, HttpFetcher};

use cli::Cli;
use product::{extract_station_block, looks_published, parse_daily_high, product_url, ProbabilityWindow};
use view::{draw, MonitorScreen, PollStatus};

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
const RETRY_AFTER_ERROR: time::Duration = time::Duration::seconds(60);
const RETRY_AFTER_PARSE_MISS: time::Duration = time::Duration::seconds(30);

#[tokio::main]
async fn main() -> Result<(), Error> {
    let cli = cli::get_config_info();
    let logger = file_logger(&cli.log_file(), level_from_str(cli.level.as_deref()))?;

    info!(logger, "NBM monitor starting...");
    info!(logger, "  Station: {}", cli.station());
    info!(logger, "  Base URL: {}", cli.base_url());
    info!(logger, "  Poll interval: {} seconds", cli.poll_interval());

    let fetcher = HttpFetcher::new(logger.clone(), &cli.user_agent())?;
    run_loop(cli, logger, fetcher).await
}

/// One fetch attempt for one cycle
enum Poll {
    Fresh {
        matrix: String,
        windows: Vec<ProbabilityWindow>,
    },
    NotPublished,
    ParseMiss,
    Failed(String),
}

async fn poll_cycle(
    fetcher: &HttpFetcher,
    logger: &Logger,
    base_url: &str,
    station: &str,
    cycle: (Date, u8),
) -> Poll {
    let (date, hour) = cycle;
    let url = product_url(base_url, date, hour);
    debug!(logger, "polling {}", url);

    let body = match fetcher.fetch_text_opt(&url, FETCH_TIMEOUT).await {
        Err(e) => return Poll::Failed(e.to_string()),
        Ok(None) => return Poll::NotPublished,
        Ok(Some(body)) => body,
    };
    if !looks_published(&body) {
        return Poll::NotPublished;
    }
    let Some(matrix) = extract_station_block(&body, station) else {
        return Poll::ParseMiss;
    };
    let Some(cycle_start) = cycles::cycle_datetime(date, hour) else {
        return Poll::ParseMiss;
    };
    let windows = parse_daily_high(&matrix, cycle_start);
    Poll::Fresh { matrix, windows }
}

async fn run_loop(cli: Cli, logger: Logger, fetcher: HttpFetcher) -> Result<(), Error> {
    let station = cli.station();
    let base_url = cli.base_url();
    let poll_interval = time::Duration::seconds(cli.poll_interval() as i64);

    let mut screen = MonitorScreen::new(station.clone());
    let mut captured: Option<(Date, u8)> = None;
    let mut next_poll = OffsetDateTime::UNIX_EPOCH;
    let mut ticker = interval(Duration::from_secs(1));
    let mut stdout = io::stdout();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!(logger, "monitor stopping");
                break;
            }
            _ = ticker.tick() => {
                let now = OffsetDateTime::now_utc();
                let target = cycles::target_cycle(now);
                screen.target = Some(target);

                if captured == Some(target) {
                    screen.status = PollStatus::Live;
                    screen.seconds_to_poll = 0;
                    screen.last_msg =
                        Some("Latest cycle captured. Waiting for next run.".to_string());
                } else if now >= next_poll {
                    screen.status = PollStatus::Scanning;
                    draw(&mut stdout, &screen, now)?;

                    match poll_cycle(&fetcher, &logger, &base_url, &station, target).await {
                        Poll::Fresh { matrix, windows } => {
                            info!(logger, "captured cycle {:02}Z", target.1);
                            screen.matrix = Some(matrix);
                            screen.windows = windows;
                            screen.status = PollStatus::Live;
                            screen.shown = Some(target);
                            screen.last_msg =
                                Some(format!("New data received ({:02}Z).", target.1));
                            captured = Some(target);
                        }
                        Poll::ParseMiss => {
                            screen.status = PollStatus::ParseMiss;
                            screen.last_msg =
                                Some(format!("File found, but {} missing.", station));
                            next_poll = now + RETRY_AFTER_PARSE_MISS;
                        }
                        Poll::NotPublished => {
                            // Fall back to the previous cycle while waiting
                            let backup = cycles::previous_cycle(target.0, target.1);
                            if let Poll::Fresh { matrix, windows } =
                                poll_cycle(&fetcher, &logger, &base_url, &station, backup).await
                            {
                                screen.matrix = Some(matrix);
                                screen.windows = windows;
                                screen.status = PollStatus::Backup;
                                screen.shown = Some(backup);
                                screen.last_msg = Some(format!(
                                    "Target {:02}Z not released. Showing {:02}Z.",
                                    target.1, backup.1
                                ));
                            }
                            next_poll = now + poll_interval;
                        }
                        Poll::Failed(e) => {
                            info!(logger, "fetch failed: {}", e);
                            screen.status = PollStatus::TransportError(e.clone());
                            screen.last_msg = Some(format!("Fetch error: {}", e));
                            next_poll = now + RETRY_AFTER_ERROR;
                        }
                    }
                    screen.seconds_to_poll = (next_poll - now).whole_seconds().max(0);
                } else {
                    screen.seconds_to_poll = (next_poll - now).whole_seconds();
                }

                draw(&mut stdout, &screen, now)?;
            }
        }
    }
    Ok(())
}
