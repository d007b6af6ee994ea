// dsm_notifier - Precipitation alerts from NWS daily summary bulletins
//
// Copyright 2022 Nick Pillitteri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use chrono::NaiveTime;
use chrono_tz::Tz;
use clap::Parser;
use dsm_notifier::client::IemClient;
use dsm_notifier::config::SmtpConfig;
use dsm_notifier::locate::BulletinLocator;
use dsm_notifier::notify::{LogNotifier, Notifier, SmtpNotifier};
use dsm_notifier::pipeline::DetectionPipeline;
use dsm_notifier::schedule::{ErrorPolicy, Outcome, PollWindow, PollingScheduler, SystemClock};
use reqwest::Client;
use std::error::Error;
use std::process;
use std::time::Duration;
use tracing::Level;

const DEFAULT_LOG_LEVEL: Level = Level::INFO;
const DEFAULT_STATION: &str = "KOKX";
const DEFAULT_PIL: &str = "DSMNYC";
const DEFAULT_API_URL: &str = "https://mesonet.agron.iastate.edu/";
const DEFAULT_TIMEOUT_MILLIS: u64 = 5000;
const DEFAULT_TIMEZONE: Tz = chrono_tz::America::New_York;
const DEFAULT_WINDOW_START: &str = "16:14";
const DEFAULT_WINDOW_END: &str = "16:20";
const DEFAULT_INTERVAL_SECS: u64 = 15;
const DEFAULT_BULLETIN_START: &str = "20:00:00";
const DEFAULT_BULLETIN_END: &str = "21:00:00";
const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 465;

#[derive(Debug, Parser)]
#[clap(name = "dsm_notifier", version = clap::crate_version!())]
struct DsmNotifierApplication {
    /// NWS office that issues the daily summary, checked against each bulletin
    #[clap(long, default_value_t = DEFAULT_STATION.into())]
    station: String,

    /// AFOS product identifier (PIL) of the daily summary to watch
    #[clap(long, default_value_t = DEFAULT_PIL.into())]
    pil: String,

    /// Base URL for the Iowa Environmental Mesonet API
    #[clap(long, default_value_t = DEFAULT_API_URL.into())]
    api_url: String,

    /// Logging verbosity. Allowed values are 'trace', 'debug', 'info', 'warn', and 'error'
    /// (case insensitive)
    #[clap(long, default_value_t = DEFAULT_LOG_LEVEL)]
    log_level: Level,

    /// Timeout for each request to the Mesonet API, in milliseconds.
    #[clap(long, default_value_t = DEFAULT_TIMEOUT_MILLIS)]
    timeout_millis: u64,

    /// Time zone of the polling window, used to determine the current day
    #[clap(long, default_value_t = DEFAULT_TIMEZONE)]
    timezone: Tz,

    /// Local time to start polling, HH:MM or HH:MM:SS
    #[clap(long, default_value = DEFAULT_WINDOW_START, value_parser = parse_time)]
    window_start: NaiveTime,

    /// Local time to stop polling, HH:MM or HH:MM:SS
    #[clap(long, default_value = DEFAULT_WINDOW_END, value_parser = parse_time)]
    window_end: NaiveTime,

    /// Check for a new bulletin at this interval, in seconds.
    #[clap(long, default_value_t = DEFAULT_INTERVAL_SECS)]
    interval_secs: u64,

    /// Only consider bulletins entered at or after this UTC time, HH:MM or HH:MM:SS
    #[clap(long, default_value = DEFAULT_BULLETIN_START, value_parser = parse_time)]
    bulletin_start: NaiveTime,

    /// Only consider bulletins entered at or before this UTC time, HH:MM or HH:MM:SS
    #[clap(long, default_value = DEFAULT_BULLETIN_END, value_parser = parse_time)]
    bulletin_end: NaiveTime,

    /// SMTP server to send email through, using implicit TLS
    #[clap(long, default_value_t = DEFAULT_SMTP_HOST.into())]
    smtp_host: String,

    /// Port of the SMTP server
    #[clap(long, default_value_t = DEFAULT_SMTP_PORT)]
    smtp_port: u16,

    /// Keep polling when a request to the Mesonet API fails instead of exiting. Bulletins that
    /// fail validation always end the run.
    #[clap(long)]
    skip_transport_errors: bool,

    /// Log the notification instead of sending email. SMTP credentials are not required.
    #[clap(long)]
    dry_run: bool,
}

fn parse_time(s: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(s, "%H:%M:%S").or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let opts = DsmNotifierApplication::parse();
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(opts.log_level)
            .finish(),
    )
    .expect("failed to set tracing subscriber");

    let window = PollWindow::new(opts.window_start, opts.window_end, Duration::from_secs(opts.interval_secs))
        .unwrap_or_else(|e| {
            tracing::error!(message = "invalid polling window", error = %e);
            process::exit(1)
        });

    let notifier: Box<dyn Notifier> = if opts.dry_run {
        Box::new(LogNotifier)
    } else {
        let config = SmtpConfig::from_env(opts.smtp_host.clone(), opts.smtp_port).unwrap_or_else(|e| {
            tracing::error!(message = "unable to load SMTP configuration", error = %e);
            process::exit(1)
        });

        Box::new(SmtpNotifier::new(config).unwrap_or_else(|e| {
            tracing::error!(message = "unable to initialize SMTP transport", error = %e);
            process::exit(1)
        }))
    };

    let timeout = Duration::from_millis(opts.timeout_millis);
    let http_client = Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
        tracing::error!(message = "unable to initialize HTTP client", error = %e);
        process::exit(1)
    });

    let client = IemClient::new(http_client, &opts.api_url).unwrap_or_else(|e| {
        tracing::error!(message = "unable to initialize Mesonet client", error = %e);
        process::exit(1)
    });

    let locator = BulletinLocator::new(opts.pil.clone(), opts.bulletin_start, opts.bulletin_end);
    let pipeline = DetectionPipeline::new(client, locator, opts.station.clone());
    let policy = if opts.skip_transport_errors {
        ErrorPolicy::SkipTransport
    } else {
        ErrorPolicy::Abort
    };

    let scheduler = PollingScheduler::new(window, opts.timezone, opts.pil.clone(), policy);
    tracing::info!(
        message = "precipitation polling started",
        api_url = %opts.api_url,
        pil = %opts.pil,
        station = %opts.station,
        window_start = %opts.window_start,
        window_end = %opts.window_end,
        timezone = %opts.timezone,
    );

    match scheduler.run(&pipeline, notifier.as_ref(), &SystemClock).await {
        Ok(Outcome::Found { detection, attempts, at }) => {
            tracing::info!(
                message = "polling finished, precipitation found",
                product_id = %detection.product_id,
                reading = %detection.reading,
                attempts = attempts,
                at = %at,
            );
        }
        Ok(Outcome::Expired { attempts }) => {
            tracing::info!(message = "polling finished, window closed", attempts = attempts);
        }
        Err(e) => {
            tracing::error!(message = "polling failed", error = %e);
            process::exit(1)
        }
    }

    Ok(())
}
