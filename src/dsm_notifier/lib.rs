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

//! Precipitation alerts from NWS daily summary bulletins
//!
//! ## Features
//!
//! `dsm_notifier` watches the [Iowa Environmental Mesonet] archive of NWS text products for
//! the afternoon Daily Summary Message (DSM) of a particular station and sends a single email
//! when that summary reports measurable or trace precipitation for the day.
//!
//! Each run covers a single day. `dsm_notifier` waits until a configured local time window opens,
//! then checks for the bulletin at a fixed interval until either precipitation is found, and an
//! email is sent, or the window closes. A check consists of:
//!
//! * Fetching the index of products for the PIL (e.g. `DSMNYC`) for today and picking the last
//!   one entered within a UTC time range (e.g. `20:00:00` to `21:00:00`).
//! * Fetching that product and making sure it was issued by the expected office (e.g. `KOKX`)
//!   and covers today.
//! * Reading the precipitation field. A trace (`T`) or any amount greater than zero counts.
//!
//! A bulletin for the wrong station or day, or one that doesn't match the expected layout, ends
//! the run with an error instead of being treated as "no precipitation".
//!
//! [Iowa Environmental Mesonet]: https://mesonet.agron.iastate.edu/
//!
//! ## Build
//!
//! `dsm_notifier` is a Rust program and must be built from source using a [Rust toolchain](https://rustup.rs/).
//!
//! ```text
//! cargo build --release
//! ```
//!
//! ## Usage
//!
//! ### Credentials
//!
//! Email is sent over SMTPS using credentials from the environment, or a `.env` file in the
//! working directory.
//!
//! * `SMTP_USER` - Username for the SMTP server, also used as the sender address. Required.
//! * `SMTP_PASS` - Password for the SMTP server. Required.
//! * `EMAIL_TO` - Address to send alerts to. Defaults to `SMTP_USER`.
//!
//! ### Run
//!
//! The defaults watch the Central Park (`KNYC`) summary issued by the New York office between
//! 4:14 and 4:20 pm Eastern, sending email through Gmail.
//!
//! ```text
//! SMTP_USER=me@gmail.com SMTP_PASS=app-password ./dsm_notifier
//! ```
//!
//! Use `--dry-run` to log the alert instead of sending it, and `--help` for all other options.
//! Since each run handles a single day, schedule it daily with cron or a Systemd timer that
//! starts before the window opens.
//!

pub mod bulletin;
pub mod client;
pub mod config;
pub mod error;
pub mod locate;
pub mod notify;
pub mod pipeline;
pub mod reading;
pub mod schedule;
