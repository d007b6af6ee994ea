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

use crate::client::ClientError;
use crate::notify::NotifyError;
use crate::schedule::WindowError;
use std::error;
use std::fmt;

/// The fetched bulletin does not look like the report we expected.
///
/// None of these are ever treated as "no precipitation": a bulletin for the wrong
/// station or date, or one whose layout has changed, must surface as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    WrongStation { expected: String, found: String },
    WrongDate { expected: String, found: String },
    MalformedBulletin(String),
    InvalidReading(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongStation { expected, found } => {
                write!(f, "wrong station: expected {}, found {}", expected, found)
            }
            Self::WrongDate { expected, found } => write!(f, "wrong date: expected {}, found {}", expected, found),
            Self::MalformedBulletin(s) => write!(f, "malformed bulletin: {}", s),
            Self::InvalidReading(s) => write!(f, "invalid precipitation reading {:?}", s),
        }
    }
}

impl error::Error for ValidationError {}

/// Any error that ends a polling run early.
#[derive(Debug)]
pub enum Error {
    Transport(ClientError),
    Validation(ValidationError),
    Notify(NotifyError),
    Window(WindowError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport error: {}", e),
            Self::Validation(e) => write!(f, "validation error: {}", e),
            Self::Notify(e) => write!(f, "notification error: {}", e),
            Self::Window(e) => write!(f, "poll window error: {}", e),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            Self::Validation(e) => Some(e),
            Self::Notify(e) => Some(e),
            Self::Window(e) => Some(e),
        }
    }
}

impl From<ClientError> for Error {
    fn from(e: ClientError) -> Self {
        Self::Transport(e)
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<NotifyError> for Error {
    fn from(e: NotifyError) -> Self {
        Self::Notify(e)
    }
}

impl From<WindowError> for Error {
    fn from(e: WindowError) -> Self {
        Self::Window(e)
    }
}
