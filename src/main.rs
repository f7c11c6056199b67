// Copyright 2024 The DocAssert Authors
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;

use json_comparator::executor;
use json_comparator::{ComparatorError, JsonComparator};

#[doc(hidden)]
#[macro_export]
macro_rules! handle_error {
    ($code:expr, $msg:expr, $($arg:tt)*) => {
        eprintln!($msg, $($arg)*);
        std::process::exit($code);
    };

    ($code:expr, $msg:expr) => {
        eprintln!($msg);
        std::process::exit($code);
    };
}

#[doc(hidden)]
struct Code;

impl Code {
    const SUCCESS: i32 = 0;
    const INTERNAL_ERROR: i32 = 1;
    const INVALID_ARGUMENT: i32 = 2;
    const SPEC_ERROR: i32 = 3;
    const MISMATCH: i32 = 4;
}

#[doc(hidden)]
#[derive(Debug, Clone)]
struct Header(String, String);

impl FromStr for Header {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, value) = s
            .split_once(':')
            .ok_or_else(|| format!("header must be in the form 'Name: value': {}", s))?;

        let name = name.trim();
        if name.is_empty() {
            return Err(format!("header name is empty: {}", s));
        }

        Ok(Header(name.to_string(), value.trim().to_string()))
    }
}

#[doc(hidden)]
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Comparison specification file with the template and the rules
    spec: PathBuf,

    /// File holding the actual JSON document
    #[clap(short, long, conflicts_with = "url")]
    actual: Option<PathBuf>,

    /// URL to fetch the actual JSON document from
    #[clap(short, long)]
    url: Option<String>,

    /// Request header in the form "Name: value", may be repeated
    #[clap(short = 'H', long = "header", requires = "url")]
    headers: Vec<Header>,

    /// Print the template and actual nodes at the path of the first difference
    #[clap(short, long)]
    details: bool,
}

fn exit_code(err: &ComparatorError) -> i32 {
    match err {
        ComparatorError::Fetch { .. } => Code::INTERNAL_ERROR,
        _ => Code::SPEC_ERROR,
    }
}

#[doc(hidden)]
#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let spec = match std::fs::read_to_string(&cli.spec) {
        Ok(spec) => spec,
        Err(err) => {
            handle_error!(
                Code::INVALID_ARGUMENT,
                "Error reading {}: {}",
                cli.spec.display(),
                err
            );
        }
    };

    let actual = match (&cli.actual, &cli.url) {
        (Some(path), _) => match std::fs::read_to_string(path) {
            Ok(actual) => Some(actual),
            Err(err) => {
                handle_error!(
                    Code::INVALID_ARGUMENT,
                    "Error reading {}: {}",
                    path.display(),
                    err
                );
            }
        },
        (None, Some(url)) => {
            let headers = cli
                .headers
                .iter()
                .map(|Header(name, value)| (name.clone(), value.clone()))
                .collect::<HashMap<_, _>>();

            match executor::fetch_actual(url, &headers).await {
                Ok(actual) => actual,
                Err(err) => {
                    handle_error!(exit_code(&err), "Error: {}", err);
                }
            }
        }
        (None, None) => None,
    };

    let comparator = JsonComparator::new();

    let outcome = match comparator.compare(&spec, actual.as_deref()) {
        Ok(outcome) => outcome,
        Err(err) => {
            handle_error!(exit_code(&err), "Error: {}", err);
        }
    };

    if outcome.is_match() {
        println!("{}", outcome);
        std::process::exit(Code::SUCCESS);
    }

    println!("{}", outcome);
    if let Some(path) = outcome.error_path() {
        println!("  at {}", path);
    }

    if cli.details {
        match comparator.extract_failure_details(&spec, actual.as_deref(), &outcome) {
            Ok(Some(details)) => println!("{}", details),
            Ok(None) => {}
            Err(err) => {
                handle_error!(exit_code(&err), "Error: {}", err);
            }
        }
    }

    std::process::exit(Code::MISMATCH);
}
