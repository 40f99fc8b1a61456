// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Tab-separated report output.
//!
//! Tables go to the console and, when configured, to a persisted file.
//! Progress notes go to the console only.

use std::fmt::Display;
use std::fs::File;
use std::io;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;

use crate::common::GAUSSIAN_FRACTIONS;
use crate::common::GAUSSIAN_LABELS;
use crate::common::NumStdDev;
use crate::error::Error;
use crate::stats::AccuracyStats;
use crate::stats::ValueStats;

/// Destination of a profile's tables and progress notes.
pub struct Report {
    console: Box<dyn Write + Send>,
    file: Option<BufWriter<File>>,
}

impl Report {
    /// A report printed to standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// A report printed to `console`.
    pub fn new(console: impl Write + Send + 'static) -> Self {
        Self {
            console: Box::new(console),
            file: None,
        }
    }

    /// Additionally writes every table row to the file at `path`.
    pub fn with_file(mut self, path: &Path) -> Result<Self, Error> {
        let file = File::create(path).map_err(|err| {
            Error::report(err).with_context("path", path.display())
        })?;
        self.file = Some(BufWriter::new(file));
        Ok(self)
    }

    /// Writes one tab-separated table row.
    pub fn row<I>(&mut self, cells: I) -> Result<(), Error>
    where
        I: IntoIterator,
        I::Item: Display,
    {
        let line = cells
            .into_iter()
            .map(|cell| cell.to_string())
            .collect::<Vec<_>>()
            .join("\t");
        writeln!(self.console, "{line}").map_err(Error::report)?;
        if let Some(file) = self.file.as_mut() {
            writeln!(file, "{line}").map_err(Error::report)?;
        }
        Ok(())
    }

    /// Writes a free-form line to the console.
    pub fn note(&mut self, line: impl Display) -> Result<(), Error> {
        writeln!(self.console, "{line}").map_err(Error::report)
    }

    pub fn flush(&mut self) -> Result<(), Error> {
        self.console.flush().map_err(Error::report)?;
        if let Some(file) = self.file.as_mut() {
            file.flush().map_err(Error::report)?;
        }
        Ok(())
    }
}

/// Writes one row per checkpoint: true value, trials, mean estimate, mean
/// and RMS relative error, the nine relative-error quantiles and, if
/// `with_bounds`, the six coverage ratios followed by the six mean bounds
/// relative to the true value.
pub fn write_accuracy_table(
    report: &mut Report,
    stats: &[AccuracyStats],
    with_bounds: bool,
) -> Result<(), Error> {
    let mut header = vec!["TrueU", "Trials", "MeanEst", "MeanRelErr", "RMSRelErr"];
    header.extend(GAUSSIAN_LABELS);
    if with_bounds {
        header.extend(["LB3<", "LB2<", "LB1<", "UB1>", "UB2>", "UB3>"]);
        header.extend(["AvgLB3", "AvgLB2", "AvgLB1", "AvgUB1", "AvgUB2", "AvgUB3"]);
    }
    report.row(header)?;

    for s in stats {
        let mut row = vec![
            s.true_value().to_string(),
            s.count().to_string(),
            format!("{:.2}", s.mean_estimate()),
            format!("{:.6}", s.mean_rel_err()),
            format!("{:.6}", s.rms_rel_err()),
        ];
        row.extend(
            s.rel_err_quantiles(&GAUSSIAN_FRACTIONS)
                .iter()
                .map(|q| format!("{q:.6}")),
        );
        if with_bounds {
            for level in NumStdDev::ALL.iter().rev() {
                row.push(format!("{:.6}", s.below_lower_ratio(*level)));
            }
            for level in NumStdDev::ALL {
                row.push(format!("{:.6}", s.above_upper_ratio(level)));
            }
            for level in NumStdDev::ALL.iter().rev() {
                row.push(format!("{:.6}", s.mean_rel_lower_bound(*level)));
            }
            for level in NumStdDev::ALL {
                row.push(format!("{:.6}", s.mean_rel_upper_bound(level)));
            }
        }
        report.row(row)?;
    }
    report.flush()
}

/// Writes one row per checkpoint: point, trials, mean, and the nine
/// quantiles of the measured values.
pub fn write_value_table(
    report: &mut Report,
    stats: &[ValueStats],
    point_label: &str,
    value_label: &str,
) -> Result<(), Error> {
    let mean_label = format!("Mean{value_label}");
    let mut header = vec![point_label, "Trials", mean_label.as_str()];
    header.extend(GAUSSIAN_LABELS);
    report.row(header)?;

    for s in stats {
        let mut row = vec![
            s.point().to_string(),
            s.count().to_string(),
            format!("{:.6}", s.mean()),
        ];
        row.extend(
            s.quantiles(&GAUSSIAN_FRACTIONS)
                .iter()
                .map(|q| format!("{q:.6}")),
        );
        report.row(row)?;
    }
    report.flush()
}
