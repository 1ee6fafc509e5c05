//! Plain-text record files.
//!
//! | Operation | Format |
//! |-----------|--------|
//! | load | whitespace-separated triples, field order per [`RecordLayout`] |
//! | save | `roll batch subject` per line, rooms in traversal order, seats row by row |
//! | export | per room: `Block A - Floor 1 - Room 1`, one line per grid row, blank line |
//!
//! Records are fed to insertion in file order. The first malformed record
//! ends the load; records before it stay seated.

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use crate::allocator::SeatingAllocator;
use crate::error::{Result, SeatingError};
use crate::query::grid_lines;

/// Field order of a record file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordLayout {
    /// `batch roll subject` (import files).
    #[default]
    BatchFirst,
    /// `roll batch subject` (what `save_records` writes).
    RollFirst,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Unsigned; a negative roll in a file is a malformed record.
    pub roll_number: u32,
    pub batch_id: u32,
    pub subject: String,
}

/// Iterator over the records of a text, yielding at most one error and
/// then stopping.
pub struct Records<'a> {
    tokens: std::str::SplitWhitespace<'a>,
    layout: RecordLayout,
    index: usize,
    done: bool,
}

/// Split `input` into records.
pub fn parse_records(input: &str, layout: RecordLayout) -> Records<'_> {
    Records {
        tokens: input.split_whitespace(),
        layout,
        index: 0,
        done: false,
    }
}

fn parse_number(token: &str, field: &str, index: usize) -> Result<u32> {
    token.parse().map_err(|_| SeatingError::MalformedRecord {
        index,
        reason: format!("{field} {token:?} is not a number"),
    })
}

impl Records<'_> {
    fn read_record(&mut self, first: &str) -> Result<Record> {
        let index = self.index;
        let short = |missing: &str| SeatingError::MalformedRecord {
            index,
            reason: format!("missing {missing}"),
        };
        let second_field = match self.layout {
            RecordLayout::BatchFirst => "roll number",
            RecordLayout::RollFirst => "batch ID",
        };
        let second = self.tokens.next().ok_or_else(|| short(second_field))?;
        let subject = self.tokens.next().ok_or_else(|| short("subject"))?;

        let (roll_token, batch_token) = match self.layout {
            RecordLayout::BatchFirst => (second, first),
            RecordLayout::RollFirst => (first, second),
        };
        Ok(Record {
            roll_number: parse_number(roll_token, "roll number", index)?,
            batch_id: parse_number(batch_token, "batch ID", index)?,
            subject: subject.to_string(),
        })
    }
}

impl Iterator for Records<'_> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let first = self.tokens.next()?;
        self.index += 1;
        let record = self.read_record(first);
        if record.is_err() {
            self.done = true;
        }
        Some(record)
    }
}

/// What a load did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub inserted: usize,
    /// Well-formed records the allocator refused.
    pub rejected: Vec<(Record, SeatingError)>,
    /// The record that stopped the load, if any.
    pub malformed: Option<SeatingError>,
}

impl SeatingAllocator {
    /// Insert every record from `reader` in order.
    pub fn load_records<R: Read>(&mut self, mut reader: R, layout: RecordLayout) -> io::Result<LoadReport> {
        let mut input = String::new();
        reader.read_to_string(&mut input)?;

        let mut report = LoadReport::default();
        for record in parse_records(&input, layout) {
            match record {
                Ok(record) => {
                    match self.insert_student(record.roll_number, record.batch_id, &record.subject) {
                        Ok(_) => report.inserted += 1,
                        Err(err) => report.rejected.push((record, err)),
                    }
                }
                Err(err) => {
                    log::warn!("Load stopped: {}", err);
                    report.malformed = Some(err);
                }
            }
        }

        log::info!(
            "Loaded {} students ({} rejected)",
            report.inserted,
            report.rejected.len()
        );
        Ok(report)
    }

    /// Write every seated student as `roll batch subject`. Returns the
    /// number of lines written.
    pub fn save_records<W: Write>(&self, mut writer: W) -> io::Result<usize> {
        let mut written = 0;
        for room_addr in self.layout().rooms() {
            for student in self.room_ref(room_addr).seats().filter_map(|s| s.student()) {
                writeln!(
                    writer,
                    "{} {} {}",
                    student.roll_number(),
                    student.batch_id(),
                    student.subject()
                )?;
                written += 1;
            }
        }
        writer.flush()?;
        log::info!("Saved {} students", written);
        Ok(written)
    }

    /// Write the seating plan, one grid per room.
    pub fn export_seating_plan<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for room_addr in self.layout().rooms() {
            writeln!(writer, "{room_addr}")?;
            for line in grid_lines(self.room_ref(room_addr)) {
                writeln!(writer, "{line}")?;
            }
            writeln!(writer)?;
        }
        writer.flush()?;
        log::info!("Seating plan exported ({} rooms)", self.layout().total_rooms());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TopologyConfig;

    fn allocator() -> SeatingAllocator {
        SeatingAllocator::new(TopologyConfig::new(1, 1, 2, 2)).unwrap()
    }

    #[test]
    fn test_parse_batch_first() {
        let records: Vec<Record> = parse_records("22 10 Math\n23 11 Physics", RecordLayout::BatchFirst)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].roll_number, 10);
        assert_eq!(records[0].batch_id, 22);
        assert_eq!(records[1].subject, "Physics");
    }

    #[test]
    fn test_parse_roll_first() {
        let record = parse_records("10 22 Math", RecordLayout::RollFirst)
            .next()
            .unwrap()
            .unwrap();
        assert_eq!((record.roll_number, record.batch_id), (10, 22));
    }

    #[test]
    fn test_parse_stops_at_first_malformed() {
        let results: Vec<Result<Record>> =
            parse_records("22 10 Math\n22 x Math\n22 12 Math", RecordLayout::BatchFirst).collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(SeatingError::MalformedRecord { index: 2, .. })
        ));
    }

    #[test]
    fn test_parse_short_record() {
        let results: Vec<Result<Record>> = parse_records("22 10", RecordLayout::BatchFirst).collect();
        assert!(matches!(
            results.as_slice(),
            [Err(SeatingError::MalformedRecord { index: 1, .. })]
        ));
    }

    #[test]
    fn test_load_reports_rejections_and_malformed() {
        let mut seats = allocator();
        let input = "22 10 Math\n21 11 Math\n23 12 Physics\n22 oops Math\n22 13 Math\n";
        let report = seats.load_records(input.as_bytes(), RecordLayout::BatchFirst).unwrap();
        assert_eq!(report.inserted, 2);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].1, SeatingError::InvalidBatch(21));
        assert!(report.malformed.is_some());
        assert_eq!(seats.occupied(), 2);
        assert!(seats.find_student_by_roll(13).is_none());
    }

    #[test]
    fn test_negative_roll_stops_the_load() {
        let mut seats = allocator();
        let input = "22 10 Math\n22 -5 Math\n22 12 Math\n";
        let report = seats.load_records(input.as_bytes(), RecordLayout::BatchFirst).unwrap();
        assert_eq!(report.inserted, 1);
        assert!(matches!(
            report.malformed,
            Some(SeatingError::MalformedRecord { index: 2, .. })
        ));
        assert!(seats.find_student_by_roll(12).is_none());
    }

    #[test]
    fn test_save_is_row_major_roll_first() {
        let mut seats = allocator();
        seats.insert_student(10, 22, "Math").unwrap();
        seats.insert_student(20, 22, "Math").unwrap();
        seats.insert_student(11, 23, "Physics").unwrap();
        let mut out = Vec::new();
        assert_eq!(seats.save_records(&mut out).unwrap(), 3);
        assert_eq!(String::from_utf8(out).unwrap(), "10 22 Math\n11 23 Physics\n20 22 Math\n");
    }

    #[test]
    fn test_export_format() {
        let mut seats = SeatingAllocator::new(TopologyConfig::new(1, 1, 1, 2)).unwrap();
        seats.insert_student(10, 22, "Math").unwrap();
        let mut out = Vec::new();
        seats.export_seating_plan(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Block A - Floor 1 - Room 1\n[10] [Empty]\n[Empty] [Empty]\n\n"
        );
    }
}
