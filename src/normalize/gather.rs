//! Interactive gap filling
//!
//! Records missing a field take a remembered value for their id when one
//! exists; otherwise the operator is asked. An empty answer skips the record.

use chrono::NaiveDate;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use super::{Dataset, Pass};
use crate::error::{DataError, Result};
use crate::store::{record_id, record_label, Record};
use crate::ui::Ui;

/// How an answer is cleaned and checked
#[derive(Debug, Clone, PartialEq)]
pub enum Validator {
    /// One of a list of options. A numeric answer picks an option by index.
    Choice(Vec<String>),
    /// A date typed as `input`, stored as `output` (chrono format strings)
    Date {
        input: &'static str,
        output: &'static str,
    },
}

impl Validator {
    pub fn release_date() -> Self {
        Self::Date {
            input: "%B %d, %Y",
            output: "%Y-%m-%d",
        }
    }

    pub fn clean(&self, answer: &str) -> String {
        let answer = answer.trim();
        match self {
            Self::Choice(options) => answer
                .parse::<usize>()
                .ok()
                .and_then(|index| options.get(index))
                .cloned()
                .unwrap_or_else(|| answer.to_string()),
            Self::Date { input, output } => NaiveDate::parse_from_str(answer, input)
                .map(|date| date.format(output).to_string())
                .unwrap_or_else(|_| answer.to_string()),
        }
    }

    pub fn validate(&self, value: &str) -> bool {
        match self {
            Self::Choice(options) => options.iter().any(|o| o == value),
            Self::Date { output, .. } => NaiveDate::parse_from_str(value, output).is_ok(),
        }
    }

    pub fn question(&self, field: &str) -> String {
        match self {
            Self::Choice(options) => {
                let listed: Vec<String> = options
                    .iter()
                    .enumerate()
                    .map(|(i, option)| format!("{} - {}", i, option))
                    .collect();
                format!(
                    "Which {} should it have?\n\t{}\nResponse: ",
                    field,
                    listed.join("\n\t")
                )
            }
            Self::Date { .. } => format!(
                "Which {} should it have?\nResponse (leave empty to skip): ",
                field
            ),
        }
    }
}

/// Ask for `field` until a valid answer, a skip, or `max_attempts` rejections
pub fn prompt_for_value(
    ui: &mut dyn Ui,
    record: &Record,
    field: &str,
    validator: &Validator,
    max_attempts: usize,
) -> Result<Option<String>> {
    ui.show_record(record);

    let mut rejected = 0;
    loop {
        let Some(answer) = ui.ask(&validator.question(field))? else {
            return Ok(None);
        };

        let cleaned = validator.clean(&answer);
        if validator.validate(&cleaned) {
            return Ok(Some(cleaned));
        }

        rejected += 1;
        if rejected >= max_attempts {
            return Err(DataError::Validation {
                field: format!("{} of {}", field, record_label(record)),
                value: answer,
            });
        }
        ui.log("No. That value is not right! Try again...");
    }
}

/// Where the options of a choice come from
#[derive(Debug, Clone, Copy)]
pub enum Options {
    /// Distinct non-empty values of the field already in the collection
    Observed,
    Date,
}

/// A field to fill, with remembered answers keyed by record id
#[derive(Debug, Clone, Copy)]
pub struct FillSpec {
    pub collection: &'static str,
    pub field: &'static str,
    pub options: Options,
    pub memory: &'static [(i64, &'static str)],
}

pub static FILLS: &[FillSpec] = &[
    FillSpec {
        collection: "upgrades",
        field: "slot",
        options: Options::Observed,
        memory: &[(294, "Modification")],
    },
    FillSpec {
        collection: "sources",
        field: "release_date",
        options: Options::Date,
        memory: RELEASE_DATES,
    },
    FillSpec {
        collection: "sources",
        field: "announcement_date",
        options: Options::Date,
        memory: ANNOUNCEMENT_DATES,
    },
];

const RELEASE_DATES: &[(i64, &str)] = &[
    (0, "2012-09-14"),
    (1, "2012-09-14"),
    (2, "2012-09-14"),
    (3, "2012-09-14"),
    (4, "2012-09-14"),
    (5, "2013-02-28"),
    (6, "2013-02-28"),
    (7, "2013-02-28"),
    (8, "2013-02-28"),
    (9, "2013-09-12"),
    (10, "2013-09-12"),
    (11, "2013-09-12"),
    (12, "2013-09-12"),
    (13, "2014-03-14"),
    (14, "2014-06-26"),
    (15, "2014-06-26"),
    (16, "2014-06-26"),
    (17, "2014-06-26"),
    (18, "2014-09-25"),
    (19, "2014-05-22"),
    (20, "2014-04-30"),
    (21, "2014-11-26"),
    (22, "2014-11-26"),
    (23, "2015-02-26"),
    (24, "2015-02-26"),
    (25, "2015-02-26"),
    (26, "2015-02-26"),
    (27, "2015-08-13"),
    (28, "2015-08-25"),
    (29, "2015-08-25"),
    (30, "2015-08-25"),
    (31, "2015-08-25"),
    (32, "2015-09-04"),
    (33, "2015-12-17"),
    (34, "2015-12-17"),
    (35, "2016-03-17"),
    (36, "2016-03-17"),
    (37, "2016-03-17"),
    (38, "2016-03-17"),
    (39, "2015-12-21"),
    (40, "2016-06-30"),
    (41, "2016-10-27"),
    (42, "2016-09-22"),
    (43, "2016-09-22"),
    (44, "2016-09-22"),
    (45, "2016-09-22"),
    (49, "2016-12-15"),
    (50, "2016-12-15"),
];

const ANNOUNCEMENT_DATES: &[(i64, &str)] = &[
    (0, "2011-08-02"),
    (1, "2012-04-17"),
    (2, "2012-04-17"),
    (3, "2012-04-17"),
    (4, "2012-04-17"),
    (5, "2012-09-14"),
    (6, "2012-09-14"),
    (7, "2012-09-14"),
    (8, "2012-09-14"),
    (9, "2013-05-04"),
    (10, "2013-05-04"),
    (11, "2013-05-04"),
    (12, "2013-05-04"),
    (13, "2013-09-16"),
    (14, "2014-02-07"),
    (15, "2014-02-07"),
    (16, "2014-02-07"),
    (17, "2014-02-07"),
    (18, "2014-03-18"),
    (19, "2013-08-20"),
    (20, "2013-08-20"),
    (21, "2014-06-13"),
    (22, "2014-06-13"),
    (23, "2014-08-15"),
    (24, "2014-08-15"),
    (25, "2014-08-15"),
    (26, "2014-08-15"),
    (27, "2014-12-19"),
    (28, "2015-04-20"),
    (29, "2015-04-20"),
    (30, "2015-04-20"),
    (31, "2015-04-20"),
    (32, "2015-09-03"),
    (33, "2015-09-10"),
    (34, "2015-09-10"),
    (35, "2015-07-31"),
    (36, "2015-07-31"),
    (37, "2015-07-31"),
    (38, "2015-07-31"),
    (39, "2015-07-31"),
    (40, "2015-12-14"),
    (41, "2016-05-04"),
    (42, "2016-06-02"),
    (43, "2016-06-02"),
    (44, "2016-06-02"),
    (45, "2016-06-02"),
    (46, "2016-08-05"),
    (47, "2016-08-05"),
    (48, "2016-08-05"),
    (49, "2016-09-02"),
    (50, "2016-09-02"),
];

/// Fills one field of one collection
pub struct GapFiller {
    spec: FillSpec,
    memory: BTreeMap<i64, String>,
    max_attempts: usize,
}

impl GapFiller {
    pub fn new(spec: FillSpec, max_attempts: usize) -> Self {
        let memory = spec
            .memory
            .iter()
            .map(|(id, value)| (*id, value.to_string()))
            .collect();
        Self {
            spec,
            memory,
            max_attempts,
        }
    }

    pub fn validator(&self, records: &[Record]) -> Validator {
        match self.spec.options {
            Options::Date => Validator::release_date(),
            Options::Observed => {
                let observed: BTreeSet<String> = records
                    .iter()
                    .filter_map(|r| r.get(self.spec.field))
                    .filter_map(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect();
                Validator::Choice(observed.into_iter().collect())
            }
        }
    }

    /// Fill the gaps in `records`, returning how many were filled
    pub fn fill(&mut self, records: &mut [Record], ui: &mut dyn Ui) -> Result<usize> {
        let validator = self.validator(records);
        let field = self.spec.field;

        let mut filled = 0;
        for record in records.iter_mut() {
            if record.contains_key(field) {
                continue;
            }

            let remembered = record_id(record).and_then(|id| self.memory.get(&id)).cloned();
            let value = match remembered {
                Some(value) => Some(value),
                None => {
                    let answer = prompt_for_value(ui, record, field, &validator, self.max_attempts)?;
                    if let (Some(answer), Some(id)) = (&answer, record_id(record)) {
                        self.memory.insert(id, answer.clone());
                    }
                    answer
                }
            };

            match value {
                Some(value) => {
                    debug!(record = %record_label(record), field, %value, "filled gap");
                    record.insert(field.to_string(), Value::String(value));
                    filled += 1;
                }
                None => info!(record = %record_label(record), field, "left empty"),
            }
        }
        Ok(filled)
    }
}

pub struct GatherPass {
    fillers: Vec<GapFiller>,
}

impl GatherPass {
    pub fn new(fillers: Vec<GapFiller>) -> Self {
        Self { fillers }
    }

    pub fn standard(max_attempts: usize) -> Self {
        Self::new(FILLS.iter().map(|spec| GapFiller::new(*spec, max_attempts)).collect())
    }
}

impl Pass for GatherPass {
    fn name(&self) -> &'static str {
        "fill-gaps"
    }

    fn targets(&self) -> Vec<String> {
        let names: BTreeSet<&str> = self.fillers.iter().map(|f| f.spec.collection).collect();
        names.into_iter().map(String::from).collect()
    }

    fn lookups(&self) -> Vec<String> {
        Vec::new()
    }

    fn analyze(&self, data: &Dataset, ui: &mut dyn Ui) -> Result<()> {
        for filler in &self.fillers {
            let records = &data.get(filler.spec.collection)?.records;
            let missing = records
                .iter()
                .filter(|r| !r.contains_key(filler.spec.field))
                .count();
            ui.log(&format!(
                "{}.{}: {} missing, {} remembered",
                filler.spec.collection,
                filler.spec.field,
                missing,
                filler.memory.len()
            ));
            if let Validator::Choice(options) = filler.validator(records) {
                ui.log(&format!("  options: {:?}", options));
            }
        }
        Ok(())
    }

    fn normalize(&mut self, data: &mut Dataset, ui: &mut dyn Ui) -> Result<()> {
        for filler in self.fillers.iter_mut() {
            let records = &mut data.get_mut(filler.spec.collection)?.records;
            let filled = filler.fill(records, ui)?;
            ui.log(&format!("{}.{}: filled {}", filler.spec.collection, filler.spec.field, filled));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::io;

    struct ScriptedUi {
        answers: VecDeque<&'static str>,
        logs: Vec<String>,
    }

    impl ScriptedUi {
        fn new(answers: &[&'static str]) -> Self {
            Self {
                answers: answers.iter().copied().collect(),
                logs: Vec::new(),
            }
        }
    }

    impl Ui for ScriptedUi {
        fn section(&mut self, _title: &str) {}
        fn log(&mut self, message: &str) {
            self.logs.push(message.to_string());
        }
        fn show_record(&mut self, _record: &Record) {}
        fn ask(&mut self, _question: &str) -> io::Result<Option<String>> {
            Ok(self
                .answers
                .pop_front()
                .filter(|a| !a.is_empty())
                .map(String::from))
        }
    }

    fn records(value: Value) -> Vec<Record> {
        crate::store::Collection::from_value("sources", value)
            .unwrap()
            .records
    }

    fn date_spec() -> FillSpec {
        FillSpec {
            collection: "sources",
            field: "release_date",
            options: Options::Date,
            memory: &[(1, "2012-09-14")],
        }
    }

    #[test]
    fn test_date_is_cleaned() {
        let validator = Validator::release_date();
        assert_eq!(validator.clean("September 14, 2012"), "2012-09-14");
        assert!(validator.validate("2012-09-14"));
        assert!(!validator.validate("soon"));
    }

    #[test]
    fn test_choice_accepts_index() {
        let validator = Validator::Choice(vec!["Crew".to_string(), "Modification".to_string()]);
        assert_eq!(validator.clean("1"), "Modification");
        assert_eq!(validator.clean("Crew"), "Crew");
        assert!(!validator.validate("Hyperdrive"));
    }

    #[test]
    fn test_memory_then_prompt() {
        let mut data = records(json!([
            {"id": 1, "name": "Core Set"},
            {"id": 60, "name": "Wave X"},
            {"id": 61, "name": "Wave Y"}
        ]));
        let mut ui = ScriptedUi::new(&["bogus", "January 05, 2017", ""]);
        let mut filler = GapFiller::new(date_spec(), 3);

        assert_eq!(filler.fill(&mut data, &mut ui).unwrap(), 2);
        assert_eq!(data[0]["release_date"], json!("2012-09-14"));
        assert_eq!(data[1]["release_date"], json!("2017-01-05"));
        assert!(!data[2].contains_key("release_date"));
        assert!(ui.logs.iter().any(|l| l.contains("Try again")));
    }

    #[test]
    fn test_too_many_rejections() {
        let mut data = records(json!([{"id": 60, "name": "Wave X"}]));
        let mut ui = ScriptedUi::new(&["a", "b", "c"]);
        let mut filler = GapFiller::new(date_spec(), 2);

        let err = filler.fill(&mut data, &mut ui).unwrap_err();
        assert!(matches!(err, DataError::Validation { .. }));
    }

    #[test]
    fn test_observed_options() {
        let data = records(json!([
            {"id": 1, "slot": "Crew"},
            {"id": 2, "slot": "Astromech"},
            {"id": 3, "slot": "Crew"},
            {"id": 4}
        ]));
        let filler = GapFiller::new(FILLS[0], 5);

        assert_eq!(
            filler.validator(&data),
            Validator::Choice(vec!["Astromech".to_string(), "Crew".to_string()])
        );
    }
}
