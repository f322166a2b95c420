use crate::models::{AttendanceCode, AttendanceRecord, PersonRanking, Ranking};
use crate::stats::percentage;
use std::collections::BTreeMap;

/// Per-person breakdown of attendance codes, best attendance first.
/// Records without a person are ignored.
pub fn rank_people(records: &[AttendanceRecord]) -> Ranking {
    let mut people: BTreeMap<String, PersonRanking> = BTreeMap::new();

    for record in records {
        let Some(person_id) = record.person_id.as_ref() else {
            continue;
        };

        let entry = people
            .entry(person_id.clone())
            .or_insert_with(|| PersonRanking {
                person_id: person_id.clone(),
                name: record.display_name(),
                present: 0,
                present_not_training: 0,
                absent: 0,
                absent_with_notice: 0,
                unknown: 0,
                total: 0,
                percentage: 0,
            });

        match record.code_or_unknown() {
            AttendanceCode::P => entry.present += 1,
            AttendanceCode::PN => entry.present_not_training += 1,
            AttendanceCode::A => entry.absent += 1,
            AttendanceCode::AA => entry.absent_with_notice += 1,
            AttendanceCode::I => entry.unknown += 1,
        }
        entry.total += 1;
    }

    let mut people: Vec<PersonRanking> = people
        .into_values()
        .map(|mut person| {
            person.percentage = percentage(person.present, person.total);
            person
        })
        .collect();
    people.sort_by(|a, b| {
        b.percentage
            .cmp(&a.percentage)
            .then_with(|| a.name.cmp(&b.name))
    });

    let average_percentage = if people.is_empty() {
        0
    } else {
        let sum: u64 = people.iter().map(|person| u64::from(person.percentage)).sum();
        (sum as f64 / people.len() as f64).round() as u32
    };

    Ranking {
        people,
        average_percentage,
    }
}

impl Ranking {
    /// Keeps people whose name contains `query`, ignoring case. The average is
    /// left as computed over everyone.
    pub fn filter_by_name(mut self, query: &str) -> Self {
        let query = query.trim().to_lowercase();
        if !query.is_empty() {
            self.people
                .retain(|person| person.name.to_lowercase().contains(&query));
        }
        self
    }
}
