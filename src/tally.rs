use crate::models::{AttendanceCode, AttendanceMark, EventTally};

impl EventTally {
    pub fn from_marks<'a>(event_id: &str, marks: impl IntoIterator<Item = &'a AttendanceMark>) -> Self {
        let mut tally = Self::default();
        for mark in marks.into_iter().filter(|mark| mark.event_id == event_id) {
            tally.add(mark.code);
        }
        tally
    }

    /// Counts a newly marked person.
    pub fn add(&mut self, code: AttendanceCode) {
        *self.slot(code) += 1;
        self.total += 1;
    }

    /// Forgets a cancelled mark.
    pub fn remove(&mut self, code: AttendanceCode) {
        let slot = self.slot(code);
        *slot = slot.saturating_sub(1);
        self.total = self.total.saturating_sub(1);
    }

    /// Moves one person from `previous` to `next`. Counters never go below zero.
    pub fn apply_change(&mut self, previous: AttendanceCode, next: AttendanceCode) {
        let slot = self.slot(previous);
        *slot = slot.saturating_sub(1);
        *self.slot(next) += 1;
    }

    fn slot(&mut self, code: AttendanceCode) -> &mut u64 {
        match code {
            AttendanceCode::I => &mut self.unknown,
            AttendanceCode::P => &mut self.present,
            AttendanceCode::PN => &mut self.present_not_training,
            AttendanceCode::A => &mut self.absent,
            AttendanceCode::AA => &mut self.absent_with_notice,
        }
    }
}
