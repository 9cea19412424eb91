//! Contact-mode schedule: which contacts may carry force at each knotpoint.

/// A knotpoint interval sharing one active-contact set. Both endpoints
/// are inclusive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContactMode {
    pub start: usize,
    pub end: usize,
    pub active_contacts: Vec<usize>,
}

impl ContactMode {
    /// Whether `knotpoint` falls inside this mode's interval.
    pub const fn covers(&self, knotpoint: usize) -> bool {
        self.start <= knotpoint && knotpoint <= self.end
    }
}

/// Ordered list of contact modes.
///
/// Overlapping modes union: a contact is active at a knotpoint if any
/// covering mode lists it. Later modes add to, never replace, earlier
/// ones, and declaring the same mode twice changes nothing. A knotpoint
/// covered by no mode has zero active contacts.
#[derive(Clone, Debug, Default)]
pub struct ContactModeSchedule {
    modes: Vec<ContactMode>,
}

impl ContactModeSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a mode covering knotpoints `start..=end` during which the
    /// listed contact indices may carry force.
    pub fn add_mode(&mut self, start: usize, end: usize, active_contacts: Vec<usize>) {
        self.modes.push(ContactMode {
            start,
            end,
            active_contacts,
        });
    }

    /// Sorted, deduplicated union of active-contact indices over every
    /// mode covering `knotpoint`.
    pub fn active_contacts(&self, knotpoint: usize) -> Vec<usize> {
        let mut active: Vec<usize> = self
            .modes
            .iter()
            .filter(|m| m.covers(knotpoint))
            .flat_map(|m| m.active_contacts.iter().copied())
            .collect();
        active.sort_unstable();
        active.dedup();
        active
    }

    /// Whether contact `contact_index` is active at `knotpoint`.
    pub fn is_active(&self, knotpoint: usize, contact_index: usize) -> bool {
        self.modes
            .iter()
            .any(|m| m.covers(knotpoint) && m.active_contacts.contains(&contact_index))
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    pub fn modes(&self) -> &[ContactMode] {
        &self.modes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Support / flight / support over equal thirds of a 27-knotpoint
    /// horizon, one foot contact.
    fn jump_schedule() -> ContactModeSchedule {
        let mut s = ContactModeSchedule::new();
        s.add_mode(1, 9, vec![0]);
        s.add_mode(10, 18, vec![]);
        s.add_mode(19, 27, vec![0]);
        s
    }

    #[test]
    fn three_phase_partition_with_boundaries() {
        let s = jump_schedule();
        for k in 1..=9 {
            assert_eq!(s.active_contacts(k), vec![0], "knotpoint {k}");
        }
        for k in 10..=18 {
            assert!(s.active_contacts(k).is_empty(), "knotpoint {k}");
        }
        for k in 19..=27 {
            assert_eq!(s.active_contacts(k), vec![0], "knotpoint {k}");
        }
        // Phase boundaries exactly.
        assert!(s.is_active(9, 0));
        assert!(!s.is_active(10, 0));
        assert!(!s.is_active(18, 0));
        assert!(s.is_active(19, 0));
    }

    #[test]
    fn uncovered_knotpoint_has_no_contacts() {
        let s = jump_schedule();
        assert!(s.active_contacts(0).is_empty());
        assert!(s.active_contacts(28).is_empty());
    }

    #[test]
    fn overlapping_modes_union() {
        let mut s = ContactModeSchedule::new();
        s.add_mode(1, 10, vec![0]);
        s.add_mode(5, 10, vec![1]);
        assert_eq!(s.active_contacts(3), vec![0]);
        assert_eq!(s.active_contacts(7), vec![0, 1]);
    }

    #[test]
    fn duplicate_mode_is_idempotent() {
        let mut s = jump_schedule();
        let before: Vec<Vec<usize>> = (1..=27).map(|k| s.active_contacts(k)).collect();
        // Declaring the first support phase a second time must change
        // nothing under union semantics.
        s.add_mode(1, 9, vec![0]);
        let after: Vec<Vec<usize>> = (1..=27).map(|k| s.active_contacts(k)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn single_knotpoint_mode() {
        let mut s = ContactModeSchedule::new();
        s.add_mode(4, 4, vec![2]);
        assert!(s.active_contacts(3).is_empty());
        assert_eq!(s.active_contacts(4), vec![2]);
        assert!(s.active_contacts(5).is_empty());
    }
}
