/// The clinic's daily booking grid: 30-minute slots from 07:00 to 18:00,
/// with the 11:30–14:00 lunch window closed. Order here is display order.
pub const SLOT_TIMES: [&str; 19] = [
    "07:00", "07:30", "08:00", "08:30", "09:00", "09:30", "10:00", "10:30", "11:00", "11:30",
    "14:00", "14:30", "15:00", "15:30", "16:00", "16:30", "17:00", "17:30", "18:00",
];

pub fn is_slot_time(time: &str) -> bool {
    SLOT_TIMES.contains(&time)
}

/// Grid minus the already-booked labels, in grid order. Booked values that
/// are not grid labels (legacy rows, free-text imports) are simply ignored.
pub fn available_times<S: AsRef<str>>(booked: &[S]) -> Vec<&'static str> {
    SLOT_TIMES
        .iter()
        .copied()
        .filter(|slot| !booked.iter().any(|b| b.as_ref() == *slot))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_booking_returns_full_grid() {
        let booked: Vec<String> = vec![];
        assert_eq!(available_times(&booked), SLOT_TIMES.to_vec());
    }

    #[test]
    fn booked_slots_are_excluded_in_grid_order() {
        let booked = ["09:00".to_string(), "07:00".to_string()];
        let avail = available_times(&booked);

        assert!(!avail.contains(&"07:00"));
        assert!(!avail.contains(&"09:00"));
        assert_eq!(avail.len(), SLOT_TIMES.len() - 2);
        assert_eq!(avail[0], "07:30");

        // still a subsequence of the grid
        let mut grid = SLOT_TIMES.iter();
        for slot in &avail {
            assert!(grid.any(|g| g == slot));
        }
    }

    #[test]
    fn result_has_no_duplicates() {
        let booked = ["14:00".to_string()];
        let avail = available_times(&booked);
        let mut dedup = avail.clone();
        dedup.dedup();
        assert_eq!(avail, dedup);
    }

    #[test]
    fn unknown_booked_labels_are_ignored() {
        let booked = ["12:00".to_string(), "garbage".to_string()];
        assert_eq!(available_times(&booked), SLOT_TIMES.to_vec());
    }

    #[test]
    fn fully_booked_day_is_empty() {
        let booked: Vec<String> = SLOT_TIMES.iter().map(|s| s.to_string()).collect();
        assert!(available_times(&booked).is_empty());
    }

    #[test]
    fn lunch_window_is_not_part_of_the_grid() {
        assert!(!is_slot_time("12:00"));
        assert!(!is_slot_time("13:30"));
        assert!(is_slot_time("11:30"));
        assert!(is_slot_time("14:00"));
    }
}
