/// Running ordinal assigned to each record
///
/// Owned by whoever drives a run and threaded through the walker by value, so two
/// runs in one process never share a count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunCounter {
    next: u64,
}

impl RunCounter {
    /// Starts counting at 1
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }

    /// Returns the next ordinal and advances
    pub fn next_index(&mut self) -> u64 {
        let index = self.next;
        self.next += 1;
        index
    }

    /// Number that the next record will receive
    pub fn peek(&self) -> u64 {
        self.next
    }
}

impl Default for RunCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_is_monotonic() {
        let mut counter = RunCounter::new();
        assert_eq!(counter.next_index(), 1);
        assert_eq!(counter.next_index(), 2);
        assert_eq!(counter.peek(), 3);
    }

    #[test]
    fn test_counter_offset() {
        let mut counter = RunCounter::starting_at(201);
        assert_eq!(counter.next_index(), 201);
    }
}
