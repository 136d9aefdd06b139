use crate::core::traits::SaveData;
use ndarray::{Array1, Array2};
use std::collections::VecDeque;

/// Number of rows kept when no capacity is given
pub const DEFAULT_CAPACITY: usize = 1000;

/// Bounded record of telemetry rows. Once full, the oldest row is dropped for every new one.
///
/// All rows share the columns of the first recorded item; recording an item with
/// different headers starts the history over.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    capacity: usize,
    headers: String,
    rows: VecDeque<Array1<f64>>,
}

impl History {
    pub fn new() -> History {
        History::with_capacity(DEFAULT_CAPACITY)
    }

    /// A capacity of zero is bumped to one.
    pub fn with_capacity(capacity: usize) -> History {
        let capacity = capacity.max(1);
        History {
            capacity,
            headers: String::new(),
            rows: VecDeque::with_capacity(capacity),
        }
    }

    pub fn record<T: SaveData>(&mut self, item: &T) {
        let headers = item.get_headers();
        if headers != self.headers {
            self.rows.clear();
            self.headers = headers;
        }
        if self.rows.len() == self.capacity {
            self.rows.pop_front();
        }
        self.rows.push_back(item.get_storable_data());
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tab-separated column names, empty before the first record
    pub fn headers(&self) -> &str {
        &self.headers
    }

    pub fn latest(&self) -> Option<&Array1<f64>> {
        self.rows.back()
    }

    /// Rows oldest first, one column per variable.
    pub fn to_array(&self) -> Array2<f64> {
        let width = self.rows.front().map_or(0, |row| row.len());
        let mut array = Array2::zeros((self.rows.len(), width));
        for (mut dest, row) in array.rows_mut().into_iter().zip(self.rows.iter()) {
            dest.assign(row);
        }
        array
    }

    /// Values of the column whose header is `name`, oldest first.
    pub fn column(&self, name: &str) -> Option<Array1<f64>> {
        let index = self.headers.split('\t').position(|h| h == name)?;
        Some(self.rows.iter().map(|row| row[index]).collect())
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        History::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    struct Sample(f64);

    impl SaveData for Sample {
        fn get_headers(&self) -> String {
            "value\tdouble".to_string()
        }
        fn num_storable_variables(&self) -> usize {
            2
        }
        fn get_storable_data(&self) -> Array1<f64> {
            arr1(&[self.0, 2.0 * self.0])
        }
    }

    #[test]
    fn keeps_the_latest_rows() {
        let mut history = History::with_capacity(3);
        assert!(history.is_empty());
        for i in 0..5 {
            history.record(&Sample(i as f64));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.capacity(), 3);
        assert_eq!(history.latest(), Some(&arr1(&[4.0, 8.0])));
        assert_eq!(history.column("value"), Some(arr1(&[2.0, 3.0, 4.0])));
        assert_eq!(history.column("missing"), None);

        let array = history.to_array();
        assert_eq!(array.shape(), &[3, 2]);
        assert_eq!(array[[0, 1]], 4.0);
        assert_eq!(array[[2, 0]], 4.0);
    }

    #[test]
    fn empty_history() {
        let history = History::default();
        assert_eq!(history.capacity(), DEFAULT_CAPACITY);
        assert_eq!(history.headers(), "");
        assert_eq!(history.latest(), None);
        assert_eq!(history.to_array().shape(), &[0, 0]);
    }
}
