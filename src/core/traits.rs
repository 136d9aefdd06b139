use ndarray::Array1;

/// Types that can be stored as one tabular row of telemetry.
pub trait SaveData {
    /// Tab-separated column names, one per storable variable
    fn get_headers(&self) -> String;
    fn num_storable_variables(&self) -> usize;
    fn get_storable_data(&self) -> Array1<f64>;
}
