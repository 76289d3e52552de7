pub mod dataset_store;
pub mod mean_abs_diff_matcher;
