pub mod bytes;
pub mod progress_counter;
